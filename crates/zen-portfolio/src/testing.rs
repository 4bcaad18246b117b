//! Test doubles shared by the unit tests of this crate

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use zen_llm::{Completion, GenerationOptions, LlmError, LlmProvider, Message};

/// LLM provider that plays back canned replies in order and records every
/// request it receives
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<zen_llm::Result<String>>>,
    requests: Mutex<Vec<(Vec<Message>, GenerationOptions)>>,
}

impl ScriptedProvider {
    pub fn new(replies: impl IntoIterator<Item = zen_llm::Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new([Ok(text.to_string())])
    }

    pub fn failing(error: LlmError) -> Self {
        Self::new([Err(error)])
    }

    pub fn last_request(&self) -> Option<(Vec<Message>, GenerationOptions)> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> zen_llm::Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> zen_llm::Result<Completion> {
        self.requests
            .lock()
            .unwrap()
            .push((messages.to_vec(), options.clone()));

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::ProviderUnavailable("script exhausted".into())));

        reply.map(|text| Completion::text("scripted-model", text))
    }
}
