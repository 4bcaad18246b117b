//! # zen-llm
//!
//! Provider-agnostic LLM abstraction for ZenWealth.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    zen-portfolio                         │
//! │  ┌────────────────────┐      ┌────────────────────────┐  │
//! │  │ SearchPriceOracle  │      │   RebalanceAdvisor     │  │
//! │  └─────────┬──────────┘      └───────────┬────────────┘  │
//! └────────────┼─────────────────────────────┼───────────────┘
//!              └──────────────┬──────────────┘
//!                   ┌─────────▼─────────┐
//!                   │    LlmProvider    │  (Strategy)
//!                   └─────────┬─────────┘
//!                   ┌─────────▼─────────┐
//!                   │  GeminiProvider   │  (zen-gemini)
//!                   └───────────────────┘
//! ```
//!
//! Both consumers only see the `LlmProvider` trait, so the backend can be
//! swapped (or scripted in tests) without touching portfolio logic.

pub mod provider;
pub mod message;
pub mod error;

pub use error::{LlmError, Result};
pub use message::{Message, Role};
pub use provider::{Completion, FinishReason, GenerationOptions, LlmProvider, TokenUsage};
