//! # zen-gemini
//!
//! Google Gemini provider for the ZenWealth LLM abstraction.
//!
//! Speaks the `generateContent` REST endpoint directly over `reqwest`,
//! including search grounding and JSON response schemas, which the price
//! oracle relies on.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zen_gemini::GeminiProvider;
//!
//! let provider = GeminiProvider::from_env()?;
//! let oracle = SearchPriceOracle::new(Arc::new(provider));
//! ```

pub mod gemini;

pub use gemini::{GeminiConfig, GeminiProvider};

// Re-export core types for convenience
pub use zen_llm::{LlmError, LlmProvider, Message, Result, Role};
