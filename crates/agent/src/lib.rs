//! Review summarization through a generative AI provider.
//!
//! The model is only asked to describe reviews; sampling, output caps and
//! error classification are decided here, not by the provider.
//!
//! - `llm`: provider-neutral [`LlmClient`] port and the Gemini transport.
//! - `prompt`: the summarization prompt and its response schema.
//! - `summarizer`: [`GeminiSummarizer`], the `ReviewSummarizer` adapter.

pub mod llm;
pub mod prompt;
pub mod summarizer;

pub use llm::{CompletionRequest, GeminiClient, LlmClient, LlmError};
pub use summarizer::GeminiSummarizer;
