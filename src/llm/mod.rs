//! LLM provider abstraction layer.
//!
//! This module provides a trait-based abstraction for generative model
//! providers, so the recommendation engine can work with Gemini or any
//! OpenAI-compatible service.

mod gemini;
mod openai;
mod provider;

pub use gemini::{GeminiProvider, GEMINI_API_BASE};
pub use openai::{ApiKeySource, OpenAIProvider};
pub use provider::{GenerationOptions, LlmError, LlmProvider};

use crate::config::{LlmProviderKind, LlmSettings};
use std::sync::Arc;

/// Build the provider selected by the configuration.
///
/// Fails with [`LlmError::Credential`] when the provider's credentials are
/// missing, before any request is made.
pub fn create_provider(settings: &LlmSettings) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match settings.provider {
        LlmProviderKind::Gemini => Ok(Arc::new(GeminiProvider::from_settings(settings)?)),
        LlmProviderKind::OpenAi => Ok(Arc::new(OpenAIProvider::from_settings(settings)?)),
    }
}
