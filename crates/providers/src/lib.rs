//! LLM provider implementations for PanePilot.
//!
//! Any OpenAI-compatible `/v1/chat/completions` endpoint is supported;
//! the configured base URL decides where requests go.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use std::sync::Arc;

use panepilot_config::AppConfig;
use panepilot_core::provider::Provider;

/// Build the provider described by the loaded configuration.
pub fn build_from_config(config: &AppConfig) -> Arc<dyn Provider> {
    Arc::new(OpenAiCompatProvider::new(
        "openai",
        &config.base_url,
        config.api_key.clone().unwrap_or_default(),
    ))
}
