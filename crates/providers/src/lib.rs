//! LLM provider implementations for DocChat.
//!
//! All providers implement the `docchat_core::Provider` trait. Models are
//! served by a local Ollama instance.

pub mod ollama;

use std::sync::Arc;
use std::time::Duration;

use docchat_config::AppConfig;
use docchat_core::error::ProviderError;
use docchat_core::provider::Provider;
use tracing::info;

pub use ollama::OllamaProvider;

/// Build the provider described by the configuration.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let provider = OllamaProvider::new(
        &config.ollama.base_url,
        Duration::from_secs(config.ollama.timeout_secs),
    )?;
    info!(base_url = %provider.base_url(), "Configured Ollama provider");
    Ok(Arc::new(provider))
}
