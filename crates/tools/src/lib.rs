//! External knowledge lookups for DocChat.
//!
//! When the model gives a weak answer the orchestrator asks a
//! [`KnowledgeSource`] instead. The only built-in source is Wikipedia.

pub mod wikipedia;

use std::sync::Arc;
use std::time::Duration;

use docchat_config::FallbackConfig;
use docchat_core::error::KnowledgeError;
use docchat_core::knowledge::KnowledgeSource;
use tracing::info;

pub use wikipedia::WikipediaLookup;

/// Build the fallback source described by the configuration.
///
/// Returns `None` when the fallback is disabled.
pub fn build_from_config(
    config: &FallbackConfig,
) -> Result<Option<Arc<dyn KnowledgeSource>>, KnowledgeError> {
    if !config.enabled {
        info!("Knowledge fallback disabled");
        return Ok(None);
    }

    let lookup = WikipediaLookup::new(&config.api_url, Duration::from_secs(config.timeout_secs))?
        .with_top_k(config.top_k_results)
        .with_max_chars(config.max_chars);
    Ok(Some(Arc::new(lookup)))
}
