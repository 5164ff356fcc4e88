pub mod chat;
pub mod doctor;
pub mod extract;
pub mod models;
pub mod onboard;
pub mod serve;

use docchat_agent::Orchestrator;
use docchat_config::AppConfig;
use docchat_core::Error;

/// Load the configuration from the default location.
pub fn load_config() -> Result<AppConfig, Error> {
    AppConfig::load().map_err(|e| Error::Config {
        message: e.to_string(),
    })
}

/// Wire the configured provider and knowledge fallback into an orchestrator.
pub fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator, Box<dyn std::error::Error>> {
    let provider = docchat_providers::build_from_config(config)?;
    let orchestrator = Orchestrator::new(provider).with_temperature(config.temperature);
    Ok(match docchat_tools::build_from_config(&config.fallback)? {
        Some(knowledge) => orchestrator.with_knowledge(knowledge),
        None => orchestrator,
    })
}
