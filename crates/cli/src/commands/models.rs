//! `docchat models` — Supported models and whether Ollama has them.

use docchat_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let provider = docchat_providers::build_from_config(&config)?;

    let pulled = match provider.list_models().await {
        Ok(models) => Some(models),
        Err(e) => {
            eprintln!("  Could not reach Ollama at {}: {e}", config.ollama.base_url);
            None
        }
    };

    print!("{}", render(&config, pulled.as_deref()));
    Ok(())
}

fn render(config: &AppConfig, pulled: Option<&[String]>) -> String {
    let mut out = String::from("Supported models:\n");
    for model in &config.supported_models {
        let marker = if *model == config.default_model { "*" } else { " " };
        let status = match pulled {
            Some(pulled) if is_pulled(model, pulled) => "pulled",
            Some(_) => "not pulled",
            None => "unknown",
        };
        out.push_str(&format!("  {marker} {model:<12} {status}\n"));
    }
    out
}

/// Ollama lists models with a tag (`mistral:latest`); an untagged name
/// matches any tag.
fn is_pulled(model: &str, pulled: &[String]) -> bool {
    pulled.iter().any(|p| {
        p == model
            || p
                .strip_prefix(model)
                .is_some_and(|tag| tag.starts_with(':'))
    })
}
