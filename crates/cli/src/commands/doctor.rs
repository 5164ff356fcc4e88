//! `docchat doctor` — Diagnose configuration and Ollama connectivity.

use docchat_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("DocChat Doctor — System Diagnostics");
    println!("===================================\n");

    let mut issues = 0;

    // Config
    let config_path = AppConfig::resolved_path();
    if config_path.exists() {
        println!("  ✅ Config file: {}", config_path.display());
    } else {
        println!(
            "  ⚠️  No config file at {} — using defaults (run `docchat onboard`)",
            config_path.display()
        );
    }
    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    // Ollama
    let provider = docchat_providers::build_from_config(&config)?;
    match provider.list_models().await {
        Ok(pulled) => {
            println!("  ✅ Ollama reachable at {}", config.ollama.base_url);
            let default = &config.default_model;
            let has_default = pulled
                .iter()
                .any(|p| p == default || p.starts_with(&format!("{default}:")));
            if has_default {
                println!("  ✅ Default model '{default}' is pulled");
            } else {
                println!("  ⚠️  Default model '{default}' not pulled — run `ollama pull {default}`");
                issues += 1;
            }
        }
        Err(e) => {
            println!("  ❌ Ollama not reachable at {}: {e}", config.ollama.base_url);
            issues += 1;
        }
    }

    // Fallback
    if config.fallback.enabled {
        println!("  ✅ Wikipedia fallback enabled ({})", config.fallback.api_url);
    } else {
        println!("  ℹ️  Wikipedia fallback disabled");
    }

    // Transcript directory
    if config.transcript.dir.is_dir() {
        println!("  ✅ Transcripts saved to {}", config.transcript.dir.display());
    } else {
        println!(
            "  ❌ Transcript directory does not exist: {}",
            config.transcript.dir.display()
        );
        issues += 1;
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
