//! `docchat onboard` — First-time setup.

use docchat_config::AppConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::resolved_path();
    let config_dir = config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(AppConfig::config_dir);

    println!("DocChat — First-Time Setup");
    println!("==========================\n");

    if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("  Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n  Config already exists at: {}", config_path.display());
        println!("  Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("  Created config at: {}", config_path.display());
        println!("\n  Next steps:");
        println!("   1. Start Ollama and pull a model: ollama pull mistral");
        println!("   2. Run: docchat doctor");
        println!("   3. Run: docchat chat --document your.pdf\n");
    }

    Ok(())
}
