//! `sitara onboard` — first-time setup.

use std::path::PathBuf;

use sitara_config::AppConfig;

pub async fn run(config_override: &Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match config_override {
        Some(path) => path.clone(),
        None => AppConfig::config_dir().join("config.toml"),
    };

    println!("Sitara — First-Time Setup");
    println!("=========================\n");

    if let Some(parent) = config_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
            println!("Created config directory: {}", parent.display());
        }
    }

    if config_path.exists() {
        println!("Config file already exists: {}", config_path.display());
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("Created config file: {}", config_path.display());
    }

    println!();
    println!("Next steps:");
    println!("  1. Set your agent id in {}", config_path.display());
    println!("     (or export SITARA_AGENT_ID)");
    println!("  2. Export SITARA_API_KEY, or set auth_mode = \"public\"");
    println!("  3. Point watch.memory_buffer_path at your memory snapshot");
    println!("  4. Start a session:  sitara run");
    println!("     Inspect payload:  sitara run --dry");

    Ok(())
}
