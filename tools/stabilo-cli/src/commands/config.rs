//! Show or initialise the configuration file.

use stabilo_common::config::{config_file_path, AppConfig};

pub fn run(config: &AppConfig, init: bool) -> anyhow::Result<()> {
    let path = config_file_path();

    if init {
        if path.exists() {
            println!("Config already exists at: {}", path.display());
        } else {
            let written = AppConfig::default()
                .save()
                .map_err(|e| anyhow::anyhow!("Failed to write config: {e}"))?;
            println!("Wrote default config to: {}", written.display());
        }
        return Ok(());
    }

    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
