//! `agentic-patterns config`: Configuration management.

use agentic_config::AppConfig;
use std::path::{Path, PathBuf};

pub async fn run(config_path: Option<&Path>, init: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);

    if init {
        if write_default(&path)? {
            println!("Wrote default configuration to {}", path.display());
        } else {
            println!("Config file already exists at {}", path.display());
        }
        return Ok(());
    }

    let config = AppConfig::load_with(Some(path.as_path()))
        .map_err(|e| format!("Failed to load config: {e}"))?;
    println!("Config file: {}", describe_path(&path));
    println!();
    // Debug output redacts API keys
    println!("{config:#?}");

    Ok(())
}

/// Write the default config to `path` unless a file is already there.
///
/// Returns whether a file was written.
fn write_default(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(true)
}

fn describe_path(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    }
}
