use anyhow::{Context as _, Result};
use mosaic_infrastructure::{MosaicConfig, MosaicPaths};
use std::path::Path;

pub fn show(config: &MosaicConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

pub fn path(override_path: Option<&Path>) -> Result<()> {
    let path = match override_path {
        Some(path) => path.to_path_buf(),
        None => MosaicPaths::config_file().context("Failed to resolve config file location")?,
    };
    let note = if path.exists() { "" } else { " (not created; defaults in use)" };
    println!("{}{}", path.display(), note);
    Ok(())
}
