use crate::scheduler::EngineOptions;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Charge et valide des options moteur depuis un fichier JSON.
///
/// Les champs absents gardent leur valeur par défaut.
pub fn load_options_from_file<P: AsRef<Path>>(path: P) -> Result<EngineOptions> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
    let options: EngineOptions = serde_json::from_slice(&data)
        .with_context(|| format!("parsing config {}", path.display()))?;
    options.validate()?;
    Ok(options)
}

pub fn export_options_json<P: AsRef<Path>>(path: P, options: &EngineOptions) -> Result<()> {
    let json = serde_json::to_string_pretty(options)?;
    fs::write(path, json)?;
    Ok(())
}
