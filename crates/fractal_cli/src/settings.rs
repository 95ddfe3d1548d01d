//! Run parameters from an optional TOML file.
use anyhow::{Context, Result};
use fractal_core::RunParameters;
use std::path::Path;

/// Reads `path` as TOML, or returns the defaults when no file is given.
/// Keys missing from the file keep their default values.
pub fn load_parameters(path: Option<&Path>) -> Result<RunParameters> {
    let Some(path) = path else {
        return Ok(RunParameters::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameter file {}.", path.display()))?;
    let params: RunParameters = toml::from_str(&text)
        .with_context(|| format!("Failed to parse parameter file {}.", path.display()))?;
    tracing::debug!(path = %path.display(), ?params, "loaded run parameters");
    Ok(params)
}
