//! Configuration loader for YAML files

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::AppError;

use super::types::AppConfig;

/// Load and validate configuration from a YAML file
///
/// # Errors
/// `AppError::Config` when the file is missing, does not parse, or fails
/// validation; `AppError::Io` when it cannot be opened.
pub fn load_config(path: &Path) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Err(AppError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let reader = BufReader::new(File::open(path)?);
    let config: AppConfig = serde_yaml::from_reader(reader).map_err(|e| {
        AppError::Config(format!("YAML parse error in '{}': {}", path.display(), e))
    })?;

    config.validate()?;
    tracing::info!(
        phase = "init",
        path = %path.display(),
        markets = ?config.markets,
        "Configuration loaded"
    );
    Ok(config)
}

/// Load and validate configuration from a YAML string
pub fn load_config_from_str(yaml_content: &str) -> Result<AppConfig, AppError> {
    let config: AppConfig = serde_yaml::from_str(yaml_content)
        .map_err(|e| AppError::Config(format!("YAML parse error: {}", e)))?;

    config.validate()?;
    Ok(config)
}

// ============================================================================
// Tests
// ============================================================================
