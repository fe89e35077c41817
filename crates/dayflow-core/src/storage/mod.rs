mod config;

pub use config::{
    parse_hhmm, AiConfig, BackfillConfig, ChainConfig, Config, DayConfig, PillarConfig,
};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the dayflow data directory, creating it if needed.
///
/// `DAYFLOW_HOME` overrides the location outright. Otherwise this is
/// `~/.config/dayflow/`, or `~/.config/dayflow-dev/` when `DAYFLOW_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("DAYFLOW_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("DAYFLOW_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("dayflow-dev")
            } else {
                base_dir.join("dayflow")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
