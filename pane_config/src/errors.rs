use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum PaneConfigError {
    #[error("configuration file not found")]
    ConfigNotFound,
    #[error("[pane] section missing from configuration file")]
    ConfigSectionNotFound,
    #[error("Failed to read environment variable {0}.")]
    EnvError(String),
    #[error("Config Error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for PaneConfigError {
    fn from(e: config::ConfigError) -> Self {
        Self::ConfigError(e.to_string())
    }
}
