use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config")]
    Json(#[from] serde_json::Error),
    #[error("Invalid color {0:?}")]
    InvalidColor(String),
}
