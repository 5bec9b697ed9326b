use crate::status::UnknownStatus;
use crate::tree::TreeError;
use thiserror::Error;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an `{"error": ...}` body.
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("unexpected status {status}")]
    Status { status: u16 },

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("no instance url configured")]
    MissingUrl,
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid date for {key}: {value}")]
    InvalidDate { key: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Status(#[from] UnknownStatus),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
