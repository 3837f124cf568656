use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Manager dependency-graph errors.
///
/// These are the only non-recoverable failures in the orchestrator: they are
/// raised while building the registry, before any polling starts, and the
/// process must refuse to run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("duplicate manager id '{id}'")]
    Duplicate { id: String },

    #[error("manager '{manager}' depends on unregistered manager '{dependency}'")]
    Unknown { manager: String, dependency: String },

    #[error("dependency cycle among managers: {ids:?}")]
    Cycle { ids: Vec<String> },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dependency(#[from] DependencyError),

    #[error("market feed error: {0}")]
    Feed(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
