use thiserror::Error;

/// Errors raised by the configuration and trace-replay surfaces.
///
/// The event entry points on [`Demangler`](crate::Demangler) never fail; an
/// event that cannot be tracked is simply ignored.
#[derive(Error, Debug)]
pub enum DemanglerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Malformed trace event on line {line}: {reason}")]
    MalformedEvent { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, DemanglerError>;
