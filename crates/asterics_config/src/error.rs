//! Errors raised while loading `asterics.toml`.

/// Loading or validating the project file failed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML text is malformed or has unexpected fields.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A required value is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// A value is present but unusable.
    #[error("validation error: {0}")]
    ValidationError(String),
}
