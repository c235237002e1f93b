//! Error types for dynsql

use thiserror::Error;

/// Result type alias for builder configuration and statement creation.
pub type BuildResult<T> = Result<T, BuildError>;

/// Recoverable errors raised while configuring a builder or creating a statement.
///
/// Malformed criteria built in code (a `BETWEEN` without two bounds, for example) are
/// bugs in the caller and panic instead; see [`Criterion::new`](crate::Criterion::new).
#[derive(Debug, Error)]
pub enum BuildError {
    /// Requested dialect has no implementation
    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    /// Relation name was empty
    #[error("Missing relation name")]
    MissingRelation,

    /// Identifier failed validation
    #[error("Invalid identifier '{ident}': {message}")]
    InvalidIdentifier { ident: String, message: String },

    /// Unknown operator token
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    /// Unknown boolean connective
    #[error("Invalid combinator: {0}")]
    InvalidCombinator(String),

    /// Criterion value does not fit its operator
    #[error("Invalid criterion on '{property}': {message}")]
    InvalidCriterion { property: String, message: String },

    /// Write statement requested for a relation that cannot be written
    #[error("Relation '{0}' is backed by a SQL source and is not writable")]
    NotWritable(String),

    /// INSERT/UPDATE without any column values
    #[error("No column values given for {0}")]
    EmptyValues(&'static str),

    /// Data source definition error
    #[error("Config error: {0}")]
    Config(String),

    /// Reading a definition file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// Create an invalid identifier error
    pub fn invalid_identifier(ident: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            ident: ident.into(),
            message: message.into(),
        }
    }

    /// Create an invalid criterion error
    pub fn invalid_criterion(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCriterion {
            property: property.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a configuration-time error (as opposed to a statement-time one)
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedDialect(_) | Self::MissingRelation | Self::Config(_) | Self::Io(_)
        )
    }
}

impl From<toml::de::Error> for BuildError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for BuildError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}
