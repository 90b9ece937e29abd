//! Error types for cxxsr-core.

use thiserror::Error;

/// Invalid renaming configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The substitute prefix is empty.
    #[error("substitute prefix must not be empty")]
    EmptyPrefix,

    /// The substitute prefix would not form a valid identifier.
    #[error("invalid substitute prefix {prefix:?}: {reason}")]
    InvalidPrefix { prefix: String, reason: &'static str },
}

/// A token list that does not line up with the mangled text it came from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// The token's length-prefixed field does not occur at or after the cursor.
    #[error("identifier {token:?} not found at or after offset {offset}")]
    TokenNotFound { token: String, offset: usize },

    /// A renameable token has no entry in the rename table.
    #[error("identifier {token:?} has no substitute")]
    Unmapped { token: String },
}

/// Core error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// I/O error while reading symbols or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
