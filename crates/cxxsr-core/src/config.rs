//! Renaming configuration.

use crate::error::ConfigError;

/// Prefix used for substitute names when none is given.
pub const DEFAULT_PREFIX: &str = "CXXSR_";

/// The initial hash range is this many slots per identifier.
pub const COLLISION_HEADROOM: u64 = 100;

/// Settings for one renaming run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameConfig {
    /// Text every substitute name starts with.
    pub prefix: String,
    /// Mixed into every identifier hash; changing it reshuffles the mapping.
    pub salt: String,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            salt: String::new(),
        }
    }
}

impl RenameConfig {
    /// Create a validated configuration.
    pub fn new(prefix: impl Into<String>, salt: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            prefix: prefix.into(),
            salt: salt.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that substitutes built from the prefix are valid identifiers.
    ///
    /// A leading digit would run into the length field of the rewritten
    /// `<length><identifier>` encoding.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut chars = self.prefix.chars();
        let first = chars.next().ok_or(ConfigError::EmptyPrefix)?;

        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(self.invalid("must start with an ASCII letter or '_'"));
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(self.invalid("may only contain ASCII letters, digits and '_'"));
        }
        Ok(())
    }

    fn invalid(&self, reason: &'static str) -> ConfigError {
        ConfigError::InvalidPrefix {
            prefix: self.prefix.clone(),
            reason,
        }
    }
}
