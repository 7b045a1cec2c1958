//! error.rs - Typed errors for the tactical AI
//!
//! Nothing in the per-tick path returns an error: geometry gaps and numeric
//! edge cases degrade to safe defaults. Errors only surface when loading
//! tunables.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse tactics config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { field, reason: reason.into() }
    }
}
