//! Error types for particle pools.
//!
//! Configuration problems surface synchronously from the operation that
//! detects them (`attached`, `resize`, config loading). Buffer packing itself
//! cannot fail once the pool is valid, so it has no error path.

use thiserror::Error;

/// Errors produced by particle components and their configuration.
#[derive(Error, Debug)]
pub enum ParticleError {
    /// A configuration value is out of range or unrecognized.
    #[error("Invalid particle configuration: {0}")]
    InvalidConfiguration(String),

    /// The entity cannot host a particle pool, or the component is already attached.
    #[error("Cannot attach particle component: {0}")]
    Attachment(String),

    /// The operation needs an attached pool.
    #[error("Particle component is not attached to an entity")]
    NotAttached,

    /// Failed to read or write a configuration file.
    #[error("Failed to access particle config file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration JSON.
    #[error("Failed to parse particle config: {0}")]
    Json(#[from] serde_json::Error),
}

impl ParticleError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ParticleError::InvalidConfiguration(msg.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ParticleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ParticleError::invalid("maxParticles must be positive");
        assert_eq!(
            err.to_string(),
            "Invalid particle configuration: maxParticles must be positive"
        );

        let err = ParticleError::Attachment("entity has no transform".into());
        assert!(err.to_string().contains("entity has no transform"));

        assert!(ParticleError::NotAttached.to_string().contains("not attached"));
    }

    #[test]
    fn test_io_source_is_preserved() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.json");
        let err: ParticleError = io.into();
        assert!(matches!(err, ParticleError::Io(_)));
        assert!(err.source().is_some());
    }
}
