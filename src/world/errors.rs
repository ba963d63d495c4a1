use thiserror::Error;

/// Errors that can arise inside the world simulation core.
#[derive(Debug, Error)]
pub enum WorldError {
    /// Wrapper around IO errors (snapshot files, world definition files).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around JSON serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapper around TOML parse errors from world definition files.
    #[error("world definition error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when loading a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// The world catalog failed an integrity check at load time. This is the
    /// one fatal startup error: without a coherent catalog no command can
    /// resolve.
    #[error("catalog integrity error: {0}")]
    CatalogIntegrity(String),

    /// Internal error (poisoned lock, unexpected condition).
    #[error("internal error: {0}")]
    Internal(String),
}

impl WorldError {
    /// Convenience constructor used by store accessors when a lock was
    /// poisoned by a panicking writer.
    pub fn poisoned(what: &str) -> Self {
        WorldError::Internal(format!("{} lock poisoned", what))
    }
}
