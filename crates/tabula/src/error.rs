//! Error types for table construction, configuration and resolution.

/// Configuration errors raised while a table is being set up.
///
/// These never depend on the incoming request: a definition that produces
/// one of them cannot resolve any request at all.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Option [{option}] doesn't exist on {target}")]
    UnknownOption { target: String, option: String },
    #[error("Option [{option}] expects {expected}")]
    InvalidOptionValue {
        option: String,
        expected: &'static str,
    },
    #[error("Invalid {decorator} decorator on column '{field}': {reason}")]
    InvalidDecorator {
        field: String,
        decorator: &'static str,
        reason: String,
    },
    #[error("Unknown {family} kind '{kind}'")]
    UnknownKind { family: &'static str, kind: String },
    #[error("Unknown clause '{0}'")]
    UnknownClause(String),
    #[error("Invalid defaults: {0}")]
    InvalidDefaults(String),
}

/// Errors reported by a record source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Resource '{0}' is not known to the record source")]
    UnknownResource(String),
    #[error("Record source failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SourceError {
    /// Wrap any backend failure so it propagates unmodified to the caller.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SourceError::Backend(Box::new(err))
    }
}

/// Errors returned by table construction and resolution.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("The table resource is not defined")]
    UndefinedResource,
    #[error("Resource '{0}' is not a valid record type")]
    InvalidResource(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("Failed to serialize table payload: {0}")]
    Serialize(#[from] serde_json::Error),
}
