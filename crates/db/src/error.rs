//! Error types surfaced by catalog operations.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures of a single catalog operation.
///
/// Conflicts are typed so callers can tell them apart; everything else the
/// engine reports is carried through with its own message.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("principal '{username}' already exists in database '{database}'")]
    DuplicatePrincipal { username: String, database: String },

    #[error("collection '{collection}' already exists in database '{database}'")]
    DuplicateCollection {
        collection: String,
        database: String,
    },

    #[error("invalid database name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("database engine unreachable: {source}")]
    Unreachable {
        #[source]
        source: BoxError,
    },

    #[error("{operation} failed: {source}")]
    Engine {
        operation: &'static str,
        #[source]
        source: BoxError,
    },
}

impl CatalogError {
    pub fn unreachable(source: impl Into<BoxError>) -> Self {
        Self::Unreachable {
            source: source.into(),
        }
    }

    pub fn engine(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Engine {
            operation,
            source: source.into(),
        }
    }

    /// True for the two "entity already exists" conditions.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::DuplicatePrincipal { .. } | Self::DuplicateCollection { .. }
        )
    }
}
