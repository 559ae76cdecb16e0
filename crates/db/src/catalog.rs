use async_trait::async_trait;

use crate::error::CatalogError;
use crate::model::{CollectionRecord, PrincipalRecord, PrincipalSpec};

const MAX_DATABASE_NAME_BYTES: usize = 64;
const FORBIDDEN_DATABASE_CHARS: &[char] = &[
    '/', '\\', '.', '"', '$', '*', '<', '>', ':', '|', '?', ' ', '\0',
];

/// Control-plane operations against a database engine.
///
/// Mutating calls are not idempotent: creating an entity that already exists
/// is reported as a duplicate, never skipped.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Short backend name used in logs.
    fn engine(&self) -> &'static str;

    /// Bind to a database by name. Creation is deferred to the first write.
    async fn select_database(&self, name: &str) -> Result<(), CatalogError>;

    /// Create a principal authenticated against `db` with exactly `principal.roles`.
    async fn create_user(&self, db: &str, principal: &PrincipalSpec) -> Result<(), CatalogError>;

    /// Create an empty collection with no validator and no extra indexes.
    async fn create_collection(&self, db: &str, name: &str) -> Result<(), CatalogError>;

    async fn database_exists(&self, name: &str) -> Result<bool, CatalogError>;

    async fn find_principal(
        &self,
        db: &str,
        username: &str,
    ) -> Result<Option<PrincipalRecord>, CatalogError>;

    async fn find_collection(
        &self,
        db: &str,
        name: &str,
    ) -> Result<Option<CollectionRecord>, CatalogError>;
}

/// Check a database name against the engine's naming rules.
pub fn validate_database_name(name: &str) -> Result<(), CatalogError> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.len() >= MAX_DATABASE_NAME_BYTES {
        Some("name must be shorter than 64 bytes")
    } else if name.contains(FORBIDDEN_DATABASE_CHARS) {
        Some("name contains a forbidden character")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(CatalogError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_hyphenated_names() {
        assert!(validate_database_name("comic-back").is_ok());
    }

    #[test]
    fn rejects_bad_names() {
        for name in ["", "comic.back", "comic back", "a/b", "$db"] {
            let err = validate_database_name(name).unwrap_err();
            assert!(matches!(err, CatalogError::InvalidName { .. }), "{name}");
        }
        assert!(validate_database_name(&"x".repeat(64)).is_err());
        assert!(validate_database_name(&"x".repeat(63)).is_ok());
    }
}
