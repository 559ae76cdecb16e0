//! In-process catalog that mirrors the engine semantics the bootstrap relies on.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::catalog::{validate_database_name, Catalog};
use crate::error::CatalogError;
use crate::model::{CollectionRecord, PrincipalRecord, PrincipalSpec, DEFAULT_INDEX};

/// A mutating call received by [`MemoryCatalog`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum CatalogCall {
    SelectDatabase { name: String },
    CreateUser { db: String, username: String },
    CreateCollection { db: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    #[serde(flatten)]
    pub call: CatalogCall,
    pub accepted: bool,
}

#[derive(Debug, Default)]
struct State {
    // Databases that received at least one write.
    materialized: BTreeSet<String>,
    // Keyed by (auth database, username).
    principals: BTreeMap<(String, String), PrincipalRecord>,
    // Keyed by (database, collection).
    collections: BTreeMap<(String, String), CollectionRecord>,
    journal: Vec<JournalEntry>,
}

impl State {
    fn record(&mut self, call: CatalogCall, accepted: bool) {
        self.journal.push(JournalEntry { call, accepted });
    }
}

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: Mutex<State>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every mutating call seen so far, in arrival order.
    pub async fn journal(&self) -> Vec<JournalEntry> {
        self.state.lock().await.journal.clone()
    }

    /// Overwrite the document count of an existing collection.
    ///
    /// Lets tests model a collection that is no longer empty.
    pub async fn set_document_count(&self, db: &str, name: &str, count: u64) -> bool {
        let mut state = self.state.lock().await;
        match state
            .collections
            .get_mut(&(db.to_string(), name.to_string()))
        {
            Some(collection) => {
                collection.document_count = count;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    fn engine(&self) -> &'static str {
        "memory"
    }

    async fn select_database(&self, name: &str) -> Result<(), CatalogError> {
        let mut state = self.state.lock().await;
        let call = CatalogCall::SelectDatabase {
            name: name.to_string(),
        };
        let result = validate_database_name(name);
        state.record(call, result.is_ok());
        result
    }

    async fn create_user(&self, db: &str, principal: &PrincipalSpec) -> Result<(), CatalogError> {
        let mut state = self.state.lock().await;
        let call = CatalogCall::CreateUser {
            db: db.to_string(),
            username: principal.username.clone(),
        };
        if let Err(err) = validate_database_name(db) {
            state.record(call, false);
            return Err(err);
        }
        let key = (db.to_string(), principal.username.clone());

        if state.principals.contains_key(&key) {
            state.record(call, false);
            return Err(CatalogError::DuplicatePrincipal {
                username: principal.username.clone(),
                database: db.to_string(),
            });
        }

        state.principals.insert(
            key,
            PrincipalRecord {
                username: principal.username.clone(),
                db: db.to_string(),
                roles: principal.roles.clone(),
            },
        );
        state.materialized.insert(db.to_string());
        state.record(call, true);
        Ok(())
    }

    async fn create_collection(&self, db: &str, name: &str) -> Result<(), CatalogError> {
        let mut state = self.state.lock().await;
        let call = CatalogCall::CreateCollection {
            db: db.to_string(),
            name: name.to_string(),
        };
        if let Err(err) = validate_database_name(db) {
            state.record(call, false);
            return Err(err);
        }
        let key = (db.to_string(), name.to_string());

        if state.collections.contains_key(&key) {
            state.record(call, false);
            return Err(CatalogError::DuplicateCollection {
                collection: name.to_string(),
                database: db.to_string(),
            });
        }

        state.collections.insert(
            key,
            CollectionRecord {
                name: name.to_string(),
                document_count: 0,
                index_names: vec![DEFAULT_INDEX.to_string()],
            },
        );
        state.materialized.insert(db.to_string());
        state.record(call, true);
        Ok(())
    }

    async fn database_exists(&self, name: &str) -> Result<bool, CatalogError> {
        Ok(self.state.lock().await.materialized.contains(name))
    }

    async fn find_principal(
        &self,
        db: &str,
        username: &str,
    ) -> Result<Option<PrincipalRecord>, CatalogError> {
        let state = self.state.lock().await;
        Ok(state
            .principals
            .get(&(db.to_string(), username.to_string()))
            .cloned())
    }

    async fn find_collection(
        &self,
        db: &str,
        name: &str,
    ) -> Result<Option<CollectionRecord>, CatalogError> {
        let state = self.state.lock().await;
        Ok(state
            .collections
            .get(&(db.to_string(), name.to_string()))
            .cloned())
    }
}
