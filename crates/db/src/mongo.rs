//! MongoDB backend for [`Catalog`].

use async_trait::async_trait;
use mongodb::bson::{self, doc, Document};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::Client;
use serde::Deserialize;

use crate::catalog::{validate_database_name, Catalog};
use crate::error::CatalogError;
use crate::model::{CollectionRecord, PrincipalRecord, PrincipalSpec};

// Server error codes the bootstrap distinguishes.
const NAMESPACE_EXISTS: i32 = 48;
const DUPLICATE_KEY: i32 = 11000;
const USER_ALREADY_EXISTS: i32 = 51003;

pub struct MongoCatalog {
    client: Client,
}

impl MongoCatalog {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[derive(Debug, Deserialize)]
struct UsersInfo {
    #[serde(default)]
    users: Vec<PrincipalRecord>,
}

fn command_code(err: &MongoError) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        _ => None,
    }
}

/// Map a driver error that has no operation-specific meaning.
fn classify(operation: &'static str, err: MongoError) -> CatalogError {
    let unreachable = matches!(
        err.kind.as_ref(),
        ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::ConnectionPoolCleared { .. }
    );
    if unreachable {
        CatalogError::unreachable(err)
    } else {
        CatalogError::engine(operation, err)
    }
}

/// Map a failed `createUser` for `principal` in `db`.
fn create_user_error(err: MongoError, db: &str, principal: &PrincipalSpec) -> CatalogError {
    match command_code(&err) {
        Some(USER_ALREADY_EXISTS) | Some(DUPLICATE_KEY) => CatalogError::DuplicatePrincipal {
            username: principal.username.clone(),
            database: db.to_string(),
        },
        _ => classify("createUser", err),
    }
}

/// Map a failed `create` of collection `name` in `db`.
fn create_collection_error(err: MongoError, db: &str, name: &str) -> CatalogError {
    match command_code(&err) {
        Some(NAMESPACE_EXISTS) => CatalogError::DuplicateCollection {
            collection: name.to_string(),
            database: db.to_string(),
        },
        _ => classify("createCollection", err),
    }
}

fn create_user_command(principal: &PrincipalSpec) -> Document {
    let roles: Vec<Document> = principal
        .roles
        .iter()
        .map(|grant| doc! { "role": grant.role.as_str(), "db": grant.db.as_str() })
        .collect();

    doc! {
        "createUser": principal.username.as_str(),
        "pwd": principal.password.as_str(),
        "roles": roles,
    }
}

#[async_trait]
impl Catalog for MongoCatalog {
    fn engine(&self) -> &'static str {
        "mongodb"
    }

    async fn select_database(&self, name: &str) -> Result<(), CatalogError> {
        // The driver hands out database handles lazily; nothing goes over the wire.
        validate_database_name(name)
    }

    async fn create_user(&self, db: &str, principal: &PrincipalSpec) -> Result<(), CatalogError> {
        self.client
            .database(db)
            .run_command(create_user_command(principal))
            .await
            .map(|_| ())
            .map_err(|err| create_user_error(err, db, principal))
    }

    async fn create_collection(&self, db: &str, name: &str) -> Result<(), CatalogError> {
        self.client
            .database(db)
            .create_collection(name)
            .await
            .map_err(|err| create_collection_error(err, db, name))
    }

    async fn database_exists(&self, name: &str) -> Result<bool, CatalogError> {
        let names = self
            .client
            .list_database_names()
            .await
            .map_err(|err| classify("listDatabases", err))?;
        Ok(names.iter().any(|existing| existing == name))
    }

    async fn find_principal(
        &self,
        db: &str,
        username: &str,
    ) -> Result<Option<PrincipalRecord>, CatalogError> {
        let reply = self
            .client
            .database(db)
            .run_command(doc! { "usersInfo": { "user": username, "db": db } })
            .await
            .map_err(|err| classify("usersInfo", err))?;

        let info: UsersInfo =
            bson::from_document(reply).map_err(|err| CatalogError::engine("usersInfo", err))?;
        Ok(info.users.into_iter().find(|user| user.username == username))
    }

    async fn find_collection(
        &self,
        db: &str,
        name: &str,
    ) -> Result<Option<CollectionRecord>, CatalogError> {
        let database = self.client.database(db);
        let names = database
            .list_collection_names()
            .await
            .map_err(|err| classify("listCollections", err))?;
        if !names.iter().any(|existing| existing == name) {
            return Ok(None);
        }

        let collection = database.collection::<Document>(name);
        let document_count = collection
            .count_documents(doc! {})
            .await
            .map_err(|err| classify("countDocuments", err))?;
        let index_names = collection
            .list_index_names()
            .await
            .map_err(|err| classify("listIndexes", err))?;

        Ok(Some(CollectionRecord {
            name: name.to_string(),
            document_count,
            index_names,
        }))
    }
}
