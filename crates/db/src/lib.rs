//! MongoDB client factory and catalog operations for the comic-back bootstrap.

use std::time::Duration;

use mongodb::options::{ClientOptions, Credential};
use mongodb::Client;
use url::Url;

pub mod catalog;
pub mod error;
pub mod memory;
pub mod model;
pub mod mongo;

pub use catalog::{validate_database_name, Catalog};
pub use error::CatalogError;
pub use memory::{CatalogCall, JournalEntry, MemoryCatalog};
pub use model::{CollectionRecord, PrincipalRecord, PrincipalSpec, Role, RoleGrant};
pub use mongo::MongoCatalog;

/// Client settings applied on top of the connection string.
///
/// Credentials travel separately so they never need URL encoding.
#[derive(Clone, Default)]
pub struct ConnectOptions {
    pub app_name: String,
    pub server_selection_timeout: Duration,
    pub username: Option<String>,
    pub password: Option<String>,
    pub auth_source: Option<String>,
}

impl ConnectOptions {
    /// SCRAM credential, or `None` when no username is configured.
    fn credential(&self) -> Option<Credential> {
        let username = self.username.as_deref().filter(|name| !name.is_empty())?;

        let mut credential = Credential::default();
        credential.username = Some(username.to_string());
        credential.password = self.password.clone();
        credential.source = self.auth_source.clone();
        Some(credential)
    }
}

/// Resolve the driver options for `uri`.
pub async fn client_options(
    uri: &str,
    settings: &ConnectOptions,
) -> Result<ClientOptions, CatalogError> {
    let mut options = ClientOptions::parse(uri)
        .await
        .map_err(|err| CatalogError::engine("parse connection string", err))?;
    options.app_name = Some(settings.app_name.clone());
    options.server_selection_timeout = Some(settings.server_selection_timeout);
    if let Some(credential) = settings.credential() {
        options.credential = Some(credential);
    }
    Ok(options)
}

/// Build a MongoDB catalog from a connection string.
///
/// Parsing may resolve SRV records; no command is sent to the server until
/// the first catalog operation.
pub async fn connect(uri: &str, settings: &ConnectOptions) -> Result<MongoCatalog, CatalogError> {
    let options = client_options(uri, settings).await?;
    let authenticated = options.credential.is_some();

    let client = Client::with_options(options)
        .map_err(|err| CatalogError::engine("build client", err))?;

    tracing::info!(
        target: "comic-back-db",
        uri = %redact_uri(uri),
        app_name = %settings.app_name,
        authenticated,
        "mongodb client ready"
    );

    Ok(MongoCatalog::new(client))
}

/// Mask the password of a connection string for logging.
pub fn redact_uri(uri: &str) -> String {
    match Url::parse(uri) {
        Ok(mut url) => {
            if url.password().is_some() && url.set_password(Some("***")).is_err() {
                return format!("{}://***", url.scheme());
            }
            url.to_string()
        }
        // Multi-host seed lists are not valid URLs; keep only the scheme.
        Err(_) => match uri.split_once("://") {
            Some((scheme, _)) => format!("{scheme}://***"),
            None => "***".to_string(),
        },
    }
}
