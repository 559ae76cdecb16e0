use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Name of the index every collection receives on creation.
pub const DEFAULT_INDEX: &str = "_id_";

/// Database roles as the engine names them.
///
/// Only the two built-ins the bootstrap grants get a variant; anything else
/// the engine reports is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Read and modify data in every non-system collection.
    ReadWrite,
    /// Schema administration: indexes, validation, statistics. No data access.
    DbAdmin,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::ReadWrite => "readWrite",
            Role::DbAdmin => "dbAdmin",
            Role::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        match name.as_str() {
            "readWrite" => Role::ReadWrite,
            "dbAdmin" => Role::DbAdmin,
            _ => Role::Other(name),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role scoped to one database.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: Role,
    pub db: String,
}

impl RoleGrant {
    pub fn new(role: Role, db: impl Into<String>) -> Self {
        Self {
            role,
            db: db.into(),
        }
    }
}

impl fmt::Display for RoleGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.role, self.db)
    }
}

/// Compare two grant lists as sets.
pub fn same_grants(left: &[RoleGrant], right: &[RoleGrant]) -> bool {
    let left: BTreeSet<&RoleGrant> = left.iter().collect();
    let right: BTreeSet<&RoleGrant> = right.iter().collect();
    left == right
}

/// A principal as handed to the engine's user creation call.
///
/// The password stays plaintext here; hashing at rest is the engine's job.
/// It is masked in `Debug` output and when serialized.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalSpec {
    pub username: String,
    #[serde(serialize_with = "mask_secret")]
    pub password: String,
    pub roles: Vec<RoleGrant>,
}

impl PrincipalSpec {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        roles: Vec<RoleGrant>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            roles,
        }
    }
}

impl fmt::Debug for PrincipalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrincipalSpec")
            .field("username", &self.username)
            .field("password", &"***")
            .field("roles", &self.roles)
            .finish()
    }
}

fn mask_secret<S: Serializer>(_: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str("***")
}

/// A principal as reported back by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalRecord {
    #[serde(rename = "user")]
    pub username: String,
    pub db: String,
    #[serde(default)]
    pub roles: Vec<RoleGrant>,
}

/// A collection as reported back by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionRecord {
    pub name: String,
    pub document_count: u64,
    pub index_names: Vec<String>,
}

impl CollectionRecord {
    pub fn is_empty(&self) -> bool {
        self.document_count == 0
    }

    /// True when no index exists besides the one the engine creates itself.
    pub fn has_only_default_indexes(&self) -> bool {
        self.index_names.iter().all(|name| name == DEFAULT_INDEX)
    }
}
