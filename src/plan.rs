use comic_back_db::{PrincipalSpec, Role, RoleGrant};
use comic_back_kernel::{Bootstrap, CreateCollection, CreatePrincipal, SelectDatabase};
use serde::Serialize;

pub const DATABASE: &str = "comic-back";
pub const APP_USER: &str = "mongousr";
pub const ADMIN_USER: &str = "admin";
pub const SHARED_PASSWORD: &str = "mongopwd";
pub const COMICS_COLLECTION: &str = "comics";

/// Everything the bootstrap writes, in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub database: String,
    pub principals: Vec<PrincipalSpec>,
    pub collections: Vec<String>,
}

impl Plan {
    /// The fixed comic-back layout: the service account, the admin account
    /// and the `comics` collection.
    pub fn comic_back() -> Self {
        Self {
            database: DATABASE.to_string(),
            principals: vec![
                PrincipalSpec::new(
                    APP_USER,
                    SHARED_PASSWORD,
                    vec![RoleGrant::new(Role::ReadWrite, DATABASE)],
                ),
                PrincipalSpec::new(
                    ADMIN_USER,
                    SHARED_PASSWORD,
                    vec![
                        RoleGrant::new(Role::DbAdmin, DATABASE),
                        RoleGrant::new(Role::ReadWrite, DATABASE),
                    ],
                ),
            ],
            collections: vec![COMICS_COLLECTION.to_string()],
        }
    }

    /// Select the database, create principals, then collections.
    pub fn bootstrap(&self) -> Bootstrap {
        let mut bootstrap = Bootstrap::new().step(SelectDatabase {
            name: self.database.clone(),
        });

        for principal in &self.principals {
            bootstrap = bootstrap.step(CreatePrincipal {
                principal: principal.clone(),
            });
        }

        for name in &self.collections {
            bootstrap = bootstrap.step(CreateCollection { name: name.clone() });
        }

        bootstrap
    }
}
