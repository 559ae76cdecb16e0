use async_trait::async_trait;
use comic_back_db::{Catalog, CatalogError, PrincipalSpec};
use serde_json::json;
use thiserror::Error;

/// Failure of a single bootstrap step.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("no database selected")]
    NoDatabaseSelected,

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Context threaded through the steps of one bootstrap run.
pub struct StepCtx<'a> {
    pub catalog: &'a dyn Catalog,
    database: Option<String>,
}

impl<'a> StepCtx<'a> {
    pub fn new(catalog: &'a dyn Catalog) -> Self {
        Self {
            catalog,
            database: None,
        }
    }

    /// The database bound by the last `SelectDatabase` step.
    pub fn database(&self) -> Result<&str, StepError> {
        self.database
            .as_deref()
            .ok_or(StepError::NoDatabaseSelected)
    }

    pub fn selected_database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    fn bind(&mut self, name: &str) {
        self.database = Some(name.to_string());
    }
}

/// One declarative operation of the bootstrap.
#[async_trait]
pub trait Step: Send + Sync {
    /// Human readable label used in logs and error reports.
    fn name(&self) -> String;

    /// Machine readable description for plan output. Never carries secrets.
    fn describe(&self) -> serde_json::Value;

    async fn apply(&self, ctx: &mut StepCtx<'_>) -> Result<(), StepError>;
}

/// Bind later steps to a database.
pub struct SelectDatabase {
    pub name: String,
}

#[async_trait]
impl Step for SelectDatabase {
    fn name(&self) -> String {
        format!("select database '{}'", self.name)
    }

    fn describe(&self) -> serde_json::Value {
        json!({ "op": "selectDatabase", "name": self.name })
    }

    async fn apply(&self, ctx: &mut StepCtx<'_>) -> Result<(), StepError> {
        ctx.catalog.select_database(&self.name).await?;
        ctx.bind(&self.name);
        Ok(())
    }
}

/// Create a principal in the selected database.
pub struct CreatePrincipal {
    pub principal: PrincipalSpec,
}

#[async_trait]
impl Step for CreatePrincipal {
    fn name(&self) -> String {
        format!("create user '{}'", self.principal.username)
    }

    fn describe(&self) -> serde_json::Value {
        json!({ "op": "createUser", "principal": self.principal })
    }

    async fn apply(&self, ctx: &mut StepCtx<'_>) -> Result<(), StepError> {
        let db = ctx.database()?;
        ctx.catalog.create_user(db, &self.principal).await?;
        Ok(())
    }
}

/// Create an empty collection in the selected database.
pub struct CreateCollection {
    pub name: String,
}

#[async_trait]
impl Step for CreateCollection {
    fn name(&self) -> String {
        format!("create collection '{}'", self.name)
    }

    fn describe(&self) -> serde_json::Value {
        json!({ "op": "createCollection", "name": self.name })
    }

    async fn apply(&self, ctx: &mut StepCtx<'_>) -> Result<(), StepError> {
        let db = ctx.database()?;
        ctx.catalog.create_collection(db, &self.name).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comic_back_db::MemoryCatalog;

    #[tokio::test]
    async fn collection_step_needs_a_selected_database() {
        let catalog = MemoryCatalog::new();
        let mut ctx = StepCtx::new(&catalog);

        let step = CreateCollection {
            name: "comics".to_string(),
        };
        let err = step.apply(&mut ctx).await.unwrap_err();
        assert!(matches!(err, StepError::NoDatabaseSelected));
        assert!(catalog.journal().await.is_empty());
    }

    #[tokio::test]
    async fn select_binds_the_context() {
        let catalog = MemoryCatalog::new();
        let mut ctx = StepCtx::new(&catalog);

        SelectDatabase {
            name: "comic-back".to_string(),
        }
        .apply(&mut ctx)
        .await
        .unwrap();
        assert_eq!(ctx.selected_database(), Some("comic-back"));
    }

    #[tokio::test]
    async fn invalid_database_is_not_bound() {
        let catalog = MemoryCatalog::new();
        let mut ctx = StepCtx::new(&catalog);

        let err = SelectDatabase {
            name: "comic.back".to_string(),
        }
        .apply(&mut ctx)
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            StepError::Catalog(CatalogError::InvalidName { .. })
        ));
        assert_eq!(ctx.selected_database(), None);
    }

    #[test]
    fn principal_description_masks_password() {
        let step = CreatePrincipal {
            principal: PrincipalSpec::new("mongousr", "mongopwd", vec![]),
        };
        let described = step.describe().to_string();
        assert!(described.contains("mongousr"));
        assert!(!described.contains("mongopwd"));
    }
}
