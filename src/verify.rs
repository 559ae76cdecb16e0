//! Read-only check that a catalog holds what the bootstrap writes.

use comic_back_db::model::same_grants;
use comic_back_db::{Catalog, CatalogError};
use serde::Serialize;

use crate::plan::Plan;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok,
    Missing,
    Mismatch { detail: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub subject: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyReport {
    pub checks: Vec<Check>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.checks.iter().all(|check| check.outcome == Outcome::Ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks
            .iter()
            .filter(|check| check.outcome != Outcome::Ok)
    }

    fn push(&mut self, subject: String, outcome: Outcome) {
        self.checks.push(Check { subject, outcome });
    }
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Compare the catalog against `plan`. Engine errors abort the check;
/// missing or divergent entities are reported, not raised.
pub async fn verify(catalog: &dyn Catalog, plan: &Plan) -> Result<VerifyReport, CatalogError> {
    let mut report = VerifyReport::default();
    let db = plan.database.as_str();

    let outcome = if catalog.database_exists(db).await? {
        Outcome::Ok
    } else {
        Outcome::Missing
    };
    report.push(format!("database '{db}'"), outcome);

    for principal in &plan.principals {
        let outcome = match catalog.find_principal(db, &principal.username).await? {
            None => Outcome::Missing,
            Some(record) if same_grants(&record.roles, &principal.roles) => Outcome::Ok,
            Some(record) => Outcome::Mismatch {
                detail: format!(
                    "expected grants [{}], found [{}]",
                    join(&principal.roles),
                    join(&record.roles)
                ),
            },
        };
        report.push(format!("principal '{}'", principal.username), outcome);
    }

    for name in &plan.collections {
        let outcome = match catalog.find_collection(db, name).await? {
            None => Outcome::Missing,
            Some(record) if !record.is_empty() => Outcome::Mismatch {
                detail: format!("holds {} documents", record.document_count),
            },
            Some(record) if !record.has_only_default_indexes() => Outcome::Mismatch {
                detail: format!("unexpected indexes [{}]", join(&record.index_names)),
            },
            Some(_) => Outcome::Ok,
        };
        report.push(format!("collection '{name}'"), outcome);
    }

    for failure in report.failures() {
        tracing::warn!(subject = %failure.subject, outcome = ?failure.outcome, "verification failed");
    }

    Ok(report)
}
