use comic_back_db::Catalog;
use serde::Serialize;
use thiserror::Error;

use crate::step::{Step, StepCtx, StepError};

/// A bootstrap run that stopped at its first failing step.
#[derive(Error, Debug)]
#[error("bootstrap aborted at step {index} ({step}): {source}")]
pub struct BootstrapError {
    pub index: usize,
    pub step: String,
    /// Steps that completed before the failure, in order.
    pub completed: Vec<String>,
    #[source]
    pub source: StepError,
}

/// Outcome of a completed bootstrap run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub engine: &'static str,
    pub database: Option<String>,
    pub completed: Vec<String>,
}

/// Ordered list of steps executed exactly once.
///
/// `run` takes the bootstrap by value: once started it cannot be run again.
#[derive(Default)]
pub struct Bootstrap {
    steps: Vec<Box<dyn Step>>,
}

impl Bootstrap {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn steps(&self) -> impl Iterator<Item = &dyn Step> {
        self.steps.iter().map(|step| step.as_ref())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Describe every step, in execution order.
    pub fn describe(&self) -> serde_json::Value {
        serde_json::Value::Array(self.steps().map(|step| step.describe()).collect())
    }

    /// Execute the steps in order, aborting on the first error.
    pub async fn run(self, catalog: &dyn Catalog) -> Result<RunReport, BootstrapError> {
        tracing::info!(
            engine = catalog.engine(),
            steps = self.steps.len(),
            "bootstrap starting"
        );

        let mut ctx = StepCtx::new(catalog);
        let mut completed = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.name();
            tracing::info!(index, step = %name, "applying step");

            if let Err(source) = step.apply(&mut ctx).await {
                tracing::error!(index, step = %name, error = %source, "step failed, aborting");
                return Err(BootstrapError {
                    index,
                    step: name,
                    completed,
                    source,
                });
            }

            completed.push(name);
        }

        tracing::info!(completed = completed.len(), "bootstrap complete");

        Ok(RunReport {
            engine: catalog.engine(),
            database: ctx.selected_database().map(str::to_string),
            completed,
        })
    }
}
