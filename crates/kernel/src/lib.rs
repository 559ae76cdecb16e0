//! Settings, the `Step` trait and the one-shot bootstrap runner.

pub mod bootstrap;
pub mod settings;
pub mod step;

pub use bootstrap::{Bootstrap, BootstrapError, RunReport};
pub use settings::Settings;
pub use step::{CreateCollection, CreatePrincipal, SelectDatabase, Step, StepCtx, StepError};
