pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use crate::adapters::{AnonymousSession, FixedClock, RestGateway, StaticTokenSession, SystemClock};
pub use crate::config::{AppConfig, EvaluationInput};
pub use crate::core::{
    store::{EvaluationStore, StoreOptions},
    workflow::{Action, EvaluationWorkflow, Step},
};
pub use crate::utils::error::{Result, VessError};
