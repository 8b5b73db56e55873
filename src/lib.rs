pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{http::ChatCompletionsClient, storage::InMemoryMealStore};
pub use config::toml_config::ServiceConfig;
pub use core::{analyzer::MealAnalyzer, profile::UserProfile, targets::compute_targets};
pub use domain::model::{AnalysisOutcome, MealAnalysisRequest, MealEntry};
pub use utils::error::{ErrorCode, NutriError, Result};
