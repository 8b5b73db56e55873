pub mod analyzer;
pub mod confidence;
pub mod insights;
pub mod normalizer;
pub mod profile;
pub mod prompt;
pub mod targets;
pub mod validator;

pub use crate::domain::model::{MealAnalysis, NutritionTargets};
pub use crate::domain::ports::{ConfigProvider, MealStore, VisionClient};
pub use crate::utils::error::Result;
