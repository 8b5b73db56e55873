use crate::utils::error::Result;
use crate::utils::validation::{validate_file_extension, validate_path, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "nutri-track")]
#[command(about = "Estimate the nutrition of a meal photo with a vision model")]
pub struct CliConfig {
    #[arg(long, help = "Meal photo (jpg, jpeg, png, webp)")]
    pub image: String,

    #[arg(long, help = "User profile TOML; defaults are used when omitted")]
    pub profile: Option<String>,

    #[arg(long, help = "Service config TOML; environment variables are used when omitted")]
    pub config: Option<String>,

    #[arg(long, help = "Meal tag such as breakfast or lunch")]
    pub tag: Option<String>,

    #[arg(long, help = "User-estimated portion amount")]
    pub portion_amount: Option<f64>,

    #[arg(long, help = "Unit of the portion amount, e.g. g or ml")]
    pub portion_unit: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("image", &self.image)?;
        validate_file_extension("image", &self.image, IMAGE_EXTENSIONS)?;

        if let Some(profile) = &self.profile {
            validate_path("profile", profile)?;
            validate_file_extension("profile", profile, &["toml"])?;
        }
        if let Some(config) = &self.config {
            validate_path("config", config)?;
            validate_file_extension("config", config, &["toml"])?;
        }

        Ok(())
    }
}
