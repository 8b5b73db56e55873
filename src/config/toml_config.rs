use crate::adapters::storage::DEFAULT_MAX_MEALS;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{NutriError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_required_field, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_VISION_ENDPOINT: &str = "https://api.deepseek.com/chat/completions";
pub const DEFAULT_VISION_MODEL: &str = "deepseek-chat";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
pub const DEFAULT_TEMPERATURE: f32 = 0.4;
pub const DEFAULT_MAX_TOKENS: u32 = 800;
pub const DEFAULT_TREND_DAYS: u32 = 7;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            model: default_model(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_max_meals")]
    pub max_meals: usize,
    #[serde(default = "default_trend_days")]
    pub trend_days: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_meals: DEFAULT_MAX_MEALS,
            trend_days: DEFAULT_TREND_DAYS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    /// "compact" 或 "json"
    pub format: Option<String>,
}

fn default_endpoint() -> String {
    DEFAULT_VISION_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_VISION_MODEL.to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_max_meals() -> usize {
    DEFAULT_MAX_MEALS
}

fn default_trend_days() -> u32 {
    DEFAULT_TREND_DAYS
}

fn env_number<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| NutriError::InvalidConfigValueError {
            field: name.to_string(),
            value: raw.clone(),
            reason: "Value must be a number".to_string(),
        }),
        Err(_) => Ok(default),
    }
}

impl ServiceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let mut config: Self = toml::from_str(&processed_content).map_err(|e| NutriError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })?;

        // 未替換的 ${VAR} 視為未設定
        if config
            .vision
            .api_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty() || key.starts_with("${"))
        {
            config.vision.api_key = None;
        }

        Ok(config)
    }

    /// 只用環境變數建立配置
    pub fn from_env() -> Result<Self> {
        let vision = VisionConfig {
            endpoint: std::env::var("VISION_API_URL").unwrap_or_else(|_| default_endpoint()),
            api_key: std::env::var("DEEPSEEK_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            model: std::env::var("VISION_MODEL").unwrap_or_else(|_| default_model()),
            timeout_seconds: env_number("VISION_TIMEOUT_SECONDS", DEFAULT_TIMEOUT_SECONDS)?,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        };

        if vision.api_key.is_some() {
            tracing::info!("🔑 Vision API key loaded from environment");
        } else {
            tracing::warn!("⚠️ DEEPSEEK_API_KEY is not set");
        }

        Ok(Self {
            vision,
            history: HistoryConfig::default(),
            logging: None,
        })
    }

    /// 替換環境變數 (例如 ${DEEPSEEK_API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| NutriError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .is_some_and(|f| f.eq_ignore_ascii_case("json"))
    }
}

impl ConfigProvider for ServiceConfig {
    fn vision_endpoint(&self) -> &str {
        &self.vision.endpoint
    }

    fn api_key(&self) -> &str {
        self.vision.api_key.as_deref().unwrap_or_default()
    }

    fn model(&self) -> &str {
        &self.vision.model
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.vision.timeout_seconds)
    }

    fn temperature(&self) -> f32 {
        self.vision.temperature
    }

    fn max_tokens(&self) -> u32 {
        self.vision.max_tokens
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        validate_url("vision.endpoint", &self.vision.endpoint)?;

        let api_key = validate_required_field("vision.api_key", &self.vision.api_key)?;
        validate_non_empty_string("vision.api_key", api_key)?;
        validate_non_empty_string("vision.model", &self.vision.model)?;

        validate_range("vision.timeout_seconds", self.vision.timeout_seconds, 1, 600)?;
        validate_range("vision.temperature", self.vision.temperature, 0.0, 2.0)?;
        validate_range("vision.max_tokens", self.vision.max_tokens, 1, 32_768)?;
        validate_range("history.max_meals", self.history.max_meals, 1, 1_000)?;
        validate_range("history.trend_days", self.history.trend_days, 1, 365)?;

        tracing::debug!("✅ Service configuration validation passed");
        Ok(())
    }
}
