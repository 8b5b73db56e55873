use crate::core::confidence::derive_flags;
use crate::utils::error::ErrorCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Gender {
    Male,
    Female,
    /// 未提供男/女時的值，BMR 使用女性公式
    Other,
}

impl Gender {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "male" => Gender::Male,
            "female" => Gender::Female,
            other => {
                if other != "other" {
                    tracing::warn!("⚠️ Unrecognized gender '{}', treating as other", label);
                }
                Gender::Other
            }
        }
    }
}

/// 空白字串視為未提供
pub(crate) fn optional_gender<'de, D>(deserializer: D) -> std::result::Result<Option<Gender>, D::Error>
where
    D: Deserializer<'de>,
{
    let label = Option::<String>::deserialize(deserializer)?;
    Ok(label
        .filter(|label| !label.trim().is_empty())
        .map(|label| Gender::parse(&label)))
}

impl From<String> for Gender {
    fn from(label: String) -> Self {
        Gender::parse(&label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    #[default]
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "sedentary" => ActivityLevel::Sedentary,
            "light" => ActivityLevel::Light,
            "moderate" => ActivityLevel::Moderate,
            "active" => ActivityLevel::Active,
            "very_active" => ActivityLevel::VeryActive,
            _ => {
                tracing::warn!("⚠️ Unrecognized activity level '{}', using moderate", label);
                ActivityLevel::Moderate
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
        }
    }
}

impl From<String> for ActivityLevel {
    fn from(label: String) -> Self {
        ActivityLevel::parse(&label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Goal {
    FatLoss,
    Muscular,
    Lean,
    #[default]
    Health,
}

impl Goal {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "fat_loss" => Goal::FatLoss,
            "muscular" => Goal::Muscular,
            "lean" => Goal::Lean,
            "health" => Goal::Health,
            _ => {
                tracing::warn!("⚠️ Unrecognized goal '{}', using health", label);
                Goal::Health
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::FatLoss => "fat_loss",
            Goal::Muscular => "muscular",
            Goal::Lean => "lean",
            Goal::Health => "health",
        }
    }
}

impl From<String> for Goal {
    fn from(label: String) -> Self {
        Goal::parse(&label)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiometricProfile {
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "optional_gender")]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub activity_level: Option<ActivityLevel>,
    #[serde(default)]
    pub goal: Option<Goal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionTargets {
    pub daily_calorie_target: i32,
    pub daily_protein_target: i32,
}

impl Default for NutritionTargets {
    fn default() -> Self {
        Self {
            daily_calorie_target: 2000,
            daily_protein_target: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    #[serde(default)]
    pub probability: f64,
    #[serde(default)]
    pub portion_estimate_g: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConfidenceFlags {
    pub needs_confirmation: bool,
    pub needs_portion_confirmation: bool,
    pub very_low_confidence: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Nutrients {
    pub calories_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    pub sugar_g: f64,
    pub sodium_mg: f64,
}

/// 驗證通過的餐點分析結果；建立後不可修改，確認旗標只由信心分數推導
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealAnalysis {
    #[serde(flatten)]
    nutrients: Nutrients,
    confidence_score: f64,
    items: Vec<FoodItem>,
    recommendations: Vec<String>,
    explanation: Vec<String>,
    #[serde(flatten)]
    flags: ConfidenceFlags,
}

impl MealAnalysis {
    pub fn new(
        nutrients: Nutrients,
        confidence_score: f64,
        items: Vec<FoodItem>,
        recommendations: Vec<String>,
        explanation: Vec<String>,
    ) -> Self {
        Self {
            nutrients,
            confidence_score,
            items,
            recommendations,
            explanation,
            flags: derive_flags(confidence_score),
        }
    }

    pub fn nutrients(&self) -> &Nutrients {
        &self.nutrients
    }

    pub fn confidence_score(&self) -> f64 {
        self.confidence_score
    }

    pub fn items(&self) -> &[FoodItem] {
        &self.items
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    pub fn explanation(&self) -> &[String] {
        &self.explanation
    }

    pub fn flags(&self) -> ConfidenceFlags {
        self.flags
    }

    pub fn needs_confirmation(&self) -> bool {
        self.flags.needs_confirmation
    }

    pub fn needs_portion_confirmation(&self) -> bool {
        self.flags.needs_portion_confirmation
    }

    pub fn very_low_confidence(&self) -> bool {
        self.flags.very_low_confidence
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortionEstimate {
    pub amount: f64,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealAnalysisRequest {
    /// 純 base64 或 data URI
    pub image_base64: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub portion_amount: Option<f64>,
    #[serde(default)]
    pub portion_unit: Option<String>,
}

impl MealAnalysisRequest {
    pub fn new(image_base64: impl Into<String>) -> Self {
        Self {
            image_base64: image_base64.into(),
            tag: None,
            portion_amount: None,
            portion_unit: None,
        }
    }

    pub fn tag(&self) -> &str {
        self.tag.as_deref().unwrap_or("snack")
    }

    /// 只有正數份量才會帶入 prompt
    pub fn portion(&self) -> Option<PortionEstimate> {
        self.portion_amount
            .filter(|amount| *amount > 0.0)
            .map(|amount| PortionEstimate {
                amount,
                unit: self.portion_unit.clone(),
            })
    }
}

/// prompt 使用的使用者背景資料
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub activity_level: Option<String>,
    #[serde(default)]
    pub daily_calorie_target: Option<i32>,
    #[serde(default)]
    pub daily_protein_target: Option<i32>,
    #[serde(default)]
    pub diet_pref: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub allergies: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub medical: Vec<String>,
}

/// 非陣列的值一律視為空清單
pub(crate) fn lenient_string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// 回傳給 API 層的結果封包
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AnalysisOutcome {
    Success { data: MealAnalysis },
    Error { code: ErrorCode, message: String },
}

impl AnalysisOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutcome::Success { .. })
    }

    pub fn analysis(&self) -> Option<&MealAnalysis> {
        match self {
            AnalysisOutcome::Success { data } => Some(data),
            AnalysisOutcome::Error { .. } => None,
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            AnalysisOutcome::Success { .. } => None,
            AnalysisOutcome::Error { code, .. } => Some(*code),
        }
    }
}

/// 使用者確認後保存的餐點
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealEntry {
    pub id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub tag: String,
    pub user_confirmed: bool,
    #[serde(flatten)]
    pub analysis: MealAnalysis,
}

impl MealEntry {
    pub fn new(user_id: impl Into<String>, tag: impl Into<String>, analysis: MealAnalysis) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            timestamp: Utc::now(),
            tag: tag.into(),
            user_confirmed: false,
            analysis,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn confirmed(mut self) -> Self {
        self.user_confirmed = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
    pub meal_count: usize,
    pub calorie_target: i32,
    pub protein_target: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendDay {
    /// YYYY-MM-DD (UTC)
    pub date: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub meal_count: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TrendSummary {
    pub avg_calories: f64,
    pub avg_protein: f64,
    pub surplus_days: usize,
    pub deficit_days: usize,
    pub protein_met_days: usize,
    pub total_days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub trends: Vec<TrendDay>,
    pub summary: TrendSummary,
}
