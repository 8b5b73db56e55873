//! 將視覺模型的回覆整理成固定的營養分析結構。
//!
//! 這一步只做結構映射，缺少的選填數值補預設值；欄位規則交給 `validator` 檢查。

use crate::domain::model::FoodItem;
use crate::utils::error::{NutriError, Result};
use serde_json::{Map, Value};

/// 未提供信心分數時的預設值
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// 正規化後的欄位狀態
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    /// 模型明確回傳 null
    Missing,
    Present(T),
    /// 型別不符，保留原始值供錯誤訊息使用
    Mistyped(Value),
}

impl<T> Slot<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Slot::Missing)
    }
}

/// 尚未驗證的分析結果
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisCandidate {
    pub calories_kcal: Slot<f64>,
    pub protein_g: Slot<f64>,
    pub carbs_g: Slot<f64>,
    pub fat_g: Slot<f64>,
    pub fiber_g: f64,
    pub sugar_g: f64,
    pub sodium_mg: f64,
    pub confidence_score: Slot<f64>,
    pub items: Slot<Vec<FoodItem>>,
    pub recommendations: Vec<String>,
    pub explanation: Vec<String>,
}

/// 取出 message.content 的文字；多段 parts 依序串接
pub fn reply_text(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect(),
        _ => String::new(),
    }
}

const FENCE: &str = "```";

/// 去掉頭尾的 ``` 圍欄（可帶語言標記，例如 ```json）
///
/// 只處理頭尾的圍欄，JSON 字串內的 ``` 不受影響。
/// 回覆不是以 `{` 開頭時，允許圍欄前有說明文字。
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();

    if !body.starts_with('{') && !body.starts_with(FENCE) {
        if let Some(start) = body.find(FENCE) {
            body = &body[start..];
        }
    }

    match body.strip_prefix(FENCE) {
        Some(rest) => {
            let tag_len = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
                .unwrap_or(rest.len());
            body = &rest[tag_len..];
            // 開頭有圍欄時，結尾圍欄之後的文字一併捨棄
            if let Some(end) = body.rfind(FENCE) {
                body = &body[..end];
            }
        }
        None => {
            if let Some(rest) = body.strip_suffix(FENCE) {
                body = rest;
            }
        }
    }

    body.trim()
}

pub fn normalize_reply(text: &str) -> Result<AnalysisCandidate> {
    let body = strip_code_fence(text);
    let value: Value = serde_json::from_str(body).map_err(|e| NutriError::MalformedResponse {
        message: format!("reply is not valid JSON: {}", e),
    })?;
    normalize(value)
}

pub fn normalize(value: Value) -> Result<AnalysisCandidate> {
    let Value::Object(root) = value else {
        return Err(NutriError::MalformedResponse {
            message: format!("expected a JSON object, got {}", json_type(&value)),
        });
    };

    let macros = root.get("macros").and_then(Value::as_object);

    let candidate = AnalysisCandidate {
        calories_kcal: numeric_slot(root.get("calories_kcal"), 0.0),
        protein_g: numeric_slot(macro_field(&root, macros, "protein_g"), 0.0),
        carbs_g: numeric_slot(macro_field(&root, macros, "carbs_g"), 0.0),
        fat_g: numeric_slot(macro_field(&root, macros, "fat_g"), 0.0),
        fiber_g: optional_number(macro_field(&root, macros, "fiber_g"), "fiber_g"),
        sugar_g: optional_number(macro_field(&root, macros, "sugar_g"), "sugar_g"),
        sodium_mg: optional_number(macro_field(&root, macros, "sodium_mg"), "sodium_mg"),
        confidence_score: numeric_slot(root.get("confidence_score"), DEFAULT_CONFIDENCE),
        items: items_slot(first_present(&root, &["food_items", "items"])),
        recommendations: string_list(root.get("recommendations")),
        explanation: string_list(first_present(&root, &["explainability", "explanation"])),
    };

    tracing::debug!(
        "Normalized reply: calories={:?}, confidence={:?}, {} recommendations",
        candidate.calories_kcal,
        candidate.confidence_score,
        candidate.recommendations.len()
    );

    Ok(candidate)
}

/// 先找 macros.{name}，再找頂層的 {name}（已正規化的資料）
fn macro_field<'a>(root: &'a Map<String, Value>, macros: Option<&'a Map<String, Value>>, name: &str) -> Option<&'a Value> {
    macros
        .and_then(|m| m.get(name))
        .or_else(|| root.get(name))
}

fn first_present<'a>(root: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| root.get(*key))
}

fn numeric_slot(value: Option<&Value>, default: f64) -> Slot<f64> {
    match value {
        None => Slot::Present(default),
        Some(Value::Null) => Slot::Missing,
        Some(v) => match v.as_f64() {
            Some(n) => Slot::Present(n),
            None => Slot::Mistyped(v.clone()),
        },
    }
}

fn optional_number(value: Option<&Value>, name: &str) -> f64 {
    match value {
        None | Some(Value::Null) => 0.0,
        Some(v) => v.as_f64().unwrap_or_else(|| {
            tracing::warn!("⚠️ Ignoring non-numeric {} in vision reply: {}", name, v);
            0.0
        }),
    }
}

fn items_slot(value: Option<&Value>) -> Slot<Vec<FoodItem>> {
    match value {
        None => Slot::Present(Vec::new()),
        Some(Value::Null) => Slot::Missing,
        Some(Value::Array(raw_items)) => {
            let items = raw_items
                .iter()
                .filter_map(|raw| match serde_json::from_value::<FoodItem>(raw.clone()) {
                    Ok(item) => Some(item),
                    Err(e) => {
                        tracing::warn!("⚠️ Skipping unreadable food item {}: {}", raw, e);
                        None
                    }
                })
                .collect();
            Slot::Present(items)
        }
        Some(other) => Slot::Mistyped(other.clone()),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(entries)) => entries
            .iter()
            .map(|entry| match entry {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
