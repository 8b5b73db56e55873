use crate::domain::model::MealEntry;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// 視覺服務回覆中的 message.content（字串或多段 parts）
#[derive(Debug, Clone, PartialEq)]
pub struct VisionReply {
    pub content: serde_json::Value,
}

impl VisionReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: serde_json::Value::String(content.into()),
        }
    }
}

pub trait ConfigProvider: Send + Sync {
    fn vision_endpoint(&self) -> &str;
    fn api_key(&self) -> &str;
    fn model(&self) -> &str;
    fn timeout(&self) -> Duration;
    fn temperature(&self) -> f32;
    fn max_tokens(&self) -> u32;
}

#[async_trait]
pub trait VisionClient: Send + Sync {
    /// 送出一次 prompt + 圖片請求，不重試
    async fn complete(&self, prompt: &str, image_data_url: &str) -> Result<VisionReply>;
}

pub trait MealStore: Send + Sync {
    fn save(&self, entry: MealEntry) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 最新的在前
    fn recent(
        &self,
        user_id: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<MealEntry>>> + Send;
    fn since(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<MealEntry>>> + Send;
    fn delete(&self, user_id: &str, meal_id: &str) -> impl std::future::Future<Output = Result<bool>> + Send;
}
