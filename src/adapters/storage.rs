use crate::config::toml_config::HistoryConfig;
use crate::domain::model::MealEntry;
use crate::domain::ports::MealStore;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// 每位使用者保留的餐點上限
pub const DEFAULT_MAX_MEALS: usize = 30;

/// 記憶體內的餐點紀錄，每位使用者只保留最新的 `max_meals` 筆
#[derive(Debug, Clone)]
pub struct InMemoryMealStore {
    meals: Arc<RwLock<HashMap<String, Vec<MealEntry>>>>,
    max_meals: usize,
}

impl InMemoryMealStore {
    pub fn new(max_meals: usize) -> Self {
        Self {
            meals: Arc::new(RwLock::new(HashMap::new())),
            max_meals: max_meals.max(1),
        }
    }

    /// 依 `[history]` 設定建立
    pub fn from_config(history: &HistoryConfig) -> Self {
        Self::new(history.max_meals)
    }

    pub fn max_meals(&self) -> usize {
        self.max_meals
    }
}

impl Default for InMemoryMealStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MEALS)
    }
}

impl MealStore for InMemoryMealStore {
    async fn save(&self, entry: MealEntry) -> Result<()> {
        let mut meals = self.meals.write().await;
        let history = meals.entry(entry.user_id.clone()).or_default();

        history.push(entry);
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        if history.len() > self.max_meals {
            let dropped = history.len() - self.max_meals;
            history.truncate(self.max_meals);
            tracing::debug!("Trimmed {} old meals beyond the {} meal limit", dropped, self.max_meals);
        }

        Ok(())
    }

    async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<MealEntry>> {
        let meals = self.meals.read().await;
        Ok(meals
            .get(user_id)
            .map(|history| history.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn since(&self, user_id: &str, start: DateTime<Utc>) -> Result<Vec<MealEntry>> {
        let meals = self.meals.read().await;
        Ok(meals
            .get(user_id)
            .map(|history| {
                history
                    .iter()
                    .filter(|entry| entry.timestamp >= start)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete(&self, user_id: &str, meal_id: &str) -> Result<bool> {
        let mut meals = self.meals.write().await;
        let Some(history) = meals.get_mut(user_id) else {
            return Ok(false);
        };

        let before = history.len();
        history.retain(|entry| entry.id != meal_id);
        Ok(history.len() < before)
    }
}
