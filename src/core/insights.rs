use crate::config::toml_config::HistoryConfig;
use crate::domain::model::{DailySummary, MealEntry, NutritionTargets, TrendDay, TrendReport, TrendSummary};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use std::collections::BTreeMap;

/// 當日（UTC）零點
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

pub fn today_summary(entries: &[MealEntry], targets: NutritionTargets, now: DateTime<Utc>) -> DailySummary {
    let day_start = start_of_day(now);
    let today: Vec<&MealEntry> = entries.iter().filter(|e| e.timestamp >= day_start).collect();

    let total = |f: fn(&MealEntry) -> f64| today.iter().map(|e| f(e)).sum::<f64>();

    DailySummary {
        total_calories: total(|e| e.analysis.nutrients().calories_kcal),
        total_protein: total(|e| e.analysis.nutrients().protein_g),
        total_carbs: total(|e| e.analysis.nutrients().carbs_g),
        total_fat: total(|e| e.analysis.nutrients().fat_g),
        meal_count: today.len(),
        calorie_target: targets.daily_calorie_target,
        protein_target: targets.daily_protein_target,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// 最近 `days` 天的每日加總與摘要，日期由舊到新
pub fn trends(entries: &[MealEntry], targets: NutritionTargets, days: u32, now: DateTime<Utc>) -> TrendReport {
    let window_start = now - Duration::days(i64::from(days));
    let mut daily: BTreeMap<String, TrendDay> = BTreeMap::new();

    for entry in entries.iter().filter(|e| e.timestamp >= window_start) {
        let date = entry.timestamp.format("%Y-%m-%d").to_string();
        let day = daily.entry(date.clone()).or_insert_with(|| TrendDay {
            date,
            calories: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
            meal_count: 0,
        });

        let nutrients = entry.analysis.nutrients();
        day.calories += nutrients.calories_kcal;
        day.protein += nutrients.protein_g;
        day.carbs += nutrients.carbs_g;
        day.fat += nutrients.fat_g;
        day.meal_count += 1;
    }

    let trends: Vec<TrendDay> = daily.into_values().collect();
    let summary = summarize(&trends, targets);

    tracing::debug!(
        "Trends over {} days: {} active days, avg {} kcal",
        days,
        summary.total_days,
        summary.avg_calories
    );

    TrendReport { trends, summary }
}

/// 使用 `[history] trend_days` 作為統計天數
pub fn configured_trends(
    entries: &[MealEntry],
    targets: NutritionTargets,
    history: &HistoryConfig,
    now: DateTime<Utc>,
) -> TrendReport {
    trends(entries, targets, history.trend_days, now)
}

fn summarize(trends: &[TrendDay], targets: NutritionTargets) -> TrendSummary {
    if trends.is_empty() {
        return TrendSummary::default();
    }

    let count = trends.len() as f64;
    let calorie_target = f64::from(targets.daily_calorie_target);
    let protein_target = f64::from(targets.daily_protein_target);

    let surplus_days = trends.iter().filter(|d| d.calories > calorie_target).count();

    TrendSummary {
        avg_calories: round1(trends.iter().map(|d| d.calories).sum::<f64>() / count),
        avg_protein: round1(trends.iter().map(|d| d.protein).sum::<f64>() / count),
        surplus_days,
        deficit_days: trends.len() - surplus_days,
        protein_met_days: trends.iter().filter(|d| d.protein >= protein_target).count(),
        total_days: trends.len(),
    }
}
