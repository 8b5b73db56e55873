use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};
use nutri_track::core::insights::{configured_trends, start_of_day, today_summary, trends};
use nutri_track::core::profile::ProfileUpdate;
use nutri_track::domain::model::{FoodItem, Gender, Goal, MealAnalysis, Nutrients};
use nutri_track::domain::ports::MealStore;
use nutri_track::{InMemoryMealStore, MealEntry, ServiceConfig, UserProfile};
use std::io::Write;
use tempfile::NamedTempFile;

fn analysis(calories: f64, protein: f64) -> MealAnalysis {
    MealAnalysis::new(
        Nutrients {
            calories_kcal: calories,
            protein_g: protein,
            carbs_g: 50.0,
            fat_g: 12.0,
            ..Nutrients::default()
        },
        0.9,
        vec![FoodItem {
            name: "chapati".to_string(),
            probability: 0.9,
            portion_estimate_g: 80.0,
        }],
        vec![],
        vec![],
    )
}

#[tokio::test]
async fn test_profile_history_and_insights_flow() -> Result<()> {
    let mut profile = UserProfile::new(Some("Meera".to_string()));
    profile.apply_update(ProfileUpdate {
        gender: Some(Gender::Male),
        age: Some(30),
        height_cm: Some(175.0),
        weight_kg: Some(70.0),
        goal: Some(Goal::FatLoss),
        ..ProfileUpdate::default()
    });
    let targets = profile.targets();
    assert_eq!(targets.daily_calorie_target, 2055);
    assert_eq!(targets.daily_protein_target, 126);

    let now = Utc.with_ymd_and_hms(2024, 6, 3, 20, 0, 0).unwrap();
    let store = InMemoryMealStore::new(30);
    store.save(MealEntry::new("meera", "breakfast", analysis(450.0, 20.0)).at(now - Duration::hours(12))).await?;
    store.save(MealEntry::new("meera", "dinner", analysis(900.0, 60.0)).at(now - Duration::hours(1)).confirmed()).await?;
    store.save(MealEntry::new("meera", "lunch", analysis(2500.0, 130.0)).at(now - Duration::days(2))).await?;

    let today = store.since("meera", start_of_day(now)).await?;
    let summary = today_summary(&today, targets, now);
    assert_eq!(summary.meal_count, 2);
    assert_eq!(summary.total_calories, 1350.0);
    assert_eq!(summary.calorie_target, 2055);

    let history = store.recent("meera", 30).await?;
    assert_eq!(history[0].tag, "dinner");
    assert!(history[0].user_confirmed);
    assert!(!history[1].user_confirmed);

    let report = trends(&history, targets, 7, now);
    assert_eq!(report.trends.len(), 2);
    assert_eq!(report.summary.surplus_days, 1);
    assert_eq!(report.summary.deficit_days, 1);
    assert_eq!(report.summary.protein_met_days, 1);
    assert_eq!(report.summary.avg_calories, 1925.0);

    Ok(())
}

#[tokio::test]
async fn test_history_is_capped_per_user() -> Result<()> {
    let store = InMemoryMealStore::default();
    let start = Utc::now() - Duration::days(10);
    for i in 0..35 {
        store
            .save(MealEntry::new("asha", "snack", analysis(100.0, 5.0)).at(start + Duration::hours(i)))
            .await?;
    }

    let history = store.recent("asha", 100).await?;
    assert_eq!(history.len(), 30);
    assert_eq!(history[0].timestamp, start + Duration::hours(34));
    Ok(())
}

#[tokio::test]
async fn test_history_section_drives_store_and_trends() -> Result<()> {
    let config = ServiceConfig::from_toml_str(
        "[vision]\napi_key = \"sk-test\"\n[history]\nmax_meals = 5\ntrend_days = 3\n",
    )?;
    let store = InMemoryMealStore::from_config(&config.history);

    let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
    for day in 0..8 {
        store
            .save(MealEntry::new("ravi", "lunch", analysis(1800.0, 90.0)).at(now - Duration::days(day)))
            .await?;
    }

    let history = store.recent("ravi", 100).await?;
    assert_eq!(history.len(), 5);

    let report = configured_trends(&history, UserProfile::default().targets(), &config.history, now);
    assert_eq!(report.summary.total_days, 4);
    Ok(())
}

#[test]
fn test_profile_file_drives_prompt_context() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        r#"
name = "Kiran"
gender = "male"
age = 30
height_cm = 175.0
weight_kg = 70.0
activity_level = "moderate"
goal = "health"
allergies = "not-a-list"
medical = ["diabetes"]
"#
    )?;

    let content = std::fs::read_to_string(file.path())?;
    let profile: UserProfile = toml::from_str(&content)?;
    let profile = profile.refreshed();
    let context = profile.context();

    assert!(profile.onboarding_completed());
    assert_eq!(context.daily_calorie_target, Some(2555));
    assert_eq!(context.daily_protein_target, Some(112));
    assert!(context.allergies.is_empty());
    assert_eq!(context.medical, vec!["diabetes"]);
    Ok(())
}
