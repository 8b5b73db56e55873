//! 每日熱量與蛋白質目標
//!
//! BMR 使用 Mifflin-St Jeor 公式，TDEE = BMR x 活動係數，再依目標調整。

use crate::domain::model::{ActivityLevel, BiometricProfile, Gender, Goal, NutritionTargets};

const FAT_LOSS_DEFICIT_KCAL: f64 = 500.0;
const MUSCULAR_SURPLUS_KCAL: f64 = 300.0;

/// Mifflin-St Jeor: 10 x 體重 + 6.25 x 身高 - 5 x 年齡 + 性別常數
pub fn basal_metabolic_rate(weight_kg: f64, height_cm: f64, age: u32, gender: Gender) -> f64 {
    let gender_constant = match gender {
        Gender::Male => 5.0,
        Gender::Female => -161.0,
        Gender::Other => -161.0,
    };

    10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age) + gender_constant
}

pub fn activity_multiplier(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::Light => 1.375,
        ActivityLevel::Moderate => 1.55,
        ActivityLevel::Active => 1.725,
        ActivityLevel::VeryActive => 1.9,
    }
}

pub fn total_daily_energy_expenditure(bmr: f64, level: ActivityLevel) -> f64 {
    bmr * activity_multiplier(level)
}

fn calorie_target(tdee: f64, goal: Goal) -> f64 {
    match goal {
        Goal::FatLoss => tdee - FAT_LOSS_DEFICIT_KCAL,
        Goal::Muscular => tdee + MUSCULAR_SURPLUS_KCAL,
        Goal::Lean | Goal::Health => tdee,
    }
}

/// 每公斤體重的蛋白質克數
fn protein_factor(goal: Goal) -> f64 {
    match goal {
        Goal::Muscular => 2.0,
        Goal::FatLoss => 1.8,
        Goal::Lean | Goal::Health => 1.6,
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

/// 缺少體重、身高、年齡或性別任一項時回傳預設 {2000, 50}
pub fn compute_targets(profile: &BiometricProfile) -> NutritionTargets {
    let (Some(weight), Some(height), Some(age), Some(gender)) = (
        positive(profile.weight_kg),
        positive(profile.height_cm),
        profile.age.filter(|a| *a > 0),
        profile.gender,
    ) else {
        tracing::debug!("Incomplete biometric profile, using default nutrition targets");
        return NutritionTargets::default();
    };

    let activity = profile.activity_level.unwrap_or_default();
    let goal = profile.goal.unwrap_or_default();

    let bmr = basal_metabolic_rate(weight, height, age, gender);
    let tdee = total_daily_energy_expenditure(bmr, activity);

    let targets = NutritionTargets {
        daily_calorie_target: calorie_target(tdee, goal) as i32,
        daily_protein_target: (weight * protein_factor(goal)) as i32,
    };

    tracing::debug!(
        "Computed targets: BMR {:.2}, TDEE {:.2} ({}, {}) -> {} kcal, {} g protein",
        bmr,
        tdee,
        activity.as_str(),
        goal.as_str(),
        targets.daily_calorie_target,
        targets.daily_protein_target
    );

    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_profile() -> BiometricProfile {
        BiometricProfile {
            weight_kg: Some(70.0),
            height_cm: Some(175.0),
            age: Some(30),
            gender: Some(Gender::Male),
            activity_level: Some(ActivityLevel::Moderate),
            goal: Some(Goal::Health),
        }
    }

    #[test]
    fn test_reference_male_profile() {
        // 700 + 1093.75 - 150 + 5
        let bmr = basal_metabolic_rate(70.0, 175.0, 30, Gender::Male);
        assert!((bmr - 1648.75).abs() < 1e-9);

        let tdee = total_daily_energy_expenditure(bmr, ActivityLevel::Moderate);
        assert!((tdee - 2555.5625).abs() < 1e-6);

        let targets = compute_targets(&reference_profile());
        assert_eq!(targets.daily_calorie_target, 2555);
        assert_eq!(targets.daily_protein_target, 112);
    }

    #[test]
    fn test_missing_fields_return_defaults() {
        let base = reference_profile();
        let variants = [
            BiometricProfile { weight_kg: None, ..base.clone() },
            BiometricProfile { height_cm: None, ..base.clone() },
            BiometricProfile { age: None, ..base.clone() },
            BiometricProfile { gender: None, ..base.clone() },
            BiometricProfile { weight_kg: Some(0.0), ..base.clone() },
            BiometricProfile::default(),
        ];

        for profile in variants {
            assert_eq!(compute_targets(&profile), NutritionTargets::default());
        }
    }

    #[test]
    fn test_blank_gender_returns_defaults() {
        for gender in ["\"\"", "\"   \""] {
            let profile: BiometricProfile = serde_json::from_str(&format!(
                r#"{{"gender": {}, "age": 30, "height_cm": 175.0, "weight_kg": 70.0}}"#,
                gender
            ))
            .unwrap();
            assert_eq!(profile.gender, None);
            assert_eq!(compute_targets(&profile), NutritionTargets::default());
        }
    }

    #[test]
    fn test_female_and_other_share_formula() {
        let female = BiometricProfile {
            gender: Some(Gender::Female),
            ..reference_profile()
        };
        let other = BiometricProfile {
            gender: Some(Gender::Other),
            ..reference_profile()
        };

        // 1482.75 x 1.55 = 2298.2625
        assert_eq!(compute_targets(&female).daily_calorie_target, 2298);
        assert_eq!(compute_targets(&female), compute_targets(&other));
    }

    #[test]
    fn test_goal_adjustments() {
        let fat_loss = compute_targets(&BiometricProfile {
            goal: Some(Goal::FatLoss),
            ..reference_profile()
        });
        assert_eq!(fat_loss.daily_calorie_target, 2055);
        assert_eq!(fat_loss.daily_protein_target, 126);

        let muscular = compute_targets(&BiometricProfile {
            goal: Some(Goal::Muscular),
            ..reference_profile()
        });
        assert_eq!(muscular.daily_calorie_target, 2855);
        assert_eq!(muscular.daily_protein_target, 140);

        let lean = compute_targets(&BiometricProfile {
            goal: Some(Goal::Lean),
            ..reference_profile()
        });
        assert_eq!(lean.daily_calorie_target, 2555);
        assert_eq!(lean.daily_protein_target, 112);
    }

    #[test]
    fn test_activity_defaults_to_moderate() {
        let no_activity = BiometricProfile {
            activity_level: None,
            ..reference_profile()
        };
        assert_eq!(compute_targets(&no_activity), compute_targets(&reference_profile()));

        let unknown = BiometricProfile {
            activity_level: Some(ActivityLevel::parse("Couch_Potato")),
            ..reference_profile()
        };
        assert_eq!(compute_targets(&unknown).daily_calorie_target, 2555);

        let very_active = BiometricProfile {
            activity_level: Some(ActivityLevel::parse("VERY_ACTIVE")),
            ..reference_profile()
        };
        // 1648.75 x 1.9 = 3132.625
        assert_eq!(compute_targets(&very_active).daily_calorie_target, 3132);
    }
}
