use crate::core::targets::compute_targets;
use crate::domain::model::{
    lenient_string_list, optional_gender, ActivityLevel, BiometricProfile, Gender, Goal, NutritionTargets, UserContext,
};
use serde::{Deserialize, Serialize};

/// 使用者檔案；目標值由生理資料推導，不可直接修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub biometrics: BiometricProfile,
    #[serde(default)]
    pub diet_pref: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub allergies: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub medical: Vec<String>,
    #[serde(skip_deserializing)]
    targets: NutritionTargets,
    #[serde(skip_deserializing)]
    onboarding_completed: bool,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::new(None)
    }
}

/// 檔案更新；None 表示不修改
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_gender")]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub goal: Option<Goal>,
    #[serde(default)]
    pub activity_level: Option<ActivityLevel>,
    #[serde(default)]
    pub diet_pref: Option<String>,
    #[serde(default)]
    pub allergies: Option<Vec<String>>,
    #[serde(default)]
    pub medical: Option<Vec<String>>,
}

impl ProfileUpdate {
    fn touches_biometrics(&self) -> bool {
        self.gender.is_some()
            || self.age.is_some()
            || self.height_cm.is_some()
            || self.weight_kg.is_some()
            || self.goal.is_some()
            || self.activity_level.is_some()
    }
}

impl UserProfile {
    /// 註冊時的預設值：health / moderate，目標 {2000, 50}
    pub fn new(name: Option<String>) -> Self {
        Self {
            name,
            biometrics: BiometricProfile {
                goal: Some(Goal::Health),
                activity_level: Some(ActivityLevel::Moderate),
                ..BiometricProfile::default()
            },
            diet_pref: None,
            allergies: Vec::new(),
            medical: Vec::new(),
            targets: NutritionTargets::default(),
            onboarding_completed: false,
        }
    }

    /// 從檔案載入後重新推導衍生欄位
    pub fn refreshed(mut self) -> Self {
        self.recompute();
        self
    }

    pub fn targets(&self) -> NutritionTargets {
        self.targets
    }

    pub fn onboarding_completed(&self) -> bool {
        self.onboarding_completed
    }

    pub fn apply_update(&mut self, update: ProfileUpdate) {
        let recompute = update.touches_biometrics();

        let bio = &mut self.biometrics;
        bio.gender = update.gender.or(bio.gender);
        bio.age = update.age.or(bio.age);
        bio.height_cm = update.height_cm.or(bio.height_cm);
        bio.weight_kg = update.weight_kg.or(bio.weight_kg);
        bio.goal = update.goal.or(bio.goal);
        bio.activity_level = update.activity_level.or(bio.activity_level);

        if update.name.is_some() {
            self.name = update.name;
        }
        if update.diet_pref.is_some() {
            self.diet_pref = update.diet_pref;
        }
        if let Some(allergies) = update.allergies {
            self.allergies = allergies;
        }
        if let Some(medical) = update.medical {
            self.medical = medical;
        }

        if recompute {
            self.recompute();
            tracing::info!(
                "🎯 Nutrition targets updated: {} kcal, {} g protein",
                self.targets.daily_calorie_target,
                self.targets.daily_protein_target
            );
        }
    }

    fn recompute(&mut self) {
        self.targets = compute_targets(&self.biometrics);
        self.onboarding_completed = self.onboarding_completed || self.has_complete_biometrics();
    }

    fn has_complete_biometrics(&self) -> bool {
        let bio = &self.biometrics;
        bio.gender.is_some()
            && bio.age.is_some_and(|a| a > 0)
            && bio.height_cm.is_some_and(|h| h > 0.0)
            && bio.weight_kg.is_some_and(|w| w > 0.0)
            && bio.goal.is_some()
            && bio.activity_level.is_some()
    }

    /// 分析 prompt 所需的背景資料
    pub fn context(&self) -> UserContext {
        UserContext {
            goal: self.biometrics.goal.map(|g| g.as_str().to_string()),
            activity_level: self.biometrics.activity_level.map(|a| a.as_str().to_string()),
            daily_calorie_target: Some(self.targets.daily_calorie_target),
            daily_protein_target: Some(self.targets.daily_protein_target),
            diet_pref: self.diet_pref.clone(),
            allergies: self.allergies.clone(),
            medical: self.medical.clone(),
        }
    }
}
