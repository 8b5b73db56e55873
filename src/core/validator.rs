use crate::core::normalizer::{AnalysisCandidate, Slot};
use crate::domain::model::{MealAnalysis, Nutrients};
use crate::utils::error::ValidationError;

/// 依序檢查，遇到第一個違規就回傳
pub fn validate(candidate: AnalysisCandidate) -> std::result::Result<MealAnalysis, ValidationError> {
    check_presence(&candidate)?;

    let calories_kcal = match candidate.calories_kcal {
        Slot::Present(value) if value >= 0.0 => value,
        _ => return Err(ValidationError::InvalidCalories),
    };

    let confidence_score = match candidate.confidence_score {
        Slot::Present(value) if (0.0..=1.0).contains(&value) => value,
        _ => return Err(ValidationError::InvalidConfidence),
    };

    let items = match candidate.items {
        Slot::Present(items) if !items.is_empty() => items,
        _ => return Err(ValidationError::NoItemsDetected),
    };

    let nutrients = Nutrients {
        calories_kcal,
        protein_g: numeric(candidate.protein_g, "protein_g")?,
        carbs_g: numeric(candidate.carbs_g, "carbs_g")?,
        fat_g: numeric(candidate.fat_g, "fat_g")?,
        fiber_g: candidate.fiber_g,
        sugar_g: candidate.sugar_g,
        sodium_mg: candidate.sodium_mg,
    };

    Ok(MealAnalysis::new(
        nutrients,
        confidence_score,
        items,
        candidate.recommendations,
        candidate.explanation,
    ))
}

fn check_presence(candidate: &AnalysisCandidate) -> std::result::Result<(), ValidationError> {
    let required = [
        ("calories_kcal", candidate.calories_kcal.is_missing()),
        ("protein_g", candidate.protein_g.is_missing()),
        ("carbs_g", candidate.carbs_g.is_missing()),
        ("fat_g", candidate.fat_g.is_missing()),
        ("confidence_score", candidate.confidence_score.is_missing()),
        ("items", candidate.items.is_missing()),
    ];

    match required.iter().find(|(_, missing)| *missing) {
        Some((name, _)) => Err(ValidationError::MissingField(*name)),
        None => Ok(()),
    }
}

/// 巨量營養素不檢查範圍，只要求是數字
fn numeric(slot: Slot<f64>, name: &'static str) -> std::result::Result<f64, ValidationError> {
    match slot {
        Slot::Present(value) => Ok(value),
        Slot::Missing => Err(ValidationError::MissingField(name)),
        Slot::Mistyped(_) => Err(ValidationError::InvalidNumber(name)),
    }
}
