use crate::domain::model::{NutritionTargets, PortionEstimate, UserContext};

const RESPONSE_SCHEMA: &str = r#"{
  "calories_kcal": <number>,
  "macros": {
    "protein_g": <number>,
    "carbs_g": <number>,
    "fat_g": <number>,
    "fiber_g": <number or null>,
    "sugar_g": <number or null>,
    "sodium_mg": <number or null>
  },
  "confidence_score": <number 0-1>,
  "food_items": [
    {
      "name": "<food name>",
      "probability": <number 0-1>,
      "portion_estimate_g": <number>
    }
  ],
  "recommendations": ["<personalized recommendation 1>", "<recommendation 2>"],
  "explainability": ["<explanation point 1>", "<explanation point 2>"]
}"#;

/// 純 base64 一律視為 JPEG
pub fn image_data_url(image: &str) -> String {
    if image.starts_with("data:") {
        image.to_string()
    } else {
        format!("data:image/jpeg;base64,{}", image)
    }
}

/// fat_loss -> "Fat Loss"
fn humanize(label: &str) -> String {
    label
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn list_or_none(values: &[String]) -> String {
    let joined = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    if joined.is_empty() {
        "None".to_string()
    } else {
        joined
    }
}

fn profile_section(context: &UserContext, portion: Option<&PortionEstimate>) -> String {
    let defaults = NutritionTargets::default();

    let goal = humanize(context.goal.as_deref().unwrap_or("health"));
    let activity = humanize(context.activity_level.as_deref().unwrap_or("moderate"));
    let calories = context.daily_calorie_target.unwrap_or(defaults.daily_calorie_target);
    let protein = context.daily_protein_target.unwrap_or(defaults.daily_protein_target);
    let diet_pref = context
        .diet_pref
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or("None");

    let portion_line = match portion {
        Some(p) if p.amount > 0.0 => format!(
            "- User-estimated portion: {} {}\n",
            p.amount,
            p.unit.as_deref().filter(|u| !u.trim().is_empty()).unwrap_or("g")
        ),
        _ => String::new(),
    };

    format!(
        "USER PROFILE CONTEXT:\n\
         - Goal: {goal}\n\
         - Activity Level: {activity}\n\
         - Daily Calorie Target: {calories} kcal\n\
         - Daily Protein Target: {protein}g\n\
         - Diet Preference: {diet_pref}\n\
         - Allergies: {allergies}\n\
         - Medical Conditions: {medical}\n\
         {portion_line}\n\
         Tailor your recommendations based on this user profile and portion estimate when provided.\n",
        allergies = list_or_none(&context.allergies),
        medical = list_or_none(&context.medical),
    )
}

pub fn build_prompt(context: &UserContext, portion: Option<&PortionEstimate>) -> String {
    format!(
        "You are an expert nutrition analyst specializing in Indian and global cuisine.\n\n\
         {profile}\n\
         TASK: Analyze this meal image and provide detailed nutritional information.\n\n\
         IMPORTANT INSTRUCTIONS:\n\
         1. Identify all visible food items with confidence scores\n\
         2. Estimate portion sizes in grams or appropriate local units\n\
         3. Calculate total nutritional values\n\
         4. Provide personalized recommendations based on user profile\n\
         5. Explain the nutritional breakdown\n\n\
         CRITICAL: Return ONLY a valid JSON object. No prose, no markdown, no explanations outside JSON.\n\n\
         EXACT JSON SCHEMA REQUIRED:\n\
         {schema}\n\n\
         VALIDATION RULES:\n\
         - All numeric values must be positive numbers\n\
         - confidence_score must be between 0 and 1\n\
         - probability must be between 0 and 1\n\
         - Include at least 2-3 recommendations\n\
         - Include at least 2-3 explainability points\n\
         - Consider user's dietary restrictions and allergies\n\
         - Tailor recommendations to user's goals (weight loss, muscle gain, etc.)\n\n\
         Return ONLY the JSON schema provided. No prose.",
        profile = profile_section(context, portion),
        schema = RESPONSE_SCHEMA,
    )
}
