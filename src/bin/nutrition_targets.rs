use clap::Parser;
use nutri_track::compute_targets;
use nutri_track::core::targets::{basal_metabolic_rate, total_daily_energy_expenditure};
use nutri_track::domain::model::{ActivityLevel, BiometricProfile, Gender, Goal};
use nutri_track::utils::logger;
use serde_json::json;

#[derive(Parser)]
#[command(name = "nutrition-targets")]
#[command(about = "Compute daily calorie and protein targets from biometrics")]
struct Args {
    /// Body weight in kilograms
    #[arg(long)]
    weight_kg: f64,

    /// Height in centimetres
    #[arg(long)]
    height_cm: f64,

    /// Age in years
    #[arg(long)]
    age: u32,

    /// male, female or other
    #[arg(long)]
    gender: String,

    /// sedentary, light, moderate, active or very_active
    #[arg(long, default_value = "moderate")]
    activity_level: String,

    /// fat_loss, lean, muscular or health
    #[arg(long, default_value = "health")]
    goal: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    let profile = BiometricProfile {
        weight_kg: Some(args.weight_kg),
        height_cm: Some(args.height_cm),
        age: Some(args.age),
        gender: Some(args.gender.trim())
            .filter(|label| !label.is_empty())
            .map(Gender::parse),
        activity_level: Some(ActivityLevel::parse(&args.activity_level)),
        goal: Some(Goal::parse(&args.goal)),
    };

    let targets = compute_targets(&profile);
    let mut output = serde_json::to_value(targets)?;

    // 無效的生理資料會回到預設值，此時不輸出 BMR/TDEE
    let usable = args.weight_kg > 0.0 && args.height_cm > 0.0 && args.age > 0;
    if let (true, Some(gender)) = (usable, profile.gender) {
        let activity = profile.activity_level.unwrap_or_default();
        let bmr = basal_metabolic_rate(args.weight_kg, args.height_cm, args.age, gender);
        output["bmr"] = json!(bmr);
        output["tdee"] = json!(total_daily_energy_expenditure(bmr, activity));
    } else {
        tracing::warn!("⚠️ Weight, height and age must be positive and gender set, showing default targets");
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
