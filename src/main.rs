use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::Parser;
use chrono::Utc;
use nutri_track::core::insights::{configured_trends, start_of_day, today_summary};
use nutri_track::domain::ports::MealStore;
use nutri_track::utils::{error::NutriError, logger, validation::Validate};
use nutri_track::{
    ChatCompletionsClient, CliConfig, InMemoryMealStore, MealAnalysisRequest, MealAnalyzer, MealEntry, ServiceConfig,
    UserProfile,
};
use std::path::Path;

fn fail(context: &str, e: &NutriError) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(1);
}

fn load_service_config(path: Option<&str>) -> Result<ServiceConfig, NutriError> {
    let config = match path {
        Some(path) => ServiceConfig::from_file(path)?,
        None => ServiceConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

fn load_profile(path: Option<&str>) -> Result<UserProfile, NutriError> {
    let Some(path) = path else {
        tracing::info!("👤 No profile given, using default targets");
        return Ok(UserProfile::default());
    };

    let content = std::fs::read_to_string(path)?;
    let profile: UserProfile = toml::from_str(&content).map_err(|e| NutriError::ConfigError {
        message: format!("Invalid profile '{}': {}", path, e),
    })?;
    Ok(profile.refreshed())
}

/// 讀取圖片並轉成 data URI
fn encode_image(path: &str) -> Result<String, NutriError> {
    let bytes = std::fs::read(path)?;
    let mime = match Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    };
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    let service_config = match load_service_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logger::init_cli_logger(args.verbose);
            fail("Configuration validation failed", &e);
        }
    };

    // 初始化日誌
    if service_config.json_logs() {
        logger::init_json_logger(service_config.log_level());
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting nutri-track");
    if args.verbose {
        tracing::debug!("CLI config: {:?}", args);
    }

    if let Err(e) = args.validate() {
        fail("Invalid arguments", &e);
    }

    let profile = load_profile(args.profile.as_deref()).unwrap_or_else(|e| fail("Failed to load profile", &e));
    let targets = profile.targets();
    tracing::info!(
        "🎯 Daily targets: {} kcal, {} g protein",
        targets.daily_calorie_target,
        targets.daily_protein_target
    );

    let image = encode_image(&args.image).unwrap_or_else(|e| fail("Failed to read image", &e));
    let request = MealAnalysisRequest {
        image_base64: image,
        tag: args.tag.clone(),
        portion_amount: args.portion_amount,
        portion_unit: args.portion_unit.clone(),
    };

    let history = service_config.history.clone();
    let store = InMemoryMealStore::from_config(&history);

    let client = ChatCompletionsClient::new(service_config)
        .unwrap_or_else(|e| fail("Failed to create vision client", &e));
    let analyzer = MealAnalyzer::new(client);

    let outcome = analyzer.analyze(&request, &profile.context()).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if let Some(code) = outcome.error_code() {
        tracing::error!("❌ Meal analysis failed with {}", code);
        std::process::exit(2);
    }

    if let Some(analysis) = outcome.analysis() {
        let user_id = profile.name.clone().unwrap_or_else(|| "local".to_string());
        store
            .save(MealEntry::new(user_id.as_str(), request.tag(), analysis.clone()))
            .await?;

        let now = Utc::now();
        let today = store.since(&user_id, start_of_day(now)).await?;
        let summary = today_summary(&today, targets, now);
        tracing::info!(
            "📊 Today: {:.0}/{} kcal, {:.1}/{} g protein over {} meals",
            summary.total_calories,
            summary.calorie_target,
            summary.total_protein,
            summary.protein_target,
            summary.meal_count
        );

        let recent = store.recent(&user_id, store.max_meals()).await?;
        let report = configured_trends(&recent, targets, &history, now);
        tracing::info!(
            "📈 Last {} days: avg {} kcal, {} surplus days, {} protein-met days",
            history.trend_days,
            report.summary.avg_calories,
            report.summary.surplus_days,
            report.summary.protein_met_days
        );
    }

    tracing::info!("✅ Meal analysis completed");
    Ok(())
}
