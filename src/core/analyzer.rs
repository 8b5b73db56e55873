use crate::core::confidence::derive_flags;
use crate::core::normalizer::{normalize_reply, reply_text, AnalysisCandidate, Slot};
use crate::core::prompt::{build_prompt, image_data_url};
use crate::core::validator::validate;
use crate::domain::model::{AnalysisOutcome, MealAnalysis, MealAnalysisRequest, UserContext};
use crate::domain::ports::VisionClient;
use crate::utils::error::Result;
use std::fmt;
use std::time::Instant;

/// 單次分析請求的處理階段，不會回到先前的階段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStage {
    BuildingPrompt,
    CallingService,
    Normalizing,
    Flagging,
    Validating,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisStage::BuildingPrompt => "building_prompt",
            AnalysisStage::CallingService => "calling_service",
            AnalysisStage::Normalizing => "normalizing",
            AnalysisStage::Flagging => "flagging",
            AnalysisStage::Validating => "validating",
        };
        f.write_str(name)
    }
}

pub struct MealAnalyzer<V: VisionClient> {
    client: V,
}

impl<V: VisionClient> MealAnalyzer<V> {
    pub fn new(client: V) -> Self {
        Self { client }
    }

    /// 所有錯誤都在這裡轉成錯誤封包，不會往外拋
    pub async fn analyze(&self, request: &MealAnalysisRequest, context: &UserContext) -> AnalysisOutcome {
        let started = Instant::now();
        tracing::info!(
            "🍽️ Analyze meal request: image {} bytes, tag '{}'",
            request.image_base64.len(),
            request.tag()
        );

        match self.run(request, context).await {
            Ok(analysis) => {
                tracing::info!(
                    "✅ Analysis succeeded in {:?}: {} kcal, {} items, confidence {:.2}",
                    started.elapsed(),
                    analysis.nutrients().calories_kcal,
                    analysis.items().len(),
                    analysis.confidence_score()
                );
                AnalysisOutcome::Success { data: analysis }
            }
            Err(e) => {
                let code = e.code();
                tracing::error!(
                    "❌ Analysis failed after {:?}: {} (code: {}, category: {:?})",
                    started.elapsed(),
                    e,
                    code,
                    e.category()
                );
                AnalysisOutcome::Error {
                    code,
                    message: e.user_friendly_message(),
                }
            }
        }
    }

    pub async fn run(&self, request: &MealAnalysisRequest, context: &UserContext) -> Result<MealAnalysis> {
        log_stage(AnalysisStage::BuildingPrompt);
        if let Some(portion) = request.portion() {
            tracing::info!(
                "User portion override: {} {}",
                portion.amount,
                portion.unit.as_deref().unwrap_or("g")
            );
        }
        let prompt = build_prompt(context, request.portion().as_ref());
        let image_url = image_data_url(&request.image_base64);

        log_stage(AnalysisStage::CallingService);
        let reply = self.client.complete(&prompt, &image_url).await?;

        log_stage(AnalysisStage::Normalizing);
        let candidate = normalize_reply(&reply_text(&reply.content))?;

        log_stage(AnalysisStage::Flagging);
        log_flags(&candidate);

        log_stage(AnalysisStage::Validating);
        let analysis = validate(candidate)?;

        Ok(analysis)
    }
}

fn log_stage(stage: AnalysisStage) {
    tracing::debug!("📍 Stage: {}", stage);
}

/// 旗標本身在建立 MealAnalysis 時推導；範圍外的分數留給驗證處理
fn log_flags(candidate: &AnalysisCandidate) {
    match candidate.confidence_score {
        Slot::Present(score) if (0.0..=1.0).contains(&score) => {
            let flags = derive_flags(score);
            tracing::debug!(
                "Confidence {:.2}: needs_confirmation={}, needs_portion_confirmation={}, very_low_confidence={}",
                score,
                flags.needs_confirmation,
                flags.needs_portion_confirmation,
                flags.very_low_confidence
            );
        }
        _ => tracing::debug!("Confidence score unusable, skipping flags"),
    }
}
