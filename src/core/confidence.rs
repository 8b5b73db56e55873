use crate::domain::model::ConfidenceFlags;

/// 低於此分數需要使用者確認
pub const CONFIRMATION_THRESHOLD: f64 = 0.80;
/// 低於此分數視為信心極低
pub const VERY_LOW_THRESHOLD: f64 = 0.50;

pub fn derive_flags(confidence_score: f64) -> ConfidenceFlags {
    let needs_confirmation = confidence_score < CONFIRMATION_THRESHOLD;
    let very_low_confidence = confidence_score < VERY_LOW_THRESHOLD;

    ConfidenceFlags {
        needs_confirmation,
        needs_portion_confirmation: needs_confirmation && !very_low_confidence,
        very_low_confidence,
    }
}
