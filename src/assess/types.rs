//! Assessment value types.
//!
//! An `Assessment` is derived once per lead per cycle and never persisted
//! beyond the notification payload.

use serde::{Deserialize, Serialize};

/// Priority tier of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Hot,
    Warm,
    Cold,
}

impl Priority {
    /// Emoji badge used in notification messages.
    pub fn badge(&self) -> &'static str {
        match self {
            Self::Hot => "🔥",
            Self::Warm => "🟡",
            Self::Cold => "❄️",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Hot => "HOT",
            Self::Warm => "WARM",
            Self::Cold => "COLD",
        }
    }
}

/// How interested the lead appears to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterestLevel {
    High,
    Medium,
    Low,
}

/// Stated or inferred intent of the inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuyingIntent {
    BuyNow,
    Researching,
    Curious,
}

/// What the operator should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedAction {
    CallUrgent,
    ScheduleVisit,
    SendInfo,
    FollowUp,
}

impl RecommendedAction {
    /// Human-readable label for notification messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CallUrgent => "Call urgently",
            Self::ScheduleVisit => "Schedule a visit",
            Self::SendInfo => "Send information",
            Self::FollowUp => "Follow up",
        }
    }

    /// Emoji used next to the action in notification messages.
    pub fn badge(&self) -> &'static str {
        match self {
            Self::CallUrgent => "📞",
            Self::ScheduleVisit => "📅",
            Self::SendInfo => "📧",
            Self::FollowUp => "👀",
        }
    }
}

/// Structured priority assessment of a lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub priority: Priority,
    /// Urgency score, 1–10. Clamped on parse.
    pub urgency_score: u8,
    pub interest_level: InterestLevel,
    pub buying_intent: BuyingIntent,
    pub recommended_action: RecommendedAction,
    /// One or two sentence summary.
    pub summary: String,
    /// Ordered list of key points.
    pub key_points: Vec<String>,
}

impl Assessment {
    /// The fixed default used whenever the model cannot be consulted.
    pub fn fallback() -> Self {
        Self {
            priority: Priority::Warm,
            urgency_score: 5,
            interest_level: InterestLevel::Medium,
            buying_intent: BuyingIntent::Researching,
            recommended_action: RecommendedAction::SendInfo,
            summary: "Automatic assessment (model unavailable)".to_string(),
            key_points: vec![
                "New lead detected".to_string(),
                "Awaiting manual review".to_string(),
            ],
        }
    }
}

/// Outcome of one assessment attempt.
///
/// The client's public contract never fails; a failed attempt is made
/// explicit here instead of being hidden behind the default values.
#[derive(Debug, Clone)]
pub enum AssessmentOutcome {
    /// The model produced a parseable assessment.
    Scored(Assessment),
    /// The model could not be consulted; `assessment` is the fixed fallback.
    Fallback { assessment: Assessment, reason: String },
}

impl AssessmentOutcome {
    /// The assessment to act on, regardless of how it was produced.
    pub fn assessment(&self) -> &Assessment {
        match self {
            Self::Scored(a) => a,
            Self::Fallback { assessment, .. } => assessment,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}
