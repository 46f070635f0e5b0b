//! AI-assisted lead scoring.
//!
//! One assessment attempt per lead per cycle, with a fixed deterministic
//! fallback when the model cannot be consulted.

pub mod client;
pub mod types;

pub use client::{AnthropicAssessor, Assessor};
pub use types::{
    Assessment, AssessmentOutcome, BuyingIntent, InterestLevel, Priority, RecommendedAction,
};
