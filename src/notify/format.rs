//! Notification formatter - renders an assessment plus lead data into one
//! human-readable message block. Pure, never fails.

use crate::assess::Assessment;
use crate::notify::templates;
use crate::store::{Lead, SiteSettings};

/// Render the full notification message for one lead.
pub fn format_notification(lead: &Lead, assessment: &Assessment, settings: &SiteSettings) -> String {
    let key_points = if assessment.key_points.is_empty() {
        "• (none)".to_string()
    } else {
        assessment
            .key_points
            .iter()
            .map(|p| format!("• {p}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "{badge} *AI ASSESSMENT — {priority}*\n\
         🎯 Urgency: {urgency}/10\n\
         {action_badge} Action: {action}\n\n\
         💭 *Summary*: {summary}\n\n\
         📋 *Key points*:\n{key_points}\n\n\
         ---\n\
         {base}",
        badge = assessment.priority.badge(),
        priority = assessment.priority.label(),
        urgency = assessment.urgency_score,
        action_badge = assessment.recommended_action.badge(),
        action = assessment.recommended_action.label(),
        summary = assessment.summary,
        base = templates::lead_notification_base(lead, settings),
    )
}
