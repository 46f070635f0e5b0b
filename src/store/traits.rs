//! Lead store contract - the async interface the pipeline depends on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;

/// Terminal processing status written back to a lead.
///
/// Every fetched lead transitions to exactly one of these per cycle. None of
/// them is eligible for a future fetch: recovery of errored leads is an
/// operator action, not an automatic retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    /// Notification delivered to the gateway.
    Sent,
    /// Assessment ran (possibly as fallback) but dispatch failed.
    AiError,
    /// Unexpected failure while processing the lead.
    Error,
}

impl ProcessingStatus {
    /// Database string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "SENT",
            Self::AiError => "AI_ERROR",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prospective customer inquiry tied to a property listing.
///
/// Immutable once fetched; the store owns the record, the pipeline borrows it
/// for the duration of one processing attempt.
#[derive(Debug, Clone)]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: String,
    pub property_title: Option<String>,
    pub property_price: Option<f64>,
    pub property_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Site-level settings the notification path needs.
#[derive(Debug, Clone, Default)]
pub struct SiteSettings {
    /// Operator WhatsApp number notifications are dispatched to.
    pub contact_whatsapp: Option<String>,
    pub site_name: Option<String>,
    pub contact_phone: Option<String>,
}

/// Backend-agnostic lead store.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Fetch the current unprocessed lead set.
    ///
    /// Order is implementation-defined but stable within one call. Leads
    /// arriving after the snapshot are picked up by the next cycle.
    async fn fetch_unprocessed(&self) -> Result<Vec<Lead>, StoreError>;

    /// Write a terminal status back to a lead.
    async fn mark_processed(&self, lead_id: &str, status: ProcessingStatus)
        -> Result<(), StoreError>;

    /// Load site settings (operator contact details).
    async fn site_settings(&self) -> Result<SiteSettings, StoreError>;
}
