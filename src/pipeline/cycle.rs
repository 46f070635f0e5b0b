//! Cycle orchestrator - one full pass over the unprocessed lead set.
//!
//! Flow per lead, strictly sequential:
//! 1. Assess (never fails - fallback on any model error)
//! 2. Render and dispatch the notification
//! 3. Write back exactly one terminal status
//!
//! A failure isolated to one lead is logged, recorded as ERROR, and never
//! aborts the remaining leads in the cycle. Store-level fetch failures are
//! cycle-level errors and propagate to the supervisor.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::assess::Assessor;
use crate::error::Result;
use crate::notify::{Dispatcher, format_notification};
use crate::store::{Lead, LeadStore, ProcessingStatus, SiteSettings};

/// Counts from one completed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub processed: usize,
    pub sent: usize,
    pub ai_error: usize,
    pub error: usize,
}

/// Processes the unprocessed lead set, one lead at a time.
pub struct LeadProcessor {
    store: Arc<dyn LeadStore>,
    assessor: Arc<dyn Assessor>,
    dispatcher: Arc<dyn Dispatcher>,
    /// Pause between leads, bounding outbound request rate to the gateway.
    inter_lead_delay: Duration,
}

impl LeadProcessor {
    pub fn new(
        store: Arc<dyn LeadStore>,
        assessor: Arc<dyn Assessor>,
        dispatcher: Arc<dyn Dispatcher>,
        inter_lead_delay: Duration,
    ) -> Self {
        Self {
            store,
            assessor,
            dispatcher,
            inter_lead_delay,
        }
    }

    /// Run one cycle over the current unprocessed snapshot.
    ///
    /// Leads arriving mid-cycle are not seen until the next cycle. An empty
    /// snapshot is a no-op with zero outbound calls.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let leads = self.store.fetch_unprocessed().await?;

        if leads.is_empty() {
            debug!("No leads to process");
            return Ok(CycleReport::default());
        }

        info!(count = leads.len(), "Processing leads");
        let settings = self.store.site_settings().await?;

        let mut report = CycleReport::default();
        let total = leads.len();

        for (i, lead) in leads.iter().enumerate() {
            let status = match self.process_lead(lead, &settings).await {
                Ok(status) => status,
                Err(e) => {
                    error!(lead_id = %lead.id, error = %e, "Unexpected failure processing lead");
                    ProcessingStatus::Error
                }
            };

            match status {
                ProcessingStatus::Sent => report.sent += 1,
                ProcessingStatus::AiError => report.ai_error += 1,
                ProcessingStatus::Error => report.error += 1,
            }
            report.processed += 1;

            if let Err(e) = self.store.mark_processed(&lead.id, status).await {
                warn!(lead_id = %lead.id, status = %status, error = %e,
                    "Failed to record lead status");
            }

            if i + 1 < total {
                tokio::time::sleep(self.inter_lead_delay).await;
            }
        }

        info!(
            processed = report.processed,
            sent = report.sent,
            ai_error = report.ai_error,
            error = report.error,
            "Cycle complete"
        );
        Ok(report)
    }

    /// One lead's attempt: assess → render → dispatch.
    ///
    /// Returns the terminal status to record. Any `Err` here is the per-lead
    /// "unexpected failure" path and becomes ERROR at the call site.
    async fn process_lead(
        &self,
        lead: &Lead,
        settings: &SiteSettings,
    ) -> Result<ProcessingStatus> {
        let outcome = self.assessor.assess(lead).await;
        let assessment = outcome.assessment();

        let message = format_notification(lead, assessment, settings);
        let delivered = self
            .dispatcher
            .send(settings, &message, &lead.id, assessment)
            .await?;

        if delivered {
            debug!(
                lead_id = %lead.id,
                priority = assessment.priority.label(),
                fallback = outcome.is_fallback(),
                "Lead processed"
            );
            Ok(ProcessingStatus::Sent)
        } else {
            Ok(ProcessingStatus::AiError)
        }
    }
}
