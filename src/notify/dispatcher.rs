//! Notification dispatcher - POSTs rendered messages to the messaging
//! gateway.
//!
//! Delivery is a boolean outcome: `true` only when the gateway returns a
//! success status AND its body explicitly signals success. Transport faults,
//! bad statuses, and malformed bodies all come back as `false`; no retries
//! at this layer.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use crate::assess::Assessment;
use crate::error::DispatchError;
use crate::store::SiteSettings;

/// Source tag carried in every gateway payload.
const SOURCE_TAG: &str = "lead-agent";

/// Max chars of a gateway error body kept for logging.
const ERROR_BODY_PREVIEW: usize = 200;

/// Outbound notification boundary.
///
/// The trait is fallible so implementations that cannot reduce a fault to a
/// boolean have somewhere to put it; the HTTP implementation always returns
/// `Ok`.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Send one notification. The recipient is resolved from `settings`;
    /// a missing recipient fails closed (`Ok(false)`).
    async fn send(
        &self,
        settings: &SiteSettings,
        message: &str,
        lead_id: &str,
        assessment: &Assessment,
    ) -> Result<bool, DispatchError>;
}

/// Dispatcher backed by the site's WhatsApp send API.
pub struct WhatsAppDispatcher {
    client: reqwest::Client,
    base_url: String,
    token: SecretString,
}

impl WhatsAppDispatcher {
    /// Create a dispatcher. `timeout` bounds the single HTTP request.
    pub fn new(base_url: String, token: SecretString, timeout: std::time::Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            base_url,
            token,
        }
    }
}

#[async_trait]
impl Dispatcher for WhatsAppDispatcher {
    async fn send(
        &self,
        settings: &SiteSettings,
        message: &str,
        lead_id: &str,
        assessment: &Assessment,
    ) -> Result<bool, DispatchError> {
        let Some(recipient) = settings.contact_whatsapp.as_deref() else {
            warn!(lead_id = %lead_id, "No WhatsApp recipient configured, skipping dispatch");
            return Ok(false);
        };

        let payload = serde_json::json!({
            "to": recipient,
            "message": message,
            "source": SOURCE_TAG,
            "lead_id": lead_id,
            "assessment": assessment,
        });

        let response = match self
            .client
            .post(format!("{}/api/whatsapp/send", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .json(&payload)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(lead_id = %lead_id, error = %e, "Gateway request failed");
                return Ok(false);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                lead_id = %lead_id,
                status = status.as_u16(),
                body = %body.chars().take(ERROR_BODY_PREVIEW).collect::<String>(),
                "Gateway returned non-success status"
            );
            return Ok(false);
        }

        let body: serde_json::Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                warn!(lead_id = %lead_id, error = %e, "Gateway response body unreadable");
                return Ok(false);
            }
        };

        let delivered = body
            .get("success")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        if delivered {
            info!(lead_id = %lead_id, "Notification dispatched");
        } else {
            warn!(lead_id = %lead_id, "Gateway did not confirm delivery");
        }
        Ok(delivered)
    }
}
