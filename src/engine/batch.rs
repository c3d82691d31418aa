//! Best-effort batch generation and delivery.
//!
//! One recipient's failure never aborts the batch; content is fully
//! assembled before any transport attempt, and a transport failure degrades
//! to a local mail-compose link with the content preserved for manual copy.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::graph::TransportError;
use crate::types::EmailRecipient;
use crate::util::percent_encode;

use super::{EmailEngine, GeneratedEmail};

/// Outbound mail transport seam. The Graph client implements this; tests
/// substitute a scripted mock.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// False when the transport is disabled or missing credentials; the
    /// batch falls back to mailto links without attempting a send.
    fn is_configured(&self) -> bool;

    async fn send(&self, email: &GeneratedEmail) -> Result<(), TransportError>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DeliveryOutcome {
    /// Delivered through the Outlook integration.
    SentViaOutlook,
    /// Transport unavailable or failed; a compose link carries the content.
    MailtoFallback { url: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRecord {
    pub recipient_id: String,
    pub email: GeneratedEmail,
    pub outcome: DeliveryOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub recipient_id: String,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub sent: Vec<DeliveryRecord>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn sent_count(&self) -> usize {
        self.sent.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

/// `mailto:` compose link for the local-client fallback path.
pub fn mailto_url(email: &GeneratedEmail) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        percent_encode(&email.to),
        percent_encode(&email.subject),
        percent_encode(&email.body)
    )
}

/// Generate and deliver the daily email for every recipient.
pub async fn generate_all_daily_emails(
    engine: &EmailEngine<'_>,
    recipients: &[EmailRecipient],
    mailer: &dyn Mailer,
    now: DateTime<Local>,
) -> BatchReport {
    let mut report = BatchReport::default();

    for recipient in recipients {
        let email = match engine.generate_daily_email(recipient, now) {
            Ok(email) => email,
            Err(e) => {
                log::warn!("Skipping recipient {}: {}", recipient.id, e);
                report.failed.push(BatchFailure {
                    recipient_id: recipient.id.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let outcome = if mailer.is_configured() {
            match mailer.send(&email).await {
                Ok(()) => DeliveryOutcome::SentViaOutlook,
                Err(e) => {
                    log::warn!("Outlook send to {} failed, using mailto: {}", email.to, e);
                    DeliveryOutcome::MailtoFallback {
                        url: mailto_url(&email),
                    }
                }
            }
        } else {
            DeliveryOutcome::MailtoFallback {
                url: mailto_url(&email),
            }
        };

        report.sent.push(DeliveryRecord {
            recipient_id: recipient.id.clone(),
            email,
            outcome,
        });
    }

    log::info!(
        "Daily email batch: {} prepared, {} failed",
        report.sent_count(),
        report.failed_count()
    );
    report
}
