//! Background scheduler for automatic daily emails and OneDrive backups.
//!
//! Polls once a minute. The daily batch fires when the local clock reads the
//! configured send time and auto-send is enabled; a calendar-day guard keeps
//! it to one run per day even across restarts within the same minute.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::engine::batch::{generate_all_daily_emails, Mailer};
use crate::engine::EmailEngine;
use crate::graph::GraphClient;
use crate::store::RecordStore;
use crate::types::{Communication, EmailRecipient, Project, Settings, Stakeholder};

/// Poll interval for the scheduler loop (1 minute)
const POLL_INTERVAL_SECS: u64 = 60;

pub struct Scheduler {
    store: Arc<RecordStore>,
    graph: Arc<GraphClient>,
}

struct Snapshot {
    communications: Vec<Communication>,
    projects: Vec<Project>,
    stakeholders: Vec<Stakeholder>,
    recipients: Vec<EmailRecipient>,
    settings: Settings,
}

impl Scheduler {
    pub fn new(store: Arc<RecordStore>, graph: Arc<GraphClient>) -> Self {
        Self { store, graph }
    }

    /// Run indefinitely, checking for due work every minute.
    pub async fn run(&self) {
        let mut last_send_date: Option<NaiveDate> = None;
        let mut last_backup: DateTime<Utc> = Utc::now();

        loop {
            tokio::time::sleep(Duration::from_secs(POLL_INTERVAL_SECS)).await;

            let now = Local::now();
            let settings = match self.store.settings() {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("Scheduler could not read settings: {}", e);
                    continue;
                }
            };

            if is_send_due(&settings, now, last_send_date) {
                log::info!("Send time {} reached, running daily batch", settings.send_time);
                self.run_daily_batch(now).await;
                last_send_date = Some(now.date_naive());
            }

            let config = self.graph.config();
            if config.auto_backup_enabled && config.onedrive_enabled {
                let elapsed_hours = (Utc::now() - last_backup).num_hours();
                if elapsed_hours >= config.backup_interval_hours as i64 {
                    match self.graph.backup_to_onedrive(self.store.data_dir()).await {
                        Ok(summary) => {
                            log::info!("Automatic backup complete: {}", summary.backup_path);
                        }
                        Err(e) => log::warn!("Automatic backup failed: {}", e),
                    }
                    last_backup = Utc::now();
                }
            }
        }
    }

    fn load_snapshot(&self) -> Result<Snapshot, crate::StoreError> {
        Ok(Snapshot {
            communications: self.store.list()?,
            projects: self.store.list()?,
            stakeholders: self.store.list()?,
            recipients: self.store.list()?,
            settings: self.store.settings()?,
        })
    }

    /// Load a fresh snapshot and deliver to every recipient.
    async fn run_daily_batch(&self, now: DateTime<Local>) {
        let Snapshot {
            communications,
            projects,
            stakeholders,
            recipients,
            settings,
        } = match self.load_snapshot() {
            Ok(s) => s,
            Err(e) => {
                log::error!("Daily batch aborted, store read failed: {}", e);
                return;
            }
        };

        if recipients.is_empty() {
            log::info!("Daily batch skipped: no email recipients configured");
            return;
        }

        let engine = EmailEngine::new(&communications, &projects, &stakeholders, &settings);
        let mailer: &dyn Mailer = self.graph.as_ref();
        let report = generate_all_daily_emails(&engine, &recipients, mailer, now).await;
        log::info!(
            "Scheduled daily batch finished: {} sent, {} failed",
            report.sent_count(),
            report.failed_count()
        );
    }
}

/// True when auto-send is on, the local time matches the configured "HH:MM"
/// exactly, and the batch has not already run today.
pub fn is_send_due(
    settings: &Settings,
    now: DateTime<Local>,
    last_send_date: Option<NaiveDate>,
) -> bool {
    if !settings.auto_send_enabled {
        return false;
    }
    if last_send_date == Some(now.date_naive()) {
        return false;
    }
    now.format("%H:%M").to_string() == settings.send_time
}
