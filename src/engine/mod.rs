//! Email content engine.
//!
//! Transforms a recipient's configuration plus live record snapshots into
//! deterministic, human-readable status messages. The engine is constructed
//! over borrowed snapshots and is purely synchronous; delivery lives in
//! [`batch`].

pub mod batch;
pub mod categorize;
mod content;

use chrono::{DateTime, Local};
use serde::Serialize;

pub use categorize::{
    bucket_communications, classify_health, project_health, Buckets, HealthStatus, ProjectHealth,
};

use crate::dates::{days_until_due, format_short_date, DateRange};
use crate::error::EmailError;
use crate::types::{Communication, EmailRecipient, Project, Settings, Stakeholder};

const UNKNOWN_PROJECT: &str = "Unknown Project";
const UNKNOWN_STAKEHOLDER: &str = "Unknown Stakeholder";

/// A fully assembled message, ready for any transport.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedEmail {
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub body: String,
}

/// Discriminator for composed emails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailType {
    Daily,
    Weekly,
    Urgent,
    ProjectSummary,
    Custom,
}

impl EmailType {
    pub fn parse(value: &str) -> Self {
        match value {
            "daily" => EmailType::Daily,
            "weekly" => EmailType::Weekly,
            "urgent" => EmailType::Urgent,
            "project-summary" | "project" => EmailType::ProjectSummary,
            _ => EmailType::Custom,
        }
    }

    pub fn subject_label(&self) -> &'static str {
        match self {
            EmailType::Daily => "Daily Update",
            EmailType::Weekly => "Weekly Report",
            EmailType::Urgent => "Urgent Items Alert",
            EmailType::ProjectSummary => "Project Summary",
            EmailType::Custom => "Project Update",
        }
    }

    fn opening(&self, long_date: &str) -> String {
        match self {
            EmailType::Daily | EmailType::Custom => format!(
                "Here's your daily project communication update as of {}:",
                long_date
            ),
            EmailType::Weekly => format!(
                "Here's your weekly project summary for the week ending {}:",
                long_date
            ),
            EmailType::Urgent => format!(
                "URGENT: The following items require immediate attention as of {}:",
                long_date
            ),
            EmailType::ProjectSummary => format!(
                "Here's a comprehensive project status summary as of {}:",
                long_date
            ),
        }
    }
}

/// Filters and section toggles for the composed/targeted variant.
#[derive(Debug, Clone)]
pub struct ComposeRequest {
    pub email_type: EmailType,
    /// Resolved through [`DateRange::parse`]; unrecognized selectors disable
    /// range filtering.
    pub date_range: String,
    pub project_ids: Vec<String>,
    pub stakeholder_ids: Vec<String>,
    pub include_urgent: bool,
    pub include_due_soon: bool,
    pub include_completed: bool,
    pub include_new: bool,
    pub include_project_health: bool,
    pub additional_message: String,
    pub custom_subject: String,
}

impl Default for ComposeRequest {
    fn default() -> Self {
        Self {
            email_type: EmailType::Daily,
            date_range: "today".to_string(),
            project_ids: Vec::new(),
            stakeholder_ids: Vec::new(),
            include_urgent: true,
            include_due_soon: true,
            include_completed: true,
            include_new: true,
            include_project_health: false,
            additional_message: String::new(),
            custom_subject: String::new(),
        }
    }
}

/// The core engine. Holds borrowed snapshots of the record collections plus
/// settings. Explicitly constructed and passed by reference, never ambient.
pub struct EmailEngine<'a> {
    communications: &'a [Communication],
    projects: &'a [Project],
    stakeholders: &'a [Stakeholder],
    settings: &'a Settings,
}

impl<'a> EmailEngine<'a> {
    pub fn new(
        communications: &'a [Communication],
        projects: &'a [Project],
        stakeholders: &'a [Stakeholder],
        settings: &'a Settings,
    ) -> Self {
        Self {
            communications,
            projects,
            stakeholders,
            settings,
        }
    }

    pub(crate) fn project(&self, id: &str) -> Option<&'a Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Dangling project references render as a placeholder, never fail.
    pub(crate) fn project_name(&self, id: &str) -> &'a str {
        self.project(id).map_or(UNKNOWN_PROJECT, |p| p.name.as_str())
    }

    pub(crate) fn stakeholder(&self, id: &str) -> Option<&'a Stakeholder> {
        self.stakeholders.iter().find(|s| s.id == id)
    }

    pub(crate) fn stakeholder_name(&self, id: Option<&str>) -> &'a str {
        id.and_then(|id| self.stakeholder(id))
            .map_or(UNKNOWN_STAKEHOLDER, |s| s.name.as_str())
    }

    /// Resolve the primary recipient, the one place where a dangling
    /// reference is fatal rather than substituted.
    fn resolve_recipient(
        &self,
        recipient: &EmailRecipient,
    ) -> Result<(&'a Stakeholder, String), EmailError> {
        let stakeholder = self
            .stakeholder(&recipient.stakeholder_id)
            .ok_or_else(|| EmailError::RecipientNotFound(recipient.stakeholder_id.clone()))?;
        let email = stakeholder
            .email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| EmailError::MissingEmail(stakeholder.name.clone()))?;
        Ok((stakeholder, email.to_string()))
    }

    fn scoped_communications(&self, project_ids: &[String]) -> Vec<&'a Communication> {
        self.communications
            .iter()
            .filter(|c| project_ids.contains(&c.project_id))
            .collect()
    }

    /// Generate the standing daily status email for one recipient.
    pub fn generate_daily_email(
        &self,
        recipient: &EmailRecipient,
        now: DateTime<Local>,
    ) -> Result<GeneratedEmail, EmailError> {
        self.generate_daily_email_with_subject(recipient, now, None)
    }

    /// Daily email with an optional caller-supplied subject override.
    pub fn generate_daily_email_with_subject(
        &self,
        recipient: &EmailRecipient,
        now: DateTime<Local>,
        subject_override: Option<&str>,
    ) -> Result<GeneratedEmail, EmailError> {
        let (stakeholder, to) = self.resolve_recipient(recipient)?;

        let scoped = self.scoped_communications(&recipient.project_ids);
        let buckets = bucket_communications(&scoped, now);
        let actions = self.action_items(&buckets, &stakeholder.id, now);
        let health: Vec<ProjectHealth> = recipient
            .project_ids
            .iter()
            .filter_map(|id| self.project(id))
            .map(|p| project_health(p, &scoped, now))
            .collect();

        let subject = match subject_override {
            Some(s) => s.to_string(),
            None => format!(
                "Daily Project Status - {} - {}",
                stakeholder.name,
                format_short_date(now.date_naive())
            ),
        };
        let body = self.render_daily_body(stakeholder, &buckets, &actions, &health, now);

        Ok(GeneratedEmail {
            to,
            to_name: stakeholder.name.clone(),
            subject,
            body,
        })
    }

    /// Action items derived from the urgent and due-soon buckets: every
    /// urgent item gets a line; among the first 3 due-soon items, those due
    /// within 2 days get a line. Urgent actions come first.
    fn action_items(
        &self,
        buckets: &Buckets<'_>,
        recipient_stakeholder_id: &str,
        now: DateTime<Local>,
    ) -> Vec<String> {
        let today = now.date_naive();
        let mut actions = Vec::new();

        for item in &buckets.urgent {
            let assigned = item
                .stakeholder_id
                .as_deref()
                .and_then(|id| self.stakeholder(id));
            match assigned {
                Some(s) if s.id != recipient_stakeholder_id => actions.push(format!(
                    "Follow up with {} on overdue {}: \"{}\"",
                    s.name, item.kind, item.subject
                )),
                _ => actions.push(format!(
                    "Address overdue {}: \"{}\"",
                    item.kind, item.subject
                )),
            }
        }

        for item in buckets.due_soon.iter().take(3) {
            if let Some(days) = days_until_due(item.due_date, today) {
                if days <= 2 {
                    let when = match days {
                        0 => "today",
                        1 => "tomorrow",
                        _ => "soon",
                    };
                    actions.push(format!(
                        "Prepare for {} due {}: \"{}\"",
                        item.kind, when, item.subject
                    ));
                }
            }
        }

        actions
    }

    /// Composed/targeted variant: one email per selected stakeholder, with
    /// explicit project/date filters and section toggles.
    pub fn compose_targeted_emails(
        &self,
        request: &ComposeRequest,
        now: DateTime<Local>,
    ) -> Result<Vec<GeneratedEmail>, EmailError> {
        if request.project_ids.is_empty() {
            return Err(EmailError::Validation(
                "select at least one project".to_string(),
            ));
        }
        if request.stakeholder_ids.is_empty() {
            return Err(EmailError::Validation(
                "select at least one stakeholder".to_string(),
            ));
        }

        let range = DateRange::parse(&request.date_range);
        let scoped: Vec<&Communication> = self
            .scoped_communications(&request.project_ids)
            .into_iter()
            .filter(|c| match c.created_at {
                Some(created) => range.contains(created, now),
                // No created timestamp: fall back to the due date.
                None => match c.due_date.and_then(|d| d.and_hms_opt(0, 0, 0)) {
                    Some(due) => range.contains(due.and_utc(), now),
                    None => matches!(range, DateRange::AllTime),
                },
            })
            .collect();

        let buckets = bucket_communications(&scoped, now);
        let health: Vec<ProjectHealth> = request
            .project_ids
            .iter()
            .filter_map(|id| self.project(id))
            .map(|p| project_health(p, &scoped, now))
            .collect();

        let mut emails = Vec::new();
        for stakeholder_id in &request.stakeholder_ids {
            // Stakeholders without a usable address are skipped, not fatal.
            let Some(stakeholder) = self.stakeholder(stakeholder_id) else {
                log::warn!("Skipping unknown stakeholder {}", stakeholder_id);
                continue;
            };
            let Some(to) = stakeholder
                .email
                .as_deref()
                .filter(|e| !e.trim().is_empty())
            else {
                log::warn!("Skipping {}: no email address", stakeholder.name);
                continue;
            };

            let subject = if request.custom_subject.trim().is_empty() {
                format!(
                    "{} - {} - {}",
                    request.email_type.subject_label(),
                    stakeholder.name,
                    format_short_date(now.date_naive())
                )
            } else {
                request.custom_subject.trim().to_string()
            };
            let body = self.render_targeted_body(stakeholder, request, &buckets, &health, now);

            emails.push(GeneratedEmail {
                to: to.to_string(),
                to_name: stakeholder.name.clone(),
                subject,
                body,
            });
        }
        Ok(emails)
    }
}
