//! Body assembly for generated emails.
//!
//! Sections are emitted only when non-empty, always in the same order, so
//! the output is deterministic for a given snapshot and reference time.

use chrono::{DateTime, Duration, Local};

use crate::dates::{days_until_due, due_text, format_long_date, format_short_date};
use crate::error::EmailError;
use crate::types::{
    default_signature, Communication, CommunicationStatus, EmailRecipient, Stakeholder,
};

use super::{Buckets, ComposeRequest, EmailEngine, GeneratedEmail, ProjectHealth};

impl<'a> EmailEngine<'a> {
    fn signature(&self) -> String {
        let configured = self.settings.email_signature.trim();
        if configured.is_empty() {
            default_signature()
        } else {
            configured.to_string()
        }
    }

    fn urgent_section(&self, header: &str, items: &[&Communication], now: DateTime<Local>) -> String {
        let today = now.date_naive();
        let mut out = format!("{}\n", header);
        for item in items {
            let days_overdue = days_until_due(item.due_date, today)
                .map(i64::abs)
                .unwrap_or(0);
            out.push_str(&format!(
                "• {}: {} \"{}\" overdue by {} days ({})\n",
                self.project_name(&item.project_id),
                item.kind,
                item.subject,
                days_overdue,
                self.stakeholder_name(item.stakeholder_id.as_deref()),
            ));
        }
        out.push('\n');
        out
    }

    fn due_soon_section(
        &self,
        header: &str,
        items: &[&Communication],
        now: DateTime<Local>,
    ) -> String {
        let today = now.date_naive();
        let mut out = format!("{}\n", header);
        for item in items {
            let days = days_until_due(item.due_date, today).unwrap_or(0);
            out.push_str(&format!(
                "• {}: {} \"{}\" due {}\n",
                self.project_name(&item.project_id),
                item.kind,
                item.subject,
                due_text(days),
            ));
        }
        out.push('\n');
        out
    }

    fn completed_section(&self, header: &str, items: &[&Communication]) -> String {
        let mut out = format!("{}\n", header);
        for item in items {
            out.push_str(&format!(
                "• {}: {} \"{}\" completed\n",
                self.project_name(&item.project_id),
                item.kind,
                item.subject,
            ));
        }
        out.push('\n');
        out
    }

    fn new_items_section(&self, items: &[&Communication]) -> String {
        let mut out = "🆕 NEW COMMUNICATIONS:\n".to_string();
        for item in items {
            out.push_str(&format!(
                "• {}: {} \"{}\" from {}\n",
                self.project_name(&item.project_id),
                item.kind,
                item.subject,
                self.stakeholder_name(item.stakeholder_id.as_deref()),
            ));
        }
        out.push('\n');
        out
    }

    fn health_section(&self, health: &[ProjectHealth]) -> String {
        let mut out = "📊 PROJECT HEALTH SUMMARY:\n".to_string();
        for entry in health {
            out.push_str(&format!(
                "• {}: {} {}\n",
                entry.name,
                entry.status.label(),
                entry.description(),
            ));
        }
        out.push('\n');
        out
    }

    fn closing(&self) -> String {
        format!(
            "Questions or need to discuss anything? Just reply to this email.\n\n{}\n",
            self.signature()
        )
    }

    pub(crate) fn render_daily_body(
        &self,
        stakeholder: &Stakeholder,
        buckets: &Buckets<'_>,
        actions: &[String],
        health: &[ProjectHealth],
        now: DateTime<Local>,
    ) -> String {
        let mut body = String::new();
        body.push_str(&format!("Hi {},\n\n", stakeholder.name));
        body.push_str(&format!(
            "Here's your daily project status update as of {}:\n\n",
            format_long_date(now.date_naive())
        ));

        if !buckets.urgent.is_empty() {
            body.push_str(&self.urgent_section(
                "🔴 URGENT - Requires Immediate Attention:",
                &buckets.urgent,
                now,
            ));
        }
        if !buckets.due_soon.is_empty() {
            body.push_str(&self.due_soon_section("🟡 DUE THIS WEEK:", &buckets.due_soon, now));
        }
        if !buckets.completed_today.is_empty() {
            body.push_str(&self.completed_section("🟢 COMPLETED TODAY:", &buckets.completed_today));
        }
        if !actions.is_empty() {
            body.push_str("📋 YOUR ACTION ITEMS:\n");
            for (index, action) in actions.iter().enumerate() {
                body.push_str(&format!("{}. {}\n", index + 1, action));
            }
            body.push('\n');
        }
        if !health.is_empty() {
            body.push_str(&self.health_section(health));
        }

        body.push_str("Weather: Check local forecast for outdoor work planning\n\n");
        body.push_str(&self.closing());
        body
    }

    pub(crate) fn render_targeted_body(
        &self,
        stakeholder: &Stakeholder,
        request: &ComposeRequest,
        buckets: &Buckets<'_>,
        health: &[ProjectHealth],
        now: DateTime<Local>,
    ) -> String {
        let mut body = String::new();
        body.push_str(&format!("Hi {},\n\n", stakeholder.name));
        body.push_str(&format!(
            "{}\n\n",
            request
                .email_type
                .opening(&format_long_date(now.date_naive()))
        ));

        let message = request.additional_message.trim();
        if !message.is_empty() {
            body.push_str(&format!("{}\n\n", message));
        }

        if request.include_urgent && !buckets.urgent.is_empty() {
            body.push_str(&self.urgent_section(
                "🔴 URGENT - Requires Immediate Attention:",
                &buckets.urgent,
                now,
            ));
        }
        if request.include_due_soon && !buckets.due_soon.is_empty() {
            body.push_str(&self.due_soon_section("🟡 DUE SOON:", &buckets.due_soon, now));
        }
        if request.include_completed && !buckets.completed_today.is_empty() {
            body.push_str(
                &self.completed_section("🟢 RECENTLY COMPLETED:", &buckets.completed_today),
            );
        }
        if request.include_new && !buckets.new_items.is_empty() {
            body.push_str(&self.new_items_section(&buckets.new_items));
        }
        if request.include_project_health && !health.is_empty() {
            body.push_str(&self.health_section(health));
        }

        body.push_str(&self.closing());
        body
    }

    /// Weekly summary: accomplishments and new items over the trailing 7
    /// days plus the coming week's due items.
    pub fn generate_weekly_summary(
        &self,
        recipient: &EmailRecipient,
        now: DateTime<Local>,
    ) -> Result<GeneratedEmail, EmailError> {
        let (stakeholder, to) = self.resolve_recipient(recipient)?;
        let today = now.date_naive();
        let week_start = today - Duration::days(6);
        let window_start = now - Duration::days(6);

        let scoped = self.scoped_communications(&recipient.project_ids);
        let week_comms: Vec<&Communication> = scoped
            .iter()
            .copied()
            .filter(|c| match c.created_at {
                Some(created) => {
                    let local = created.with_timezone(&Local);
                    local >= window_start && local <= now
                }
                None => false,
            })
            .collect();

        let completed: Vec<&Communication> = week_comms
            .iter()
            .copied()
            .filter(|c| c.status == CommunicationStatus::Completed)
            .collect();
        let added: Vec<&Communication> = week_comms
            .iter()
            .copied()
            .filter(|c| c.status != CommunicationStatus::Completed)
            .collect();
        let coming_up: Vec<&Communication> = scoped
            .iter()
            .copied()
            .filter(|c| {
                matches!(days_until_due(c.due_date, today), Some(d) if (0..=7).contains(&d))
            })
            .collect();

        let mut body = String::new();
        body.push_str(&format!("Hi {},\n\n", stakeholder.name));
        body.push_str(&format!(
            "Here's your weekly project summary for the week of {}:\n\n",
            format_short_date(week_start)
        ));

        if !completed.is_empty() {
            let mut section = "✅ COMPLETED THIS WEEK:\n".to_string();
            for item in &completed {
                section.push_str(&format!(
                    "• {}: {} \"{}\"\n",
                    self.project_name(&item.project_id),
                    item.kind,
                    item.subject
                ));
            }
            body.push_str(&section);
            body.push('\n');
        }
        if !added.is_empty() {
            let mut section = "📝 NEW ITEMS THIS WEEK:\n".to_string();
            for item in &added {
                section.push_str(&format!(
                    "• {}: {} \"{}\"\n",
                    self.project_name(&item.project_id),
                    item.kind,
                    item.subject
                ));
            }
            body.push_str(&section);
            body.push('\n');
        }
        if !coming_up.is_empty() {
            let mut section = "📅 COMING UP NEXT WEEK:\n".to_string();
            for item in &coming_up {
                let due = item.due_date.map(format_short_date).unwrap_or_default();
                section.push_str(&format!(
                    "• {}: {} \"{}\" due {}\n",
                    self.project_name(&item.project_id),
                    item.kind,
                    item.subject,
                    due
                ));
            }
            body.push_str(&section);
            body.push('\n');
        }

        body.push_str(&format!("Have a great weekend!\n\n{}\n", self.signature()));

        Ok(GeneratedEmail {
            to,
            to_name: stakeholder.name.clone(),
            subject: format!(
                "Weekly Project Summary - {} - Week of {}",
                stakeholder.name,
                format_short_date(week_start)
            ),
            body,
        })
    }
}
