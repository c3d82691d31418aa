//! Dashboard aggregates: headline stats, alerts and upcoming deadlines.

use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::{days_until_due, is_due_soon, is_overdue};
use crate::engine::categorize::DUE_SOON_WINDOW_DAYS;
use crate::types::{Communication, Priority, Project, ProjectStatus, Prospect};

const MAX_ALERTS: usize = 10;
const MAX_DEADLINES: usize = 10;

/// Communications due within this many days raise a warning alert.
const ALERT_DUE_SOON_DAYS: i64 = 3;
/// Prospect proposals due within this many days raise an info alert.
const PROPOSAL_ALERT_DAYS: i64 = 5;
/// Deadline lookahead window.
const DEADLINE_WINDOW_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_projects: usize,
    pub pending_items: usize,
    pub overdue_items: usize,
    pub due_this_week: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    /// Days until due; negative when already past.
    pub days_until: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deadline {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub project: String,
    pub due_date: NaiveDate,
    pub days_until: i64,
    pub priority: Priority,
}

/// Read-only aggregation over borrowed record snapshots.
pub struct DashboardService<'a> {
    communications: &'a [Communication],
    projects: &'a [Project],
    prospects: &'a [Prospect],
}

impl<'a> DashboardService<'a> {
    pub fn new(
        communications: &'a [Communication],
        projects: &'a [Project],
        prospects: &'a [Prospect],
    ) -> Self {
        Self {
            communications,
            projects,
            prospects,
        }
    }

    fn project_name(&self, id: &str) -> &str {
        self.projects
            .iter()
            .find(|p| p.id == id)
            .map_or("Unknown Project", |p| p.name.as_str())
    }

    /// Headline counters for the dashboard cards.
    pub fn stats(&self, today: NaiveDate) -> DashboardStats {
        DashboardStats {
            active_projects: self
                .projects
                .iter()
                .filter(|p| p.status == ProjectStatus::Active)
                .count(),
            pending_items: self
                .communications
                .iter()
                .filter(|c| c.status.is_open())
                .count(),
            overdue_items: self
                .communications
                .iter()
                .filter(|c| is_overdue(c.due_date, today))
                .count(),
            due_this_week: self
                .communications
                .iter()
                .filter(|c| is_due_soon(c.due_date, today, DUE_SOON_WINDOW_DAYS))
                .count(),
        }
    }

    /// Alert feed: overdue communications (critical), communications due
    /// within 3 days (warning), prospect proposals due within 5 days (info).
    /// Sorted most severe first, then most urgent; capped at 10.
    pub fn critical_alerts(&self, today: NaiveDate) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for comm in self.communications {
            if is_overdue(comm.due_date, today) {
                let days = days_until_due(comm.due_date, today).unwrap_or(0);
                alerts.push(Alert {
                    severity: AlertSeverity::Critical,
                    title: format!("Overdue {}", comm.kind),
                    message: format!(
                        "{} ({})",
                        comm.subject,
                        self.project_name(&comm.project_id)
                    ),
                    days_until: days,
                });
            } else if is_due_soon(comm.due_date, today, ALERT_DUE_SOON_DAYS) {
                let days = days_until_due(comm.due_date, today).unwrap_or(0);
                alerts.push(Alert {
                    severity: AlertSeverity::Warning,
                    title: format!("{} Due Soon", comm.kind),
                    message: format!(
                        "{} ({})",
                        comm.subject,
                        self.project_name(&comm.project_id)
                    ),
                    days_until: days,
                });
            }
        }

        for prospect in self.prospects {
            if is_due_soon(prospect.proposal_due_date, today, PROPOSAL_ALERT_DAYS) {
                let days = days_until_due(prospect.proposal_due_date, today).unwrap_or(0);
                alerts.push(Alert {
                    severity: AlertSeverity::Info,
                    title: "Proposal Due Soon".to_string(),
                    message: format!("{} ({})", prospect.name, prospect.client),
                    days_until: days,
                });
            }
        }

        alerts.sort_by_key(|a| (a.severity, a.days_until));
        alerts.truncate(MAX_ALERTS);
        alerts
    }

    /// Communication and prospect-proposal deadlines within the next 14
    /// days, soonest first; capped at 10.
    pub fn upcoming_deadlines(&self, today: NaiveDate) -> Vec<Deadline> {
        let mut deadlines = Vec::new();

        for comm in self.communications {
            if let Some(due) = comm.due_date {
                if is_due_soon(comm.due_date, today, DEADLINE_WINDOW_DAYS) {
                    deadlines.push(Deadline {
                        kind: comm.kind.label().to_string(),
                        title: comm.subject.clone(),
                        project: self.project_name(&comm.project_id).to_string(),
                        due_date: due,
                        days_until: days_until_due(comm.due_date, today).unwrap_or(0),
                        priority: comm.priority,
                    });
                }
            }
        }

        for prospect in self.prospects {
            if let Some(due) = prospect.proposal_due_date {
                if is_due_soon(prospect.proposal_due_date, today, DEADLINE_WINDOW_DAYS) {
                    deadlines.push(Deadline {
                        kind: "Proposal".to_string(),
                        title: prospect.name.clone(),
                        project: prospect.client.clone(),
                        due_date: due,
                        days_until: days_until_due(prospect.proposal_due_date, today)
                            .unwrap_or(0),
                        priority: Priority::High,
                    });
                }
            }
        }

        deadlines.sort_by_key(|d| d.days_until);
        deadlines.truncate(MAX_DEADLINES);
        deadlines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommunicationStatus, CommunicationType};
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 29).unwrap()
    }

    fn project(id: &str, name: &str, status: ProjectStatus) -> Project {
        Project {
            id: id.into(),
            number: String::new(),
            name: name.into(),
            client: String::new(),
            project_manager_id: None,
            superintendent_id: None,
            start_date: None,
            end_date: None,
            contract_value: None,
            status,
            created_at: None,
            updated_at: None,
        }
    }

    fn comm(subject: &str, due_offset: Option<i64>, status: CommunicationStatus) -> Communication {
        Communication {
            id: subject.into(),
            project_id: "p1".into(),
            stakeholder_id: None,
            kind: CommunicationType::Rfi,
            subject: subject.into(),
            notes: String::new(),
            priority: Priority::Medium,
            status,
            due_date: due_offset.map(|d| today() + Duration::days(d)),
            created_at: None,
            updated_at: None,
        }
    }

    fn prospect(name: &str, proposal_offset: Option<i64>) -> Prospect {
        Prospect {
            id: name.into(),
            name: name.into(),
            client: "Beta Industries".into(),
            estimator_id: None,
            walk_date: None,
            proposal_due_date: proposal_offset.map(|d| today() + Duration::days(d)),
            estimated_value: None,
            probability: 50,
            notes: String::new(),
            status: "active".into(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_stats_counts() {
        let projects = vec![
            project("p1", "Alpha", ProjectStatus::Active),
            project("p2", "Beta", ProjectStatus::Planning),
        ];
        let comms = vec![
            comm("overdue", Some(-1), CommunicationStatus::Pending),
            comm("this week", Some(4), CommunicationStatus::InProgress),
            comm("far out", Some(30), CommunicationStatus::Pending),
            comm("done", Some(2), CommunicationStatus::Completed),
        ];
        let service = DashboardService::new(&comms, &projects, &[]);
        let stats = service.stats(today());
        assert_eq!(stats.active_projects, 1);
        assert_eq!(stats.pending_items, 3);
        assert_eq!(stats.overdue_items, 1);
        // "done" is still due within the window; status does not exclude it.
        assert_eq!(stats.due_this_week, 2);
    }

    #[test]
    fn test_alerts_severity_order_and_exclusivity() {
        let projects = vec![project("p1", "Alpha", ProjectStatus::Active)];
        let comms = vec![
            comm("due in two", Some(2), CommunicationStatus::Pending),
            comm("late", Some(-4), CommunicationStatus::Pending),
        ];
        let prospects = vec![prospect("Beta Warehouse", Some(3))];
        let service = DashboardService::new(&comms, &projects, &prospects);
        let alerts = service.critical_alerts(today());

        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[0].title, "Overdue RFI");
        assert_eq!(alerts[0].message, "late (Alpha)");
        assert_eq!(alerts[1].severity, AlertSeverity::Warning);
        assert_eq!(alerts[2].severity, AlertSeverity::Info);
        assert_eq!(alerts[2].message, "Beta Warehouse (Beta Industries)");
    }

    #[test]
    fn test_overdue_item_is_not_also_due_soon_alert() {
        let projects = vec![project("p1", "Alpha", ProjectStatus::Active)];
        let comms = vec![comm("late", Some(-1), CommunicationStatus::Pending)];
        let service = DashboardService::new(&comms, &projects, &[]);
        let alerts = service.critical_alerts(today());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn test_deadlines_sorted_and_capped_window() {
        let projects = vec![project("p1", "Alpha", ProjectStatus::Active)];
        let comms = vec![
            comm("two weeks out", Some(14), CommunicationStatus::Pending),
            comm("tomorrow", Some(1), CommunicationStatus::Pending),
            comm("next month", Some(20), CommunicationStatus::Pending),
        ];
        let prospects = vec![prospect("Beta Warehouse", Some(5))];
        let service = DashboardService::new(&comms, &projects, &prospects);
        let deadlines = service.upcoming_deadlines(today());

        let titles: Vec<&str> = deadlines.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, ["tomorrow", "Beta Warehouse", "two weeks out"]);
        assert_eq!(deadlines[1].kind, "Proposal");
        assert_eq!(deadlines[1].priority, Priority::High);
        assert_eq!(deadlines[1].project, "Beta Industries");
    }
}
