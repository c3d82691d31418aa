//! Bucketing and health scoring for status emails.
//!
//! The four buckets are driven entirely by the date utilities against one
//! reference instant, so urgent/due-soon can never overlap.

use chrono::{DateTime, Duration, Local};

use crate::dates::{days_until_due, is_due_soon, is_overdue, local_date};
use crate::types::{Communication, Project};

/// Window (days) for the due-soon bucket.
pub const DUE_SOON_WINDOW_DAYS: i64 = 7;

/// Categorized views over one recipient's communications.
#[derive(Debug, Default)]
pub struct Buckets<'a> {
    /// Overdue, most overdue first (stable ties).
    pub urgent: Vec<&'a Communication>,
    /// Due within the next 7 days, soonest first.
    pub due_soon: Vec<&'a Communication>,
    /// Completed with a last-modified timestamp on today's calendar day.
    pub completed_today: Vec<&'a Communication>,
    /// Created within the last 24 hours (composed-email variant only).
    pub new_items: Vec<&'a Communication>,
}

/// Partition `communications` into the four buckets relative to `now`.
pub fn bucket_communications<'a>(
    communications: &[&'a Communication],
    now: DateTime<Local>,
) -> Buckets<'a> {
    let today = now.date_naive();
    let fresh_cutoff = now - Duration::hours(24);
    let mut buckets = Buckets::default();

    for comm in communications {
        if is_overdue(comm.due_date, today) {
            buckets.urgent.push(comm);
        } else if is_due_soon(comm.due_date, today, DUE_SOON_WINDOW_DAYS) {
            buckets.due_soon.push(comm);
        }

        if comm.status == crate::types::CommunicationStatus::Completed {
            if let Some(updated) = comm.updated_at {
                if local_date(updated) == today {
                    buckets.completed_today.push(comm);
                }
            }
        }

        if let Some(created) = comm.created_at {
            if created.with_timezone(&Local) >= fresh_cutoff {
                buckets.new_items.push(comm);
            }
        }
    }

    // Ascending signed days puts the most overdue first; sort is stable so
    // same-day ties keep their original order.
    buckets
        .urgent
        .sort_by_key(|c| days_until_due(c.due_date, today).unwrap_or(0));
    buckets
        .due_soon
        .sort_by_key(|c| days_until_due(c.due_date, today).unwrap_or(0));

    buckets
}

/// Three-level project health derived from open communications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "🟢 Healthy",
            HealthStatus::Warning => "🟡 Warning",
            HealthStatus::Critical => "🔴 Critical",
        }
    }
}

/// First match wins: Critical before Warning before Healthy.
pub fn classify_health(overdue_count: usize, pending_count: usize) -> HealthStatus {
    if overdue_count > 2 || pending_count > 10 {
        HealthStatus::Critical
    } else if overdue_count > 0 || pending_count > 5 {
        HealthStatus::Warning
    } else {
        HealthStatus::Healthy
    }
}

#[derive(Debug, Clone)]
pub struct ProjectHealth {
    pub project_id: String,
    pub name: String,
    pub status: HealthStatus,
    pub overdue_count: usize,
    pub pending_count: usize,
}

impl ProjectHealth {
    /// "(2 overdue, 4 pending)", or just the pending count when healthy.
    pub fn description(&self) -> String {
        if self.status == HealthStatus::Healthy {
            format!("({} pending items)", self.pending_count)
        } else {
            format!(
                "({} overdue, {} pending)",
                self.overdue_count, self.pending_count
            )
        }
    }
}

/// Score one project against the communications already restricted to the
/// recipient's scope.
pub fn project_health(
    project: &Project,
    communications: &[&Communication],
    now: DateTime<Local>,
) -> ProjectHealth {
    let today = now.date_naive();
    let mut overdue_count = 0;
    let mut pending_count = 0;
    for comm in communications {
        if comm.project_id != project.id {
            continue;
        }
        if is_overdue(comm.due_date, today) {
            overdue_count += 1;
        }
        if comm.status.is_open() {
            pending_count += 1;
        }
    }
    ProjectHealth {
        project_id: project.id.clone(),
        name: project.name.clone(),
        status: classify_health(overdue_count, pending_count),
        overdue_count,
        pending_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::types::{CommunicationStatus, CommunicationType, Priority};

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 8, 29, 17, 0, 0).unwrap()
    }

    fn comm(subject: &str, due_offset: Option<i64>) -> Communication {
        Communication {
            id: subject.to_string(),
            project_id: "p1".into(),
            stakeholder_id: None,
            kind: CommunicationType::Rfi,
            subject: subject.into(),
            notes: String::new(),
            priority: Priority::Medium,
            status: CommunicationStatus::Pending,
            due_date: due_offset
                .map(|d| now().date_naive() + chrono::Duration::days(d)),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_urgent_sorted_most_overdue_first() {
        let a = comm("one day late", Some(-1));
        let b = comm("five days late", Some(-5));
        let c = comm("three days late", Some(-3));
        let comms = [&a, &b, &c];
        let buckets = bucket_communications(&comms, now());
        let order: Vec<&str> = buckets.urgent.iter().map(|c| c.subject.as_str()).collect();
        assert_eq!(order, ["five days late", "three days late", "one day late"]);
    }

    #[test]
    fn test_due_soon_sorted_ascending() {
        let a = comm("in five", Some(5));
        let b = comm("today", Some(0));
        let c = comm("in two", Some(2));
        let comms = [&a, &b, &c];
        let buckets = bucket_communications(&comms, now());
        let order: Vec<&str> = buckets.due_soon.iter().map(|c| c.subject.as_str()).collect();
        assert_eq!(order, ["today", "in two", "in five"]);
    }

    #[test]
    fn test_buckets_are_exclusive_for_due_dates() {
        let overdue = comm("late", Some(-2));
        let soon = comm("soon", Some(3));
        let far = comm("far", Some(20));
        let undated = comm("undated", None);
        let comms = [&overdue, &soon, &far, &undated];
        let buckets = bucket_communications(&comms, now());
        assert_eq!(buckets.urgent.len(), 1);
        assert_eq!(buckets.due_soon.len(), 1);
        assert!(buckets.urgent[0].subject == "late");
        assert!(buckets.due_soon[0].subject == "soon");
    }

    #[test]
    fn test_completed_today_requires_same_calendar_day() {
        let reference = now().with_timezone(&Utc);
        let mut done_today = comm("done today", None);
        done_today.status = CommunicationStatus::Completed;
        done_today.updated_at = Some(reference - chrono::Duration::hours(2));
        let mut done_last_week = comm("done last week", None);
        done_last_week.status = CommunicationStatus::Completed;
        done_last_week.updated_at = Some(reference - chrono::Duration::days(6));
        let comms = [&done_today, &done_last_week];
        let buckets = bucket_communications(&comms, now());
        assert_eq!(buckets.completed_today.len(), 1);
        assert_eq!(buckets.completed_today[0].subject, "done today");
    }

    #[test]
    fn test_new_items_within_24_hours() {
        let mut fresh = comm("fresh", None);
        fresh.created_at = Some(Utc::now() - chrono::Duration::hours(3));
        let mut stale = comm("stale", None);
        stale.created_at = Some(Utc::now() - chrono::Duration::days(3));
        let comms = [&fresh, &stale];
        let buckets = bucket_communications(&comms, Local::now());
        let names: Vec<&str> = buckets.new_items.iter().map(|c| c.subject.as_str()).collect();
        assert_eq!(names, ["fresh"]);
    }

    #[test]
    fn test_health_classification_table() {
        assert_eq!(classify_health(3, 1), HealthStatus::Critical);
        assert_eq!(classify_health(0, 11), HealthStatus::Critical);
        assert_eq!(classify_health(1, 1), HealthStatus::Warning);
        assert_eq!(classify_health(0, 6), HealthStatus::Warning);
        assert_eq!(classify_health(0, 0), HealthStatus::Healthy);
        assert_eq!(classify_health(0, 5), HealthStatus::Healthy);
        // Boundary: exactly 2 overdue is still Warning, not Critical.
        assert_eq!(classify_health(2, 0), HealthStatus::Warning);
    }

    #[test]
    fn test_project_health_counts_only_own_communications() {
        let project = Project {
            id: "p1".into(),
            number: String::new(),
            name: "Alpha".into(),
            client: String::new(),
            project_manager_id: None,
            superintendent_id: None,
            start_date: None,
            end_date: None,
            contract_value: None,
            status: crate::types::ProjectStatus::Active,
            created_at: None,
            updated_at: None,
        };
        let mine = comm("mine", Some(-1));
        let mut other = comm("other", Some(-1));
        other.project_id = "p2".into();
        let comms = [&mine, &other];
        let health = project_health(&project, &comms, now());
        assert_eq!(health.overdue_count, 1);
        assert_eq!(health.pending_count, 1);
        assert_eq!(health.status, HealthStatus::Warning);
    }

    #[test]
    fn test_health_description() {
        let healthy = ProjectHealth {
            project_id: "p1".into(),
            name: "Alpha".into(),
            status: HealthStatus::Healthy,
            overdue_count: 0,
            pending_count: 2,
        };
        assert_eq!(healthy.description(), "(2 pending items)");
        let warning = ProjectHealth {
            status: HealthStatus::Warning,
            overdue_count: 1,
            pending_count: 3,
            ..healthy
        };
        assert_eq!(warning.description(), "(1 overdue, 3 pending)");
    }

    #[test]
    fn test_stable_tie_order_for_equal_overdue() {
        let first = comm("first", Some(-2));
        let second = comm("second", Some(-2));
        let comms = [&first, &second];
        let buckets = bucket_communications(&comms, now());
        let order: Vec<&str> = buckets.urgent.iter().map(|c| c.subject.as_str()).collect();
        assert_eq!(order, ["first", "second"]);
    }
}
