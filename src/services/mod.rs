pub mod dashboard;

pub use dashboard::{Alert, AlertSeverity, DashboardService, DashboardStats, Deadline};
