// Serde struct fields for Graph API payloads appear unused to the compiler but
// are required for forward-compatible JSON deserialization.
#![allow(dead_code)]

pub mod dates;
pub mod engine;
mod error;
pub mod graph;
pub mod scheduler;
pub mod services;
pub mod store;
pub mod types;
pub mod util;

pub use engine::batch::{generate_all_daily_emails, BatchReport, DeliveryOutcome, Mailer};
pub use engine::{ComposeRequest, EmailEngine, EmailType, GeneratedEmail};
pub use error::{EmailError, StoreError};
pub use graph::{GraphClient, GraphConfig, TransportError};
pub use scheduler::Scheduler;
pub use services::DashboardService;
pub use store::RecordStore;
