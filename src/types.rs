use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Inter-party communication item tracked against a project.
///
/// `status` and `priority` accept the legacy capitalized / hyphenated
/// spellings still present in older data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Communication {
    #[serde(default)]
    pub id: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stakeholder_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: CommunicationType,
    pub subject: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: CommunicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommunicationType {
    #[serde(rename = "RFI")]
    Rfi,
    Submittal,
    #[serde(rename = "Change Order", alias = "ChangeOrder")]
    ChangeOrder,
    #[serde(rename = "Lien Release", alias = "LienRelease")]
    LienRelease,
    General,
}

impl CommunicationType {
    pub fn label(&self) -> &'static str {
        match self {
            CommunicationType::Rfi => "RFI",
            CommunicationType::Submittal => "Submittal",
            CommunicationType::ChangeOrder => "Change Order",
            CommunicationType::LienRelease => "Lien Release",
            CommunicationType::General => "General",
        }
    }
}

impl std::fmt::Display for CommunicationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical communication status. Earlier data files drifted between
/// `in-progress`, `in_progress` and `In Progress`; all map to one variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationStatus {
    #[default]
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "in-progress", alias = "In Progress", alias = "In-Progress")]
    InProgress,
    #[serde(alias = "Completed")]
    Completed,
}

impl CommunicationStatus {
    /// Pending and in-progress both count as open work for health scoring.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            CommunicationStatus::Pending | CommunicationStatus::InProgress
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[serde(alias = "Low")]
    Low,
    #[default]
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
}

/// Canonical project status. Legacy `in_progress` records map to `Active`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Planning,
    #[serde(alias = "in_progress", alias = "in-progress")]
    Active,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub number: String,
    pub name: String,
    #[serde(default)]
    pub client: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_manager_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superintendent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_value: Option<f64>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Named contact: PM, superintendent, architect, estimator, subcontractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stakeholder {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub receives_emails: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Defines which projects' communications feed a stakeholder's daily email.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecipient {
    #[serde(default)]
    pub id: String,
    pub stakeholder_id: String,
    #[serde(default)]
    pub project_ids: Vec<String>,
    #[serde(default = "default_send_time")]
    pub send_time: String,
    #[serde(default = "default_frequency")]
    pub frequency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_send_time() -> String {
    "17:00".to_string()
}

fn default_frequency() -> String {
    "daily".to_string()
}

/// Pre-contract sales opportunity, tracked independently of active projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prospect {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub client: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimator_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walk_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal_due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<f64>,
    #[serde(default)]
    pub probability: u8,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Singleton settings record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_signature")]
    pub email_signature: String,
    #[serde(default = "default_send_time")]
    pub send_time: String,
    #[serde(default)]
    pub auto_send_enabled: bool,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub your_name: String,
}

pub(crate) fn default_signature() -> String {
    "Best regards,\nProject Engineering Department".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            email_signature: default_signature(),
            send_time: default_send_time(),
            auto_send_enabled: false,
            company_name: "Your Construction Company".to_string(),
            your_name: "Project Engineer".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_status_spellings() {
        let c: CommunicationStatus = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(c, CommunicationStatus::InProgress);
        let c: CommunicationStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(c, CommunicationStatus::InProgress);
        let c: CommunicationStatus = serde_json::from_str("\"Pending\"").unwrap();
        assert_eq!(c, CommunicationStatus::Pending);
    }

    #[test]
    fn test_legacy_project_status_maps_to_active() {
        let s: ProjectStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(s, ProjectStatus::Active);
    }

    #[test]
    fn test_communication_type_labels() {
        assert_eq!(CommunicationType::Rfi.label(), "RFI");
        assert_eq!(CommunicationType::ChangeOrder.label(), "Change Order");
        let t: CommunicationType = serde_json::from_str("\"RFI\"").unwrap();
        assert_eq!(t, CommunicationType::Rfi);
    }

    #[test]
    fn test_settings_defaults() {
        let s = Settings::default();
        assert_eq!(s.send_time, "17:00");
        assert!(!s.auto_send_enabled);
        assert!(s.email_signature.starts_with("Best regards"));
    }

    #[test]
    fn test_communication_camel_case_wire_format() {
        let json = r#"{
            "id": "comm_1",
            "projectId": "proj_1",
            "stakeholderId": "stake_3",
            "type": "RFI",
            "subject": "Electrical layout clarification",
            "priority": "Medium",
            "status": "Pending",
            "dueDate": "2025-08-05"
        }"#;
        let c: Communication = serde_json::from_str(json).unwrap();
        assert_eq!(c.project_id, "proj_1");
        assert_eq!(c.kind, CommunicationType::Rfi);
        assert_eq!(c.priority, Priority::Medium);
        assert_eq!(c.status, CommunicationStatus::Pending);
        assert!(c.due_date.is_some());
    }
}
