//! Microsoft Graph adapter: Outlook mail, OneDrive backup, calendar events.
//!
//! Direct HTTP via reqwest with app-only (client credentials) auth. Every
//! failure surfaces as a [`TransportError`]; callers recover through the
//! mailto/manual fallback, so a transport failure is never fatal to a batch.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::engine::batch::Mailer;
use crate::engine::GeneratedEmail;

const GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";
const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Refresh the token this long before its actual expiry.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Microsoft 365 integration not configured")]
    NotConfigured,

    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Graph API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

/// Environment-driven adapter configuration.
///
/// Flags mirror the deployment environment: `ONEDRIVE_SYNC`,
/// `OUTLOOK_INTEGRATION`, `AUTO_BACKUP`, `BACKUP_INTERVAL_HOURS`,
/// `ONEDRIVE_FOLDER`, plus `MICROSOFT_CLIENT_ID` / `MICROSOFT_CLIENT_SECRET`
/// / `MICROSOFT_TENANT_ID` / `MICROSOFT_SENDER` credentials.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    /// Mailbox the app sends from and whose drive holds backups.
    pub sender: String,
    pub onedrive_enabled: bool,
    pub outlook_enabled: bool,
    pub auto_backup_enabled: bool,
    pub backup_interval_hours: u64,
    pub onedrive_folder: String,
}

impl GraphConfig {
    pub fn from_env() -> Self {
        let flag = |name: &str| std::env::var(name).map(|v| v == "true").unwrap_or(false);
        Self {
            client_id: std::env::var("MICROSOFT_CLIENT_ID").unwrap_or_default(),
            client_secret: std::env::var("MICROSOFT_CLIENT_SECRET").unwrap_or_default(),
            tenant_id: std::env::var("MICROSOFT_TENANT_ID").unwrap_or_default(),
            sender: std::env::var("MICROSOFT_SENDER").unwrap_or_default(),
            onedrive_enabled: flag("ONEDRIVE_SYNC"),
            outlook_enabled: flag("OUTLOOK_INTEGRATION"),
            auto_backup_enabled: flag("AUTO_BACKUP"),
            backup_interval_hours: std::env::var("BACKUP_INTERVAL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            onedrive_folder: std::env::var("ONEDRIVE_FOLDER")
                .unwrap_or_else(|_| "Construction Dashboard".to_string()),
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty() && !self.tenant_id.is_empty()
    }
}

/// Integration status report for the UI / health surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStatus {
    pub one_drive_enabled: bool,
    pub outlook_enabled: bool,
    pub auto_backup_enabled: bool,
    pub backup_interval: u64,
    pub one_drive_folder_name: String,
    pub is_authenticated: bool,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Summary manifest written alongside each OneDrive backup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OneDriveBackupSummary {
    pub timestamp: DateTime<Utc>,
    pub files: Vec<String>,
    pub total_files: usize,
    pub backup_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneDriveBackup {
    pub name: String,
    pub created: Option<String>,
    pub modified: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveChildren {
    value: Vec<DriveItem>,
}

#[derive(Debug, Deserialize)]
struct DriveItem {
    name: String,
    #[serde(default)]
    folder: Option<serde_json::Value>,
    #[serde(rename = "createdDateTime")]
    created_date_time: Option<String>,
    #[serde(rename = "lastModifiedDateTime")]
    last_modified_date_time: Option<String>,
}

/// Calendar event creation request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventRequest {
    pub subject: String,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub reminder_minutes: Option<i32>,
}

pub struct GraphClient {
    http: reqwest::Client,
    config: GraphConfig,
    token: Mutex<Option<CachedToken>>,
}

impl GraphClient {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            token: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn status(&self) -> GraphStatus {
        let authenticated = self
            .token
            .lock()
            .map(|guard| {
                guard
                    .as_ref()
                    .is_some_and(|t| t.expires_at > Utc::now())
            })
            .unwrap_or(false);
        GraphStatus {
            one_drive_enabled: self.config.onedrive_enabled,
            outlook_enabled: self.config.outlook_enabled,
            auto_backup_enabled: self.config.auto_backup_enabled,
            backup_interval: self.config.backup_interval_hours,
            one_drive_folder_name: self.config.onedrive_folder.clone(),
            is_authenticated: authenticated,
        }
    }

    /// Acquire (or reuse) an app-only access token.
    async fn access_token(&self) -> Result<String, TransportError> {
        if !self.config.has_credentials() {
            return Err(TransportError::NotConfigured);
        }

        if let Ok(guard) = self.token.lock() {
            if let Some(cached) = guard.as_ref() {
                if cached.expires_at > Utc::now() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let url = format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            self.config.tenant_id
        );
        let response = self
            .http
            .post(&url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", GRAPH_SCOPE),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::Auth(format!("{}: {}", status, message)));
        }

        let token: TokenResponse = response.json().await?;
        let cached = CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Utc::now()
                + Duration::seconds((token.expires_in - TOKEN_EXPIRY_MARGIN_SECS).max(0)),
        };
        if let Ok(mut guard) = self.token.lock() {
            *guard = Some(cached);
        }
        Ok(token.access_token)
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        Err(TransportError::Api { status, message })
    }

    /// Verify credentials by fetching the sender's user record.
    pub async fn test_connection(&self) -> Result<(), TransportError> {
        let token = self.access_token().await?;
        let url = format!("{}/users/{}", GRAPH_BASE, self.config.sender);
        let response = self.http.get(&url).bearer_auth(token).send().await?;
        self.check(response).await?;
        Ok(())
    }

    /// Send a plain-text email through Outlook.
    pub async fn send_mail(
        &self,
        subject: &str,
        content: &str,
        recipients: &[String],
        priority: &str,
    ) -> Result<(), TransportError> {
        if !self.config.outlook_enabled {
            return Err(TransportError::NotConfigured);
        }
        let token = self.access_token().await?;

        let to_recipients: Vec<serde_json::Value> = recipients
            .iter()
            .map(|address| json!({ "emailAddress": { "address": address } }))
            .collect();
        let payload = json!({
            "message": {
                "subject": subject,
                "body": { "contentType": "Text", "content": content },
                "toRecipients": to_recipients,
                "importance": importance(priority),
            },
            "saveToSentItems": true,
        });

        let url = format!("{}/users/{}/sendMail", GRAPH_BASE, self.config.sender);
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;
        self.check(response).await?;
        log::info!("Sent email '{}' to {} recipient(s)", subject, recipients.len());
        Ok(())
    }

    /// Upload every collection file to a timestamped OneDrive backup folder
    /// plus a summary manifest.
    pub async fn backup_to_onedrive(
        &self,
        data_dir: &Path,
    ) -> Result<OneDriveBackupSummary, TransportError> {
        if !self.config.onedrive_enabled {
            return Err(TransportError::NotConfigured);
        }
        let token = self.access_token().await?;

        let timestamp = Utc::now();
        let folder = format!("backup-{}", timestamp.format("%Y-%m-%dT%H-%M-%S"));
        let backup_path = format!("{}/{}", self.config.onedrive_folder, folder);

        let mut files = Vec::new();
        for entry in std::fs::read_dir(data_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.ends_with(".json") {
                continue;
            }
            let bytes = std::fs::read(entry.path())?;
            self.upload_bytes(&token, &format!("{}/{}", backup_path, name), bytes)
                .await?;
            files.push(name);
        }

        let summary = OneDriveBackupSummary {
            timestamp,
            total_files: files.len(),
            files,
            backup_path: backup_path.clone(),
        };
        let manifest = serde_json::to_vec_pretty(&summary)
            .map_err(|e| TransportError::Api { status: 0, message: e.to_string() })?;
        self.upload_bytes(
            &token,
            &format!("{}/backup-summary.json", backup_path),
            manifest,
        )
        .await?;

        log::info!(
            "Backed up {} files to OneDrive at {}",
            summary.total_files,
            summary.backup_path
        );
        Ok(summary)
    }

    async fn upload_bytes(
        &self,
        token: &str,
        drive_path: &str,
        bytes: Vec<u8>,
    ) -> Result<(), TransportError> {
        let url = format!(
            "{}/users/{}/drive/root:/{}:/content",
            GRAPH_BASE, self.config.sender, drive_path
        );
        let response = self
            .http
            .put(&url)
            .bearer_auth(token)
            .body(bytes)
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    /// List backup folders under the configured OneDrive folder.
    pub async fn list_backups(&self) -> Result<Vec<OneDriveBackup>, TransportError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/users/{}/drive/root:/{}:/children",
            GRAPH_BASE, self.config.sender, self.config.onedrive_folder
        );
        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let children: DriveChildren = self.check(response).await?.json().await?;
        Ok(children
            .value
            .into_iter()
            .filter(|item| item.folder.is_some() && item.name.starts_with("backup-"))
            .map(|item| OneDriveBackup {
                name: item.name,
                created: item.created_date_time,
                modified: item.last_modified_date_time,
            })
            .collect())
    }

    /// Create an Outlook calendar event with an optional reminder.
    pub async fn create_calendar_event(
        &self,
        event: &CalendarEventRequest,
    ) -> Result<(), TransportError> {
        if !self.config.outlook_enabled {
            return Err(TransportError::NotConfigured);
        }
        let token = self.access_token().await?;

        let mut payload = json!({
            "subject": event.subject,
            "body": { "contentType": "Text", "content": event.description },
            "start": {
                "dateTime": event.start_time.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": "UTC",
            },
            "end": {
                "dateTime": event.end_time.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": "UTC",
            },
            "location": { "displayName": event.location },
        });
        if let Some(minutes) = event.reminder_minutes {
            payload["isReminderOn"] = json!(true);
            payload["reminderMinutesBeforeStart"] = json!(minutes);
        }

        let url = format!("{}/users/{}/events", GRAPH_BASE, self.config.sender);
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }
}

fn importance(priority: &str) -> &'static str {
    match priority {
        "high" => "high",
        "low" => "low",
        _ => "normal",
    }
}

#[async_trait]
impl Mailer for GraphClient {
    fn is_configured(&self) -> bool {
        self.config.outlook_enabled && self.config.has_credentials()
    }

    async fn send(&self, email: &GeneratedEmail) -> Result<(), TransportError> {
        self.send_mail(&email.subject, &email.body, &[email.to.clone()], "normal")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(outlook: bool, creds: bool) -> GraphConfig {
        GraphConfig {
            client_id: if creds { "id".into() } else { String::new() },
            client_secret: if creds { "secret".into() } else { String::new() },
            tenant_id: if creds { "tenant".into() } else { String::new() },
            sender: "ops@yourcompany.com".into(),
            onedrive_enabled: false,
            outlook_enabled: outlook,
            auto_backup_enabled: false,
            backup_interval_hours: 24,
            onedrive_folder: "Construction Dashboard".into(),
        }
    }

    #[test]
    fn test_importance_mapping() {
        assert_eq!(importance("high"), "high");
        assert_eq!(importance("low"), "low");
        assert_eq!(importance("normal"), "normal");
        assert_eq!(importance("anything"), "normal");
    }

    #[test]
    fn test_is_configured_requires_flag_and_credentials() {
        assert!(GraphClient::new(config(true, true)).is_configured());
        assert!(!GraphClient::new(config(false, true)).is_configured());
        assert!(!GraphClient::new(config(true, false)).is_configured());
    }

    #[test]
    fn test_status_reports_unauthenticated_before_first_token() {
        let client = GraphClient::new(config(true, true));
        let status = client.status();
        assert!(!status.is_authenticated);
        assert!(status.outlook_enabled);
        assert_eq!(status.one_drive_folder_name, "Construction Dashboard");
    }

    #[tokio::test]
    async fn test_send_without_credentials_is_not_configured() {
        let client = GraphClient::new(config(true, false));
        let err = client
            .send_mail("s", "c", &["a@example.com".into()], "normal")
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::NotConfigured));
    }
}
