//! JSON-file-backed record store.
//!
//! One file per collection under the data directory. Each request reads the
//! file, mutates, and writes it back atomically. Last write wins, no
//! cross-request locking (single-operator use). Referential integrity is not
//! enforced here; consumers resolve dangling ids to "Unknown" placeholders.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::types::{
    Communication, CommunicationStatus, CommunicationType, EmailRecipient, Priority, Project,
    ProjectStatus, Prospect, Settings, Stakeholder,
};
use crate::util::{atomic_write_str, new_id};

/// A storable entity: knows its collection file and carries id + timestamps.
pub trait Record: Serialize + DeserializeOwned + Clone {
    const FILE_NAME: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn created_at(&self) -> Option<DateTime<Utc>>;
    fn set_created_at(&mut self, at: DateTime<Utc>);
    fn set_updated_at(&mut self, at: DateTime<Utc>);
}

macro_rules! impl_record {
    ($ty:ty, $file:expr) => {
        impl Record for $ty {
            const FILE_NAME: &'static str = $file;

            fn id(&self) -> &str {
                &self.id
            }
            fn set_id(&mut self, id: String) {
                self.id = id;
            }
            fn created_at(&self) -> Option<DateTime<Utc>> {
                self.created_at
            }
            fn set_created_at(&mut self, at: DateTime<Utc>) {
                self.created_at = Some(at);
            }
            fn set_updated_at(&mut self, at: DateTime<Utc>) {
                self.updated_at = Some(at);
            }
        }
    };
}

impl_record!(Project, "projects.json");
impl_record!(Communication, "communications.json");
impl_record!(Prospect, "prospects.json");
impl_record!(Stakeholder, "stakeholders.json");
impl_record!(EmailRecipient, "email-recipients.json");

/// Full-snapshot export/import payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    pub projects: Vec<Project>,
    pub communications: Vec<Communication>,
    pub prospects: Vec<Prospect>,
    pub stakeholders: Vec<Stakeholder>,
    pub email_recipients: Vec<EmailRecipient>,
    pub settings: Settings,
    pub export_date: DateTime<Utc>,
}

pub struct RecordStore {
    data_dir: PathBuf,
}

impl RecordStore {
    /// Open (and create if needed) a store rooted at `data_dir`.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir).map_err(|source| StoreError::Io {
            path: data_dir.clone(),
            source,
        })?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn collection_path(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }

    fn read_file<T: DeserializeOwned>(&self, file_name: &str) -> Result<Option<T>, StoreError> {
        let path = self.collection_path(file_name);
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Json { path, source })
    }

    fn write_file<T: Serialize>(&self, file_name: &str, value: &T) -> Result<(), StoreError> {
        let path = self.collection_path(file_name);
        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        atomic_write_str(&path, &json).map_err(|source| StoreError::Io { path, source })
    }

    /// All records in a collection (missing file reads as empty).
    pub fn list<T: Record>(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.read_file(T::FILE_NAME)?.unwrap_or_default())
    }

    pub fn get<T: Record>(&self, id: &str) -> Result<Option<T>, StoreError> {
        Ok(self.list::<T>()?.into_iter().find(|r| r.id() == id))
    }

    /// Insert a record, assigning an id and `createdAt` when absent.
    pub fn add<T: Record>(&self, mut record: T) -> Result<T, StoreError> {
        if record.id().is_empty() {
            record.set_id(new_id());
        }
        if record.created_at().is_none() {
            record.set_created_at(Utc::now());
        }
        let mut records = self.list::<T>()?;
        records.push(record.clone());
        self.write_file(T::FILE_NAME, &records)?;
        Ok(record)
    }

    /// Replace a record by id and stamp `updatedAt`.
    pub fn update<T: Record>(&self, mut record: T) -> Result<T, StoreError> {
        let mut records = self.list::<T>()?;
        let slot = records
            .iter_mut()
            .find(|r| r.id() == record.id())
            .ok_or_else(|| StoreError::NotFound(record.id().to_string()))?;
        record.set_updated_at(Utc::now());
        *slot = record.clone();
        self.write_file(T::FILE_NAME, &records)?;
        Ok(record)
    }

    pub fn delete<T: Record>(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.list::<T>()?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.write_file(T::FILE_NAME, &records)
    }

    /// Delete a project and every communication it owns. Returns the number
    /// of communications removed alongside the project.
    pub fn delete_project_cascade(&self, project_id: &str) -> Result<usize, StoreError> {
        self.delete::<Project>(project_id)?;
        let mut communications = self.list::<Communication>()?;
        let before = communications.len();
        communications.retain(|c| c.project_id != project_id);
        let removed = before - communications.len();
        if removed > 0 {
            self.write_file(Communication::FILE_NAME, &communications)?;
        }
        Ok(removed)
    }

    /// Delete an email recipient; when it was the last recipient for its
    /// stakeholder, clear that stakeholder's `receivesEmails` flag.
    pub fn delete_email_recipient(&self, id: &str) -> Result<(), StoreError> {
        let recipient: EmailRecipient = self
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.delete::<EmailRecipient>(id)?;

        let remaining = self
            .list::<EmailRecipient>()?
            .iter()
            .any(|r| r.stakeholder_id == recipient.stakeholder_id);
        if !remaining {
            if let Some(mut stakeholder) = self.get::<Stakeholder>(&recipient.stakeholder_id)? {
                if stakeholder.receives_emails {
                    stakeholder.receives_emails = false;
                    self.update(stakeholder)?;
                }
            }
        }
        Ok(())
    }

    /// The settings singleton (built-in defaults when the file is missing).
    pub fn settings(&self) -> Result<Settings, StoreError> {
        Ok(self.read_file("settings.json")?.unwrap_or_default())
    }

    pub fn put_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        self.write_file("settings.json", settings)
    }

    /// Export every collection as one snapshot.
    pub fn export_backup(&self) -> Result<BackupSnapshot, StoreError> {
        Ok(BackupSnapshot {
            projects: self.list()?,
            communications: self.list()?,
            prospects: self.list()?,
            stakeholders: self.list()?,
            email_recipients: self.list()?,
            settings: self.settings()?,
            export_date: Utc::now(),
        })
    }

    /// Overwrite every collection from a snapshot.
    pub fn restore_backup(&self, snapshot: &BackupSnapshot) -> Result<(), StoreError> {
        self.write_file(Project::FILE_NAME, &snapshot.projects)?;
        self.write_file(Communication::FILE_NAME, &snapshot.communications)?;
        self.write_file(Prospect::FILE_NAME, &snapshot.prospects)?;
        self.write_file(Stakeholder::FILE_NAME, &snapshot.stakeholders)?;
        self.write_file(EmailRecipient::FILE_NAME, &snapshot.email_recipients)?;
        self.put_settings(&snapshot.settings)?;
        log::info!(
            "Restored backup from {}: {} projects, {} communications",
            snapshot.export_date,
            snapshot.projects.len(),
            snapshot.communications.len()
        );
        Ok(())
    }

    /// Populate an empty store with starter data. Returns true if seeded.
    pub fn seed_sample_data(&self) -> Result<bool, StoreError> {
        if self.collection_path(Project::FILE_NAME).exists() {
            return Ok(false);
        }
        log::info!("Initializing store with sample data");

        let now = Utc::now();
        let stakeholders = vec![
            Stakeholder {
                id: "stake_1".into(),
                name: "John Smith".into(),
                role: "Project Manager".into(),
                company: "Your Construction Company".into(),
                email: Some("john.smith@yourcompany.com".into()),
                phone: Some("(555) 123-4567".into()),
                receives_emails: true,
                created_at: Some(now),
                updated_at: None,
            },
            Stakeholder {
                id: "stake_2".into(),
                name: "Mike Johnson".into(),
                role: "Superintendent".into(),
                company: "Your Construction Company".into(),
                email: Some("mike.johnson@yourcompany.com".into()),
                phone: Some("(555) 123-4568".into()),
                receives_emails: true,
                created_at: Some(now),
                updated_at: None,
            },
            Stakeholder {
                id: "stake_3".into(),
                name: "Sarah Wilson".into(),
                role: "Architect".into(),
                company: "Design Associates".into(),
                email: Some("sarah.wilson@designassoc.com".into()),
                phone: Some("(555) 234-5678".into()),
                receives_emails: false,
                created_at: Some(now),
                updated_at: None,
            },
        ];

        let projects = vec![Project {
            id: "proj_1".into(),
            number: "2025-001".into(),
            name: "Alpha Office Building".into(),
            client: "Alpha Corp".into(),
            project_manager_id: Some("stake_1".into()),
            superintendent_id: Some("stake_2".into()),
            start_date: chrono::NaiveDate::from_ymd_opt(2025, 7, 1),
            end_date: chrono::NaiveDate::from_ymd_opt(2025, 12, 31),
            contract_value: Some(750_000.0),
            status: ProjectStatus::Active,
            created_at: Some(now),
            updated_at: None,
        }];

        let communications = vec![Communication {
            id: "comm_1".into(),
            project_id: "proj_1".into(),
            stakeholder_id: Some("stake_3".into()),
            kind: CommunicationType::Rfi,
            subject: "Electrical layout clarification".into(),
            notes: "Need clarification on electrical outlet placement in conference rooms".into(),
            priority: Priority::Medium,
            status: CommunicationStatus::Pending,
            due_date: chrono::NaiveDate::from_ymd_opt(2025, 8, 5),
            created_at: Some(now),
            updated_at: None,
        }];

        let prospects = vec![Prospect {
            id: "pros_1".into(),
            name: "Beta Warehouse Project".into(),
            client: "Beta Industries".into(),
            estimator_id: Some("stake_1".into()),
            walk_date: chrono::NaiveDate::from_ymd_opt(2025, 8, 15),
            proposal_due_date: chrono::NaiveDate::from_ymd_opt(2025, 8, 30),
            estimated_value: Some(950_000.0),
            probability: 70,
            notes: "Strong relationship with client, good chance of winning".into(),
            status: "active".into(),
            created_at: Some(now),
            updated_at: None,
        }];

        self.write_file(Stakeholder::FILE_NAME, &stakeholders)?;
        self.write_file(Project::FILE_NAME, &projects)?;
        self.write_file(Communication::FILE_NAME, &communications)?;
        self.write_file(Prospect::FILE_NAME, &prospects)?;
        self.write_file(EmailRecipient::FILE_NAME, &Vec::<EmailRecipient>::new())?;
        self.put_settings(&Settings {
            email_signature:
                "Best regards,\nProject Engineering Department\nYour Construction Company".into(),
            ..Settings::default()
        })?;
        Ok(true)
    }
}
