use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::store::{
    AnyStore, Entity, EntityKind, FieldValue, ResourceStore, StoreError, StoreResult,
};

pub const DEFAULT_DURATION_MINUTES: i32 = 30;
pub const MAX_DURATION_MINUTES: i32 = 480;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentMode {
    #[default]
    Video,
    Audio,
    InPerson,
}

impl AppointmentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentMode::Video => "video",
            AppointmentMode::Audio => "audio",
            AppointmentMode::InPerson => "in_person",
        }
    }
}

impl TryFrom<String> for AppointmentMode {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "video" => Ok(AppointmentMode::Video),
            "audio" => Ok(AppointmentMode::Audio),
            "in_person" => Ok(AppointmentMode::InPerson),
            other => Err(StoreError::Validation(format!(
                "unknown appointment mode `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }

    /// Staying in the same state is always allowed.
    pub fn can_become(self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        self == next
            || matches!(
                (self, next),
                (Scheduled, InProgress | Completed | Cancelled) | (InProgress, Completed | Cancelled)
            )
    }
}

impl TryFrom<String> for AppointmentStatus {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "in_progress" => Ok(AppointmentStatus::InProgress),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(StoreError::Validation(format!(
                "unknown appointment status `{other}`"
            ))),
        }
    }
}

/// `doctor_id` is the user id of the doctor, not the profile id.
#[derive(Debug, Clone, FromRow)]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub scheduled_at: OffsetDateTime,
    pub duration_minutes: i32,
    #[sqlx(try_from = "String")]
    pub mode: AppointmentMode,
    #[sqlx(try_from = "String")]
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct AppointmentPatch {
    pub scheduled_at: Option<OffsetDateTime>,
    pub duration_minutes: Option<i32>,
    pub mode: Option<AppointmentMode>,
    pub status: Option<AppointmentStatus>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

pub fn check_duration(minutes: i32) -> StoreResult<()> {
    if (1..=MAX_DURATION_MINUTES).contains(&minutes) {
        Ok(())
    } else {
        Err(StoreError::Validation(format!(
            "duration_minutes must be between 1 and {MAX_DURATION_MINUTES}, got {minutes}"
        )))
    }
}

impl Entity for Appointment {
    type Patch = AppointmentPatch;

    const KIND: EntityKind = EntityKind::Appointment;
    const TABLE: &'static str = "appointments";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "patient_id",
        "doctor_id",
        "scheduled_at",
        "duration_minutes",
        "mode",
        "status",
        "reason",
        "notes",
        "created_at",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.clone().into(),
            self.patient_id.clone().into(),
            self.doctor_id.clone().into(),
            self.scheduled_at.into(),
            self.duration_minutes.into(),
            self.mode.as_str().into(),
            self.status.as_str().into(),
            self.reason.clone().into(),
            self.notes.clone().into(),
            self.created_at.into(),
        ]
    }

    fn apply(&mut self, patch: AppointmentPatch) -> StoreResult<()> {
        if let Some(next) = patch.status {
            if !self.status.can_become(next) {
                return Err(StoreError::Validation(format!(
                    "appointment cannot go from {} to {}",
                    self.status.as_str(),
                    next.as_str()
                )));
            }
        }
        if let Some(minutes) = patch.duration_minutes {
            check_duration(minutes)?;
            self.duration_minutes = minutes;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(at) = patch.scheduled_at {
            self.scheduled_at = at;
        }
        if let Some(mode) = patch.mode {
            self.mode = mode;
        }
        if patch.reason.is_some() {
            self.reason = patch.reason;
        }
        if patch.notes.is_some() {
            self.notes = patch.notes;
        }
        Ok(())
    }

    fn into_any(store: Arc<dyn ResourceStore<Self>>) -> AnyStore {
        AnyStore::Appointments(store)
    }

    fn from_any(store: &AnyStore) -> Option<Arc<dyn ResourceStore<Self>>> {
        match store {
            AnyStore::Appointments(s) => Some(s.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AppointmentStatus::*;
    use super::*;

    #[test]
    fn status_transitions() {
        assert!(Scheduled.can_become(InProgress));
        assert!(Scheduled.can_become(Cancelled));
        assert!(InProgress.can_become(Completed));
        assert!(Cancelled.can_become(Cancelled));
        assert!(!Completed.can_become(Cancelled));
        assert!(!Cancelled.can_become(Scheduled));
        assert!(!InProgress.can_become(Scheduled));
        assert!(Completed.is_terminal() && !Scheduled.is_terminal());
    }

    #[test]
    fn mode_text_roundtrip() {
        for mode in [
            AppointmentMode::Video,
            AppointmentMode::Audio,
            AppointmentMode::InPerson,
        ] {
            assert_eq!(AppointmentMode::try_from(mode.as_str().to_string()).unwrap(), mode);
        }
        assert!(AppointmentMode::try_from("fax".to_string()).is_err());
    }
}
