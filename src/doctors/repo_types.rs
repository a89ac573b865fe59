use std::sync::Arc;

use sqlx::FromRow;
use time::OffsetDateTime;

use crate::{
    store::{AnyStore, Entity, EntityKind, FieldValue, ResourceStore, StoreResult},
    validation::check_not_blank,
};

/// Professional profile attached to a user whose role is `doctor`.
#[derive(Debug, Clone, FromRow)]
pub struct Doctor {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub specialization: Option<String>,
    pub qualifications: Option<String>,
    pub languages: Option<String>,
    pub clinic_address: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct DoctorPatch {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub qualifications: Option<String>,
    pub languages: Option<String>,
    pub clinic_address: Option<String>,
}

impl Entity for Doctor {
    type Patch = DoctorPatch;

    const KIND: EntityKind = EntityKind::Doctor;
    const TABLE: &'static str = "doctors";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "name",
        "specialization",
        "qualifications",
        "languages",
        "clinic_address",
        "created_at",
    ];
    const UNIQUE: &'static [&'static str] = &["user_id"];

    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.clone().into(),
            self.user_id.clone().into(),
            self.name.clone().into(),
            self.specialization.clone().into(),
            self.qualifications.clone().into(),
            self.languages.clone().into(),
            self.clinic_address.clone().into(),
            self.created_at.into(),
        ]
    }

    fn apply(&mut self, patch: DoctorPatch) -> StoreResult<()> {
        if let Some(name) = patch.name {
            check_not_blank("name", &name)?;
            self.name = name;
        }
        if patch.specialization.is_some() {
            self.specialization = patch.specialization;
        }
        if patch.qualifications.is_some() {
            self.qualifications = patch.qualifications;
        }
        if patch.languages.is_some() {
            self.languages = patch.languages;
        }
        if patch.clinic_address.is_some() {
            self.clinic_address = patch.clinic_address;
        }
        Ok(())
    }

    fn into_any(store: Arc<dyn ResourceStore<Self>>) -> AnyStore {
        AnyStore::Doctors(store)
    }

    fn from_any(store: &AnyStore) -> Option<Arc<dyn ResourceStore<Self>>> {
        match store {
            AnyStore::Doctors(s) => Some(s.clone()),
            _ => None,
        }
    }
}
