use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

use crate::{
    store::{AnyStore, Entity, EntityKind, FieldValue, ResourceStore, StoreError, StoreResult},
    validation::{check_email, check_not_blank, normalize_email},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Patient,
    Doctor,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
        }
    }
}

impl TryFrom<String> for Role {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            "admin" => Ok(Role::Admin),
            other => Err(StoreError::Validation(format!("unknown role `{other}`"))),
        }
    }
}

/// User row. `password_hash` is an argon2 PHC string and never leaves the service.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub dob: Option<Date>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub dob: Option<Date>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
}

pub fn check_age(age: Option<i32>) -> StoreResult<()> {
    match age {
        Some(a) if !(0..=150).contains(&a) => Err(StoreError::Validation(format!(
            "age must be between 0 and 150, got {a}"
        ))),
        _ => Ok(()),
    }
}

impl Entity for User {
    type Patch = UserPatch;

    const KIND: EntityKind = EntityKind::User;
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "email",
        "password_hash",
        "role",
        "gender",
        "age",
        "dob",
        "blood_group",
        "address",
        "created_at",
    ];
    const UNIQUE: &'static [&'static str] = &["email"];

    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.clone().into(),
            self.name.clone().into(),
            self.email.clone().into(),
            self.password_hash.clone().into(),
            self.role.as_str().into(),
            self.gender.clone().into(),
            self.age.into(),
            self.dob.into(),
            self.blood_group.clone().into(),
            self.address.clone().into(),
            self.created_at.into(),
        ]
    }

    fn apply(&mut self, patch: UserPatch) -> StoreResult<()> {
        if let Some(name) = patch.name {
            check_not_blank("name", &name)?;
            self.name = name;
        }
        if let Some(email) = patch.email {
            let email = normalize_email(&email);
            check_email(&email)?;
            self.email = email;
        }
        if let Some(hash) = patch.password_hash {
            self.password_hash = hash;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if patch.age.is_some() {
            check_age(patch.age)?;
            self.age = patch.age;
        }
        if patch.gender.is_some() {
            self.gender = patch.gender;
        }
        if patch.dob.is_some() {
            self.dob = patch.dob;
        }
        if patch.blood_group.is_some() {
            self.blood_group = patch.blood_group;
        }
        if patch.address.is_some() {
            self.address = patch.address;
        }
        Ok(())
    }

    fn into_any(store: Arc<dyn ResourceStore<Self>>) -> AnyStore {
        AnyStore::Users(store)
    }

    fn from_any(store: &AnyStore) -> Option<Arc<dyn ResourceStore<Self>>> {
        match store {
            AnyStore::Users(s) => Some(s.clone()),
            _ => None,
        }
    }
}
