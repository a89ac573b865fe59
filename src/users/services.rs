use tracing::{info, warn};

use super::{
    dto::{CreateUserRequest, UpdateUserRequest, UserQuery, UserResponse},
    parser::{NewUser, UserChanges, UserParser},
    repo::EmailLookup,
    repo_types::{check_age, Role, User},
};
use crate::{
    auth::password::{hash_password, verify_password},
    error::{AppError, AppResult},
    manager::ResourceManager,
    store::{EntityKind, Filter, UnitOfWork},
    validation::{is_valid_email, normalize_email},
};

/// Tables holding a reference to a user, by referencing column.
const DEPENDENTS: &[(EntityKind, &str)] = &[
    (EntityKind::Doctor, "user_id"),
    (EntityKind::Record, "user_id"),
    (EntityKind::Appointment, "patient_id"),
    (EntityKind::Appointment, "doctor_id"),
    (EntityKind::InsurancePolicy, "patient_id"),
    (EntityKind::Notification, "user_id"),
    (EntityKind::AiResult, "user_id"),
];

/// Rows that need the referenced user to keep the doctor role.
const DOCTOR_DEPENDENTS: &[(EntityKind, &str)] = &[
    (EntityKind::Doctor, "user_id"),
    (EntityKind::Appointment, "doctor_id"),
];

pub struct UserManager<'a> {
    uow: &'a UnitOfWork,
    users: ResourceManager<UserParser>,
}

fn checked_email(raw: &str) -> AppResult<String> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }
    Ok(email)
}

impl<'a> UserManager<'a> {
    pub fn new(uow: &'a UnitOfWork) -> AppResult<Self> {
        Ok(Self {
            uow,
            users: ResourceManager::open(uow)?,
        })
    }

    pub async fn create(&self, req: CreateUserRequest) -> AppResult<UserResponse> {
        let email = checked_email(&req.email)?;
        check_age(req.age)?;
        if self.users.store().find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AppError::ConstraintViolation(
                "Email already registered".into(),
            ));
        }
        let password_hash = hash_password(&req.password)?;

        self.users
            .create(NewUser {
                name: req.name,
                email,
                password_hash,
                role: req.role.unwrap_or_default(),
                gender: req.gender,
                age: req.age,
                dob: req.dob,
                blood_group: req.blood_group,
                address: req.address,
            })
            .await
    }

    pub async fn get(&self, id: &str) -> AppResult<UserResponse> {
        self.users.get(id).await
    }

    pub async fn fetch(&self, id: &str) -> AppResult<User> {
        self.users.fetch(id).await
    }

    pub async fn list(&self, query: UserQuery) -> AppResult<Vec<UserResponse>> {
        let filter = Filter::new()
            .eq_opt("role", query.role.map(|r| r.as_str()))
            .eq_opt("email", query.email.as_deref().map(normalize_email));
        self.users.list(&filter).await
    }

    pub async fn update(&self, id: &str, req: UpdateUserRequest) -> AppResult<UserResponse> {
        if let Some(role) = req.role.filter(|r| *r != Role::Doctor) {
            self.check_demotion(id, role).await?;
        }
        let email = match req.email.as_deref() {
            Some(raw) => {
                let email = checked_email(raw)?;
                if let Some(owner) = self.users.store().find_by_email(&email).await? {
                    if owner.id != id {
                        warn!(email = %email, "email already registered");
                        return Err(AppError::ConstraintViolation(
                            "Email already registered".into(),
                        ));
                    }
                }
                Some(email)
            }
            None => None,
        };
        let password_hash = req
            .password
            .as_deref()
            .map(hash_password)
            .transpose()?;

        self.users
            .update(
                id,
                UserChanges {
                    name: req.name,
                    email,
                    password_hash,
                    role: req.role,
                    gender: req.gender,
                    age: req.age,
                    dob: req.dob,
                    blood_group: req.blood_group,
                    address: req.address,
                },
            )
            .await
    }

    /// A doctor keeps the role while a profile or an appointment names them.
    async fn check_demotion(&self, id: &str, role: Role) -> AppResult<()> {
        let Some(current) = self.users.find(id).await? else {
            return Ok(());
        };
        if current.role != Role::Doctor {
            return Ok(());
        }
        for (kind, column) in DOCTOR_DEPENDENTS {
            let count = self
                .uow
                .get_store(*kind)?
                .count(&Filter::new().eq(*column, id))
                .await?;
            if count > 0 {
                warn!(user_id = %id, to = role.as_str(), dependents = %kind, count, "doctor demotion refused");
                return Err(AppError::ConstraintViolation(format!(
                    "User {id} is still the doctor of {count} {kind}"
                )));
            }
        }
        Ok(())
    }

    /// Refuses while other rows still reference the user.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        if self.users.find(id).await?.is_none() {
            return Ok(false);
        }
        for (kind, column) in DEPENDENTS {
            let count = self
                .uow
                .get_store(*kind)?
                .count(&Filter::new().eq(*column, id))
                .await?;
            if count > 0 {
                warn!(user_id = %id, dependents = %kind, count, "user still referenced");
                return Err(AppError::ConstraintViolation(format!(
                    "User {id} is still referenced by {count} {kind}"
                )));
            }
        }
        self.users.delete(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.users.store().find_by_email(email).await?)
    }

    /// Checks credentials; unknown email and wrong password look the same.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        let invalid = || AppError::Unauthorized("Invalid credentials".into());
        let Some(user) = self.find_by_email(email).await? else {
            warn!(email = %normalize_email(email), "login unknown email");
            return Err(invalid());
        };
        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "login invalid password");
            return Err(invalid());
        }
        info!(user_id = %user.id, "user authenticated");
        Ok(user)
    }
}

/// Creates a user with a fixed password, for tests of dependent entities.
#[cfg(test)]
pub(crate) async fn seed_user(
    uow: &UnitOfWork,
    email: &str,
    role: super::repo_types::Role,
) -> UserResponse {
    UserManager::new(uow)
        .unwrap()
        .create(CreateUserRequest {
            name: email.split('@').next().unwrap_or("user").to_string(),
            email: email.to_string(),
            password: "correct-horse".into(),
            role: Some(role),
            gender: None,
            age: None,
            dob: None,
            blood_group: None,
            address: None,
        })
        .await
        .unwrap()
}
