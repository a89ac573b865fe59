use tracing::warn;

use super::{
    dto::{CreateDoctorRequest, DoctorQuery, DoctorResponse, UpdateDoctorRequest},
    parser::DoctorParser,
};
use crate::{
    error::{AppError, AppResult},
    manager::{require_related, ResourceManager},
    store::{Filter, UnitOfWork},
    users::repo_types::{Role, User},
};

/// Loads a user that must exist and act as a doctor.
pub async fn require_doctor_user(uow: &UnitOfWork, user_id: &str) -> AppResult<User> {
    let user = require_related::<User>(uow, user_id).await?;
    if user.role != Role::Doctor {
        warn!(%user_id, role = user.role.as_str(), "user is not a doctor");
        return Err(AppError::Validation(format!("User {user_id} is not a doctor")));
    }
    Ok(user)
}

pub struct DoctorManager<'a> {
    uow: &'a UnitOfWork,
    doctors: ResourceManager<DoctorParser>,
}

impl<'a> DoctorManager<'a> {
    pub fn new(uow: &'a UnitOfWork) -> AppResult<Self> {
        Ok(Self {
            uow,
            doctors: ResourceManager::open(uow)?,
        })
    }

    pub async fn create(&self, mut req: CreateDoctorRequest) -> AppResult<DoctorResponse> {
        let user = require_doctor_user(self.uow, &req.user_id).await?;
        if req.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            req.name = Some(user.name);
        }
        self.doctors.create(req).await
    }

    pub async fn get(&self, id: &str) -> AppResult<DoctorResponse> {
        self.doctors.get(id).await
    }

    pub async fn list(&self, query: DoctorQuery) -> AppResult<Vec<DoctorResponse>> {
        let filter = Filter::new()
            .eq_opt("specialization", query.specialization)
            .eq_opt("user_id", query.user_id);
        self.doctors.list(&filter).await
    }

    pub async fn update(&self, id: &str, req: UpdateDoctorRequest) -> AppResult<DoctorResponse> {
        self.doctors.update(id, req).await
    }

    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        self.doctors.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{store::StoreRegistry, users::services::seed_user};

    fn profile(user_id: &str) -> CreateDoctorRequest {
        CreateDoctorRequest {
            user_id: user_id.into(),
            name: None,
            specialization: Some("cardiology".into()),
            qualifications: Some("MD".into()),
            languages: Some("en,fr".into()),
            clinic_address: None,
        }
    }

    #[tokio::test]
    async fn profile_takes_user_name_by_default() {
        let uow = StoreRegistry::memory().begin().await.unwrap();
        let user = seed_user(&uow, "house@clinic.org", Role::Doctor).await;
        let mgr = DoctorManager::new(&uow).unwrap();

        let doctor = mgr.create(profile(&user.id)).await.unwrap();
        assert_eq!(doctor.name, "house");
        assert_eq!(doctor.user_id, user.id);

        let cardio = mgr
            .list(DoctorQuery {
                specialization: Some("cardiology".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(cardio.len(), 1);
    }

    #[tokio::test]
    async fn patient_cannot_become_a_doctor_profile() {
        let uow = StoreRegistry::memory().begin().await.unwrap();
        let user = seed_user(&uow, "pat@example.com", Role::Patient).await;
        let mgr = DoctorManager::new(&uow).unwrap();
        assert!(matches!(
            mgr.create(profile(&user.id)).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            mgr.create(profile("ghost")).await,
            Err(AppError::ConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn one_profile_per_user() {
        let uow = StoreRegistry::memory().begin().await.unwrap();
        let user = seed_user(&uow, "house@clinic.org", Role::Doctor).await;
        let mgr = DoctorManager::new(&uow).unwrap();
        mgr.create(profile(&user.id)).await.unwrap();
        assert!(matches!(
            mgr.create(profile(&user.id)).await,
            Err(AppError::ConstraintViolation(_))
        ));
    }
}
