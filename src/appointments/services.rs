use tracing::{info, warn};

use super::{
    dto::{
        AppointmentQuery, AppointmentResponse, CreateAppointmentRequest, UpdateAppointmentRequest,
    },
    parser::AppointmentParser,
    repo_types::{AppointmentPatch, AppointmentStatus},
};
use crate::{
    doctors::services::require_doctor_user,
    error::{AppError, AppResult},
    manager::{require_related, ResourceManager},
    parser::Parser,
    store::{Filter, UnitOfWork},
    users::repo_types::User,
};

pub struct AppointmentManager<'a> {
    uow: &'a UnitOfWork,
    appointments: ResourceManager<AppointmentParser>,
}

impl<'a> AppointmentManager<'a> {
    pub fn new(uow: &'a UnitOfWork) -> AppResult<Self> {
        Ok(Self {
            uow,
            appointments: ResourceManager::open(uow)?,
        })
    }

    pub async fn create(&self, req: CreateAppointmentRequest) -> AppResult<AppointmentResponse> {
        require_related::<User>(self.uow, &req.patient_id).await?;
        require_doctor_user(self.uow, &req.doctor_id).await?;
        if req.patient_id == req.doctor_id {
            return Err(AppError::Validation(
                "Patient and doctor must be different users".into(),
            ));
        }
        self.appointments.create(req).await
    }

    pub async fn get(&self, id: &str) -> AppResult<AppointmentResponse> {
        self.appointments.get(id).await
    }

    pub async fn list(&self, query: AppointmentQuery) -> AppResult<Vec<AppointmentResponse>> {
        let filter = Filter::new()
            .eq_opt("patient_id", query.patient_id)
            .eq_opt("doctor_id", query.doctor_id)
            .eq_opt("status", query.status.map(|s| s.as_str()));
        self.appointments.list(&filter).await
    }

    pub async fn update(
        &self,
        id: &str,
        req: UpdateAppointmentRequest,
    ) -> AppResult<AppointmentResponse> {
        self.appointments.update(id, req).await
    }

    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        self.appointments.delete(id).await
    }

    /// Cancelling twice is a no-op; a completed appointment stays completed.
    pub async fn cancel(&self, id: &str) -> AppResult<AppointmentResponse> {
        self.transition(id, AppointmentStatus::Cancelled).await
    }

    pub async fn complete(&self, id: &str) -> AppResult<AppointmentResponse> {
        self.transition(id, AppointmentStatus::Completed).await
    }

    async fn transition(
        &self,
        id: &str,
        next: AppointmentStatus,
    ) -> AppResult<AppointmentResponse> {
        let current = self.appointments.fetch(id).await?;
        if current.status == next {
            return Ok(AppointmentParser::to_response(current));
        }
        if !current.status.can_become(next) {
            warn!(appointment_id = %id, from = current.status.as_str(), to = next.as_str(), "illegal transition");
            return Err(AppError::Validation(format!(
                "Appointment is already {}",
                current.status.as_str()
            )));
        }
        let updated = self
            .appointments
            .patch(
                id,
                AppointmentPatch {
                    status: Some(next),
                    ..Default::default()
                },
            )
            .await?;
        info!(appointment_id = %id, status = next.as_str(), "appointment status changed");
        Ok(AppointmentParser::to_response(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        appointments::repo_types::AppointmentMode,
        store::StoreRegistry,
        users::{repo_types::Role, services::seed_user},
    };
    use time::macros::datetime;

    fn booking(patient_id: &str, doctor_id: &str) -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            patient_id: patient_id.into(),
            doctor_id: doctor_id.into(),
            scheduled_at: datetime!(2026-05-04 10:00 UTC),
            duration_minutes: Some(45),
            mode: AppointmentMode::Audio,
            reason: Some("follow-up".into()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn doctor_must_have_doctor_role() {
        let uow = StoreRegistry::memory().begin().await.unwrap();
        let patient = seed_user(&uow, "pat@example.com", Role::Patient).await;
        let other = seed_user(&uow, "sam@example.com", Role::Patient).await;
        let mgr = AppointmentManager::new(&uow).unwrap();

        assert!(matches!(
            mgr.create(booking(&patient.id, &other.id)).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            mgr.create(booking("ghost", &other.id)).await,
            Err(AppError::ConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn cancel_is_idempotent_and_final() {
        let uow = StoreRegistry::memory().begin().await.unwrap();
        let patient = seed_user(&uow, "pat@example.com", Role::Patient).await;
        let doctor = seed_user(&uow, "house@clinic.org", Role::Doctor).await;
        let mgr = AppointmentManager::new(&uow).unwrap();

        let appt = mgr.create(booking(&patient.id, &doctor.id)).await.unwrap();
        assert_eq!(appt.status, AppointmentStatus::Scheduled);

        let first = mgr.cancel(&appt.id).await.unwrap();
        let second = mgr.cancel(&appt.id).await.unwrap();
        assert_eq!(first.status, AppointmentStatus::Cancelled);
        assert_eq!(second.status, AppointmentStatus::Cancelled);
        assert!(matches!(
            mgr.complete(&appt.id).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn completed_appointment_cannot_be_cancelled() {
        let uow = StoreRegistry::memory().begin().await.unwrap();
        let patient = seed_user(&uow, "pat@example.com", Role::Patient).await;
        let doctor = seed_user(&uow, "house@clinic.org", Role::Doctor).await;
        let mgr = AppointmentManager::new(&uow).unwrap();

        let appt = mgr.create(booking(&patient.id, &doctor.id)).await.unwrap();
        mgr.complete(&appt.id).await.unwrap();
        assert!(matches!(
            mgr.cancel(&appt.id).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            mgr.cancel("missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn list_filters_by_doctor_and_status() {
        let uow = StoreRegistry::memory().begin().await.unwrap();
        let patient = seed_user(&uow, "pat@example.com", Role::Patient).await;
        let house = seed_user(&uow, "house@clinic.org", Role::Doctor).await;
        let grey = seed_user(&uow, "grey@clinic.org", Role::Doctor).await;
        let mgr = AppointmentManager::new(&uow).unwrap();

        let a = mgr.create(booking(&patient.id, &house.id)).await.unwrap();
        mgr.create(booking(&patient.id, &house.id)).await.unwrap();
        mgr.create(booking(&patient.id, &grey.id)).await.unwrap();
        mgr.cancel(&a.id).await.unwrap();

        let for_house = mgr
            .list(AppointmentQuery {
                doctor_id: Some(house.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_house.len(), 2);

        let cancelled = mgr
            .list(AppointmentQuery {
                status: Some(AppointmentStatus::Cancelled),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].id, a.id);
    }

    #[tokio::test]
    async fn update_rejects_illegal_status_and_duration() {
        let uow = StoreRegistry::memory().begin().await.unwrap();
        let patient = seed_user(&uow, "pat@example.com", Role::Patient).await;
        let doctor = seed_user(&uow, "house@clinic.org", Role::Doctor).await;
        let mgr = AppointmentManager::new(&uow).unwrap();
        let appt = mgr.create(booking(&patient.id, &doctor.id)).await.unwrap();

        let err = mgr
            .update(
                &appt.id,
                UpdateAppointmentRequest {
                    duration_minutes: Some(600),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let moved = mgr
            .update(
                &appt.id,
                UpdateAppointmentRequest {
                    notes: Some("bring labs".into()),
                    status: Some(AppointmentStatus::InProgress),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.status, AppointmentStatus::InProgress);
        assert_eq!(moved.duration_minutes, 45);
        assert_eq!(moved.reason.as_deref(), Some("follow-up"));
    }
}
