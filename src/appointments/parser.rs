use super::{
    dto::{AppointmentResponse, CreateAppointmentRequest, UpdateAppointmentRequest},
    repo_types::{
        check_duration, Appointment, AppointmentPatch, AppointmentStatus, DEFAULT_DURATION_MINUTES,
    },
};
use crate::parser::{new_id, now, require, ParseError, Parser};

pub struct AppointmentParser;

impl Parser for AppointmentParser {
    type Entity = Appointment;
    type Create = CreateAppointmentRequest;
    type Update = UpdateAppointmentRequest;
    type Response = AppointmentResponse;

    fn to_entity(req: CreateAppointmentRequest) -> Result<Appointment, ParseError> {
        let duration_minutes = req.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
        check_duration(duration_minutes).map_err(|e| ParseError::Invalid {
            field: "duration_minutes",
            reason: e.to_string(),
        })?;
        Ok(Appointment {
            id: new_id(),
            patient_id: require("patient_id", req.patient_id)?,
            doctor_id: require("doctor_id", req.doctor_id)?,
            scheduled_at: req.scheduled_at,
            duration_minutes,
            mode: req.mode,
            status: AppointmentStatus::Scheduled,
            reason: req.reason,
            notes: req.notes,
            created_at: now(),
        })
    }

    fn to_patch(req: UpdateAppointmentRequest) -> Result<AppointmentPatch, ParseError> {
        Ok(AppointmentPatch {
            scheduled_at: req.scheduled_at,
            duration_minutes: req.duration_minutes,
            mode: req.mode,
            status: req.status,
            reason: req.reason,
            notes: req.notes,
        })
    }

    fn to_response(a: Appointment) -> AppointmentResponse {
        AppointmentResponse {
            id: a.id,
            patient_id: a.patient_id,
            doctor_id: a.doctor_id,
            scheduled_at: a.scheduled_at,
            duration_minutes: a.duration_minutes,
            mode: a.mode,
            status: a.status,
            reason: a.reason,
            notes: a.notes,
            created_at: a.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments::repo_types::AppointmentMode;

    #[test]
    fn defaults_apply_on_create() {
        let req: CreateAppointmentRequest = serde_json::from_str(
            r#"{"patient_id":"p-1","doctor_id":"d-1","scheduled_at":"2026-03-01T09:30:00Z"}"#,
        )
        .unwrap();
        let a = AppointmentParser::to_entity(req).unwrap();
        assert_eq!(a.duration_minutes, 30);
        assert_eq!(a.mode, AppointmentMode::Video);
        assert_eq!(a.status, AppointmentStatus::Scheduled);

        let json = serde_json::to_value(AppointmentParser::to_response(a)).unwrap();
        assert_eq!(json["status"], "scheduled");
        assert_eq!(json["scheduled_at"], "2026-03-01T09:30:00Z");
    }

    #[test]
    fn zero_duration_is_invalid() {
        let req: CreateAppointmentRequest = serde_json::from_str(
            r#"{"patient_id":"p","doctor_id":"d","scheduled_at":"2026-03-01T09:30:00Z","duration_minutes":0,"mode":"in_person"}"#,
        )
        .unwrap();
        assert!(matches!(
            AppointmentParser::to_entity(req),
            Err(ParseError::Invalid { field: "duration_minutes", .. })
        ));
    }
}
