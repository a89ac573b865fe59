use super::{
    dto::{CreateNotificationRequest, NotificationResponse, UpdateNotificationRequest},
    repo_types::{Notification, NotificationPatch, MAX_TITLE_LEN},
};
use crate::{
    parser::{new_id, now, require, require_opt, ParseError, Parser},
    validation::check_max_len,
};

pub struct NotificationParser;

impl Parser for NotificationParser {
    type Entity = Notification;
    type Create = CreateNotificationRequest;
    type Update = UpdateNotificationRequest;
    type Response = NotificationResponse;

    fn to_entity(req: CreateNotificationRequest) -> Result<Notification, ParseError> {
        let title = require("title", req.title)?;
        check_max_len("title", Some(title.as_str()), MAX_TITLE_LEN).map_err(|e| {
            ParseError::Invalid {
                field: "title",
                reason: e.to_string(),
            }
        })?;
        Ok(Notification {
            id: new_id(),
            user_id: require("user_id", req.user_id)?,
            title,
            message: require("message", req.message)?,
            kind: require("type", req.kind)?,
            read: false,
            created_at: now(),
            read_at: None,
        })
    }

    fn to_patch(req: UpdateNotificationRequest) -> Result<NotificationPatch, ParseError> {
        Ok(NotificationPatch {
            title: require_opt("title", req.title)?,
            message: require_opt("message", req.message)?,
            kind: require_opt("type", req.kind)?,
            read: req.read,
        })
    }

    fn to_response(n: Notification) -> NotificationResponse {
        NotificationResponse {
            id: n.id,
            user_id: n.user_id,
            title: n.title,
            message: n.message,
            kind: n.kind,
            read: n.read,
            created_at: n.created_at,
            read_at: n.read_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_defaults_to_general() {
        let req: CreateNotificationRequest = serde_json::from_value(json!({
            "user_id": "u-1",
            "title": "Hello",
            "message": "Welcome aboard"
        }))
        .unwrap();
        let json = serde_json::to_value(NotificationParser::to_response(
            NotificationParser::to_entity(req).unwrap(),
        ))
        .unwrap();
        assert_eq!(json["type"], "general");
        assert_eq!(json["read"], false);
        assert!(json["read_at"].is_null());
    }

    #[test]
    fn blank_message_is_rejected() {
        let req = CreateNotificationRequest {
            user_id: "u-1".into(),
            title: "Hello".into(),
            message: "  ".into(),
            kind: "general".into(),
        };
        assert!(matches!(
            NotificationParser::to_entity(req),
            Err(ParseError::MissingField("message"))
        ));
    }

    #[test]
    fn title_longer_than_column_is_rejected_on_create() {
        let req = |title: String| CreateNotificationRequest {
            user_id: "u-1".into(),
            title,
            message: "Results are ready".into(),
            kind: "lab".into(),
        };
        assert!(NotificationParser::to_entity(req("t".repeat(MAX_TITLE_LEN))).is_ok());
        assert!(matches!(
            NotificationParser::to_entity(req("t".repeat(MAX_TITLE_LEN + 1))),
            Err(ParseError::Invalid { field: "title", .. })
        ));
    }
}
