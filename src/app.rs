use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    ai, appointments, auth, doctors, insurance, notifications, records, state::AppState, users,
};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(auth::router())
                .merge(users::router())
                .merge(doctors::router())
                .merge(records::router())
                .merge(appointments::router())
                .merge(insurance::router())
                .merge(notifications::router())
                .merge(ai::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        call_with_token(app, method, uri, body, None).await
    }

    async fn call_with_token(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(json) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn register(app: &Router, email: &str, role: &str) -> Value {
        let (status, body) = call(
            app,
            Method::POST,
            "/api/v1/users",
            Some(json!({
                "name": "Test User",
                "email": email,
                "password": "correct-horse",
                "role": role
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    #[tokio::test]
    async fn health_ok() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn user_crud_over_http() {
        let app = build_app(AppState::fake());
        let user = register(&app, "ada@example.com", "patient").await;
        let id = user["id"].as_str().unwrap();
        assert!(user.get("password").is_none());
        assert!(user.get("password_hash").is_none());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/users",
            Some(json!({"name": "Again", "email": "ADA@example.com", "password": "correct-horse"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONSTRAINT_VIOLATION");

        let (status, body) = call(
            &app,
            Method::PATCH,
            &format!("/api/v1/users/{id}"),
            Some(json!({"address": "12 Analytical Row"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["address"], "12 Analytical Row");
        assert_eq!(body["email"], "ada@example.com");

        let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/users/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::GET, &format!("/api/v1/users/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/users/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn login_and_me() {
        let app = build_app(AppState::fake());
        let user = register(&app, "grace@example.com", "patient").await;

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": "grace@example.com", "password": "wrong-password"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, tokens) = call(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": "grace@example.com", "password": "correct-horse"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let access = tokens["access_token"].as_str().unwrap();

        let (status, me) =
            call_with_token(&app, Method::GET, "/api/v1/me", None, Some(access)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], user["id"]);

        let (status, _) = call(&app, Method::GET, "/api/v1/me", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, refreshed) = call(
            &app,
            Method::POST,
            "/api/v1/auth/refresh",
            Some(json!({"refresh_token": tokens["refresh_token"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(refreshed["user"]["email"], "grace@example.com");
    }

    #[tokio::test]
    async fn appointment_flow_and_notifications() {
        let app = build_app(AppState::fake());
        let patient = register(&app, "pat@example.com", "patient").await;
        let doctor = register(&app, "house@clinic.org", "doctor").await;

        let (status, appt) = call(
            &app,
            Method::POST,
            "/api/v1/appointments",
            Some(json!({
                "patient_id": patient["id"],
                "doctor_id": doctor["id"],
                "scheduled_at": "2026-05-04T10:00:00Z",
                "mode": "video"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{appt}");
        let appt_id = appt["id"].as_str().unwrap();

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/appointments/{appt_id}/complete"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "completed");

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/api/v1/appointments/{appt_id}/cancel"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, note) = call(
            &app,
            Method::POST,
            "/api/v1/notifications",
            Some(json!({
                "user_id": patient["id"],
                "title": "Visit completed",
                "message": "Your summary is ready",
                "type": "appointment"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/api/v1/notifications/{}/read", note["id"].as_str().unwrap());
        let (_, first) = call(&app, Method::POST, &uri, None).await;
        let (status, second) = call(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["read"], true);
        assert_eq!(first["read_at"], second["read_at"]);

        let (_, tokens) = call(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({"email": "pat@example.com", "password": "correct-horse"})),
        )
        .await;
        let (status, mine) = call_with_token(
            &app,
            Method::GET,
            "/api/v1/me/notifications",
            None,
            tokens["access_token"].as_str(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn record_with_metadata_and_summary() {
        let app = build_app(AppState::fake());
        let owner = register(&app, "pat@example.com", "patient").await;

        let (status, record) = call(
            &app,
            Method::POST,
            "/api/v1/records",
            Some(json!({
                "user_id": owner["id"],
                "category": "lab",
                "title": "Lipid panel",
                "content": "LDL 130 mg/dL, HDL 45 mg/dL, triglycerides 150 mg/dL.",
                "metadata": {"pages": 3}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(record["metadata"], json!({"pages": 3}));

        let (status, result) = call(
            &app,
            Method::POST,
            "/api/v1/ai/summarize",
            Some(json!({"record_id": record["id"], "mode": "short"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{result}");
        assert_eq!(result["user_id"], owner["id"]);

        let (status, results) = call(
            &app,
            Method::GET,
            &format!("/api/v1/ai/results?user_id={}", owner["id"].as_str().unwrap()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(results.as_array().unwrap().len(), 1);

        let (status, _) = call(&app, Method::GET, "/api/v1/records/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn insurance_claim_processing() {
        let app = build_app(AppState::fake());
        let patient = register(&app, "pat@example.com", "patient").await;

        let (status, policy) = call(
            &app,
            Method::POST,
            "/api/v1/insurance/policies",
            Some(json!({
                "patient_id": patient["id"],
                "provider": "Acme Health",
                "policy_number": "AC-1",
                "sum_insured": 100000,
                "premium": 950.0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, claim) = call(
            &app,
            Method::POST,
            "/api/v1/insurance/claims",
            Some(json!({"policy_id": policy["id"], "amount": 420.5})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(claim["patient_id"], patient["id"]);

        let uri = format!("/api/v1/insurance/claims/{}/process", claim["id"].as_str().unwrap());
        let (status, processed) = call(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(processed["status"], "processed");
        let (status, _) = call(&app, Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::DELETE,
            &format!("/api/v1/insurance/policies/{}", policy["id"].as_str().unwrap()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
