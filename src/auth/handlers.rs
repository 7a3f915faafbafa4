use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RegisterRequest},
        errors::AuthError,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

fn bad_body(rejection: JsonRejection) -> AuthError {
    AuthError::Validation(rejection.body_text())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let Json(payload) = payload.map_err(bad_body)?;

    match state
        .auth
        .register(&payload.name, &payload.email, &payload.password)
        .await
    {
        Ok(token) => {
            info!(email = %payload.email.trim(), "user registered");
            Ok((StatusCode::CREATED, Json(AuthResponse { token })))
        }
        Err(e) => {
            if !e.status_code().is_server_error() {
                warn!(email = %payload.email.trim(), reason = %e, "registration rejected");
            }
            Err(e)
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AuthError> {
    let Json(payload) = payload.map_err(bad_body)?;

    match state.auth.login(&payload.email, &payload.password).await {
        Ok(token) => {
            info!(email = %payload.email.trim(), "user logged in");
            Ok(Json(AuthResponse { token }))
        }
        Err(e) => {
            if !e.status_code().is_server_error() {
                warn!(email = %payload.email.trim(), "login failed");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{
        app::build_app,
        auth::{
            dto::AuthResponse,
            errors::{
                ErrorResponse, StoreError, DUPLICATE_EMAIL_MESSAGE, INTERNAL_ERROR_MESSAGE,
                INVALID_CREDENTIALS_MESSAGE,
            },
            repo::UserStore,
            repo_types::{NewUser, User},
        },
        state::AppState,
    };

    struct DownStore;

    #[async_trait]
    impl UserStore for DownStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn exists_by_email(&self, _email: &str) -> Result<bool, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
        async fn save(&self, _user: NewUser) -> Result<User, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    async fn send(app: &Router, path: &str, body: String) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    async fn post_json(app: &Router, path: &str, body: Value) -> (StatusCode, Vec<u8>) {
        send(app, path, body.to_string()).await
    }

    fn error_body(bytes: &[u8]) -> ErrorResponse {
        serde_json::from_slice(bytes).expect("error body")
    }

    #[tokio::test]
    async fn register_returns_created_with_token() {
        let state = AppState::fake();
        let app = build_app(state.clone());

        let (status, body) = post_json(
            &app,
            "/api/v1/auth/register",
            json!({"name": "Ana", "email": "ana@x.com", "password": "pw123"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let res: AuthResponse = serde_json::from_slice(&body).unwrap();
        let subject = state.auth.keys().extract_subject(&res.token).unwrap();
        assert_eq!(subject, "ana@x.com");
    }

    #[tokio::test]
    async fn duplicate_register_is_bad_request() {
        let app = build_app(AppState::fake());
        let body = json!({"name": "Ana", "email": "ana@x.com", "password": "pw123"});

        let (status, _) = post_json(&app, "/api/v1/auth/register", body.clone()).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, bytes) = post_json(&app, "/api/v1/auth/register", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let err = error_body(&bytes);
        assert_eq!(err.status, 400);
        assert_eq!(err.error, "Bad Request");
        assert_eq!(err.message, DUPLICATE_EMAIL_MESSAGE);
    }

    #[tokio::test]
    async fn login_scenario_over_http() {
        let state = AppState::fake();
        let app = build_app(state.clone());

        let (_, bytes) = post_json(
            &app,
            "/api/v1/auth/register",
            json!({"name": "Ana", "email": "ana@x.com", "password": "pw123"}),
        )
        .await;
        let registered: AuthResponse = serde_json::from_slice(&bytes).unwrap();
        let registered = state.auth.keys().verify(&registered.token).unwrap();

        let (status, bytes) = post_json(
            &app,
            "/api/v1/auth/login",
            json!({"email": "ana@x.com", "password": "pw123"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let res: AuthResponse = serde_json::from_slice(&bytes).unwrap();
        let claims = state.auth.keys().verify(&res.token).unwrap();
        assert_eq!(claims.sub, "ana@x.com");
        assert_eq!(claims.user_id, registered.user_id);
        assert_eq!(claims.full_name, "Ana");
    }

    #[tokio::test]
    async fn failed_logins_share_one_shape() {
        let app = build_app(AppState::fake());
        post_json(
            &app,
            "/api/v1/auth/register",
            json!({"name": "Ana", "email": "ana@x.com", "password": "pw123"}),
        )
        .await;

        let (wrong_status, wrong) = post_json(
            &app,
            "/api/v1/auth/login",
            json!({"email": "ana@x.com", "password": "wrongpw"}),
        )
        .await;
        let (unknown_status, unknown) = post_json(
            &app,
            "/api/v1/auth/login",
            json!({"email": "nobody@x.com", "password": "pw123"}),
        )
        .await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);

        let wrong = error_body(&wrong);
        let unknown = error_body(&unknown);
        assert_eq!(wrong.message, INVALID_CREDENTIALS_MESSAGE);
        assert_eq!(wrong.message, unknown.message);
        assert_eq!(wrong.error, unknown.error);
        assert_eq!(wrong.status, unknown.status);
    }

    #[tokio::test]
    async fn malformed_body_gets_error_shape() {
        let app = build_app(AppState::fake());

        let (status, bytes) = send(&app, "/api/v1/auth/login", "{not json".into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_body(&bytes).status, 400);

        let (status, bytes) = post_json(
            &app,
            "/api/v1/auth/register",
            json!({"email": "ana@x.com", "password": "pw123"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_body(&bytes).error, "Bad Request");
    }

    #[tokio::test]
    async fn invalid_email_is_bad_request() {
        let app = build_app(AppState::fake());
        let (status, bytes) = post_json(
            &app,
            "/api/v1/auth/register",
            json!({"name": "Ana", "email": "ana-at-x", "password": "pw123"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_body(&bytes).message, "Invalid email.");
    }

    #[tokio::test]
    async fn storage_failure_is_opaque_server_error() {
        let app = build_app(AppState::with_store(Arc::new(DownStore)));

        for (path, body) in [
            (
                "/api/v1/auth/register",
                json!({"name": "Ana", "email": "ana@x.com", "password": "pw123"}),
            ),
            (
                "/api/v1/auth/login",
                json!({"email": "ana@x.com", "password": "pw123"}),
            ),
        ] {
            let (status, bytes) = post_json(&app, path, body).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{path}");

            let raw: Value = serde_json::from_slice(&bytes).unwrap();
            for field in ["message", "status", "error", "timestamp"] {
                assert!(raw.get(field).is_some(), "{path} missing {field}");
            }
            let err = error_body(&bytes);
            assert_eq!(err.status, 500);
            assert_eq!(err.error, "Internal Server Error");
            assert_eq!(err.message, INTERNAL_ERROR_MESSAGE);
            assert!(!String::from_utf8_lossy(&bytes).contains("pool"));
        }
    }
}
