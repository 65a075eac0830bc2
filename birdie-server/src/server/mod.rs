mod acl;
pub mod auth;
mod carnets;
mod config;
mod kid_notes;
mod kids;
mod reports;
mod teacher_notes;
mod teachers;
pub mod validate;

use crate::server::auth::AuthCtx;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware;
use axum::response::Response as AxumResponse;
use axum::{
    Extension, Json, Router,
    http::{Method, StatusCode, header},
    routing::{get, post},
};
use birdie_shared::api::{self, FieldErrorDto, HealthDto, OkDto, ValidationErrorsDto};
use birdie_shared::jwt::TokenVerifier;
pub use config::{AppConfig, ConfigError, CorsConfig, CorsMode, IdentityConfig};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{Span, info_span, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: crate::storage::Store,
    pub verifier: TokenVerifier,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: AppConfig, store: crate::storage::Store) -> Result<Self, ConfigError> {
        let verifier = config.identity.verifier()?;
        Ok(Self {
            config,
            store,
            verifier,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

#[derive(Clone, Debug)]
struct ReqId(pub String);

/// Registers `path` both with and without a trailing slash.
fn collection(
    router: Router<AppState>,
    path: &str,
    method_router: axum::routing::MethodRouter<AppState>,
) -> Router<AppState> {
    router
        .route(path, method_router.clone())
        .route(&format!("{}/", path), method_router)
}

pub fn router(state: AppState) -> Router {
    let v1 = api::API_V1_PREFIX;
    let mut private = Router::new()
        .route("/private", get(auth_probe))
        .route("/scoped", get(auth_probe));
    private = collection(
        private,
        &format!("{v1}/teachers"),
        get(teachers::api_list_teachers).post(teachers::api_create_teacher),
    );
    private = collection(
        private,
        &format!("{v1}/teacher_notes"),
        get(teacher_notes::api_list_teacher_notes),
    );
    private = collection(
        private,
        &format!("{v1}/kids"),
        get(kids::api_list_kids).post(kids::api_create_kid),
    );
    private = collection(
        private,
        &format!("{v1}/kid_notes"),
        get(kid_notes::api_list_kid_notes),
    );
    private = collection(
        private,
        &format!("{v1}/carnets"),
        get(carnets::api_carnet_info),
    );
    let private = private
        .route(&format!("{v1}/teachers/{{id}}"), get(teachers::api_get_teacher))
        .route(
            &format!("{v1}/teacher_notes/date"),
            post(teacher_notes::api_teacher_notes_by_date),
        )
        .route(
            &format!("{v1}/teacher_notes/period"),
            post(teacher_notes::api_teacher_notes_by_period),
        )
        .route(
            &format!("{v1}/teacher_notes/{{id}}"),
            get(teacher_notes::api_get_teacher_note)
                .post(teacher_notes::api_create_teacher_note)
                .put(teacher_notes::api_update_teacher_note),
        )
        .route(&format!("{v1}/kids/{{id}}"), get(kids::api_get_kid))
        .route(
            &format!("{v1}/kid_notes/period"),
            post(kid_notes::api_kid_notes_by_period),
        )
        .route(
            &format!("{v1}/kid_notes/{{id}}"),
            get(kid_notes::api_get_kid_note)
                .post(kid_notes::api_create_kid_note)
                .put(kid_notes::api_update_kid_note),
        )
        .route(
            &format!("{v1}/carnets/{{id}}"),
            get(carnets::api_get_carnet)
                .post(carnets::api_create_carnet)
                .put(carnets::api_update_carnet),
        )
        .route(
            &format!("{v1}/reports/monthly-report"),
            post(reports::api_monthly_report),
        )
        .with_state(state.clone())
        .layer(middleware::from_fn(acl::enforce_acl))
        .layer(middleware::from_fn(set_auth_span_fields))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::resolve_user,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    // Trace with request context (method, path, request_id)
    let trace = TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
        let request_id = req
            .extensions()
            .get::<ReqId>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        info_span!(
            "request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id,
            email = tracing::field::Empty,
            role = tracing::field::Empty,
            user_id = tracing::field::Empty
        )
    });

    Router::new()
        .route("/", get(health))
        .route("/heartbeat", get(health))
        .merge(private)
        .with_state(state.clone())
        .layer(trace)
        .layer(middleware::from_fn(add_security_headers))
        .layer(middleware::from_fn(add_request_id))
        .layer(cors_layer(&state.config.cors))
}

fn cors_layer(cfg: &CorsConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("x-xsrf-token"),
        ])
        .allow_credentials(true);
    match cfg.mode {
        CorsMode::Release => {
            let origins: Vec<HeaderValue> = cfg
                .allowed_origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        warn!(origin = %o, error = %e, "cors: ignoring invalid origin");
                        None
                    }
                })
                .collect();
            base.allow_origin(origins)
        }
        CorsMode::Dev => base.allow_origin(AllowOrigin::mirror_request()),
    }
}

async fn health() -> Json<HealthDto> {
    Json(HealthDto {
        status: StatusCode::OK.as_u16().to_string(),
        title: "Health OK".into(),
        detail: chrono::Utc::now().to_rfc3339(),
    })
}

/// Token probe for clients; ACL decides who may call it.
async fn auth_probe(Extension(auth): Extension<AuthCtx>) -> Json<OkDto> {
    tracing::debug!(email = %auth.email, role = %auth.role, "auth probe");
    Json(OkDto { ok: "true".into() })
}

async fn add_request_id(
    mut req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let hdr = HeaderName::from_static("x-request-id");
    let rid = req
        .headers()
        .get(&hdr)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(ReqId(rid.clone()));
    let mut resp = next.run(req).await;
    if let Ok(hv) = HeaderValue::from_str(&rid) {
        resp.headers_mut().insert(hdr, hv);
    }
    Ok(resp)
}

async fn add_security_headers(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let api_path = req.uri().path().starts_with(api::API_V1_PREFIX);
    let mut resp = next.run(req).await;

    let headers = resp.headers_mut();
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    // School records must never end up in shared caches
    if api_path {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, private"),
        );
    }

    Ok(resp)
}

async fn set_auth_span_fields(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    if let Some(auth) = req.extensions().get::<AuthCtx>() {
        let span = Span::current();
        span.record("email", tracing::field::display(&auth.email));
        span.record("role", tracing::field::display(auth.role));
        span.record("user_id", auth.user_id);
    }
    Ok(next.run(req).await)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Validation(Vec<FieldErrorDto>),
    Unauthorized(String),
    Forbidden,
    NotFound(String),
    Internal(String),
}

impl AppError {
    pub(crate) fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }
    pub(crate) fn unauthorized<T: Into<String>>(msg: T) -> Self {
        Self::Unauthorized(msg.into())
    }
    pub(crate) fn forbidden() -> Self {
        Self::Forbidden
    }
    pub(crate) fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }
    pub(crate) fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, msg, kind, detail) = match self {
            AppError::Validation(errors) => {
                warn!(status = %StatusCode::BAD_REQUEST, fields = errors.len(), "validation failed");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ValidationErrorsDto { errors }),
                )
                    .into_response();
            }
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m, "bad_request", None),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m, "unauthorized", None),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "you are not authorize to access this resource".into(),
                "forbidden",
                None,
            ),
            AppError::NotFound(m) => (
                StatusCode::NOT_FOUND,
                "Resource not found".into(),
                "not_found",
                Some(m),
            ),
            // Do not leak internal error details to clients, but log them
            AppError::Internal(m) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong.".into(),
                "internal",
                Some(m),
            ),
        };
        if status.is_server_error() {
            tracing::error!(status = %status, kind = kind, message = %msg, detail = ?detail, "request failed");
        } else {
            tracing::warn!(status = %status, kind = kind, message = %msg, detail = ?detail, "request rejected");
        }
        let body = Json(ErrorBody { error: msg });
        (status, body).into_response()
    }
}
