use axum::{
    body::{Body, Bytes},
    extract::{rejection::JsonRejection, FromRequestParts},
    http::{request::Parts, Request},
    routing::{get, patch, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::acl::{Authenticator, Caller};
use crate::error::ApiError;
use crate::services::{
    AccountService, ContactService, GpuService, OrderService, OrganizationService,
    WorkspaceService,
};

mod account;
mod contact;
mod health;
mod order;
mod organization;
mod workspace;

/// Shared handles for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub account_service: Arc<AccountService>,
    pub contact_service: Arc<ContactService>,
    pub gpu_service: Arc<GpuService>,
    pub order_service: Arc<OrderService>,
    pub organization_service: Arc<OrganizationService>,
    pub workspace_service: Arc<WorkspaceService>,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state.authenticator.authenticate(&parts.headers).await
    }
}

/// Unwraps a JSON body, reporting malformed input in the error envelope.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
    }
}

/// Like [`json_body`] for endpoints whose body may be omitted entirely.
pub(crate) fn optional_json_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body).map_err(|err| ApiError::Validation(format!("invalid body: {err}")))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/orders", get(order::list).post(order::create))
        .route("/api/orders/:id", get(order::get_by_id))
        .route("/api/orders/:id/stop", post(order::stop))
        .route("/api/orders/:id/terminate", post(order::terminate))
        .route("/api/orders/:id/telemetry", get(order::telemetry))
        .route("/api/invite", post(account::invite))
        .route("/api/admin/users", get(account::list_users))
        .route(
            "/api/admin/users/:id",
            patch(account::update_user).delete(account::delete_user),
        )
        .route(
            "/api/admin/organizations",
            get(organization::list).post(organization::create),
        )
        .route("/api/admin/roles", get(organization::list_roles))
        .route(
            "/api/profile",
            get(account::get_profile).patch(account::update_profile),
        )
        .route("/api/gpus", get(workspace::list_gpus))
        .route("/api/check-workspace", get(workspace::check))
        .route("/api/contact", post(contact::submit))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "http",
                    http.method = %request.method(),
                    http.url = %request.uri(),
                    http.status_code = tracing::field::Empty,
                    otel.name = %format!("HTTP {}", request.method()),
                    otel.kind = "server",
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
