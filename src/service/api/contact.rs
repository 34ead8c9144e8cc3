use arion_core::{ContactRequestMessage, OkResponse};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use super::{json_body, AppState};
use crate::error::ApiError;

/// Public endpoint, no session required.
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequestMessage>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let message = json_body(payload)?;

    state.contact_service.submit(message).await?;

    Ok(Json(OkResponse { ok: true }))
}
