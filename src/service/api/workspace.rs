use arion_core::{ListGpusResponse, WorkspaceCheckResponse};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::acl::Caller;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CheckWorkspaceParams {
    pub url: Option<String>,
}

pub async fn list_gpus(
    State(state): State<AppState>,
    _caller: Caller,
) -> Result<Json<ListGpusResponse>, ApiError> {
    let gpus = state.gpu_service.list().await?;

    Ok(Json(ListGpusResponse { ok: true, gpus }))
}

pub async fn check(
    State(state): State<AppState>,
    _caller: Caller,
    Query(params): Query<CheckWorkspaceParams>,
) -> Result<Json<WorkspaceCheckResponse>, ApiError> {
    let url = params
        .url
        .ok_or_else(|| ApiError::Validation("url is required".to_string()))?;

    let response = state.workspace_service.check(&url).await?;

    Ok(Json(response))
}
