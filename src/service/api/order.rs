use arion_core::{
    CreateOrderRequest, ListOrdersResponse, OrderResponse, ProvisionResponse, StopOrderResponse,
    TelemetryResponse, TerminateOrderRequest, TerminateOrderResponse,
};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use uuid::Uuid;

use super::{json_body, optional_json_body, AppState};
use crate::acl::Caller;
use crate::error::ApiError;

pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<Json<ProvisionResponse>, ApiError> {
    let request = json_body(payload)?;

    let response = state.order_service.provision(&caller, &request).await?;

    Ok(Json(response))
}

pub async fn list(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ListOrdersResponse>, ApiError> {
    let orders = state.order_service.list(&caller).await?;

    Ok(Json(ListOrdersResponse {
        ok: true,
        orders: orders.into_iter().map(Into::into).collect(),
    }))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    caller: Caller,
    Path(order_id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.order_service.get_by_id(&caller, &order_id).await?;

    Ok(Json(OrderResponse {
        ok: true,
        order: order.into(),
    }))
}

pub async fn stop(
    State(state): State<AppState>,
    caller: Caller,
    Path(order_id): Path<Uuid>,
) -> Result<Json<StopOrderResponse>, ApiError> {
    let response = state.order_service.stop(&caller, &order_id).await?;

    Ok(Json(response))
}

pub async fn terminate(
    State(state): State<AppState>,
    caller: Caller,
    Path(order_id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<TerminateOrderResponse>, ApiError> {
    let request: TerminateOrderRequest = optional_json_body(&body)?;

    let response = state
        .order_service
        .terminate(&caller, &order_id, request.delete_workspace)
        .await?;

    Ok(Json(response))
}

pub async fn telemetry(
    State(state): State<AppState>,
    caller: Caller,
    Path(order_id): Path<Uuid>,
) -> Result<Json<TelemetryResponse>, ApiError> {
    let telemetry = state.order_service.telemetry(&caller, &order_id).await?;

    Ok(Json(TelemetryResponse {
        ok: true,
        telemetry,
    }))
}

#[cfg(test)]
mod tests {
    use arion_core::Role;
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::tests::TestApp;
    use crate::runpod::mock::MockBehavior;

    fn order_body(datacenter_id: &str) -> serde_json::Value {
        json!({
            "name": "training",
            "datacenter_id": datacenter_id,
            "storage_gb": 100,
            "gpu_type": "Enterprise"
        })
    }

    #[tokio::test]
    async fn test_order_lifecycle_over_http() {
        let app = TestApp::new(MockBehavior::default()).await;
        let (_, token) = app.user("ada@example.com", Role::WorkspaceUser).await;

        let (status, created) = app
            .call("POST", "/api/orders", Some(&token), Some(order_body("EU-RO-1")))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["ok"], true);
        assert_eq!(created["podReady"], true);
        let order_id = created["orderId"].as_str().unwrap().to_string();

        let (status, listed) = app.call("GET", "/api/orders", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["orders"].as_array().unwrap().len(), 1);
        assert_eq!(listed["orders"][0]["status"], "running");
        assert_eq!(listed["orders"][0]["gpu_type"], "NVIDIA H100 80GB HBM3");

        let (status, telemetry) = app
            .call(
                "GET",
                &format!("/api/orders/{order_id}/telemetry"),
                Some(&token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(telemetry["runtime_status"], "RUNNING");
        assert_eq!(telemetry["volume_size_gb"], 100);

        let (status, stopped) = app
            .call("POST", &format!("/api/orders/{order_id}/stop"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stopped["desiredStatus"], "EXITED");

        let (status, terminated) = app
            .call(
                "POST",
                &format!("/api/orders/{order_id}/terminate"),
                Some(&token),
                Some(json!({ "deleteWorkspace": true })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(terminated["volumeDeleted"], true);

        let (_, order) = app
            .call("GET", &format!("/api/orders/{order_id}"), Some(&token), None)
            .await;
        assert_eq!(order["order"]["status"], "deleted");
        assert!(order["order"]["volume_id"].is_null());
    }

    #[tokio::test]
    async fn test_invalid_datacenter_is_rejected() {
        let app = TestApp::new(MockBehavior::default()).await;
        let (_, token) = app.user("ada@example.com", Role::WorkspaceUser).await;

        let (status, body) = app
            .call("POST", "/api/orders", Some(&token), Some(order_body("AP-JP-1")))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);

        let (_, listed) = app.call("GET", "/api/orders", Some(&token), None).await;
        assert!(listed["orders"].as_array().unwrap().is_empty());
        assert!(app.cloud.calls().is_empty());
    }

    #[tokio::test]
    async fn test_readiness_timeout_is_bad_gateway() {
        let app = TestApp::new(MockBehavior {
            pod_never_ready: true,
            ..Default::default()
        })
        .await;
        let (_, token) = app.user("ada@example.com", Role::WorkspaceUser).await;

        let (status, body) = app
            .call("POST", "/api/orders", Some(&token), Some(order_body("US-KS-2")))
            .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["ok"], false);

        let (_, listed) = app.call("GET", "/api/orders", Some(&token), None).await;
        assert_eq!(listed["orders"][0]["status"], "failed");
    }

    #[tokio::test]
    async fn test_terminate_without_body_keeps_workspace() {
        let app = TestApp::new(MockBehavior::default()).await;
        let (_, token) = app.user("ada@example.com", Role::WorkspaceUser).await;

        let (_, created) = app
            .call("POST", "/api/orders", Some(&token), Some(order_body("CA-MTL-1")))
            .await;
        let order_id = created["orderId"].as_str().unwrap().to_string();

        let (status, terminated) = app
            .call(
                "POST",
                &format!("/api/orders/{order_id}/terminate"),
                Some(&token),
                None,
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(terminated["volumeDeleted"], false);
        assert!(app.cloud.volume_exists("vol-1"));
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let app = TestApp::new(MockBehavior::default()).await;
        let (_, token) = app.user("ada@example.com", Role::WorkspaceUser).await;

        let (status, _) = app
            .call(
                "GET",
                &format!("/api/orders/{}", uuid::Uuid::new_v4()),
                Some(&token),
                None,
            )
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
