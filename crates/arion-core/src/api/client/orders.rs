use uuid::Uuid;

use super::{ArionClient, ClientError};
use crate::{
    CreateOrderRequest, ListOrdersResponse, OrderResponse, ProvisionResponse, StopOrderResponse,
    TelemetryResponse, TerminateOrderRequest, TerminateOrderResponse,
};

impl ArionClient {
    pub async fn create_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<ProvisionResponse, ClientError> {
        self.post("/api/orders", request).await
    }

    pub async fn list_orders(&self) -> Result<ListOrdersResponse, ClientError> {
        self.get("/api/orders").await
    }

    pub async fn get_order(&self, order_id: &Uuid) -> Result<OrderResponse, ClientError> {
        self.get(&format!("/api/orders/{order_id}")).await
    }

    pub async fn stop_order(&self, order_id: &Uuid) -> Result<StopOrderResponse, ClientError> {
        self.post(
            &format!("/api/orders/{order_id}/stop"),
            &serde_json::json!({}),
        )
        .await
    }

    pub async fn terminate_order(
        &self,
        order_id: &Uuid,
        delete_workspace: bool,
    ) -> Result<TerminateOrderResponse, ClientError> {
        let request = TerminateOrderRequest { delete_workspace };

        self.post(&format!("/api/orders/{order_id}/terminate"), &request)
            .await
    }

    pub async fn order_telemetry(
        &self,
        order_id: &Uuid,
    ) -> Result<TelemetryResponse, ClientError> {
        self.get(&format!("/api/orders/{order_id}/telemetry")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_terminate_order_posts_delete_workspace_flag() {
        let mock_server = MockServer::start().await;
        let order_id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path(format!("/api/orders/{order_id}/terminate")))
            .and(body_json(serde_json::json!({ "deleteWorkspace": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "orderId": order_id,
                "volumeDeleted": true
            })))
            .mount(&mock_server)
            .await;

        let client = ArionClient::new(&mock_server.uri(), Some("token".to_owned())).unwrap();
        let response = client.terminate_order(&order_id, true).await.unwrap();

        assert!(response.volume_deleted);
        assert_eq!(response.order_id, order_id);
    }

    #[tokio::test]
    async fn test_order_telemetry() {
        let mock_server = MockServer::start().await;
        let order_id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path(format!("/api/orders/{order_id}/telemetry")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "runtime_status": "RUNNING",
                "uptime_seconds": 120,
                "gpu_type": "NVIDIA A40",
                "volume_size_gb": 100
            })))
            .mount(&mock_server)
            .await;

        let client = ArionClient::new(&mock_server.uri(), None).unwrap();
        let response = client.order_telemetry(&order_id).await.unwrap();

        assert_eq!(response.telemetry.runtime_status, "RUNNING");
        assert_eq!(response.telemetry.uptime_seconds, 120);
    }
}
