use arion_core::{
    catalog::{is_supported_datacenter, normalize_gpu_type, DATACENTERS},
    CreateOrderRequest, ProvisionResponse, StopOrderResponse, TelemetryMessage,
    TerminateOrderResponse,
};
use async_trait::async_trait;
use handlebars::Handlebars;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use super::saga::{Compensation, Compensator, Saga};
use crate::acl::Caller;
use crate::config::ProvisioningConfig;
use crate::error::ApiError;
use crate::models::Order;
use crate::persistence::{OrderPersistence, Persistence};
use crate::runpod::{volume_deleted, GpuCloud, PodSpec};

pub const MIN_STORAGE_GB: i32 = 10;
pub const MAX_STORAGE_GB: i32 = 4000;

const WORKSPACE_MOUNT_PATH: &str = "/workspace";
const WORKSPACE_PORTS: [&str; 2] = ["8888/http", "22/tcp"];

pub struct OrderService {
    pub persistence: Box<dyn OrderPersistence>,
    pub cloud: Arc<dyn GpuCloud>,
    pub provisioning: ProvisioningConfig,
}

#[async_trait]
impl Compensator for OrderService {
    async fn compensate(&self, step: &Compensation) -> anyhow::Result<()> {
        match step {
            Compensation::TerminatePod(pod_id) => {
                self.cloud.terminate_pod(pod_id).await?;
            }
            Compensation::DeleteVolume(volume_id) => {
                let status = self.cloud.delete_network_volume(volume_id).await?;
                if !volume_deleted(status) {
                    anyhow::bail!("volume delete answered with status {status}");
                }
            }
            other => anyhow::bail!("order workflow cannot compensate '{other}'"),
        }

        Ok(())
    }
}

impl OrderService {
    fn validate(request: &CreateOrderRequest) -> Result<(), ApiError> {
        if request.name.trim().is_empty() {
            return Err(ApiError::Validation("name is required".to_string()));
        }

        if !is_supported_datacenter(&request.datacenter_id) {
            return Err(ApiError::Validation(format!(
                "datacenter_id must be one of {}",
                DATACENTERS.join(", ")
            )));
        }

        if !(MIN_STORAGE_GB..=MAX_STORAGE_GB).contains(&request.storage_gb) {
            return Err(ApiError::Validation(format!(
                "storage_gb must be between {MIN_STORAGE_GB} and {MAX_STORAGE_GB}"
            )));
        }

        if request.gpu_type.trim().is_empty() {
            return Err(ApiError::Validation("gpu_type is required".to_string()));
        }

        Ok(())
    }

    fn choose_organization(caller: &Caller, requested: Option<Uuid>) -> Result<Uuid, ApiError> {
        match requested {
            Some(organization_id) if caller.can_access_organization(&organization_id) => {
                Ok(organization_id)
            }
            Some(organization_id) => Err(ApiError::Forbidden(format!(
                "not a member of organization {organization_id}"
            ))),
            None => caller.organization_ids.first().copied().ok_or_else(|| {
                ApiError::Forbidden("caller does not belong to an organization".to_string())
            }),
        }
    }

    pub fn render_workspace_url(&self, pod_id: &str) -> anyhow::Result<String> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);

        let url = handlebars.render_template(
            &self.provisioning.workspace_url_template,
            &json!({ "pod_id": pod_id }),
        )?;

        Ok(url)
    }

    async fn fail(&self, order: &mut Order, reason: &str) -> Result<(), ApiError> {
        order.mark_failed(reason);
        self.persistence.upsert(order).await?;

        tracing::warn!(order_id = %order.id, "order failed: {}", reason);

        Ok(())
    }

    async fn record_running(
        &self,
        order: &Order,
        pod_id: &str,
        volume_id: &str,
    ) -> anyhow::Result<String> {
        let workspace_url = self.render_workspace_url(pod_id)?;

        let mut running = order.clone();
        running.mark_running(pod_id, volume_id, &workspace_url);
        self.persistence.upsert(&running).await?;

        Ok(workspace_url)
    }

    /// Polls until the provider reports the pod as running. Lookup errors count
    /// as a not-ready attempt.
    async fn wait_for_pod(&self, pod_id: &str) -> bool {
        for attempt in 1..=self.provisioning.max_poll_attempts {
            tokio::time::sleep(self.provisioning.poll_interval).await;

            match self.cloud.get_pod(pod_id).await {
                Ok(pod) if pod.is_running() => {
                    tracing::info!(pod_id, attempt, "pod is running");
                    return true;
                }
                Ok(pod) => {
                    tracing::debug!(pod_id, attempt, status = ?pod.desired_status, "pod not ready")
                }
                Err(err) => tracing::warn!(pod_id, attempt, "pod status lookup failed: {}", err),
            }
        }

        false
    }

    #[tracing::instrument(name = "service::order::provision", skip_all, fields(user_id = %caller.user_id))]
    pub async fn provision(
        &self,
        caller: &Caller,
        request: &CreateOrderRequest,
    ) -> Result<ProvisionResponse, ApiError> {
        Self::validate(request)?;
        let organization_id = Self::choose_organization(caller, request.organization_id)?;
        let gpu_type = normalize_gpu_type(&request.gpu_type);

        let mut order = Order::new_pending(
            caller.user_id,
            organization_id,
            request.name.trim(),
            &request.datacenter_id,
            request.storage_gb,
            &gpu_type,
        );
        self.persistence.upsert(&order).await?;

        tracing::info!(order_id = %order.id, gpu_type = %gpu_type, "order created");

        let mut saga = Saga::new("provision");

        let volume = match self
            .cloud
            .create_network_volume(&order.name, order.storage_gb, &order.datacenter_id)
            .await
        {
            Ok(volume) => volume,
            Err(err) => {
                self.fail(&mut order, &format!("network volume creation failed: {err}"))
                    .await?;
                return Err(err.into());
            }
        };
        saga.record(Compensation::DeleteVolume(volume.id.clone()));

        let spec = PodSpec {
            name: order.name.clone(),
            image_name: self.provisioning.image_name.clone(),
            gpu_type_id: gpu_type.clone(),
            gpu_count: 1,
            container_disk_gb: self.provisioning.container_disk_gb,
            network_volume_id: volume.id.clone(),
            data_center_id: order.datacenter_id.clone(),
            volume_mount_path: WORKSPACE_MOUNT_PATH.to_string(),
            ports: WORKSPACE_PORTS.iter().map(|port| port.to_string()).collect(),
            container_registry_auth_id: self.provisioning.registry_auth_id.clone(),
        };

        let pod = match self.cloud.create_pod(&spec).await {
            Ok(pod) => pod,
            Err(err) => {
                saga.unwind(self).await;
                self.fail(&mut order, &format!("pod creation failed: {err}"))
                    .await?;
                return Err(err.into());
            }
        };
        saga.record(Compensation::TerminatePod(pod.id.clone()));

        if !self.wait_for_pod(&pod.id).await {
            saga.unwind(self).await;

            let seconds = self.provisioning.poll_interval.as_secs()
                * u64::from(self.provisioning.max_poll_attempts);
            let reason = format!("pod {} did not reach RUNNING within {seconds}s", pod.id);
            self.fail(&mut order, &reason).await?;

            return Err(ApiError::Upstream(reason));
        }

        let workspace_url = match self.record_running(&order, &pod.id, &volume.id).await {
            Ok(workspace_url) => workspace_url,
            Err(err) => {
                saga.unwind(self).await;
                self.fail(&mut order, &format!("recording running order failed: {err}"))
                    .await?;
                return Err(ApiError::Internal(err));
            }
        };
        saga.commit();

        tracing::info!(order_id = %order.id, pod_id = %pod.id, "order running");

        Ok(ProvisionResponse {
            ok: true,
            order_id: order.id,
            pod_id: pod.id,
            volume_id: volume.id,
            workspace_url,
            pod_ready: true,
        })
    }

    #[tracing::instrument(name = "service::order::list", skip_all)]
    pub async fn list(&self, caller: &Caller) -> Result<Vec<Order>, ApiError> {
        let orders = if caller.is_arion_admin() {
            self.persistence.list().await?
        } else {
            self.persistence
                .get_by_organization_ids(&caller.organization_ids)
                .await?
        };

        Ok(orders)
    }

    #[tracing::instrument(name = "service::order::get_by_id", skip(self, caller))]
    pub async fn get_by_id(&self, caller: &Caller, order_id: &Uuid) -> Result<Order, ApiError> {
        let order = match self.persistence.get_by_id(order_id).await? {
            Some(order) => order,
            None => return Err(ApiError::NotFound(format!("order {order_id} not found"))),
        };

        if !caller.can_access_organization(&order.organization_id) {
            return Err(ApiError::Forbidden(format!(
                "no access to order {order_id}"
            )));
        }

        Ok(order)
    }

    fn require_pod(order: &Order) -> Result<String, ApiError> {
        order
            .pod_id
            .clone()
            .ok_or_else(|| ApiError::Conflict(format!("order {} has no pod", order.id)))
    }

    /// Stops the pod. The order row is left as is; the next telemetry poll
    /// reflects the provider state.
    #[tracing::instrument(name = "service::order::stop", skip(self, caller))]
    pub async fn stop(&self, caller: &Caller, order_id: &Uuid) -> Result<StopOrderResponse, ApiError> {
        let order = self.get_by_id(caller, order_id).await?;
        let pod_id = Self::require_pod(&order)?;

        let pod = self.cloud.stop_pod(&pod_id).await?;

        tracing::info!(order_id = %order.id, pod_id = %pod_id, "pod stopped");

        Ok(StopOrderResponse {
            ok: true,
            order_id: order.id,
            pod_id,
            desired_status: pod.desired_status,
        })
    }

    #[tracing::instrument(name = "service::order::terminate", skip(self, caller))]
    pub async fn terminate(
        &self,
        caller: &Caller,
        order_id: &Uuid,
        delete_workspace: bool,
    ) -> Result<TerminateOrderResponse, ApiError> {
        let mut order = self.get_by_id(caller, order_id).await?;

        if let Some(pod_id) = &order.pod_id {
            self.cloud.terminate_pod(pod_id).await?;
        }

        let mut deleted = false;
        if delete_workspace {
            if let Some(volume_id) = &order.volume_id {
                match self.cloud.delete_network_volume(volume_id).await {
                    Ok(status) => {
                        deleted = volume_deleted(status);
                        if !deleted {
                            tracing::warn!(volume_id = %volume_id, status, "volume was not deleted");
                        }
                    }
                    Err(err) => tracing::warn!(volume_id = %volume_id, "volume delete failed: {}", err),
                }
            }
        }

        order.mark_deleted(deleted);
        self.persistence.upsert(&order).await?;

        tracing::info!(order_id = %order.id, volume_deleted = deleted, "order terminated");

        Ok(TerminateOrderResponse {
            ok: true,
            order_id: order.id,
            volume_deleted: deleted,
        })
    }

    #[tracing::instrument(name = "service::order::telemetry", skip(self, caller))]
    pub async fn telemetry(&self, caller: &Caller, order_id: &Uuid) -> Result<TelemetryMessage, ApiError> {
        let mut order = self.get_by_id(caller, order_id).await?;
        let pod_id = Self::require_pod(&order)?;

        let pod_telemetry = self.cloud.pod_telemetry(&pod_id).await?;

        let volume_size_gb = match &order.volume_id {
            Some(volume_id) => match self.cloud.get_network_volume(volume_id).await {
                Ok(volume) => volume.size,
                Err(err) => {
                    tracing::warn!(volume_id = %volume_id, "volume lookup failed: {}", err);
                    None
                }
            },
            None => None,
        };

        let telemetry = TelemetryMessage {
            runtime_status: pod_telemetry
                .desired_status
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            uptime_seconds: pod_telemetry.uptime_seconds.unwrap_or(0),
            gpu_type: pod_telemetry
                .gpu_display_name
                .or_else(|| Some(order.gpu_type.clone())),
            volume_size_gb,
        };

        order.runtime_status = Some(telemetry.runtime_status.clone());
        order.uptime_seconds = Some(telemetry.uptime_seconds);
        self.persistence.upsert(&order).await?;

        Ok(telemetry)
    }
}
