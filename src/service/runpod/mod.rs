//! GPU cloud provider integration.
//!
//! Network volumes and pod creation go through the provider's REST API, pod
//! lifecycle mutations and telemetry through its GraphQL endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod client;
pub mod mock;

pub use client::RunPodClient;

/// Desired status reported by the provider once a pod is up.
pub const POD_RUNNING: &str = "RUNNING";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("provider GraphQL error: {0}")]
    GraphQl(String),

    #[error("unexpected provider response: {0}")]
    Decode(String),
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkVolume {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<i32>,
    #[serde(default)]
    pub data_center_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    pub id: String,
    #[serde(default)]
    pub desired_status: Option<String>,
}

impl Pod {
    pub fn is_running(&self) -> bool {
        self.desired_status.as_deref() == Some(POD_RUNNING)
    }
}

/// Everything needed to deploy one workspace pod.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PodSpec {
    pub name: String,
    pub image_name: String,
    pub gpu_type_id: String,
    pub gpu_count: i32,
    pub container_disk_gb: i32,
    pub network_volume_id: String,
    pub data_center_id: String,
    pub volume_mount_path: String,
    pub ports: Vec<String>,
    pub container_registry_auth_id: Option<String>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PodTelemetry {
    pub desired_status: Option<String>,
    pub uptime_seconds: Option<i64>,
    pub gpu_display_name: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuType {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub memory_in_gb: Option<i32>,
    #[serde(default)]
    pub secure_cloud: Option<bool>,
    #[serde(default)]
    pub community_cloud: Option<bool>,
}

#[async_trait]
pub trait GpuCloud: Send + Sync {
    async fn create_network_volume(
        &self,
        name: &str,
        size_gb: i32,
        datacenter_id: &str,
    ) -> Result<NetworkVolume, ProviderError>;

    async fn get_network_volume(&self, volume_id: &str) -> Result<NetworkVolume, ProviderError>;

    /// Returns the raw HTTP status of the delete call; 200 and 204 mean deleted.
    async fn delete_network_volume(&self, volume_id: &str) -> Result<u16, ProviderError>;

    async fn create_pod(&self, spec: &PodSpec) -> Result<Pod, ProviderError>;

    async fn get_pod(&self, pod_id: &str) -> Result<Pod, ProviderError>;

    async fn pod_telemetry(&self, pod_id: &str) -> Result<PodTelemetry, ProviderError>;

    async fn stop_pod(&self, pod_id: &str) -> Result<Pod, ProviderError>;

    async fn terminate_pod(&self, pod_id: &str) -> Result<(), ProviderError>;

    async fn list_gpu_types(&self) -> Result<Vec<GpuType>, ProviderError>;
}

pub fn volume_deleted(status: u16) -> bool {
    status == 200 || status == 204
}
