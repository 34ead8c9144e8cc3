use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use super::{GpuCloud, GpuType, NetworkVolume, Pod, PodSpec, PodTelemetry, ProviderError};
use crate::config::PodDeployMode;

const DEPLOY_POD_MUTATION: &str = r#"
mutation deployPod($input: PodFindAndDeployOnDemandInput) {
  podFindAndDeployOnDemand(input: $input) { id desiredStatus }
}"#;

const POD_TELEMETRY_QUERY: &str = r#"
query podTelemetry($input: PodFilter) {
  pod(input: $input) {
    id
    desiredStatus
    runtime { uptimeInSeconds }
    machine { gpuDisplayName }
  }
}"#;

const STOP_POD_MUTATION: &str = r#"
mutation stopPod($input: PodStopInput!) {
  podStop(input: $input) { id desiredStatus }
}"#;

const TERMINATE_POD_MUTATION: &str = r#"
mutation terminatePod($input: PodTerminateInput!) {
  podTerminate(input: $input)
}"#;

const GPU_TYPES_QUERY: &str = r#"
query gpuTypes {
  gpuTypes { id displayName memoryInGb secureCloud communityCloud }
}"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlErrorItem>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorItem {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TelemetryPod {
    desired_status: Option<String>,
    runtime: Option<TelemetryRuntime>,
    machine: Option<TelemetryMachine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TelemetryRuntime {
    uptime_in_seconds: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TelemetryMachine {
    gpu_display_name: Option<String>,
}

/// REST + GraphQL client for the RunPod API.
#[derive(Clone, Debug)]
pub struct RunPodClient {
    http: reqwest::Client,
    rest_url: String,
    graphql_url: String,
    deploy_mode: PodDeployMode,
}

impl RunPodClient {
    pub fn new(
        api_key: &str,
        rest_url: &str,
        graphql_url: &str,
        deploy_mode: PodDeployMode,
    ) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        let token_value = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| ProviderError::Decode("invalid api key format".into()))?;
        headers.insert(AUTHORIZATION, token_value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            rest_url: rest_url.trim_end_matches('/').to_string(),
            graphql_url: graphql_url.to_string(),
            deploy_mode,
        })
    }

    fn rest(&self, path: &str) -> String {
        format!("{}{}", self.rest_url, path)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("unknown").to_string()
        } else {
            body.chars().take(512).collect()
        };

        Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Runs a GraphQL operation and decodes `data.<field>`.
    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
        field: &str,
    ) -> Result<T, ProviderError> {
        let response = self
            .http
            .post(&self.graphql_url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let envelope: GraphQlResponse = response.json().await?;
        if !envelope.errors.is_empty() {
            let messages: Vec<String> = envelope
                .errors
                .into_iter()
                .map(|error| error.message)
                .collect();
            return Err(ProviderError::GraphQl(messages.join("; ")));
        }

        let value = envelope
            .data
            .and_then(|mut data| data.get_mut(field).map(Value::take))
            .unwrap_or(Value::Null);

        serde_json::from_value(value).map_err(|err| ProviderError::Decode(format!("{field}: {err}")))
    }

    async fn create_pod_rest(&self, spec: &PodSpec) -> Result<Pod, ProviderError> {
        let mut body = json!({
            "name": spec.name,
            "imageName": spec.image_name,
            "cloudType": "SECURE",
            "gpuTypeIds": [spec.gpu_type_id],
            "gpuCount": spec.gpu_count,
            "containerDiskInGb": spec.container_disk_gb,
            "networkVolumeId": spec.network_volume_id,
            "dataCenterIds": [spec.data_center_id],
            "volumeMountPath": spec.volume_mount_path,
            "ports": spec.ports,
        });
        if let Some(auth_id) = &spec.container_registry_auth_id {
            body["containerRegistryAuthId"] = json!(auth_id);
        }

        let response = self.http.post(self.rest("/pods")).json(&body).send().await?;
        let response = Self::check_status(response).await?;

        Ok(response.json().await?)
    }

    async fn create_pod_graphql(&self, spec: &PodSpec) -> Result<Pod, ProviderError> {
        let mut input = json!({
            "cloudType": "SECURE",
            "gpuCount": spec.gpu_count,
            "gpuTypeId": spec.gpu_type_id,
            "name": spec.name,
            "imageName": spec.image_name,
            "containerDiskInGb": spec.container_disk_gb,
            "networkVolumeId": spec.network_volume_id,
            "dataCenterId": spec.data_center_id,
            "volumeMountPath": spec.volume_mount_path,
            "ports": spec.ports.join(","),
        });
        if let Some(auth_id) = &spec.container_registry_auth_id {
            input["containerRegistryAuthId"] = json!(auth_id);
        }

        let pod: Option<Pod> = self
            .graphql(
                DEPLOY_POD_MUTATION,
                json!({ "input": input }),
                "podFindAndDeployOnDemand",
            )
            .await?;

        pod.ok_or_else(|| ProviderError::GraphQl("no pod capacity available".into()))
    }
}

#[async_trait]
impl GpuCloud for RunPodClient {
    #[tracing::instrument(name = "runpod::create_network_volume", skip(self))]
    async fn create_network_volume(
        &self,
        name: &str,
        size_gb: i32,
        datacenter_id: &str,
    ) -> Result<NetworkVolume, ProviderError> {
        let response = self
            .http
            .post(self.rest("/networkvolumes"))
            .json(&json!({ "name": name, "size": size_gb, "dataCenterId": datacenter_id }))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        Ok(response.json().await?)
    }

    #[tracing::instrument(name = "runpod::get_network_volume", skip(self))]
    async fn get_network_volume(&self, volume_id: &str) -> Result<NetworkVolume, ProviderError> {
        let response = self
            .http
            .get(self.rest(&format!("/networkvolumes/{volume_id}")))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        Ok(response.json().await?)
    }

    #[tracing::instrument(name = "runpod::delete_network_volume", skip(self))]
    async fn delete_network_volume(&self, volume_id: &str) -> Result<u16, ProviderError> {
        let response = self
            .http
            .delete(self.rest(&format!("/networkvolumes/{volume_id}")))
            .send()
            .await?;

        Ok(response.status().as_u16())
    }

    #[tracing::instrument(name = "runpod::create_pod", skip_all, fields(name = %spec.name))]
    async fn create_pod(&self, spec: &PodSpec) -> Result<Pod, ProviderError> {
        match self.deploy_mode {
            PodDeployMode::Rest => self.create_pod_rest(spec).await,
            PodDeployMode::GraphQl => self.create_pod_graphql(spec).await,
        }
    }

    #[tracing::instrument(name = "runpod::get_pod", skip(self))]
    async fn get_pod(&self, pod_id: &str) -> Result<Pod, ProviderError> {
        let response = self
            .http
            .get(self.rest(&format!("/pods/{pod_id}")))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        Ok(response.json().await?)
    }

    #[tracing::instrument(name = "runpod::pod_telemetry", skip(self))]
    async fn pod_telemetry(&self, pod_id: &str) -> Result<PodTelemetry, ProviderError> {
        let pod: Option<TelemetryPod> = self
            .graphql(
                POD_TELEMETRY_QUERY,
                json!({ "input": { "podId": pod_id } }),
                "pod",
            )
            .await?;

        let pod = pod.ok_or_else(|| ProviderError::Api {
            status: 404,
            message: format!("pod {pod_id} not found"),
        })?;

        Ok(PodTelemetry {
            desired_status: pod.desired_status,
            uptime_seconds: pod.runtime.and_then(|runtime| runtime.uptime_in_seconds),
            gpu_display_name: pod.machine.and_then(|machine| machine.gpu_display_name),
        })
    }

    #[tracing::instrument(name = "runpod::stop_pod", skip(self))]
    async fn stop_pod(&self, pod_id: &str) -> Result<Pod, ProviderError> {
        self.graphql(
            STOP_POD_MUTATION,
            json!({ "input": { "podId": pod_id } }),
            "podStop",
        )
        .await
    }

    #[tracing::instrument(name = "runpod::terminate_pod", skip(self))]
    async fn terminate_pod(&self, pod_id: &str) -> Result<(), ProviderError> {
        let _: Value = self
            .graphql(
                TERMINATE_POD_MUTATION,
                json!({ "input": { "podId": pod_id } }),
                "podTerminate",
            )
            .await?;

        Ok(())
    }

    #[tracing::instrument(name = "runpod::list_gpu_types", skip_all)]
    async fn list_gpu_types(&self) -> Result<Vec<GpuType>, ProviderError> {
        let gpu_types: Option<Vec<GpuType>> =
            self.graphql(GPU_TYPES_QUERY, json!({}), "gpuTypes").await?;

        Ok(gpu_types.unwrap_or_default())
    }
}
