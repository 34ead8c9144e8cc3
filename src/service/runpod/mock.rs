use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{GpuCloud, GpuType, NetworkVolume, Pod, PodSpec, PodTelemetry, ProviderError, POD_RUNNING};

/// Failure switches for [`MockGpuCloud`].
#[derive(Clone, Debug, Default)]
pub struct MockBehavior {
    pub fail_volume_create: bool,
    pub fail_pod_create: bool,
    pub pod_never_ready: bool,
    /// Number of `get_pod` calls that report a non-running pod before it turns `RUNNING`.
    pub polls_until_ready: u32,
    pub fail_stop: bool,
    pub fail_terminate: bool,
    pub fail_telemetry: bool,
    pub fail_volume_lookup: bool,
    pub volume_delete_status: Option<u16>,
}

#[derive(Debug, Default)]
struct MockState {
    volumes: HashMap<String, NetworkVolume>,
    pods: HashMap<String, (Pod, u32)>,
    calls: Vec<String>,
    next_id: u32,
}

/// In-memory GPU cloud used by tests and local development.
#[derive(Debug, Default)]
pub struct MockGpuCloud {
    behavior: MockBehavior,
    state: Mutex<MockState>,
}

impl MockGpuCloud {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            state: Mutex::new(MockState::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<MockState>, ProviderError> {
        self.state
            .lock()
            .map_err(|_| ProviderError::Decode("mock state poisoned".into()))
    }

    fn record(&self, call: String) -> Result<MutexGuard<MockState>, ProviderError> {
        let mut state = self.lock()?;
        state.calls.push(call);

        Ok(state)
    }

    /// Every provider call made so far, as `operation:argument`.
    pub fn calls(&self) -> Vec<String> {
        self.lock().map(|state| state.calls.clone()).unwrap_or_default()
    }

    pub fn volume_exists(&self, volume_id: &str) -> bool {
        self.lock()
            .map(|state| state.volumes.contains_key(volume_id))
            .unwrap_or(false)
    }

    pub fn pod_exists(&self, pod_id: &str) -> bool {
        self.lock()
            .map(|state| state.pods.contains_key(pod_id))
            .unwrap_or(false)
    }

    /// Registers a pod directly, for tests that start from an existing order.
    pub fn insert_pod(&self, pod_id: &str, desired_status: &str) {
        if let Ok(mut state) = self.lock() {
            let pod = Pod {
                id: pod_id.to_string(),
                desired_status: Some(desired_status.to_string()),
            };
            state.pods.insert(pod_id.to_string(), (pod, 0));
        }
    }

    pub fn insert_volume(&self, volume_id: &str, size_gb: i32) {
        if let Ok(mut state) = self.lock() {
            let volume = NetworkVolume {
                id: volume_id.to_string(),
                name: None,
                size: Some(size_gb),
                data_center_id: None,
            };
            state.volumes.insert(volume_id.to_string(), volume);
        }
    }

    fn failure(operation: &str) -> ProviderError {
        ProviderError::Api {
            status: 500,
            message: format!("{operation} failed"),
        }
    }
}

#[async_trait]
impl GpuCloud for MockGpuCloud {
    async fn create_network_volume(
        &self,
        name: &str,
        size_gb: i32,
        datacenter_id: &str,
    ) -> Result<NetworkVolume, ProviderError> {
        let mut state = self.record(format!("create_network_volume:{name}"))?;
        if self.behavior.fail_volume_create {
            return Err(Self::failure("create_network_volume"));
        }

        state.next_id += 1;
        let volume = NetworkVolume {
            id: format!("vol-{}", state.next_id),
            name: Some(name.to_string()),
            size: Some(size_gb),
            data_center_id: Some(datacenter_id.to_string()),
        };
        state.volumes.insert(volume.id.clone(), volume.clone());

        Ok(volume)
    }

    async fn get_network_volume(&self, volume_id: &str) -> Result<NetworkVolume, ProviderError> {
        let state = self.record(format!("get_network_volume:{volume_id}"))?;
        if self.behavior.fail_volume_lookup {
            return Err(Self::failure("get_network_volume"));
        }

        state.volumes.get(volume_id).cloned().ok_or(ProviderError::Api {
            status: 404,
            message: format!("volume {volume_id} not found"),
        })
    }

    async fn delete_network_volume(&self, volume_id: &str) -> Result<u16, ProviderError> {
        let mut state = self.record(format!("delete_network_volume:{volume_id}"))?;

        if let Some(status) = self.behavior.volume_delete_status {
            return Ok(status);
        }

        match state.volumes.remove(volume_id) {
            Some(_) => Ok(204),
            None => Ok(404),
        }
    }

    async fn create_pod(&self, spec: &PodSpec) -> Result<Pod, ProviderError> {
        let mut state = self.record(format!("create_pod:{}", spec.network_volume_id))?;
        if self.behavior.fail_pod_create {
            return Err(Self::failure("create_pod"));
        }

        state.next_id += 1;
        let pod = Pod {
            id: format!("pod-{}", state.next_id),
            desired_status: Some("CREATED".to_string()),
        };
        state.pods.insert(pod.id.clone(), (pod.clone(), 0));

        Ok(pod)
    }

    async fn get_pod(&self, pod_id: &str) -> Result<Pod, ProviderError> {
        let mut state = self.record(format!("get_pod:{pod_id}"))?;
        let polls_until_ready = self.behavior.polls_until_ready;
        let never_ready = self.behavior.pod_never_ready;

        let (pod, polls) = state.pods.get_mut(pod_id).ok_or(ProviderError::Api {
            status: 404,
            message: format!("pod {pod_id} not found"),
        })?;

        *polls += 1;
        if !never_ready && *polls > polls_until_ready {
            pod.desired_status = Some(POD_RUNNING.to_string());
        }

        Ok(pod.clone())
    }

    async fn pod_telemetry(&self, pod_id: &str) -> Result<PodTelemetry, ProviderError> {
        let state = self.record(format!("pod_telemetry:{pod_id}"))?;
        if self.behavior.fail_telemetry {
            return Err(ProviderError::GraphQl("telemetry unavailable".into()));
        }

        let (pod, polls) = state.pods.get(pod_id).ok_or(ProviderError::Api {
            status: 404,
            message: format!("pod {pod_id} not found"),
        })?;

        Ok(PodTelemetry {
            desired_status: pod.desired_status.clone(),
            uptime_seconds: Some(i64::from(*polls) * 60),
            gpu_display_name: Some("A40".to_string()),
        })
    }

    async fn stop_pod(&self, pod_id: &str) -> Result<Pod, ProviderError> {
        let mut state = self.record(format!("stop_pod:{pod_id}"))?;
        if self.behavior.fail_stop {
            return Err(ProviderError::GraphQl("podStop failed".into()));
        }

        let (pod, _) = state.pods.get_mut(pod_id).ok_or(ProviderError::GraphQl(format!(
            "pod {pod_id} not found"
        )))?;
        pod.desired_status = Some("EXITED".to_string());

        Ok(pod.clone())
    }

    async fn terminate_pod(&self, pod_id: &str) -> Result<(), ProviderError> {
        let mut state = self.record(format!("terminate_pod:{pod_id}"))?;
        if self.behavior.fail_terminate {
            return Err(ProviderError::GraphQl("podTerminate failed".into()));
        }

        state.pods.remove(pod_id);

        Ok(())
    }

    async fn list_gpu_types(&self) -> Result<Vec<GpuType>, ProviderError> {
        let _state = self.record("list_gpu_types".to_string())?;

        Ok(vec![
            GpuType {
                id: "NVIDIA A40".to_string(),
                display_name: "A40".to_string(),
                memory_in_gb: Some(48),
                secure_cloud: Some(true),
                community_cloud: Some(true),
            },
            GpuType {
                id: "NVIDIA H100 80GB HBM3".to_string(),
                display_name: "H100 SXM".to_string(),
                memory_in_gb: Some(80),
                secure_cloud: Some(true),
                community_cloud: Some(false),
            },
        ])
    }
}
