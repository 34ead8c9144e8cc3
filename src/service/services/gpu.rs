use arion_core::{catalog::aliases_for, GpuTypeMessage};
use std::sync::Arc;

use crate::error::ApiError;
use crate::runpod::GpuCloud;

pub struct GpuService {
    pub cloud: Arc<dyn GpuCloud>,
}

impl GpuService {
    /// Provider GPU types, each annotated with the shorthand names that resolve to it.
    #[tracing::instrument(name = "service::gpu::list", skip_all)]
    pub async fn list(&self) -> Result<Vec<GpuTypeMessage>, ApiError> {
        let mut gpu_types = self.cloud.list_gpu_types().await?;
        gpu_types.sort_by(|a, b| a.display_name.cmp(&b.display_name));

        let gpus = gpu_types
            .into_iter()
            .map(|gpu_type| GpuTypeMessage {
                aliases: aliases_for(&gpu_type.id),
                id: gpu_type.id,
                display_name: gpu_type.display_name,
                memory_in_gb: gpu_type.memory_in_gb,
                secure_cloud: gpu_type.secure_cloud.unwrap_or(false),
                community_cloud: gpu_type.community_cloud.unwrap_or(false),
            })
            .collect();

        Ok(gpus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runpod::mock::MockGpuCloud;

    #[tokio::test]
    async fn test_list_includes_aliases() {
        let service = GpuService {
            cloud: Arc::new(MockGpuCloud::default()),
        };

        let gpus = service.list().await.unwrap();
        assert_eq!(gpus.len(), 2);

        let h100 = gpus
            .iter()
            .find(|gpu| gpu.id == "NVIDIA H100 80GB HBM3")
            .unwrap();
        assert!(h100.aliases.contains(&"h100".to_string()));
        assert!(h100.aliases.contains(&"enterprise".to_string()));
        assert!(!h100.community_cloud);
    }
}
