use async_trait::async_trait;
use arion_core::Role;

use crate::{models::RoleDescriptor, persistence::RolePersistence};

/// Serves the same rows the initial migration seeds into `roles`.
#[derive(Debug, Default)]
pub struct RoleMemoryPersistence {}

#[async_trait]
impl RolePersistence for RoleMemoryPersistence {
    async fn list(&self) -> anyhow::Result<Vec<RoleDescriptor>> {
        let roles = [
            (Role::ArionAdmin, "Platform administrator"),
            (Role::OrgAdmin, "Organization administrator"),
            (Role::WorkspaceUser, "Workspace user"),
        ];

        Ok(roles
            .into_iter()
            .map(|(role, description)| RoleDescriptor {
                name: role.as_str().to_string(),
                description: Some(description.to_string()),
            })
            .collect())
    }
}
