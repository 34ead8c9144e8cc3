use std::sync::Arc;

use crate::acl::Caller;
use crate::error::ApiError;
use crate::models::{Organization, RoleDescriptor};
use crate::persistence::{OrganizationPersistence, Persistence, RolePersistence};

pub struct OrganizationService {
    pub persistence: Arc<dyn OrganizationPersistence>,
    pub roles: Box<dyn RolePersistence>,
}

impl OrganizationService {
    #[tracing::instrument(name = "service::organization::list", skip_all)]
    pub async fn list(&self, caller: &Caller) -> Result<Vec<Organization>, ApiError> {
        caller.require_admin()?;

        let organizations = if caller.is_arion_admin() {
            self.persistence.list().await?
        } else {
            self.persistence.get_by_ids(&caller.organization_ids).await?
        };

        Ok(organizations)
    }

    #[tracing::instrument(name = "service::organization::create", skip(self, caller))]
    pub async fn create(&self, caller: &Caller, name: &str) -> Result<Organization, ApiError> {
        caller.require_arion_admin()?;

        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("name is required".to_string()));
        }

        if self.persistence.get_by_name(name).await?.is_some() {
            return Err(ApiError::Conflict(format!(
                "organization '{name}' already exists"
            )));
        }

        let organization = Organization::new(name);
        self.persistence.upsert(&organization).await?;

        tracing::info!(organization_id = %organization.id, "organization created");

        Ok(organization)
    }

    #[tracing::instrument(name = "service::organization::list_roles", skip_all)]
    pub async fn list_roles(&self, caller: &Caller) -> Result<Vec<RoleDescriptor>, ApiError> {
        caller.require_admin()?;

        Ok(self.roles.list().await?)
    }
}
