use async_trait::async_trait;
use uuid::Uuid;

use super::MemoryPersistence;
use crate::{
    models::Organization,
    persistence::{OrganizationPersistence, Persistence},
};

#[derive(Debug, Default)]
pub struct OrganizationMemoryPersistence {
    organizations: MemoryPersistence<Organization>,
}

#[async_trait]
impl Persistence<Organization> for OrganizationMemoryPersistence {
    async fn upsert(&self, organization: &Organization) -> anyhow::Result<u64> {
        let mut locked_organizations = self.organizations.get_models_locked()?;

        // mirrors the unique constraint on organizations.name
        let duplicate = locked_organizations.values().any(|existing| {
            existing.id != organization.id && existing.name == organization.name
        });
        if duplicate {
            anyhow::bail!("organization name '{}' already exists", organization.name);
        }

        locked_organizations.insert(organization.id, organization.clone());

        Ok(1)
    }

    async fn delete(&self, organization_id: &Uuid) -> anyhow::Result<u64> {
        self.organizations.delete(organization_id).await
    }

    async fn get_by_id(&self, organization_id: &Uuid) -> anyhow::Result<Option<Organization>> {
        self.organizations.get_by_id(organization_id).await
    }

    async fn list(&self) -> anyhow::Result<Vec<Organization>> {
        let mut organizations = self.organizations.list().await?;
        organizations.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(organizations)
    }
}

#[async_trait]
impl OrganizationPersistence for OrganizationMemoryPersistence {
    async fn get_by_name(&self, name: &str) -> anyhow::Result<Option<Organization>> {
        let matching = self
            .organizations
            .filtered(|organization| organization.name == name)?;

        Ok(matching.into_iter().next())
    }

    async fn get_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Organization>> {
        let mut organizations = self
            .organizations
            .filtered(|organization| ids.contains(&organization.id))?;
        organizations.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(organizations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_names_are_rejected() {
        let organization_persistence = OrganizationMemoryPersistence::default();

        let organization = Organization::new("Acme");
        organization_persistence.upsert(&organization).await.unwrap();

        let duplicate = Organization::new("Acme");
        assert!(organization_persistence.upsert(&duplicate).await.is_err());

        let fetched = organization_persistence
            .get_by_name("Acme")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.id, organization.id);
    }
}
