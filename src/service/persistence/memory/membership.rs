use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::{models::OrganizationUser, persistence::MembershipPersistence};

#[derive(Debug, Default)]
pub struct MembershipMemoryPersistence {
    memberships: Arc<Mutex<Vec<OrganizationUser>>>,
}

#[async_trait]
impl MembershipPersistence for MembershipMemoryPersistence {
    async fn add(&self, membership: &OrganizationUser) -> anyhow::Result<u64> {
        let mut locked_memberships = self.get_models_locked()?;

        locked_memberships.retain(|existing| {
            !(existing.user_id == membership.user_id
                && existing.organization_id == membership.organization_id)
        });
        locked_memberships.push(membership.clone());

        Ok(1)
    }

    async fn remove_all_for_user(&self, user_id: &Uuid) -> anyhow::Result<u64> {
        let mut locked_memberships = self.get_models_locked()?;

        let before = locked_memberships.len();
        locked_memberships.retain(|membership| membership.user_id != *user_id);

        Ok((before - locked_memberships.len()) as u64)
    }

    async fn get_by_user_id(&self, user_id: &Uuid) -> anyhow::Result<Vec<OrganizationUser>> {
        let locked_memberships = self.get_models_locked()?;

        Ok(locked_memberships
            .iter()
            .filter(|membership| membership.user_id == *user_id)
            .cloned()
            .collect())
    }

    async fn get_by_organization_ids(
        &self,
        organization_ids: &[Uuid],
    ) -> anyhow::Result<Vec<OrganizationUser>> {
        let locked_memberships = self.get_models_locked()?;

        Ok(locked_memberships
            .iter()
            .filter(|membership| organization_ids.contains(&membership.organization_id))
            .cloned()
            .collect())
    }
}

impl MembershipMemoryPersistence {
    fn get_models_locked(&self) -> anyhow::Result<MutexGuard<Vec<OrganizationUser>>> {
        match self.memberships.lock() {
            Ok(locked_memberships) => Ok(locked_memberships),
            Err(_) => Err(anyhow::anyhow!("failed to acquire lock")),
        }
    }
}
