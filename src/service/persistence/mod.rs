use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{ContactRequest, Order, Organization, OrganizationUser, Profile, RoleDescriptor};

pub mod memory;
pub mod relational;

pub trait PersistableModel {
    fn get_id(&self) -> Uuid;
}

#[async_trait]
pub trait Persistence<Model>: Send + Sync {
    async fn upsert(&self, model: &Model) -> anyhow::Result<u64>;
    async fn delete(&self, model_id: &Uuid) -> anyhow::Result<u64>;
    async fn get_by_id(&self, model_id: &Uuid) -> anyhow::Result<Option<Model>>;
    async fn list(&self) -> anyhow::Result<Vec<Model>>;
}

#[async_trait]
pub trait ProfilePersistence: Persistence<Profile> {
    async fn get_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Profile>>;
    async fn touch_last_login(&self, user_id: &Uuid, at: DateTime<Utc>) -> anyhow::Result<u64>;

    /// Removes the profile together with its auth backend user.
    async fn delete_user_and_profile(&self, user_id: &Uuid) -> anyhow::Result<u64>;
}

#[async_trait]
pub trait OrganizationPersistence: Persistence<Organization> {
    async fn get_by_name(&self, name: &str) -> anyhow::Result<Option<Organization>>;
    async fn get_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Organization>>;
}

#[async_trait]
pub trait MembershipPersistence: Send + Sync {
    async fn add(&self, membership: &OrganizationUser) -> anyhow::Result<u64>;
    async fn remove_all_for_user(&self, user_id: &Uuid) -> anyhow::Result<u64>;
    async fn get_by_user_id(&self, user_id: &Uuid) -> anyhow::Result<Vec<OrganizationUser>>;
    async fn get_by_organization_ids(
        &self,
        organization_ids: &[Uuid],
    ) -> anyhow::Result<Vec<OrganizationUser>>;
}

#[async_trait]
pub trait OrderPersistence: Persistence<Order> {
    async fn get_by_organization_ids(&self, organization_ids: &[Uuid]) -> anyhow::Result<Vec<Order>>;
}

#[async_trait]
pub trait RolePersistence: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<RoleDescriptor>>;
}

#[async_trait]
pub trait ContactPersistence: Send + Sync {
    async fn create(&self, contact: &ContactRequest) -> anyhow::Result<u64>;
}
