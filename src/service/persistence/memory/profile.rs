use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::MemoryPersistence;
use crate::{
    models::Profile,
    persistence::{Persistence, ProfilePersistence},
};

#[derive(Debug, Default)]
pub struct ProfileMemoryPersistence {
    profiles: MemoryPersistence<Profile>,
}

#[async_trait]
impl Persistence<Profile> for ProfileMemoryPersistence {
    async fn upsert(&self, profile: &Profile) -> anyhow::Result<u64> {
        self.profiles.upsert(profile).await
    }

    async fn delete(&self, profile_id: &Uuid) -> anyhow::Result<u64> {
        self.profiles.delete(profile_id).await
    }

    async fn get_by_id(&self, profile_id: &Uuid) -> anyhow::Result<Option<Profile>> {
        self.profiles.get_by_id(profile_id).await
    }

    async fn list(&self) -> anyhow::Result<Vec<Profile>> {
        self.profiles.list().await
    }
}

#[async_trait]
impl ProfilePersistence for ProfileMemoryPersistence {
    async fn get_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Profile>> {
        self.profiles.filtered(|profile| ids.contains(&profile.id))
    }

    async fn touch_last_login(&self, user_id: &Uuid, at: DateTime<Utc>) -> anyhow::Result<u64> {
        let mut locked_profiles = self.profiles.get_models_locked()?;

        match locked_profiles.get_mut(user_id) {
            Some(profile) => {
                profile.last_login = Some(at);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_user_and_profile(&self, user_id: &Uuid) -> anyhow::Result<u64> {
        self.profiles.delete(user_id).await
    }
}
