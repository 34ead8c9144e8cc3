use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};
use uuid::Uuid;

use crate::persistence::{PersistableModel, Persistence};

#[derive(Debug)]
pub struct MemoryPersistence<Model>
where
    Model: PersistableModel + Clone + Send + Sync,
{
    models: Arc<Mutex<HashMap<Uuid, Model>>>,
}

#[async_trait]
impl<Model> Persistence<Model> for MemoryPersistence<Model>
where
    Model: PersistableModel + Clone + Send + Sync,
{
    async fn upsert(&self, model: &Model) -> anyhow::Result<u64> {
        let mut locked_models = self.get_models_locked()?;

        locked_models.insert(model.get_id(), model.clone());

        Ok(1)
    }

    async fn delete(&self, model_id: &Uuid) -> anyhow::Result<u64> {
        let mut locked_models = self.get_models_locked()?;

        match locked_models.remove(model_id) {
            Some(_) => Ok(1),
            None => Ok(0),
        }
    }

    async fn get_by_id(&self, model_id: &Uuid) -> anyhow::Result<Option<Model>> {
        let locked_models = self.get_models_locked()?;

        Ok(locked_models.get(model_id).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<Model>> {
        let locked_models = self.get_models_locked()?;

        let models = locked_models.values().cloned().collect();

        Ok(models)
    }
}

impl<Model> Default for MemoryPersistence<Model>
where
    Model: PersistableModel + Clone + Send + Sync,
{
    fn default() -> Self {
        Self {
            models: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<Model> MemoryPersistence<Model>
where
    Model: PersistableModel + Clone + Send + Sync,
{
    pub(crate) fn get_models_locked(&self) -> anyhow::Result<MutexGuard<HashMap<Uuid, Model>>> {
        match self.models.lock() {
            Ok(locked_models) => Ok(locked_models),
            Err(_) => Err(anyhow::anyhow!("failed to acquire lock")),
        }
    }

    pub(crate) fn filtered<F>(&self, predicate: F) -> anyhow::Result<Vec<Model>>
    where
        F: Fn(&Model) -> bool,
    {
        let locked_models = self.get_models_locked()?;

        let models = locked_models
            .values()
            .filter(|model| predicate(model))
            .cloned()
            .collect();

        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use arion_core::Role;

    use super::*;
    use crate::models::Profile;

    #[tokio::test]
    async fn test_upsert_get_delete() {
        let profile_persistence = MemoryPersistence::<Profile>::default();
        let profile = Profile::new(Uuid::new_v4(), "ada@example.com", Role::WorkspaceUser);

        let upserted = profile_persistence.upsert(&profile).await.unwrap();
        assert_eq!(upserted, 1);

        let fetched_profile = profile_persistence
            .get_by_id(&profile.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched_profile, profile);

        assert_eq!(profile_persistence.list().await.unwrap().len(), 1);

        let deleted_profiles = profile_persistence.delete(&profile.id).await.unwrap();
        assert_eq!(deleted_profiles, 1);

        let deleted_profiles = profile_persistence.delete(&profile.id).await.unwrap();
        assert_eq!(deleted_profiles, 0);
    }
}
