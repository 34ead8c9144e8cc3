use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::{models::ContactRequest, persistence::ContactPersistence};

#[derive(Debug, Default)]
pub struct ContactMemoryPersistence {
    contacts: Arc<Mutex<Vec<ContactRequest>>>,
}

#[async_trait]
impl ContactPersistence for ContactMemoryPersistence {
    async fn create(&self, contact: &ContactRequest) -> anyhow::Result<u64> {
        let mut locked_contacts = self
            .contacts
            .lock()
            .map_err(|_| anyhow::anyhow!("failed to acquire lock"))?;

        locked_contacts.push(contact.clone());

        Ok(1)
    }
}

impl ContactMemoryPersistence {
    pub fn stored(&self) -> anyhow::Result<Vec<ContactRequest>> {
        let locked_contacts = self
            .contacts
            .lock()
            .map_err(|_| anyhow::anyhow!("failed to acquire lock"))?;

        Ok(locked_contacts.clone())
    }
}
