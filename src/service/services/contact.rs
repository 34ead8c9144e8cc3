use arion_core::ContactRequestMessage;

use crate::error::ApiError;
use crate::models::ContactRequest;
use crate::persistence::ContactPersistence;

const MAX_MESSAGE_CHARS: usize = 5000;

pub struct ContactService {
    pub persistence: Box<dyn ContactPersistence>,
}

impl ContactService {
    #[tracing::instrument(name = "service::contact::submit", skip_all)]
    pub async fn submit(&self, message: ContactRequestMessage) -> Result<ContactRequest, ApiError> {
        let contact = ContactRequest::from(message);

        if contact.name.is_empty() {
            return Err(ApiError::Validation("name is required".to_string()));
        }
        if !contact.email.contains('@') {
            return Err(ApiError::Validation("a valid email is required".to_string()));
        }
        if contact.message.is_empty() {
            return Err(ApiError::Validation("message is required".to_string()));
        }
        if contact.message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ApiError::Validation(format!(
                "message must be at most {MAX_MESSAGE_CHARS} characters"
            )));
        }

        self.persistence.create(&contact).await?;

        tracing::info!(contact_id = %contact.id, "contact request stored");

        Ok(contact)
    }
}

#[cfg(test)]
mod tests {
    use arion_core::test::get_contact_fixture;
    use std::sync::Arc;

    use super::*;
    use crate::persistence::memory::ContactMemoryPersistence;

    struct SharedContacts(Arc<ContactMemoryPersistence>);

    #[async_trait::async_trait]
    impl ContactPersistence for SharedContacts {
        async fn create(&self, contact: &ContactRequest) -> anyhow::Result<u64> {
            self.0.create(contact).await
        }
    }

    #[tokio::test]
    async fn test_submit_validates_and_stores() {
        let contacts = Arc::new(ContactMemoryPersistence::default());
        let service = ContactService {
            persistence: Box::new(SharedContacts(Arc::clone(&contacts))),
        };

        let mut invalid = get_contact_fixture();
        invalid.email = "not-an-email".into();
        let err = service.submit(invalid).await.unwrap_err();
        assert_eq!(err.status_code(), 400);

        let mut blank = get_contact_fixture();
        blank.message = "   ".into();
        assert!(service.submit(blank).await.is_err());

        service.submit(get_contact_fixture()).await.unwrap();

        let stored = contacts.stored().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].company.as_deref(), Some("Analytical Engines"));
    }
}
