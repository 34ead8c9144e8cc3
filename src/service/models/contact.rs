use arion_core::ContactRequestMessage;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Clone, Debug, Eq, FromRow, PartialEq)]
pub struct ContactRequest {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<ContactRequestMessage> for ContactRequest {
    fn from(message: ContactRequestMessage) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: message.name.trim().to_string(),
            email: message.email.trim().to_string(),
            company: message
                .company
                .map(|company| company.trim().to_string())
                .filter(|company| !company.is_empty()),
            message: message.message.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}
