use arion_core::{ProfileMessage, Role};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::persistence::PersistableModel;

#[derive(Clone, Debug, Eq, FromRow, PartialEq)]
pub struct Profile {
    /// Same id as the auth backend user.
    pub id: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_title: Option<String>,
    pub phone: Option<String>,

    /// Gate for using the application beyond the pending-approval screens.
    pub authorized: bool,

    #[sqlx(try_from = "String")]
    pub role: Role,

    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(id: Uuid, email: &str, role: Role) -> Self {
        Self {
            id,
            email: Some(email.to_string()),
            first_name: None,
            last_name: None,
            job_title: None,
            phone: None,
            authorized: false,
            role,
            last_login: None,
            created_at: Utc::now(),
        }
    }

    pub fn into_message(self, organization_ids: Vec<Uuid>) -> ProfileMessage {
        ProfileMessage {
            id: self.id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            job_title: self.job_title,
            phone: self.phone,
            authorized: self.authorized,
            role: self.role,
            last_login: self.last_login,
            organization_ids,
        }
    }
}

impl PersistableModel for Profile {
    fn get_id(&self) -> Uuid {
        self.id
    }
}
