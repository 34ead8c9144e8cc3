use arion_core::{MemberRole, OrganizationMessage};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::persistence::PersistableModel;

#[derive(Clone, Debug, Eq, FromRow, PartialEq)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}

impl PersistableModel for Organization {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl From<Organization> for OrganizationMessage {
    fn from(organization: Organization) -> Self {
        Self {
            id: organization.id,
            name: organization.name,
            created_at: organization.created_at,
        }
    }
}

/// Row of the `organization_users` join table.
#[derive(Clone, Debug, Eq, FromRow, PartialEq)]
pub struct OrganizationUser {
    pub user_id: Uuid,
    pub organization_id: Uuid,

    #[sqlx(try_from = "String")]
    pub role: MemberRole,
}
