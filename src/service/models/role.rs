use arion_core::RoleMessage;
use sqlx::FromRow;

#[derive(Clone, Debug, Eq, FromRow, PartialEq)]
pub struct RoleDescriptor {
    pub name: String,
    pub description: Option<String>,
}

impl From<RoleDescriptor> for RoleMessage {
    fn from(role: RoleDescriptor) -> Self {
        Self {
            name: role.name,
            description: role.description,
        }
    }
}
