use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::models::RoleDescriptor;
use crate::persistence::RolePersistence;

#[derive(Debug)]
pub struct RoleRelationalPersistence {
    pub db: Arc<PgPool>,
}

#[async_trait]
impl RolePersistence for RoleRelationalPersistence {
    #[tracing::instrument(name = "relational::role::list", skip_all)]
    async fn list(&self) -> anyhow::Result<Vec<RoleDescriptor>> {
        let roles =
            sqlx::query_as::<_, RoleDescriptor>("SELECT name, description FROM roles ORDER BY name")
                .fetch_all(&*self.db)
                .await?;

        Ok(roles)
    }
}
