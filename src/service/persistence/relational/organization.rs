use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::Organization;
use crate::persistence::{OrganizationPersistence, Persistence};

#[derive(Debug)]
pub struct OrganizationRelationalPersistence {
    pub db: Arc<PgPool>,
}

#[async_trait]
impl Persistence<Organization> for OrganizationRelationalPersistence {
    #[tracing::instrument(name = "relational::organization::upsert", skip_all)]
    async fn upsert(&self, organization: &Organization) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO organizations
               (id, name, created_at)
            VALUES
               ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
               name = $2
            "#,
        )
        .bind(organization.id)
        .bind(&organization.name)
        .bind(organization.created_at)
        .execute(&*self.db)
        .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(name = "relational::organization::delete", skip_all)]
    async fn delete(&self, id: &Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(&*self.db)
            .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(name = "relational::organization::get_by_id", skip_all)]
    async fn get_by_id(&self, id: &Uuid) -> anyhow::Result<Option<Organization>> {
        let organization =
            sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
                .bind(id)
                .fetch_optional(&*self.db)
                .await?;

        Ok(organization)
    }

    #[tracing::instrument(name = "relational::organization::list", skip_all)]
    async fn list(&self) -> anyhow::Result<Vec<Organization>> {
        let organizations =
            sqlx::query_as::<_, Organization>("SELECT * FROM organizations ORDER BY name")
                .fetch_all(&*self.db)
                .await?;

        Ok(organizations)
    }
}

#[async_trait]
impl OrganizationPersistence for OrganizationRelationalPersistence {
    #[tracing::instrument(name = "relational::organization::get_by_name", skip_all)]
    async fn get_by_name(&self, name: &str) -> anyhow::Result<Option<Organization>> {
        let organization =
            sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE name = $1")
                .bind(name)
                .fetch_optional(&*self.db)
                .await?;

        Ok(organization)
    }

    #[tracing::instrument(name = "relational::organization::get_by_ids", skip_all)]
    async fn get_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Organization>> {
        let organizations = sqlx::query_as::<_, Organization>(
            "SELECT * FROM organizations WHERE id = ANY($1) ORDER BY name",
        )
        .bind(ids)
        .fetch_all(&*self.db)
        .await?;

        Ok(organizations)
    }
}
