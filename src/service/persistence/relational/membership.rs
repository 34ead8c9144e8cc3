use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::OrganizationUser;
use crate::persistence::MembershipPersistence;

#[derive(Debug)]
pub struct MembershipRelationalPersistence {
    pub db: Arc<PgPool>,
}

#[async_trait]
impl MembershipPersistence for MembershipRelationalPersistence {
    #[tracing::instrument(name = "relational::membership::add", skip_all)]
    async fn add(&self, membership: &OrganizationUser) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO organization_users
               (user_id, organization_id, role)
            VALUES
               ($1, $2, $3)
            ON CONFLICT (user_id, organization_id) DO UPDATE SET
               role = $3
            "#,
        )
        .bind(membership.user_id)
        .bind(membership.organization_id)
        .bind(membership.role.as_str())
        .execute(&*self.db)
        .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(name = "relational::membership::remove_all_for_user", skip_all)]
    async fn remove_all_for_user(&self, user_id: &Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM organization_users WHERE user_id = $1")
            .bind(user_id)
            .execute(&*self.db)
            .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(name = "relational::membership::get_by_user_id", skip_all)]
    async fn get_by_user_id(&self, user_id: &Uuid) -> anyhow::Result<Vec<OrganizationUser>> {
        let memberships = sqlx::query_as::<_, OrganizationUser>(
            "SELECT user_id, organization_id, role FROM organization_users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&*self.db)
        .await?;

        Ok(memberships)
    }

    #[tracing::instrument(name = "relational::membership::get_by_organization_ids", skip_all)]
    async fn get_by_organization_ids(
        &self,
        organization_ids: &[Uuid],
    ) -> anyhow::Result<Vec<OrganizationUser>> {
        let memberships = sqlx::query_as::<_, OrganizationUser>(
            r#"
            SELECT user_id, organization_id, role
            FROM organization_users
            WHERE organization_id = ANY($1)
            "#,
        )
        .bind(organization_ids)
        .fetch_all(&*self.db)
        .await?;

        Ok(memberships)
    }
}
