use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::Order;
use crate::persistence::{OrderPersistence, Persistence};

#[derive(Debug)]
pub struct OrderRelationalPersistence {
    pub db: Arc<PgPool>,
}

#[async_trait]
impl Persistence<Order> for OrderRelationalPersistence {
    #[tracing::instrument(name = "relational::order::upsert", skip_all)]
    async fn upsert(&self, order: &Order) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO orders
               (id, user_id, organization_id, name, datacenter_id, storage_gb, gpu_type,
                status, pod_id, volume_id, workspace_url, runtime_status, uptime_seconds,
                failure_reason, created_at, updated_at)
            VALUES
               ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, now())
            ON CONFLICT (id) DO UPDATE SET
               status = $8,
               pod_id = $9,
               volume_id = $10,
               workspace_url = $11,
               runtime_status = $12,
               uptime_seconds = $13,
               failure_reason = $14,
               updated_at = now()
            "#,
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.organization_id)
        .bind(&order.name)
        .bind(&order.datacenter_id)
        .bind(order.storage_gb)
        .bind(&order.gpu_type)
        .bind(order.status.as_str())
        .bind(&order.pod_id)
        .bind(&order.volume_id)
        .bind(&order.workspace_url)
        .bind(&order.runtime_status)
        .bind(order.uptime_seconds)
        .bind(&order.failure_reason)
        .bind(order.created_at)
        .execute(&*self.db)
        .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(name = "relational::order::delete", skip_all)]
    async fn delete(&self, id: &Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&*self.db)
            .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(name = "relational::order::get_by_id", skip_all)]
    async fn get_by_id(&self, id: &Uuid) -> anyhow::Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&*self.db)
            .await?;

        Ok(order)
    }

    #[tracing::instrument(name = "relational::order::list", skip_all)]
    async fn list(&self) -> anyhow::Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
            .fetch_all(&*self.db)
            .await?;

        Ok(orders)
    }
}

#[async_trait]
impl OrderPersistence for OrderRelationalPersistence {
    #[tracing::instrument(name = "relational::order::get_by_organization_ids", skip_all)]
    async fn get_by_organization_ids(&self, organization_ids: &[Uuid]) -> anyhow::Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE organization_id = ANY($1) ORDER BY created_at DESC",
        )
        .bind(organization_ids)
        .fetch_all(&*self.db)
        .await?;

        Ok(orders)
    }
}
