use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::MemoryPersistence;
use crate::{
    models::Order,
    persistence::{OrderPersistence, Persistence},
};

#[derive(Debug, Default)]
pub struct OrderMemoryPersistence {
    orders: MemoryPersistence<Order>,
}

#[async_trait]
impl Persistence<Order> for OrderMemoryPersistence {
    async fn upsert(&self, order: &Order) -> anyhow::Result<u64> {
        let mut order = order.clone();
        order.updated_at = Utc::now();

        self.orders.upsert(&order).await
    }

    async fn delete(&self, order_id: &Uuid) -> anyhow::Result<u64> {
        self.orders.delete(order_id).await
    }

    async fn get_by_id(&self, order_id: &Uuid) -> anyhow::Result<Option<Order>> {
        self.orders.get_by_id(order_id).await
    }

    async fn list(&self) -> anyhow::Result<Vec<Order>> {
        let mut orders = self.orders.list().await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(orders)
    }
}

#[async_trait]
impl OrderPersistence for OrderMemoryPersistence {
    async fn get_by_organization_ids(&self, organization_ids: &[Uuid]) -> anyhow::Result<Vec<Order>> {
        let mut orders = self
            .orders
            .filtered(|order| organization_ids.contains(&order.organization_id))?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(orders)
    }
}
