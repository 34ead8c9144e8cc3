use arion_core::{OrderMessage, OrderStatus};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::persistence::PersistableModel;

#[derive(Clone, Debug, Eq, FromRow, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub datacenter_id: String,
    pub storage_gb: i32,
    pub gpu_type: String,

    #[sqlx(try_from = "String")]
    pub status: OrderStatus,

    pub pod_id: Option<String>,
    pub volume_id: Option<String>,
    pub workspace_url: Option<String>,
    pub runtime_status: Option<String>,
    pub uptime_seconds: Option<i64>,
    pub failure_reason: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new_pending(
        user_id: Uuid,
        organization_id: Uuid,
        name: &str,
        datacenter_id: &str,
        storage_gb: i32,
        gpu_type: &str,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            user_id,
            organization_id,
            name: name.to_string(),
            datacenter_id: datacenter_id.to_string(),
            storage_gb,
            gpu_type: gpu_type.to_string(),
            status: OrderStatus::Pending,
            pod_id: None,
            volume_id: None,
            workspace_url: None,
            runtime_status: None,
            uptime_seconds: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_failed(&mut self, reason: &str) {
        self.status = OrderStatus::Failed;
        self.failure_reason = Some(reason.to_string());
        self.updated_at = Utc::now();
    }

    pub fn mark_running(&mut self, pod_id: &str, volume_id: &str, workspace_url: &str) {
        self.status = OrderStatus::Running;
        self.pod_id = Some(pod_id.to_string());
        self.volume_id = Some(volume_id.to_string());
        self.workspace_url = Some(workspace_url.to_string());
        self.runtime_status = Some("RUNNING".to_string());
        self.failure_reason = None;
        self.updated_at = Utc::now();
    }

    pub fn mark_deleted(&mut self, volume_deleted: bool) {
        self.status = OrderStatus::Deleted;
        self.pod_id = None;
        if volume_deleted {
            self.volume_id = None;
        }
        self.runtime_status = Some("TERMINATED".to_string());
        self.updated_at = Utc::now();
    }
}

impl PersistableModel for Order {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl From<Order> for OrderMessage {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            organization_id: order.organization_id,
            name: order.name,
            datacenter_id: order.datacenter_id,
            storage_gb: order.storage_gb,
            gpu_type: order.gpu_type,
            status: order.status,
            pod_id: order.pod_id,
            volume_id: order.volume_id,
            workspace_url: order.workspace_url,
            runtime_status: order.runtime_status,
            uptime_seconds: order.uptime_seconds,
            failure_reason: order.failure_reason,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}
