use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    ArionAdmin,
    OrgAdmin,
    WorkspaceUser,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::ArionAdmin => "arion_admin",
            Role::OrgAdmin => "org_admin",
            Role::WorkspaceUser => "workspace_user",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::ArionAdmin | Role::OrgAdmin)
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "arion_admin" => Ok(Role::ArionAdmin),
            "org_admin" => Ok(Role::OrgAdmin),
            "workspace_user" => Ok(Role::WorkspaceUser),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Admin,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
        }
    }
}

impl TryFrom<String> for MemberRole {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "admin" => Ok(MemberRole::Admin),
            "member" => Ok(MemberRole::Member),
            other => Err(UnknownVariant::new("organization role", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Running,
    Failed,
    Deleted,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Running => "running",
            OrderStatus::Failed => "failed",
            OrderStatus::Deleted => "deleted",
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "running" => Ok(OrderStatus::Running),
            "failed" => Ok(OrderStatus::Failed),
            "deleted" => Ok(OrderStatus::Deleted),
            other => Err(UnknownVariant::new("order status", other)),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// orders

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CreateOrderRequest {
    pub name: String,
    pub datacenter_id: String,
    pub storage_gb: i32,
    pub gpu_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionResponse {
    pub ok: bool,
    pub order_id: Uuid,
    pub pod_id: String,
    pub volume_id: String,
    pub workspace_url: String,
    pub pod_ready: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct OrderMessage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub datacenter_id: String,
    pub storage_gb: i32,
    pub gpu_type: String,
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

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ListOrdersResponse {
    pub ok: bool,
    pub orders: Vec<OrderMessage>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OrderResponse {
    pub ok: bool,
    pub order: OrderMessage,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopOrderResponse {
    pub ok: bool,
    pub order_id: Uuid,
    pub pod_id: String,
    pub desired_status: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminateOrderRequest {
    #[serde(default)]
    pub delete_workspace: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminateOrderResponse {
    pub ok: bool,
    pub order_id: Uuid,
    pub volume_deleted: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TelemetryMessage {
    pub runtime_status: String,
    pub uptime_seconds: i64,
    pub gpu_type: Option<String>,
    pub volume_size_gb: Option<i32>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TelemetryResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub telemetry: TelemetryMessage,
}

// accounts

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InviteRequest {
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Option<Role>,
    #[serde(default)]
    pub organization_id: Option<Uuid>,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    pub ok: bool,
    pub user_id: Uuid,
    pub organization_id: Uuid,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ProfileMessage {
    pub id: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_title: Option<String>,
    pub phone: Option<String>,
    pub authorized: bool,
    pub role: Role,
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub organization_ids: Vec<Uuid>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct UpdateProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ListUsersResponse {
    pub ok: bool,
    pub users: Vec<ProfileMessage>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UserResponse {
    pub ok: bool,
    pub user: ProfileMessage,
}

// organizations

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct OrganizationMessage {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ListOrganizationsResponse {
    pub ok: bool,
    pub organizations: Vec<OrganizationMessage>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OrganizationResponse {
    pub ok: bool,
    pub organization: OrganizationMessage,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RoleMessage {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ListRolesResponse {
    pub ok: bool,
    pub roles: Vec<RoleMessage>,
}

// misc

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GpuTypeMessage {
    pub id: String,
    pub display_name: String,
    pub memory_in_gb: Option<i32>,
    pub secure_cloud: bool,
    pub community_cloud: bool,
    pub aliases: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ListGpusResponse {
    pub ok: bool,
    pub gpus: Vec<GpuTypeMessage>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct WorkspaceCheckResponse {
    pub ok: bool,
    pub reachable: bool,
    pub status: Option<u16>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ContactRequestMessage {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    pub message: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}
