//! Auth backend integration: session validation and the admin user API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

mod client;
pub mod mock;

pub use client::SupabaseIdentity;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("auth backend error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    AlreadyExists(String),

    #[error("invalid or expired session")]
    InvalidToken,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Profile fields stored as user metadata on the auth backend.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct UserMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves an access token to its user. Rejected tokens are [`IdentityError::InvalidToken`].
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, IdentityError>;

    async fn invite_user_by_email(
        &self,
        email: &str,
        redirect_to: Option<&str>,
        metadata: &UserMetadata,
    ) -> Result<AuthUser, IdentityError>;

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        metadata: &UserMetadata,
    ) -> Result<AuthUser, IdentityError>;

    async fn delete_user(&self, user_id: &Uuid) -> Result<(), IdentityError>;
}
