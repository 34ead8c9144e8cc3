mod auth;
mod orders;

pub use auth::{AuthClient, AuthSession, AuthSessionUser};

use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    ContactRequestMessage, CreateOrganizationRequest, ErrorResponse, InviteRequest,
    InviteResponse, ListGpusResponse, ListOrganizationsResponse, ListRolesResponse,
    ListUsersResponse, OkResponse, OrganizationResponse, UpdateProfileRequest, UserResponse,
    WorkspaceCheckResponse,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(err) => err.status().map(|status| status.as_u16()),
        }
    }
}

/// Typed client for the Arion Flow HTTP API.
#[derive(Clone, Debug)]
pub struct ArionClient {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl ArionClient {
    pub fn new(endpoint: &str, token: Option<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.endpoint, path));

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(error_response) => error_response.error,
                Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
            };

            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        Self::send(self.request(Method::GET, path)).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        Self::send(self.request(Method::POST, path).json(body)).await
    }

    async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        Self::send(self.request(Method::PATCH, path).json(body)).await
    }

    pub async fn list_gpus(&self) -> Result<ListGpusResponse, ClientError> {
        self.get("/api/gpus").await
    }

    pub async fn check_workspace(
        &self,
        workspace_url: &str,
    ) -> Result<WorkspaceCheckResponse, ClientError> {
        let builder = self
            .request(Method::GET, "/api/check-workspace")
            .query(&[("url", workspace_url)]);

        Self::send(builder).await
    }

    pub async fn submit_contact(
        &self,
        contact: &ContactRequestMessage,
    ) -> Result<OkResponse, ClientError> {
        self.post("/api/contact", contact).await
    }

    pub async fn get_profile(&self) -> Result<UserResponse, ClientError> {
        self.get("/api/profile").await
    }

    pub async fn update_profile(
        &self,
        update: &UpdateProfileRequest,
    ) -> Result<UserResponse, ClientError> {
        self.patch("/api/profile", update).await
    }

    pub async fn invite_user(&self, invite: &InviteRequest) -> Result<InviteResponse, ClientError> {
        self.post("/api/invite", invite).await
    }

    pub async fn list_users(&self) -> Result<ListUsersResponse, ClientError> {
        self.get("/api/admin/users").await
    }

    pub async fn update_user(
        &self,
        user_id: &Uuid,
        update: &UpdateProfileRequest,
    ) -> Result<UserResponse, ClientError> {
        self.patch(&format!("/api/admin/users/{user_id}"), update)
            .await
    }

    pub async fn delete_user(&self, user_id: &Uuid) -> Result<OkResponse, ClientError> {
        Self::send(self.request(Method::DELETE, &format!("/api/admin/users/{user_id}"))).await
    }

    pub async fn list_organizations(&self) -> Result<ListOrganizationsResponse, ClientError> {
        self.get("/api/admin/organizations").await
    }

    pub async fn create_organization(
        &self,
        name: &str,
    ) -> Result<OrganizationResponse, ClientError> {
        let request = CreateOrganizationRequest {
            name: name.to_string(),
        };

        self.post("/api/admin/organizations", &request).await
    }

    pub async fn list_roles(&self) -> Result<ListRolesResponse, ClientError> {
        self.get("/api/admin/roles").await
    }
}
