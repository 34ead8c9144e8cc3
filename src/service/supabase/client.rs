use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{AuthUser, IdentityError, IdentityProvider, UserMetadata};

/// Auth backend client holding both the public and the service role key.
#[derive(Clone, Debug)]
pub struct SupabaseIdentity {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

impl SupabaseIdentity {
    pub fn new(
        base_url: &str,
        anon_key: &str,
        service_role_key: &str,
    ) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            service_role_key: service_role_key.to_string(),
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    fn admin(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }

    async fn parse_user(response: reqwest::Response) -> Result<AuthUser, IdentityError> {
        let response = Self::check_status(response).await?;

        // the invite endpoint answers with the bare user, admin create may wrap it
        let body: Value = response.json().await?;
        let user = match body.get("user") {
            Some(user) if user.is_object() => user.clone(),
            _ => body,
        };

        serde_json::from_value(user).map_err(|err| IdentityError::Api {
            status: 502,
            message: format!("unexpected user payload: {err}"),
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, IdentityError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: Value = response.json().await.unwrap_or_default();
        let message = ["msg", "message", "error_description", "error"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown"))
            .to_string();

        let error_code = body.get("error_code").and_then(Value::as_str);
        if error_code == Some("email_exists")
            || error_code == Some("user_already_exists")
            || message.contains("already been registered")
        {
            return Err(IdentityError::AlreadyExists(message));
        }

        Err(IdentityError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    #[tracing::instrument(name = "supabase::get_user", skip_all)]
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, IdentityError> {
        let response = self
            .http
            .get(self.auth_url("/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(IdentityError::InvalidToken),
            _ => Self::parse_user(response).await,
        }
    }

    #[tracing::instrument(name = "supabase::invite_user_by_email", skip(self, metadata))]
    async fn invite_user_by_email(
        &self,
        email: &str,
        redirect_to: Option<&str>,
        metadata: &UserMetadata,
    ) -> Result<AuthUser, IdentityError> {
        let mut request = self.admin(self.http.post(self.auth_url("/invite")));
        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }

        let response = request
            .json(&json!({ "email": email, "data": metadata }))
            .send()
            .await?;

        Self::parse_user(response).await
    }

    #[tracing::instrument(name = "supabase::create_user", skip(self, password, metadata))]
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        metadata: &UserMetadata,
    ) -> Result<AuthUser, IdentityError> {
        let response = self
            .admin(self.http.post(self.auth_url("/admin/users")))
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
                "user_metadata": metadata,
            }))
            .send()
            .await?;

        Self::parse_user(response).await
    }

    #[tracing::instrument(name = "supabase::delete_user", skip(self))]
    async fn delete_user(&self, user_id: &Uuid) -> Result<(), IdentityError> {
        let response = self
            .admin(self.http.delete(self.auth_url(&format!("/admin/users/{user_id}"))))
            .send()
            .await?;

        Self::check_status(response).await?;

        Ok(())
    }
}
