use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ClientError;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AuthSessionUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub user: Option<AuthSessionUser>,
}

/// Public (anon key) client for the auth backend's session endpoints.
#[derive(Clone, Debug)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl AuthClient {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    #[tracing::instrument(name = "auth::sign_in_with_password", skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ClientError> {
        let response = self
            .http
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        Self::parse_session(response).await
    }

    #[tracing::instrument(name = "auth::refresh_session", skip_all)]
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, ClientError> {
        let response = self
            .http
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        Self::parse_session(response).await
    }

    #[tracing::instrument(name = "auth::sign_out", skip_all)]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            // an already expired token has nothing left to revoke
            StatusCode::UNAUTHORIZED => Ok(()),
            status => Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(response).await,
            }),
        }
    }

    async fn parse_session(response: reqwest::Response) -> Result<AuthSession, ClientError> {
        let status = response.status();

        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }

        Ok(response.json().await?)
    }
}

/// Extracts the human readable message from an auth backend error body. The
/// backend has used several shapes over time.
pub(crate) async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body: serde_json::Value = response.json().await.unwrap_or_default();

    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(|value| value.as_str()))
        .map(|message| message.to_string())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_sign_in_with_password() {
        let mock_server = MockServer::start().await;
        let user_id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", "anon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access",
                "refresh_token": "refresh",
                "expires_in": 3600,
                "expires_at": 1700000000,
                "token_type": "bearer",
                "user": { "id": user_id, "email": "ada@example.com" }
            })))
            .mount(&mock_server)
            .await;

        let client = AuthClient::new(&mock_server.uri(), "anon").unwrap();
        let session = client
            .sign_in_with_password("ada@example.com", "secret")
            .await
            .unwrap();

        assert_eq!(session.access_token, "access");
        assert_eq!(session.user.unwrap().id, user_id);
    }

    #[tokio::test]
    async fn test_invalid_credentials() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&mock_server)
            .await;

        let client = AuthClient::new(&mock_server.uri(), "anon").unwrap();
        let err = client
            .sign_in_with_password("ada@example.com", "wrong")
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("Invalid login credentials"));
    }
}
