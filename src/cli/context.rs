use arion_core::api::client::{ArionClient, AuthClient};
use chrono::Utc;
use std::time::Duration;

use crate::profile::Profile;

const DEFAULT_ENDPOINT: &str = "http://localhost:3000";

pub struct Context {
    pub endpoint: String,
    pub auth_url: Option<String>,
    pub anon_key: Option<String>,
    pub profile: Profile,
}

impl Context {
    /// Resolves settings: command line flags and environment first, then the stored profile.
    pub fn load(matches: &clap::ArgMatches) -> anyhow::Result<Self> {
        let profile = Profile::load()?;

        let endpoint = matches
            .get_one::<String>("endpoint")
            .cloned()
            .or_else(|| profile.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let auth_url = matches
            .get_one::<String>("auth-url")
            .cloned()
            .or_else(|| profile.auth_url.clone());

        let anon_key = matches
            .get_one::<String>("anon-key")
            .cloned()
            .or_else(|| profile.anon_key.clone());

        Ok(Self {
            endpoint,
            auth_url,
            anon_key,
            profile,
        })
    }

    pub fn auth_client(&self) -> anyhow::Result<AuthClient> {
        let auth_url = self
            .auth_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("auth url not configured, pass --auth-url or set SUPABASE_URL"))?;
        let anon_key = self
            .anon_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("anon key not configured, pass --anon-key or set SUPABASE_ANON_KEY"))?;

        Ok(AuthClient::new(auth_url, anon_key)?)
    }

    /// Builds an authenticated API client, refreshing the stored session first when it is close to expiry.
    pub async fn client(&mut self) -> anyhow::Result<ArionClient> {
        if self.profile.refresh_due_in(Utc::now()) == Some(Duration::ZERO) {
            self.refresh().await?;
        }

        let token = self
            .profile
            .access_token
            .clone()
            .ok_or_else(|| anyhow::anyhow!("not logged in, run `arion login` first"))?;

        Ok(ArionClient::new(&self.endpoint, Some(token))?)
    }

    pub fn anonymous_client(&self) -> anyhow::Result<ArionClient> {
        Ok(ArionClient::new(&self.endpoint, None)?)
    }

    async fn refresh(&mut self) -> anyhow::Result<()> {
        let refresh_token = match &self.profile.refresh_token {
            Some(refresh_token) => refresh_token.clone(),
            None => return Ok(()),
        };

        let session = self.auth_client()?.refresh_session(&refresh_token).await?;
        self.profile.store_session(&session, Utc::now());
        self.profile.save()?;

        tracing::debug!("session refreshed");

        Ok(())
    }
}
