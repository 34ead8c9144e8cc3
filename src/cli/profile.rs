use arion_core::api::client::AuthSession;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Refresh this long before the access token expires.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Locally stored connection settings and session, `~/.arion/profile.json`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Profile {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub auth_url: Option<String>,
    #[serde(default)]
    pub anon_key: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl Profile {
    pub fn load() -> anyhow::Result<Self> {
        let profile_path = Profile::build_config_path()?;

        if !profile_path.exists() {
            return Ok(Profile::default());
        }

        let profile_json = fs::read_to_string(profile_path)?;
        let profile: Profile = serde_json::from_str(&profile_json)?;

        Ok(profile)
    }

    fn build_config_path() -> anyhow::Result<PathBuf> {
        let mut path =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("home directory not found"))?;

        path.push(".arion");

        fs::create_dir_all(&path)?;

        path.push("profile.json");

        Ok(path)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let profile_path = Profile::build_config_path()?;

        let profile_json = serde_json::to_string_pretty(&self)?;

        Ok(fs::write(profile_path, profile_json)?)
    }

    pub fn store_session(&mut self, session: &AuthSession, now: DateTime<Utc>) {
        self.access_token = Some(session.access_token.clone());
        self.refresh_token = Some(session.refresh_token.clone());
        self.expires_at = Some(
            session
                .expires_at
                .unwrap_or_else(|| now.timestamp() + session.expires_in),
        );

        if let Some(email) = session.user.as_ref().and_then(|user| user.email.clone()) {
            self.email = Some(email);
        }
    }

    pub fn clear_session(&mut self) {
        self.access_token = None;
        self.refresh_token = None;
        self.expires_at = None;
    }

    /// Time left until the session should be refreshed. Zero when already due
    /// and `None` without a refreshable session.
    pub fn refresh_due_in(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.refresh_token.as_ref()?;
        let expires_at = self.expires_at?;

        let seconds = (expires_at - REFRESH_MARGIN_SECS - now.timestamp()).max(0);

        Some(Duration::from_secs(seconds as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arion_core::api::client::AuthSessionUser;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn session(expires_at: Option<i64>) -> AuthSession {
        AuthSession {
            access_token: "access".to_owned(),
            refresh_token: "refresh".to_owned(),
            expires_in: 3600,
            expires_at,
            user: Some(AuthSessionUser {
                id: Uuid::new_v4(),
                email: Some("ada@example.com".to_owned()),
            }),
        }
    }

    #[test]
    fn test_store_session_computes_expiry() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut profile = Profile::default();

        profile.store_session(&session(None), now);

        assert_eq!(profile.expires_at, Some(1_700_003_600));
        assert_eq!(profile.email.as_deref(), Some("ada@example.com"));
        assert_eq!(
            profile.refresh_due_in(now),
            Some(Duration::from_secs(3540))
        );
    }

    #[test]
    fn test_refresh_due_immediately_when_expired() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut profile = Profile::default();
        profile.store_session(&session(Some(1_699_999_000)), now);

        assert_eq!(profile.refresh_due_in(now), Some(Duration::ZERO));

        profile.clear_session();
        assert_eq!(profile.refresh_due_in(now), None);
        assert!(profile.access_token.is_none());
    }
}
