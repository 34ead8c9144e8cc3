use arion_core::Role;
use axum::http::HeaderMap;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::persistence::{MembershipPersistence, Persistence, ProfilePersistence};
use crate::supabase::IdentityProvider;

/// Authenticated and approved user on whose behalf a request runs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Caller {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Role,
    pub organization_ids: Vec<Uuid>,
}

impl Caller {
    pub fn is_arion_admin(&self) -> bool {
        self.role == Role::ArionAdmin
    }

    pub fn is_member_of(&self, organization_id: &Uuid) -> bool {
        self.organization_ids.contains(organization_id)
    }

    pub fn can_access_organization(&self, organization_id: &Uuid) -> bool {
        self.is_arion_admin() || self.is_member_of(organization_id)
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("administrator role required".to_string()))
        }
    }

    pub fn require_arion_admin(&self) -> Result<(), ApiError> {
        if self.is_arion_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("platform administrator role required".to_string()))
        }
    }
}

pub fn get_token_from_headers(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = match headers.get("authorization") {
        Some(auth_header) => auth_header,
        None => {
            return Err(ApiError::Unauthorized(
                "missing authorization header".to_string(),
            ))
        }
    };

    let value = match auth_header.to_str() {
        Ok(value) => value.trim(),
        Err(_) => {
            return Err(ApiError::Unauthorized(
                "authorization header malformed".to_string(),
            ))
        }
    };

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim().to_string())
        }
        _ => Err(ApiError::Unauthorized(
            "authorization header malformed".to_string(),
        )),
    }
}

/// `last_login` is rewritten at most this often per user.
const LAST_LOGIN_RESOLUTION_SECS: i64 = 300;

/// Resolves bearer tokens into [`Caller`]s.
#[derive(Clone)]
pub struct Authenticator {
    pub identity: Arc<dyn IdentityProvider>,
    pub profiles: Arc<dyn ProfilePersistence>,
    pub memberships: Arc<dyn MembershipPersistence>,
}

impl Authenticator {
    #[tracing::instrument(name = "acl::authenticate", skip_all)]
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Caller, ApiError> {
        let token = get_token_from_headers(headers)?;
        let user = self.identity.get_user(&token).await?;

        let profile = match self.profiles.get_by_id(&user.id).await? {
            Some(profile) => profile,
            None => return Err(ApiError::Forbidden("account pending approval".to_string())),
        };

        if !profile.authorized {
            return Err(ApiError::Forbidden("account pending approval".to_string()));
        }

        let now = Utc::now();
        let stale = profile
            .last_login
            .map_or(true, |at| (now - at).num_seconds() >= LAST_LOGIN_RESOLUTION_SECS);
        if stale {
            if let Err(err) = self.profiles.touch_last_login(&user.id, now).await {
                tracing::warn!(user_id = %user.id, "recording last login failed: {:?}", err);
            }
        }

        let organization_ids = self
            .memberships
            .get_by_user_id(&user.id)
            .await?
            .into_iter()
            .map(|membership| membership.organization_id)
            .collect();

        Ok(Caller {
            user_id: user.id,
            email: user.email.or(profile.email),
            role: profile.role,
            organization_ids,
        })
    }
}
