use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{AuthUser, IdentityError, IdentityProvider, UserMetadata};

#[derive(Clone, Debug, Default)]
pub struct MockIdentityBehavior {
    pub fail_create: bool,
    pub fail_delete: bool,
}

#[derive(Debug, Default)]
struct MockIdentityState {
    tokens: HashMap<String, AuthUser>,
    users: HashMap<Uuid, AuthUser>,
    invited: Vec<String>,
    deleted: Vec<Uuid>,
}

/// In-memory auth backend. Tokens are registered explicitly with [`MockIdentityProvider::sign_in`].
#[derive(Debug, Default)]
pub struct MockIdentityProvider {
    behavior: MockIdentityBehavior,
    state: Mutex<MockIdentityState>,
}

impl MockIdentityProvider {
    pub fn new(behavior: MockIdentityBehavior) -> Self {
        Self {
            behavior,
            state: Mutex::new(MockIdentityState::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<MockIdentityState>, IdentityError> {
        self.state.lock().map_err(|_| IdentityError::Api {
            status: 500,
            message: "mock state poisoned".into(),
        })
    }

    /// Creates a user and returns an access token for it.
    pub fn sign_in(&self, email: &str) -> (Uuid, String) {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
        };
        let token = format!("token-{}", user.id);

        if let Ok(mut state) = self.lock() {
            state.users.insert(user.id, user.clone());
            state.tokens.insert(token.clone(), user.clone());
        }

        (user.id, token)
    }

    /// Issues an access token for an existing user, as if they had accepted their invite.
    pub fn issue_token(&self, user_id: &Uuid) -> Option<String> {
        let mut state = self.lock().ok()?;
        let user = state.users.get(user_id)?.clone();
        let token = format!("token-{}", user.id);
        state.tokens.insert(token.clone(), user);

        Some(token)
    }

    pub fn user_exists(&self, user_id: &Uuid) -> bool {
        self.lock()
            .map(|state| state.users.contains_key(user_id))
            .unwrap_or(false)
    }

    pub fn invited(&self) -> Vec<String> {
        self.lock()
            .map(|state| state.invited.clone())
            .unwrap_or_default()
    }

    pub fn deleted(&self) -> Vec<Uuid> {
        self.lock()
            .map(|state| state.deleted.clone())
            .unwrap_or_default()
    }

    fn insert_user(&self, email: &str) -> Result<AuthUser, IdentityError> {
        if self.behavior.fail_create {
            return Err(IdentityError::Api {
                status: 500,
                message: "user creation failed".into(),
            });
        }

        let mut state = self.lock()?;
        let exists = state
            .users
            .values()
            .any(|user| user.email.as_deref() == Some(email));
        if exists {
            return Err(IdentityError::AlreadyExists(
                "A user with this email address has already been registered".into(),
            ));
        }

        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, IdentityError> {
        let state = self.lock()?;

        state
            .tokens
            .get(access_token)
            .filter(|user| state.users.contains_key(&user.id))
            .cloned()
            .ok_or(IdentityError::InvalidToken)
    }

    async fn invite_user_by_email(
        &self,
        email: &str,
        _redirect_to: Option<&str>,
        _metadata: &UserMetadata,
    ) -> Result<AuthUser, IdentityError> {
        let user = self.insert_user(email)?;
        self.lock()?.invited.push(email.to_string());

        Ok(user)
    }

    async fn create_user(
        &self,
        email: &str,
        _password: &str,
        _metadata: &UserMetadata,
    ) -> Result<AuthUser, IdentityError> {
        self.insert_user(email)
    }

    async fn delete_user(&self, user_id: &Uuid) -> Result<(), IdentityError> {
        if self.behavior.fail_delete {
            return Err(IdentityError::Api {
                status: 500,
                message: "user deletion failed".into(),
            });
        }

        let mut state = self.lock()?;
        state.users.remove(user_id);
        state.deleted.push(*user_id);

        Ok(())
    }
}
