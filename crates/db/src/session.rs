//! Session validation against the BaaS auth collection.

use std::sync::Arc;

use crate::collections::USERS;
use crate::models::user::User;
use crate::store::RecordStore;

/// Result of checking a session token.
///
/// `client` is the store handle carrying the token; it is present whenever a
/// token was supplied, even if the session turned out to be invalid. After a
/// successful refresh both `client` and `token` carry the refreshed token.
pub struct SessionCheck {
    pub client: Option<Arc<dyn RecordStore>>,
    pub token: Option<String>,
    pub user: Option<User>,
    pub valid: bool,
}

impl SessionCheck {
    fn missing() -> Self {
        Self {
            client: None,
            token: None,
            user: None,
            valid: false,
        }
    }

    /// The authenticated user, only when the session is valid.
    pub fn valid_user(&self) -> Option<&User> {
        self.user.as_ref().filter(|_| self.valid)
    }
}

/// Validates session tokens by refreshing them against the BaaS.
#[derive(Clone)]
pub struct SessionValidator {
    store: Arc<dyn RecordStore>,
    require_verified: bool,
}

impl SessionValidator {
    pub fn new(store: Arc<dyn RecordStore>, require_verified: bool) -> Self {
        Self {
            store,
            require_verified,
        }
    }

    /// Check a token. Never mutates external state.
    ///
    /// No token means no network call. Any BaaS error, a missing user record,
    /// or (when required) an unverified user yields `valid = false`.
    pub async fn validate(&self, token: Option<&str>) -> SessionCheck {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return SessionCheck::missing();
        };
        let client = self.store.with_token(token);

        let refreshed = match client.auth_refresh(USERS, token).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                tracing::debug!(error = %e, "Session refresh rejected");
                return SessionCheck {
                    client: Some(client),
                    token: Some(token.to_string()),
                    user: None,
                    valid: false,
                };
            }
        };

        let token = refreshed.token;
        let client = self.store.with_token(&token);

        let user = match serde_json::from_value::<User>(refreshed.record) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Auth refresh returned an unreadable user record");
                return SessionCheck {
                    client: Some(client),
                    token: Some(token),
                    user: None,
                    valid: false,
                };
            }
        };

        let valid = !self.require_verified || user.verified;
        SessionCheck {
            client: Some(client),
            token: Some(token),
            user: Some(user),
            valid,
        }
    }
}
