//! Read-through cache for the bearer credential.
//!
//! A single process-wide entry, replaced wholesale on refresh. The cache lock
//! is held across the exchange, so concurrent photo events are serialized and
//! at most one token exchange is ever in flight.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::AuthError;
use crate::exchange::TokenSource;

/// Tokens closer than this to expiry are refreshed before being handed out.
pub const SAFETY_MARGIN_SECS: i64 = 5 * 60;

/// How long a freshly exchanged token is trusted. Kept inside the service's
/// ~12-hour validity.
pub const CACHED_TTL_SECS: i64 = 11 * 60 * 60;

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Serialized read-through cache over a [`TokenSource`].
pub struct TokenCache {
    source: Arc<dyn TokenSource>,
    state: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            state: Mutex::new(None),
        }
    }

    /// Return a bearer token with more than [`SAFETY_MARGIN_SECS`] of
    /// validity left, refreshing through the identity service otherwise.
    pub async fn bearer_token(&self) -> Result<String, AuthError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        if let Some(cached) = state.as_ref() {
            if cached.expires_at - now > Duration::seconds(SAFETY_MARGIN_SECS) {
                debug!("using cached bearer token");
                return Ok(cached.token.clone());
            }
        }

        let token = self.source.issue().await?;
        let expires_at = now + Duration::seconds(CACHED_TTL_SECS);
        info!(%expires_at, "bearer token refreshed");
        *state = Some(CachedToken {
            token: token.clone(),
            expires_at,
        });
        Ok(token)
    }

    #[cfg(test)]
    async fn seed(&self, token: &str, expires_at: DateTime<Utc>) {
        *self.state.lock().await = Some(CachedToken {
            token: token.to_string(),
            expires_at,
        });
    }

    #[cfg(test)]
    async fn cached_expiry(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.as_ref().map(|c| c.expires_at)
    }
}
