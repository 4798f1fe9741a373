//! Capabilities consumed from the hosted database/auth service.
//!
//! The service is reached through two trait seams, [`AuthApi`] and [`Database`],
//! bundled by [`Backend`]. [`SupabaseClient`] talks to a real deployment over
//! HTTP; [`FakeBackend`] keeps everything in memory for tests.

mod events;
mod fake;
pub mod pkce;
mod query;
mod supabase;

pub use events::{AuthEvent, SessionEvents};
pub use fake::{FakeBackend, FakeOp};
pub use query::{Embed, Filter, Join, Order, Select};
pub use supabase::SupabaseClient;

use crate::config::AppConfig;
use crate::error::RemoteError;
use crate::types::{Session, User};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Table operations, scoped to one caller's credentials.
#[async_trait]
pub trait Database: Send + Sync {
    async fn select(&self, query: &Select) -> Result<Vec<Value>, RemoteError>;

    /// Insert rows and return them as stored (with generated columns).
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, RemoteError>;

    /// Apply `patch` to every row matching all filters; returns the updated rows.
    async fn update(
        &self,
        table: &str,
        patch: Value,
        filters: &[Filter],
    ) -> Result<Vec<Value>, RemoteError>;

    /// Delete every row matching all filters; returns the deleted rows.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, RemoteError>;
}

/// Outcome of a magic-link request. The verifier must be presented again
/// when the emailed code is exchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicLink {
    pub code_verifier: String,
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_in_with_magic_link(
        &self,
        email: &str,
        redirect_url: &str,
    ) -> Result<MagicLink, RemoteError>;

    /// Resolve an access token to its user. `Ok(None)` when the token is rejected.
    async fn get_user(&self, access_token: &str) -> Result<Option<User>, RemoteError>;

    /// Current session for `access_token`, or `Ok(None)` when there is none.
    /// Without a token this only confirms the auth service answers.
    async fn get_session(&self, access_token: Option<&str>)
        -> Result<Option<Session>, RemoteError>;

    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<Session, RemoteError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), RemoteError>;
}

/// A hosted service deployment: auth plus per-caller table access.
pub trait Backend: Send + Sync + fmt::Debug {
    fn auth(&self) -> &dyn AuthApi;

    /// Table access as the holder of `access_token` (anonymous when `None`),
    /// so row-level security applies to that identity.
    fn database(&self, access_token: Option<&str>) -> Box<dyn Database>;

    fn events(&self) -> &SessionEvents;

    /// Backend name for logs (e.g. "supabase", "fake").
    fn name(&self) -> &'static str;
}

/// The remote client as derived from configuration at startup.
#[derive(Debug, Clone)]
pub enum BackendState {
    Ready(Arc<dyn Backend>),
    /// One or both public configuration values are missing.
    NotConfigured,
    /// Configuration was present but the client could not be built.
    Failed(String),
}

impl BackendState {
    pub fn from_config(config: &AppConfig) -> Self {
        let Some(settings) = config.supabase() else {
            return BackendState::NotConfigured;
        };

        match SupabaseClient::new(&settings) {
            Ok(client) => BackendState::Ready(Arc::new(client)),
            Err(e) => BackendState::Failed(e.to_string()),
        }
    }

    pub fn ready(backend: impl Backend + 'static) -> Self {
        BackendState::Ready(Arc::new(backend))
    }

    pub fn backend(&self) -> Result<&Arc<dyn Backend>, RemoteError> {
        match self {
            BackendState::Ready(backend) => Ok(backend),
            BackendState::NotConfigured => Err(RemoteError::NotConfigured(
                "SUPABASE_URL and SUPABASE_ANON_KEY must be set".to_string(),
            )),
            BackendState::Failed(message) => Err(RemoteError::NotConfigured(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: Option<&str>, key: Option<&str>) -> AppConfig {
        AppConfig {
            supabase_url: url.map(str::to_string),
            supabase_anon_key: key.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_values_are_not_configured() {
        let state = BackendState::from_config(&config(Some("https://x.supabase.co"), None));
        assert!(matches!(state, BackendState::NotConfigured));
        assert!(matches!(state.backend(), Err(RemoteError::NotConfigured(_))));
    }

    #[test]
    fn test_invalid_url_is_failed() {
        let state = BackendState::from_config(&config(Some("not a url"), Some("anon")));
        match state {
            BackendState::Failed(message) => assert!(message.contains("Invalid service URL")),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_config_is_ready() {
        let state =
            BackendState::from_config(&config(Some("https://x.supabase.co"), Some("anon")));
        let backend = state.backend().unwrap();
        assert_eq!(backend.name(), "supabase");
    }
}
