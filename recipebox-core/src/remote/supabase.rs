//! HTTP client for a Supabase deployment (PostgREST tables + GoTrue auth).

use super::{pkce, AuthApi, AuthEvent, Backend, Database, Filter, MagicLink, Select, SessionEvents};
use crate::config::SupabaseSettings;
use crate::error::RemoteError;
use crate::types::{Session, User};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::Instrument;
use url::Url;

const REST_PATH: &str = "rest/v1/";
const AUTH_PATH: &str = "auth/v1/";

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    rest_url: Url,
    auth_url: Url,
    anon_key: String,
    events: SessionEvents,
}

/// Client for one deployment. Cheap to clone; clones share the connection pool
/// and the session event channel.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    inner: Arc<Inner>,
}

impl SupabaseClient {
    pub fn new(settings: &SupabaseSettings) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("recipebox/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_http_client(settings, http)
    }

    pub fn with_http_client(
        settings: &SupabaseSettings,
        http: reqwest::Client,
    ) -> Result<Self, RemoteError> {
        let mut base =
            Url::parse(&settings.url).map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(RemoteError::InvalidUrl(format!(
                "unsupported scheme: {}",
                base.scheme()
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let rest_url = base
            .join(REST_PATH)
            .map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;
        let auth_url = base
            .join(AUTH_PATH)
            .map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                rest_url,
                auth_url,
                anon_key: settings.anon_key.clone(),
                events: SessionEvents::default(),
            }),
        })
    }

    fn auth_request(&self, method: Method, path: &str) -> Result<RequestBuilder, RemoteError> {
        let url = self
            .inner
            .auth_url
            .join(path)
            .map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;
        Ok(self
            .inner
            .http
            .request(method, url)
            .header("apikey", &self.inner.anon_key))
    }

    async fn fetch_user(&self, access_token: &str) -> Result<Option<User>, RemoteError> {
        let response = self
            .auth_request(Method::GET, "user")?
            .bearer_auth(access_token)
            .send()
            .instrument(tracing::info_span!("remote.call", service = "auth", op = "get_user"))
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }

        let body = read_success(response).await?;
        let user = serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(Some(user))
    }
}

#[async_trait]
impl AuthApi for SupabaseClient {
    async fn sign_in_with_magic_link(
        &self,
        email: &str,
        redirect_url: &str,
    ) -> Result<MagicLink, RemoteError> {
        let code_verifier = pkce::generate_verifier();
        let body = json!({
            "email": email,
            "create_user": true,
            "code_challenge": pkce::challenge(&code_verifier),
            "code_challenge_method": "s256",
        });

        let response = self
            .auth_request(Method::POST, "otp")?
            .query(&[("redirect_to", redirect_url)])
            .json(&body)
            .send()
            .instrument(tracing::info_span!("remote.call", service = "auth", op = "otp"))
            .await?;
        read_success(response).await?;

        tracing::debug!("magic link requested");
        Ok(MagicLink { code_verifier })
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<User>, RemoteError> {
        self.fetch_user(access_token).await
    }

    async fn get_session(
        &self,
        access_token: Option<&str>,
    ) -> Result<Option<Session>, RemoteError> {
        match access_token {
            Some(token) => Ok(self.fetch_user(token).await?.map(|user| Session {
                access_token: token.to_string(),
                refresh_token: None,
                expires_in: None,
                user,
            })),
            None => {
                let response = self
                    .auth_request(Method::GET, "health")?
                    .send()
                    .instrument(tracing::info_span!(
                        "remote.call",
                        service = "auth",
                        op = "health"
                    ))
                    .await?;
                read_success(response).await?;
                Ok(None)
            }
        }
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<Session, RemoteError> {
        let response = self
            .auth_request(Method::POST, "token")?
            .query(&[("grant_type", "pkce")])
            .json(&json!({ "auth_code": code, "code_verifier": code_verifier }))
            .send()
            .instrument(tracing::info_span!(
                "remote.call",
                service = "auth",
                op = "exchange_code"
            ))
            .await?;

        let body = read_success(response).await?;
        let session: Session =
            serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))?;

        self.inner.events.publish(AuthEvent::SignedIn {
            user_id: session.user.id,
        });
        Ok(session)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), RemoteError> {
        let response = self
            .auth_request(Method::POST, "logout")?
            .bearer_auth(access_token)
            .send()
            .instrument(tracing::info_span!("remote.call", service = "auth", op = "logout"))
            .await?;
        read_success(response).await?;

        self.inner.events.publish(AuthEvent::SignedOut);
        Ok(())
    }
}

impl Backend for SupabaseClient {
    fn auth(&self) -> &dyn AuthApi {
        self
    }

    fn database(&self, access_token: Option<&str>) -> Box<dyn Database> {
        Box::new(PostgrestDatabase {
            inner: self.inner.clone(),
            access_token: access_token.map(str::to_string),
        })
    }

    fn events(&self) -> &SessionEvents {
        &self.inner.events
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}

/// PostgREST access with the caller's token, or the anonymous key.
struct PostgrestDatabase {
    inner: Arc<Inner>,
    access_token: Option<String>,
}

impl PostgrestDatabase {
    fn request(&self, method: Method, table: &str) -> Result<RequestBuilder, RemoteError> {
        let url = self
            .inner
            .rest_url
            .join(table)
            .map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;
        let bearer = self
            .access_token
            .as_deref()
            .unwrap_or(&self.inner.anon_key);

        Ok(self
            .inner
            .http
            .request(method, url)
            .header("apikey", &self.inner.anon_key)
            .bearer_auth(bearer))
    }

    fn filter_pairs(filters: &[Filter]) -> Vec<(String, String)> {
        filters.iter().map(Filter::query_pair).collect()
    }

    async fn send_rows(
        request: RequestBuilder,
        op: &'static str,
        table: &str,
    ) -> Result<Vec<Value>, RemoteError> {
        let span = tracing::info_span!("remote.call", service = "rest", op, table);
        let response = request.send().instrument(span).await?;
        let body = read_success(response).await?;
        parse_rows(&body)
    }
}

#[async_trait]
impl Database for PostgrestDatabase {
    async fn select(&self, query: &Select) -> Result<Vec<Value>, RemoteError> {
        let request = self
            .request(Method::GET, &query.table)?
            .query(&query.query_pairs());
        Self::send_rows(request, "select", &query.table).await
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, RemoteError> {
        let request = self
            .request(Method::POST, table)?
            .header("Prefer", "return=representation")
            .json(&rows);
        Self::send_rows(request, "insert", table).await
    }

    async fn update(
        &self,
        table: &str,
        patch: Value,
        filters: &[Filter],
    ) -> Result<Vec<Value>, RemoteError> {
        let request = self
            .request(Method::PATCH, table)?
            .header("Prefer", "return=representation")
            .query(&Self::filter_pairs(filters))
            .json(&patch);
        Self::send_rows(request, "update", table).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, RemoteError> {
        let request = self
            .request(Method::DELETE, table)?
            .header("Prefer", "return=representation")
            .query(&Self::filter_pairs(filters));
        Self::send_rows(request, "delete", table).await
    }
}

/// Body of a successful response, or the service's error payload as a [`RemoteError`].
async fn read_success(response: Response) -> Result<String, RemoteError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        tracing::debug!(status = %status, "remote call returned an error");
        Err(parse_error_body(status.as_u16(), &body))
    }
}

fn parse_rows(body: &str) -> Result<Vec<Value>, RemoteError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))? {
        Value::Array(rows) => Ok(rows),
        Value::Null => Ok(Vec::new()),
        row => Ok(vec![row]),
    }
}

/// Map a PostgREST (`{code, message}`) or GoTrue (`{error_code, msg}`) error body.
pub(crate) fn parse_error_body(status: u16, body: &str) -> RemoteError {
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let text = |key: &str| parsed.get(key).and_then(Value::as_str).map(str::to_string);

    let code = text("code").or_else(|| text("error_code"));
    let message = text("message")
        .or_else(|| text("msg"))
        .or_else(|| text("error_description"))
        .or_else(|| text("error"))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body.trim().to_string()
            }
        });

    RemoteError::Api {
        status,
        code,
        message,
    }
}
