//! HTTP plumbing shared by every endpoint client.
//!
//! - The bearer token is attached only to requests under the configured
//!   backend URLs, and only when one is stored.
//! - A 401 triggers at most one token refresh and one retry. Concurrent 401s
//!   share a single refresh.
//! - Every failure is normalized into [`ClientError`].

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use smartparking_auth::TokenStore;
use smartparking_core::ApiErrorBody;

use crate::error::{normalize_response, normalize_transport, session_expired_redirect};
use crate::{ClientConfig, ClientError};

/// Tokens returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Access token lifetime in milliseconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Recovery {
    RefreshAndRetry,
    Never,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    store: TokenStore,
    refresh_lock: Arc<Mutex<()>>,
}

impl ApiClient {
    pub fn new(config: Arc<ClientConfig>, store: TokenStore) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;
        Ok(Self {
            http,
            config,
            store,
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T, ClientError> {
        let body = self.send(Method::GET, url, query, None, Recovery::RefreshAndRetry).await?;
        decode(&body)
    }

    pub async fn post<B, T>(&self, url: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_value(body)?;
        let body = self.send(Method::POST, url, &[], Some(&payload), Recovery::RefreshAndRetry).await?;
        decode(&body)
    }

    pub async fn put<B, T>(&self, url: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_value(body)?;
        let body = self.send(Method::PUT, url, &[], Some(&payload), Recovery::RefreshAndRetry).await?;
        decode(&body)
    }

    /// PATCH with an empty JSON object, the backend's convention for state toggles.
    pub async fn patch<T: DeserializeOwned>(&self, url: &str) -> Result<T, ClientError> {
        let payload = json!({});
        let body = self.send(Method::PATCH, url, &[], Some(&payload), Recovery::RefreshAndRetry).await?;
        decode(&body)
    }

    pub async fn delete(&self, url: &str) -> Result<(), ClientError> {
        self.send(Method::DELETE, url, &[], None, Recovery::RefreshAndRetry).await?;
        Ok(())
    }

    /// POST whose 401 is an answer (bad credentials), not an expired session.
    pub async fn post_public<B, T>(&self, url: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_value(body)?;
        let body = self.send(Method::POST, url, &[], Some(&payload), Recovery::Never).await?;
        decode(&body)
    }

    /// GET counterpart of [`ApiClient::post_public`].
    pub async fn get_public<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T, ClientError> {
        let body = self.send(Method::GET, url, query, None, Recovery::Never).await?;
        decode(&body)
    }

    /// Exchange the stored refresh token for a new pair.
    ///
    /// Callers racing here are coalesced: whoever finds the access token
    /// already replaced by the refresh it waited on returns without a call.
    pub async fn refresh_tokens(&self) -> Result<(), ClientError> {
        let stale = self.store.get();
        self.refresh_if_unchanged(stale.as_deref()).await
    }

    async fn refresh_if_unchanged(&self, stale: Option<&str>) -> Result<(), ClientError> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.store.get();
        if current.is_some() && current.as_deref() != stale {
            self.trace("token already refreshed by a concurrent request");
            return Ok(());
        }

        let Some(refresh_token) = self.store.get_refresh() else {
            return Err(ClientError::NoRefreshToken);
        };

        let url = self.config.endpoint("auth/refresh");
        let payload = json!({ "refreshToken": refresh_token });
        let outcome = match self.dispatch(Method::POST, &url, &[], Some(&payload)).await {
            Ok(response) => read(response).await,
            Err(e) => Err(e),
        };

        let pair: TokenPair = match outcome.and_then(|(status, body)| {
            if status.is_success() {
                decode(&body)
            } else {
                Err(ClientError::Api(normalize_response(status, &body)))
            }
        }) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed, clearing session");
                if let Err(clear) = self.store.clear() {
                    tracing::error!(error = %clear, "failed to clear credentials after refresh failure");
                }
                return Err(e);
            }
        };

        self.store.save(&pair.access_token, &pair.refresh_token)?;
        self.trace("token refreshed");
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
        recovery: Recovery,
    ) -> Result<String, ClientError> {
        let token_before = self.store.get();
        let (status, text) = read(self.dispatch(method.clone(), url, query, body).await?).await?;

        if status != StatusCode::UNAUTHORIZED || recovery == Recovery::Never || !self.config.is_api_url(url) {
            return self.finish(status, text, recovery);
        }

        match self.refresh_if_unchanged(token_before.as_deref()).await {
            Ok(()) => {
                self.trace("retrying request after refresh");
                let (status, text) = read(self.dispatch(method, url, query, body).await?).await?;
                self.finish(status, text, recovery)
            }
            Err(e) => {
                tracing::debug!(error = %e, "could not recover from 401");
                Err(self.expire_session(normalize_response(status, &text)))
            }
        }
    }

    fn finish(&self, status: StatusCode, text: String, recovery: Recovery) -> Result<String, ClientError> {
        if status.is_success() {
            return Ok(text);
        }

        let error = normalize_response(status, &text);
        if status == StatusCode::UNAUTHORIZED && recovery == Recovery::RefreshAndRetry {
            return Err(self.expire_session(error));
        }

        match status.as_u16() {
            403 | 404 | 422 => tracing::warn!(status = error.status, error_message = %error.message, "request rejected"),
            _ => tracing::error!(status = error.status, error_message = %error.message, "request failed"),
        }
        Err(ClientError::Api(error))
    }

    fn expire_session(&self, error: ApiErrorBody) -> ClientError {
        if let Err(e) = self.store.clear() {
            tracing::error!(error = %e, "failed to clear credentials after 401");
        }
        tracing::warn!("session expired, credentials cleared");
        ClientError::SessionExpired {
            error,
            redirect: session_expired_redirect(&self.config.auth_routes),
        }
    }

    async fn dispatch(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, ClientError> {
        let mut request = self.http.request(method.clone(), url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if self.config.is_api_url(url) {
            if let Some(token) = self.store.get() {
                request = request.bearer_auth(token);
                self.trace(&format!("bearer token attached to {method} {url}"));
            }
        }

        request.send().await.map_err(|e| {
            let error = normalize_transport(&e);
            tracing::error!(url = %url, error_message = %error.message, "request did not complete");
            ClientError::Api(error)
        })
    }

    fn trace(&self, message: &str) {
        if self.config.debug {
            tracing::info!("{message}");
        } else {
            tracing::debug!("{message}");
        }
    }
}

async fn read(response: reqwest::Response) -> Result<(StatusCode, String), ClientError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ClientError::Api(normalize_transport(&e)))?;
    Ok((status, text))
}

/// Decode a JSON body; an empty body decodes as `null` (for `()` and `Option`).
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))
}
