//! Client errors and HTTP error normalization.
//!
//! Every failed request is turned into an [`ApiErrorBody`] with a message fit
//! for display. A server-provided `message` wins over the stock text, except
//! for 503 where gateways tend to leak internals.

use chrono::Utc;
use reqwest::StatusCode;
use thiserror::Error;

use smartparking_auth::{AuthRoutes, Redirect, StorageError};
use smartparking_core::{ApiErrorBody, CoreError, ServerErrorBody};

use crate::ConfigError;

pub const SESSION_EXPIRED_MESSAGE: &str = "Tu sesión ha expirado. Por favor, inicia sesión nuevamente.";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend (or the network) refused the request.
    #[error("{0}")]
    Api(ApiErrorBody),

    /// A 401 that could not be recovered; stored credentials were cleared.
    #[error("session expired: {error}")]
    SessionExpired { error: ApiErrorBody, redirect: Redirect },

    #[error("no refresh token available")]
    NoRefreshToken,

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("invalid request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Page(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build http client: {0}")]
    Build(String),
}

impl ClientError {
    /// HTTP status of the failure; `0` for transport errors.
    pub fn status(&self) -> Option<u16> {
        self.api_error().map(|e| e.status)
    }

    pub fn api_error(&self) -> Option<&ApiErrorBody> {
        match self {
            ClientError::Api(error) | ClientError::SessionExpired { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            ClientError::SessionExpired { redirect, .. } => Some(redirect),
            _ => None,
        }
    }
}

/// Display message for a failed response.
pub fn status_message(status: StatusCode, server_message: Option<&str>) -> String {
    let stock = match status.as_u16() {
        401 => "Sesión expirada. Por favor, inicia sesión nuevamente.",
        403 => "No tienes permisos para realizar esta acción.",
        404 => "Recurso no encontrado.",
        422 => "Los datos enviados no son válidos.",
        500 => "Error interno del servidor. Por favor, intenta más tarde.",
        503 => return "Servicio temporalmente no disponible. Por favor, intenta más tarde.".to_string(),
        code => {
            return server_message.map(str::to_string).unwrap_or_else(|| {
                format!("Error {}: {}", code, status.canonical_reason().unwrap_or_default())
            });
        }
    };
    server_message.unwrap_or(stock).to_string()
}

/// Normalize a non-success response.
///
/// `error` carries the parsed JSON body, or the raw text when it is not JSON.
pub fn normalize_response(status: StatusCode, body: &str) -> ApiErrorBody {
    let value: Option<serde_json::Value> = if body.trim().is_empty() {
        None
    } else {
        Some(serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_string())))
    };

    let server: ServerErrorBody = value
        .as_ref()
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();

    ApiErrorBody::new(
        status.as_u16(),
        status_message(status, server.message()),
        value,
        Utc::now(),
    )
}

/// Normalize a failure that produced no response.
pub fn normalize_transport(err: &reqwest::Error) -> ApiErrorBody {
    ApiErrorBody::new(0, format!("Error de conexión: {err}"), None, Utc::now())
}

/// Where an unrecoverable 401 sends the user.
pub fn session_expired_redirect(routes: &AuthRoutes) -> Redirect {
    Redirect::to(&routes.login)
        .with_query("sessionExpired", "true")
        .with_query("message", SESSION_EXPIRED_MESSAGE)
}
