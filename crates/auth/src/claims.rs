use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use smartparking_core::UserId;

use crate::{Permission, Role};

/// Claims carried by the access token (transport-agnostic).
///
/// The payload is decoded client-side WITHOUT signature verification, so these
/// claims are a UI hint. The backend re-verifies the token on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    /// Subject (the user's email for tokens issued by the auth service).
    #[serde(default)]
    pub sub: Option<String>,

    #[serde(default)]
    pub user_id: Option<UserId>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    #[serde(default)]
    pub phone_number: Option<String>,

    #[serde(default)]
    pub profile_picture: Option<String>,

    /// Role the user signed in with.
    #[serde(default)]
    pub active_role: Option<Role>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub roles: Vec<Role>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub permissions: Vec<Permission>,

    #[serde(default)]
    pub status: Option<bool>,

    #[serde(default)]
    pub email_verified: Option<bool>,

    /// Issued-at, seconds since epoch.
    #[serde(default)]
    pub iat: Option<i64>,

    /// Expiry, seconds since epoch.
    pub exp: i64,
}

/// List claims may be sent as `null`; treat that like a missing key.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Expired iff `now` (in milliseconds) has reached `exp * 1000`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() >= self.exp.saturating_mul(1000)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("token has no payload segment")]
    MissingPayload,

    #[error("token payload is not valid base64url: {0}")]
    Base64(String),

    #[error("token payload is not valid UTF-8")]
    Utf8,

    #[error("token payload is not a valid claims object: {0}")]
    Json(String),
}

/// URL-safe alphabet; padded and unpadded payloads are both accepted.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode the claims segment of a compact token (`header.payload.signature`).
pub fn decode_claims(token: &str) -> Result<TokenClaims, DecodeError> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or(DecodeError::MissingPayload)?;

    // Some issuers emit the standard alphabet; fold it into URL-safe.
    let normalized: String = payload
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = PAYLOAD_ENGINE
        .decode(normalized.as_bytes())
        .map_err(|e| DecodeError::Base64(e.to_string()))?;
    let json = String::from_utf8(bytes).map_err(|_| DecodeError::Utf8)?;

    serde_json::from_str(&json).map_err(|e| DecodeError::Json(e.to_string()))
}
