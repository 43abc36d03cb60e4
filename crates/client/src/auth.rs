//! Authentication endpoints (`{api_url}/auth/...`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use smartparking_auth::{Permission, Role};
use smartparking_core::UserId;

use crate::{ApiClient, ClientError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remember_me: Option<bool>,
    /// Role to sign in as when the user holds several.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_role: Option<Role>,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            remember_me: None,
            selected_role: None,
        }
    }

    pub fn as_role(mut self, role: Role) -> Self {
        self.selected_role = Some(role);
        self
    }
}

/// User summary returned alongside the tokens at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Access token lifetime in milliseconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: UserInfo,
}

/// Citizen self-registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub password: String,
    pub confirm_password: String,
    pub accept_terms: bool,
}

/// `{success, message}` acknowledgement of the account-recovery endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn endpoint(&self, path: &str) -> String {
        self.api.config().endpoint(&format!("auth/{path}"))
    }

    /// Sign in and persist both tokens.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let response: AuthResponse = self.api.post_public(&self.endpoint("login"), request).await?;
        self.api
            .store()
            .save(&response.access_token, &response.refresh_token)?;

        tracing::info!(
            user = %response.user.email,
            roles = ?response.user.roles,
            expires_in_ms = ?response.expires_in,
            "login succeeded"
        );
        Ok(response)
    }

    /// Renew the access token. A failed refresh clears the stored credentials.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        self.api.refresh_tokens().await
    }

    /// Forget the stored credentials. No backend call is made.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.api.store().clear()?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Whether the user is authenticated at `now`, refreshing once when the
    /// access token is present but expired and a refresh token is stored.
    pub async fn check_authentication_at(&self, now: DateTime<Utc>) -> bool {
        let store = self.api.store();
        if store.is_authenticated_at(now) {
            return true;
        }
        if !store.has_credential() || store.get_refresh().is_none() {
            return false;
        }

        match self.refresh().await {
            Ok(()) => store.is_authenticated_at(now),
            Err(e) => {
                tracing::warn!(error = %e, "session could not be renewed");
                if let Err(e) = store.clear() {
                    tracing::error!(error = %e, "failed to clear credentials");
                }
                false
            }
        }
    }

    pub async fn check_authentication(&self) -> bool {
        self.check_authentication_at(Utc::now()).await
    }

    /// Create a citizen account. No credentials are stored: the account may
    /// still need its email verified before it can sign in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Acknowledgement, ClientError> {
        let ack: Acknowledgement = self.api.post_public(&self.endpoint("register"), request).await?;
        tracing::info!(user = %request.email, "account registered");
        Ok(ack)
    }

    /// Send the verification email again.
    pub async fn resend_verification(&self, email: &str) -> Result<Acknowledgement, ClientError> {
        self.api
            .post_public(&self.endpoint("resend-verification"), &serde_json::json!({ "email": email }))
            .await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<Acknowledgement, ClientError> {
        self.api
            .post_public(&self.endpoint("forgot-password"), &serde_json::json!({ "email": email }))
            .await
    }

    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<Acknowledgement, ClientError> {
        let body = serde_json::json!({
            "token": token,
            "newPassword": new_password,
            "confirmPassword": confirm_password,
        });
        self.api.post_public(&self.endpoint("reset-password"), &body).await
    }

    pub async fn verify_email(&self, token: &str) -> Result<Acknowledgement, ClientError> {
        self.api
            .get_public(&self.endpoint("verify-email"), &[("token", token.to_string())])
            .await
    }

    /// Change the signed-in user's password.
    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<(), ClientError> {
        let body = serde_json::json!({
            "currentPassword": current_password,
            "newPassword": new_password,
        });
        let _: serde_json::Value = self.api.post(&self.endpoint("change-password"), &body).await?;
        Ok(())
    }
}
