//! `smartparking-client`: REST access to the Smart Parking backends.
//!
//! [`Session`] is the entry point: it owns configuration, credentials and the
//! HTTP client, and hands out endpoint clients. Credentials are attached,
//! refreshed and cleared here; authorization decisions live in
//! `smartparking-auth`.

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod resources;
pub mod session;

pub use auth::{Acknowledgement, AuthClient, AuthResponse, LoginRequest, RegisterRequest, UserInfo};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, normalize_response, normalize_transport, session_expired_redirect, status_message};
pub use http::{ApiClient, TokenPair};
pub use resources::{ListFilters, Resource, ResourceClient};
pub use session::Session;
