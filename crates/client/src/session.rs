use std::sync::Arc;

use serde::de::DeserializeOwned;

use smartparking_auth::{MenuItem, Navigator, Principal, TokenStorage, TokenStore, catalog, filter_menu};

use crate::{ApiClient, AuthClient, ClientConfig, ClientError, Resource, ResourceClient};

/// Authentication context of one signed-in console.
///
/// Owns the configuration, the token store and the HTTP client (which holds
/// the refresh coordinator). Clones share all of them.
#[derive(Debug, Clone)]
pub struct Session {
    config: Arc<ClientConfig>,
    api: ApiClient,
}

impl Session {
    pub fn new(config: ClientConfig, storage: Arc<dyn TokenStorage>) -> Result<Self, ClientError> {
        let config = Arc::new(config);
        let store = TokenStore::new(storage, config.token_keys.clone());
        let api = ApiClient::new(Arc::clone(&config), store)?;
        Ok(Self { config, api })
    }

    /// Session whose credentials live only in this process.
    pub fn in_memory(config: ClientConfig) -> Result<Self, ClientError> {
        Self::new(config, Arc::new(smartparking_auth::MemoryStorage::new()))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &TokenStore {
        self.api.store()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn auth(&self) -> AuthClient {
        AuthClient::new(self.api.clone())
    }

    pub fn resource<T: DeserializeOwned>(&self, resource: Resource) -> ResourceClient<T> {
        ResourceClient::new(self.api.clone(), resource)
    }

    pub fn is_authenticated(&self) -> bool {
        self.store().is_authenticated()
    }

    /// Principal derived from the stored access token, read fresh each call.
    pub fn principal(&self) -> Option<Principal> {
        self.store().principal()
    }

    /// Guards over the application's route table.
    pub fn navigator(&self) -> Navigator {
        Navigator::new(self.store().clone(), catalog::routes())
            .with_auth_routes(self.config.auth_routes.clone())
            .with_debug(self.config.debug)
    }

    /// Sidebar entries visible to the current principal; empty when signed
    /// out or once the access token has expired.
    pub fn menu(&self) -> Vec<MenuItem> {
        if !self.is_authenticated() {
            return Vec::new();
        }
        match self.principal() {
            Some(principal) => filter_menu(&catalog::menu(), &principal),
            None => Vec::new(),
        }
    }
}
