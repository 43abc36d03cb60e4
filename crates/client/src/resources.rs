//! CRUD access to the backend resources.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use smartparking_core::{Page, PageRequest, PagedPayload, ResourceId};

use crate::{ApiClient, ClientError};

/// Every list/CRUD endpoint the console talks to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Roles,
    Permissions,
    Parkings,
    Zones,
    Spaces,
    SpaceTypes,
    Shifts,
    Rates,
    Customers,
    Vehicles,
    Transactions,
    Payments,
    Infractions,
    DocumentTypes,
    PaymentTypes,
}

impl Resource {
    pub const ALL: [Resource; 16] = [
        Resource::Users,
        Resource::Roles,
        Resource::Permissions,
        Resource::Parkings,
        Resource::Zones,
        Resource::Spaces,
        Resource::SpaceTypes,
        Resource::Shifts,
        Resource::Rates,
        Resource::Customers,
        Resource::Vehicles,
        Resource::Transactions,
        Resource::Payments,
        Resource::Infractions,
        Resource::DocumentTypes,
        Resource::PaymentTypes,
    ];

    /// Path below `api_url`.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Roles => "roles",
            Resource::Permissions => "permissions",
            Resource::Parkings => "parking-service/v1/parkings",
            Resource::Zones => "parking-service/v1/zones",
            Resource::Spaces => "parking-service/v1/spaces",
            Resource::Shifts => "parking-service/v1/shifts",
            Resource::Rates => "parking-service/v1/rates",
            Resource::DocumentTypes => "parking-service/v1/document-types",
            Resource::PaymentTypes => "parking-service/v1/payment-types",
            Resource::SpaceTypes => "parking-service/api/v1/space-types",
            Resource::Customers => "parking-service/api/v1/customers",
            Resource::Vehicles => "parking-service/api/v1/vehicles",
            Resource::Transactions => "parking-service/api/v1/transactions",
            Resource::Payments => "parking-service/api/v1/payments",
            Resource::Infractions => "parking-service/api/v1/infractions",
        }
    }

    /// Served by the auth service rather than the parking service.
    pub fn is_auth_service(self) -> bool {
        matches!(self, Resource::Users | Resource::Roles | Resource::Permissions)
    }
}

/// Optional list filters sent next to the page parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
    pub search: Option<String>,
    pub status: Option<String>,
}

impl ListFilters {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Blank values are left out.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("status", status.to_string()));
        }
        pairs
    }
}

/// Typed client for one [`Resource`].
#[derive(Debug, Clone)]
pub struct ResourceClient<T> {
    api: ApiClient,
    resource: Resource,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> ResourceClient<T> {
    pub fn new(api: ApiClient, resource: Resource) -> Self {
        Self {
            api,
            resource,
            _marker: PhantomData,
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    fn url(&self, suffix: &str) -> String {
        let base = self.api.config().endpoint(self.resource.path());
        if suffix.is_empty() {
            base
        } else {
            format!("{base}/{suffix}")
        }
    }

    /// One page, whichever shape the owning service answers with.
    pub async fn list(&self, request: &PageRequest, filters: &ListFilters) -> Result<Page<T>, ClientError> {
        let mut query = request.query_pairs();
        query.extend(filters.query_pairs());
        let payload: PagedPayload<T> = self.api.get(&self.url(""), &query).await?;
        Ok(Page::try_from(payload)?)
    }

    pub async fn get(&self, id: ResourceId) -> Result<T, ClientError> {
        self.api.get(&self.url(&id.to_string()), &[]).await
    }

    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<T, ClientError> {
        self.api.post(&self.url(""), body).await
    }

    pub async fn update<B: Serialize + ?Sized>(&self, id: ResourceId, body: &B) -> Result<T, ClientError> {
        self.api.put(&self.url(&id.to_string()), body).await
    }

    pub async fn delete(&self, id: ResourceId) -> Result<(), ClientError> {
        self.api.delete(&self.url(&id.to_string())).await
    }

    /// Flip the active flag (PATCH `/{id}/toggle-status`).
    pub async fn toggle_status(&self, id: ResourceId) -> Result<T, ClientError> {
        self.api.patch(&self.url(&format!("{id}/toggle-status"))).await
    }

    /// Active entries, unpaged.
    pub async fn active(&self) -> Result<Vec<T>, ClientError> {
        self.api.get(&self.url("active"), &[]).await
    }

    /// Every entry, unpaged (auth-service resources).
    pub async fn all(&self) -> Result<Vec<T>, ClientError> {
        self.api.get(&self.url("all"), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_service_resources_sit_at_the_root() {
        for resource in Resource::ALL {
            assert_eq!(resource.is_auth_service(), !resource.path().starts_with("parking-service/"));
        }
        assert_eq!(Resource::Shifts.path(), "parking-service/v1/shifts");
    }

    #[test]
    fn filters_skip_blank_values() {
        let filters = ListFilters::default().search("  ").status("");
        assert!(filters.query_pairs().is_empty());

        let filters = ListFilters::default().search(" mañana ").status("true");
        assert_eq!(
            filters.query_pairs(),
            vec![("search", "mañana".to_string()), ("status", "true".to_string())]
        );
    }
}
