use crate::api::error::ApiError;
use crate::api::types::PropertyQuery;
use crate::models::{Lead, Property, Tenant};
use async_trait::async_trait;

/// Operations the catalog core needs from the content API.
/// The HTTP client implements it; tests swap in an in-memory backend.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// All tenants known to the backend
    async fn list_tenants(&self) -> Result<Vec<Tenant>, ApiError>;

    /// A single tenant, `ApiError::NotFound` when the id is unknown
    async fn get_tenant(&self, id: &str) -> Result<Tenant, ApiError>;

    /// Listings matching the server-side part of a query
    async fn list_properties(&self, query: &PropertyQuery) -> Result<Vec<Property>, ApiError>;

    async fn create_lead(&self, lead: &Lead) -> Result<(), ApiError>;

    /// Name of the backend, for logs
    fn backend_name(&self) -> &'static str;
}
