use crate::api::error::ApiError;
use crate::api::mapping;
use crate::api::traits::CatalogApi;
use crate::api::types::PropertyQuery;
use crate::config::Config;
use crate::models::{Lead, Property, Tenant};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// HTTP client for the headless CMS that owns tenants, listings and leads
pub struct StrapiClient {
    client: Client,
    base_url: String,
    media_url: String,
}

impl StrapiClient {
    /// Create a client against `base_url` (e.g. `http://localhost:1337/api`)
    pub fn new(base_url: &str, media_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            media_url: media_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_url, &config.media_url, config.http_timeout)
    }

    async fn get_json(&self, path: &str, params: &[(String, String)]) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching URL: {} ({} params)", url, params.len());

        let response = self.client.get(&url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} returned status: {}", path, status);
            return Err(ApiError::from_status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl CatalogApi for StrapiClient {
    async fn list_tenants(&self) -> Result<Vec<Tenant>, ApiError> {
        let params = vec![("populate".to_string(), "*".to_string())];
        let body = self.get_json("/clientes", &params).await?;
        let tenants = mapping::tenants_from_response(&body);
        info!("Loaded {} tenants", tenants.len());
        Ok(tenants)
    }

    async fn get_tenant(&self, id: &str) -> Result<Tenant, ApiError> {
        // Filtering the collection works on every CMS version; `/clientes/{id}` does not
        let params = vec![
            ("populate".to_string(), "*".to_string()),
            ("filters[id][$eq]".to_string(), id.to_string()),
        ];
        let body = self.get_json("/clientes", &params).await?;
        mapping::tenants_from_response(&body)
            .into_iter()
            .next()
            .ok_or(ApiError::NotFound)
    }

    async fn list_properties(&self, query: &PropertyQuery) -> Result<Vec<Property>, ApiError> {
        let body = self.get_json("/imovels", &query.to_params()).await?;
        let properties = mapping::properties_from_response(&body, &self.media_url);
        info!(
            "Loaded {} properties (tenant: {})",
            properties.len(),
            query.tenant_id.as_deref().unwrap_or("all")
        );
        Ok(properties)
    }

    async fn create_lead(&self, lead: &Lead) -> Result<(), ApiError> {
        let url = format!("{}/leads", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&mapping::lead_payload(lead))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Lead submission returned status: {}", status);
            return Err(ApiError::from_status(status.as_u16()));
        }
        info!("Lead submitted for {}", lead.email);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "Strapi"
    }
}
