use crate::api::error::ApiError;
use crate::api::mapping::parse_timestamp;
use crate::api::traits::CatalogApi;
use crate::api::types::PropertyQuery;
use crate::models::{Lead, Property, PropertyType, Tenant, TenantPlan};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;
use tracing::info;

/// API operation, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListTenants,
    GetTenant,
    ListProperties,
    CreateLead,
}

#[derive(Default)]
struct Inner {
    tenants: Vec<Tenant>,
    properties: Vec<Property>,
    leads: Vec<Lead>,
    last_query: Option<PropertyQuery>,
    failures: HashMap<Operation, ApiError>,
    tenant_gate: Option<Arc<Notify>>,
}

/// Catalog backend held in memory: the `--demo` data source and the test double.
#[derive(Default)]
pub struct InMemoryCatalog {
    inner: Mutex<Inner>,
}

impl InMemoryCatalog {
    pub fn new(tenants: Vec<Tenant>, properties: Vec<Property>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                tenants,
                properties,
                ..Inner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make `op` fail with `err` until [`clear_failures`](Self::clear_failures)
    pub fn fail(&self, op: Operation, err: ApiError) {
        self.lock().failures.insert(op, err);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Park tenant lookups until the returned handle is notified.
    pub fn hold_tenant_lookups(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().tenant_gate = Some(gate.clone());
        gate
    }

    pub fn submitted_leads(&self) -> Vec<Lead> {
        self.lock().leads.clone()
    }

    /// Query of the most recent `list_properties` call
    pub fn last_query(&self) -> Option<PropertyQuery> {
        self.lock().last_query.clone()
    }

    fn check(&self, op: Operation) -> Result<(), ApiError> {
        match self.lock().failures.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Two agencies and a few listings, one of them shared
    pub fn demo() -> Self {
        let mut acme = Tenant::new("1", "Imobiliária Demo");
        acme.contact_email = Some("contato@demo.com.br".to_string());
        acme.plan = TenantPlan::Premium;
        acme.locale = Some("pt-BR".to_string());

        let mut sur = Tenant::new("2", "Inmobiliaria Sur");
        sur.locale = Some("es-PY".to_string());

        let listing = |id: &str,
                       tenant: Option<&str>,
                       title: &str,
                       city: &str,
                       kind: PropertyType,
                       price: f64,
                       area: f64,
                       rooms: (u32, u32),
                       created: &str| Property {
            title: title.to_string(),
            description: format!("{} em {}", title, city),
            city: city.to_string(),
            address: format!("{} Centro", city),
            property_type: Some(kind),
            price: Some(price),
            area: Some(area),
            bedrooms: Some(rooms.0),
            bathrooms: Some(rooms.1),
            created_at: parse_timestamp(created),
            tenant_id: tenant.map(str::to_string),
            ..Property::new(id)
        };

        let properties = vec![
            listing("101", Some("1"), "Casa com piscina", "São Paulo", PropertyType::House, 185_000.0, 220.0, (3, 2), "2024-05-10"),
            listing("102", Some("1"), "Apartamento vista mar", "Santos", PropertyType::Apartment, 95_000.0, 78.0, (2, 1), "2024-06-01"),
            listing("103", Some("1"), "Sala comercial", "São Paulo", PropertyType::Commercial, 60_000.0, 45.0, (0, 1), "2024-02-20"),
            listing("201", Some("2"), "Casa en Asunción", "Asunción", PropertyType::House, 120_000.0, 180.0, (4, 3), "2024-04-15"),
            listing("202", Some("2"), "Terreno urbano", "Encarnación", PropertyType::Land, 35_000.0, 600.0, (0, 0), "2024-01-05"),
            listing("900", None, "Chácara rural", "Ciudad del Este", PropertyType::Rural, 250_000.0, 20_000.0, (5, 4), "2023-11-30"),
        ];

        Self::new(vec![acme, sur], properties)
    }
}

fn query_matches(query: &PropertyQuery, property: &Property) -> bool {
    let tenant_ok = match (&query.tenant_id, &property.tenant_id) {
        (None, _) | (Some(_), None) => true,
        (Some(wanted), Some(actual)) => wanted == actual,
    };
    tenant_ok
        && query.city.as_ref().map_or(true, |c| &property.city == c)
        && query
            .property_type
            .map_or(true, |t| property.property_type == Some(t))
        && query
            .min_price
            .map_or(true, |m| property.price.is_some_and(|p| p >= m))
        && query
            .max_price
            .map_or(true, |m| property.price.is_some_and(|p| p <= m))
        && query
            .bedrooms
            .map_or(true, |b| property.bedrooms == Some(b))
}

#[async_trait]
impl CatalogApi for InMemoryCatalog {
    async fn list_tenants(&self) -> Result<Vec<Tenant>, ApiError> {
        self.check(Operation::ListTenants)?;
        Ok(self.lock().tenants.clone())
    }

    async fn get_tenant(&self, id: &str) -> Result<Tenant, ApiError> {
        let gate = self.lock().tenant_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check(Operation::GetTenant)?;
        self.lock()
            .tenants
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(ApiError::NotFound)
    }

    async fn list_properties(&self, query: &PropertyQuery) -> Result<Vec<Property>, ApiError> {
        self.lock().last_query = Some(query.clone());
        self.check(Operation::ListProperties)?;
        Ok(self
            .lock()
            .properties
            .iter()
            .filter(|p| query_matches(query, p))
            .cloned()
            .collect())
    }

    async fn create_lead(&self, lead: &Lead) -> Result<(), ApiError> {
        self.check(Operation::CreateLead)?;
        info!("Stored lead from {} in memory", lead.email);
        self.lock().leads.push(lead.clone());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tenant_query_includes_shared_listings() {
        let catalog = InMemoryCatalog::demo();
        let query = PropertyQuery {
            tenant_id: Some("2".to_string()),
            ..PropertyQuery::default()
        };
        let ids: Vec<String> = catalog
            .list_properties(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["201", "202", "900"]);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let catalog = InMemoryCatalog::demo();
        catalog.fail(Operation::GetTenant, ApiError::Server(502));
        assert_eq!(catalog.get_tenant("1").await, Err(ApiError::Server(502)));
        catalog.clear_failures();
        assert_eq!(catalog.get_tenant("1").await.unwrap().name, "Imobiliária Demo");
        assert_eq!(catalog.get_tenant("nope").await, Err(ApiError::NotFound));
    }
}
