use crate::models::{PropertyType, Tenant};
use crate::search::{FilterSet, RoomMatch};
use serde::{Deserialize, Serialize};

/// Server-side part of a property search.
///
/// Only the facets the CMS filters cheaply are forwarded; the rest of the
/// pipeline runs client-side over whatever comes back.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PropertyQuery {
    /// Tenant the listings must belong to (shared listings are always included)
    pub tenant_id: Option<String>,
    pub city: Option<String>,
    pub property_type: Option<PropertyType>,
    /// Minimum price (USD)
    pub min_price: Option<f64>,
    /// Maximum price (USD)
    pub max_price: Option<f64>,
    pub bedrooms: Option<u32>,
}

impl PropertyQuery {
    /// Query scoped to a tenant; the placeholder tenant is not a real scope.
    pub fn for_tenant(tenant: &Tenant) -> Self {
        Self {
            tenant_id: (!tenant.is_default()).then(|| tenant.id.clone()),
            ..Self::default()
        }
    }

    /// Forward the server-friendly facets of a filter set.
    pub fn with_facets(mut self, facets: &FilterSet) -> Self {
        self.city = facets.city.clone();
        self.property_type = facets.property_type;
        self.min_price = facets.price_min;
        self.max_price = facets.price_max;
        // The CMS only offers equality here
        self.bedrooms = match facets.room_match {
            RoomMatch::Exact => facets.bedrooms,
            RoomMatch::AtLeast => None,
        };
        self
    }

    /// Query-string pairs in the CMS filter dialect
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("populate".to_string(), "*".to_string()),
            ("sort".to_string(), "createdAt:desc".to_string()),
        ];

        if let Some(city) = &self.city {
            params.push(("filters[cidade][$eq]".to_string(), city.clone()));
        }
        if let Some(kind) = self.property_type {
            params.push(("filters[tipo][$eq]".to_string(), kind.cms_label().to_string()));
        }
        if let Some(min) = self.min_price {
            params.push(("filters[preco][$gte]".to_string(), number_param(min)));
        }
        if let Some(max) = self.max_price {
            params.push(("filters[preco][$lte]".to_string(), number_param(max)));
        }
        if let Some(bedrooms) = self.bedrooms {
            params.push(("filters[quartos][$eq]".to_string(), bedrooms.to_string()));
        }
        if let Some(tenant) = &self.tenant_id {
            params.push((
                "filters[$or][0][cliente][id][$eq]".to_string(),
                tenant.clone(),
            ));
            params.push((
                "filters[$or][1][cliente][id][$null]".to_string(),
                "true".to_string(),
            ));
        }

        params
    }
}

fn number_param(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_default_tenant_is_not_forwarded() {
        let query = PropertyQuery::for_tenant(&Tenant::fallback());
        assert_eq!(query.tenant_id, None);

        let params = query.to_params();
        assert_eq!(param(&params, "populate"), Some("*"));
        assert_eq!(param(&params, "sort"), Some("createdAt:desc"));
        assert!(params.iter().all(|(k, _)| !k.contains("cliente")));
    }

    #[test]
    fn test_facets_become_cms_filters() {
        let facets = FilterSet {
            city: Some("Asunción".to_string()),
            property_type: Some(PropertyType::House),
            price_min: Some(50_000.0),
            price_max: Some(80_000.5),
            bedrooms: Some(3),
            ..FilterSet::default()
        };
        let query = PropertyQuery::for_tenant(&Tenant::new("7", "Acme")).with_facets(&facets);
        let params = query.to_params();

        assert_eq!(param(&params, "filters[cidade][$eq]"), Some("Asunción"));
        assert_eq!(param(&params, "filters[tipo][$eq]"), Some("casa"));
        assert_eq!(param(&params, "filters[preco][$gte]"), Some("50000"));
        assert_eq!(param(&params, "filters[preco][$lte]"), Some("80000.5"));
        assert_eq!(param(&params, "filters[quartos][$eq]"), Some("3"));
        assert_eq!(param(&params, "filters[$or][0][cliente][id][$eq]"), Some("7"));
        assert_eq!(param(&params, "filters[$or][1][cliente][id][$null]"), Some("true"));
    }
}
