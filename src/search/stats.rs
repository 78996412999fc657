use crate::models::{Property, PropertyType};
use serde::Serialize;

/// Summary figures over a listing collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStats {
    pub total: usize,
    pub types: Vec<PropertyType>,
    pub cities: Vec<String>,
    /// Rounded mean over listings with a positive price
    pub average_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub average_area: f64,
}

/// Values present in a collection, used to populate the filter widgets
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FacetOptions {
    pub types: Vec<PropertyType>,
    pub cities: Vec<String>,
    pub bedrooms: Vec<u32>,
    pub bathrooms: Vec<u32>,
}

fn distinct<T: PartialEq>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}

fn distinct_counts(items: impl Iterator<Item = Option<u32>>) -> Vec<u32> {
    let mut counts = distinct(items.flatten().filter(|n| *n > 0));
    counts.sort_unstable();
    counts
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        (values.iter().sum::<f64>() / values.len() as f64).round()
    }
}

/// `None` for an empty collection
pub fn catalog_stats(properties: &[Property]) -> Option<CatalogStats> {
    if properties.is_empty() {
        return None;
    }

    let prices: Vec<f64> = properties
        .iter()
        .filter_map(|p| p.price)
        .filter(|v| *v > 0.0)
        .collect();
    let areas: Vec<f64> = properties
        .iter()
        .filter_map(|p| p.area)
        .filter(|v| *v > 0.0)
        .collect();

    let options = facet_options(properties);

    Some(CatalogStats {
        total: properties.len(),
        types: options.types,
        cities: options.cities,
        average_price: mean(&prices),
        min_price: prices.iter().copied().reduce(f64::min).unwrap_or(0.0),
        max_price: prices.iter().copied().reduce(f64::max).unwrap_or(0.0),
        average_area: mean(&areas),
    })
}

pub fn facet_options(properties: &[Property]) -> FacetOptions {
    FacetOptions {
        types: distinct(properties.iter().filter_map(|p| p.property_type)),
        cities: distinct(
            properties
                .iter()
                .filter(|p| !p.city.is_empty())
                .map(|p| p.city.clone()),
        ),
        bedrooms: distinct_counts(properties.iter().map(|p| p.bedrooms)),
        bathrooms: distinct_counts(properties.iter().map(|p| p.bathrooms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(city: &str, kind: PropertyType, price: Option<f64>, bedrooms: u32) -> Property {
        Property {
            city: city.to_string(),
            property_type: Some(kind),
            price,
            area: Some(100.0),
            bedrooms: Some(bedrooms),
            ..Property::new(city)
        }
    }

    #[test]
    fn test_empty_has_no_stats() {
        assert_eq!(catalog_stats(&[]), None);
    }

    #[test]
    fn test_stats_skip_unpriced() {
        let props = vec![
            listing("Lima", PropertyType::House, Some(100.0), 3),
            listing("Lima", PropertyType::Land, None, 0),
            listing("Cusco", PropertyType::House, Some(201.0), 1),
        ];
        let stats = catalog_stats(&props).unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.average_price, 151.0);
        assert_eq!(stats.min_price, 100.0);
        assert_eq!(stats.max_price, 201.0);
        assert_eq!(stats.types, vec![PropertyType::House, PropertyType::Land]);
        assert_eq!(stats.cities, vec!["Lima".to_string(), "Cusco".to_string()]);
    }

    #[test]
    fn test_facet_counts_sorted_without_zero() {
        let props = vec![
            listing("A", PropertyType::House, None, 3),
            listing("B", PropertyType::House, None, 0),
            listing("C", PropertyType::House, None, 1),
            listing("D", PropertyType::House, None, 3),
        ];
        assert_eq!(facet_options(&props).bedrooms, vec![1, 3]);
    }
}
