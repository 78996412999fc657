use crate::models::Property;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Result ordering offered to the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Newest first
    #[default]
    Recent,
    PriceAsc,
    PriceDesc,
    AreaAsc,
    AreaDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Recent,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
        SortKey::AreaAsc,
        SortKey::AreaDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Recent => "recent",
            SortKey::PriceAsc => "price-asc",
            SortKey::PriceDesc => "price-desc",
            SortKey::AreaAsc => "area-asc",
            SortKey::AreaDesc => "area-desc",
        }
    }

    fn compare(&self, a: &Property, b: &Property) -> Ordering {
        let price = |p: &Property| p.price.unwrap_or(0.0);
        let area = |p: &Property| p.area.unwrap_or(0.0);
        let created = |p: &Property| p.created_at.map_or(0, |ts| ts.timestamp_millis());

        match self {
            SortKey::Recent => created(b).cmp(&created(a)),
            SortKey::PriceAsc => price(a).total_cmp(&price(b)),
            SortKey::PriceDesc => price(b).total_cmp(&price(a)),
            SortKey::AreaAsc => area(a).total_cmp(&area(b)),
            SortKey::AreaDesc => area(b).total_cmp(&area(a)),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown sort key '{}'", s))
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Return a sorted copy. Missing values sort as zero (epoch for dates) and
/// equal keys keep their input order.
pub fn sort(properties: &[Property], key: SortKey) -> Vec<Property> {
    let mut sorted = properties.to_vec();
    sorted.sort_by(|a, b| key.compare(a, b));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mapping::parse_timestamp;

    fn listing(id: &str, price: Option<f64>, area: Option<f64>, created: Option<&str>) -> Property {
        Property {
            price,
            area,
            created_at: created.and_then(parse_timestamp),
            ..Property::new(id)
        }
    }

    fn ids(props: &[Property]) -> Vec<&str> {
        props.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_each_key() {
        let props = vec![
            listing("a", Some(300.0), Some(40.0), Some("2024-03-01")),
            listing("b", Some(100.0), Some(90.0), Some("2024-05-01")),
            listing("c", Some(200.0), Some(60.0), Some("2023-12-31")),
        ];

        assert_eq!(ids(&sort(&props, SortKey::Recent)), vec!["b", "a", "c"]);
        assert_eq!(ids(&sort(&props, SortKey::PriceAsc)), vec!["b", "c", "a"]);
        assert_eq!(ids(&sort(&props, SortKey::PriceDesc)), vec!["a", "c", "b"]);
        assert_eq!(ids(&sort(&props, SortKey::AreaAsc)), vec!["a", "c", "b"]);
        assert_eq!(ids(&sort(&props, SortKey::AreaDesc)), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_missing_values_sort_as_zero() {
        let props = vec![
            listing("dated", Some(5.0), None, Some("2020-01-01")),
            listing("undated", None, Some(5.0), None),
        ];
        assert_eq!(ids(&sort(&props, SortKey::Recent)), vec!["dated", "undated"]);
        assert_eq!(ids(&sort(&props, SortKey::PriceAsc)), vec!["undated", "dated"]);
        assert_eq!(ids(&sort(&props, SortKey::AreaDesc)), vec!["undated", "dated"]);
    }

    #[test]
    fn test_ties_keep_input_order_and_sort_is_idempotent() {
        let props = vec![
            listing("1", Some(100.0), Some(50.0), None),
            listing("2", Some(50.0), Some(50.0), None),
            listing("3", Some(100.0), Some(50.0), None),
            listing("4", Some(50.0), Some(50.0), None),
        ];

        for key in SortKey::ALL {
            let once = sort(&props, key);
            assert_eq!(sort(&once, key), once);
        }
        assert_eq!(ids(&sort(&props, SortKey::PriceDesc)), vec!["1", "3", "2", "4"]);
        assert_eq!(ids(&sort(&props, SortKey::AreaAsc)), vec!["1", "2", "3", "4"]);
        assert_eq!(ids(&sort(&props, SortKey::Recent)), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!("price-desc".parse::<SortKey>(), Ok(SortKey::PriceDesc));
        assert!("cheapest".parse::<SortKey>().is_err());
    }
}
