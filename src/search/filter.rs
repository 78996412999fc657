use crate::models::{Property, PropertyType};
use serde::{Deserialize, Serialize};
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// How bedroom/bathroom facets compare against a listing.
///
/// The main search box asks for an exact count; the advanced filter panel
/// offers "N or more".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoomMatch {
    #[default]
    Exact,
    AtLeast,
}

impl RoomMatch {
    fn accepts(&self, wanted: u32, actual: Option<u32>) -> bool {
        match (self, actual) {
            (_, None) => false,
            (RoomMatch::Exact, Some(n)) => n == wanted,
            (RoomMatch::AtLeast, Some(n)) => n >= wanted,
        }
    }
}

/// A single structured filter dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Type,
    City,
    PriceMin,
    PriceMax,
    Bedrooms,
    Bathrooms,
    AreaMin,
    AreaMax,
}

impl Facet {
    /// Map a form field name to a facet. Both the English names and the
    /// CMS-era Portuguese names (`precoMin`, `quartos`, ...) are accepted.
    pub fn from_key(key: &str) -> Option<Self> {
        let facet = match key.trim() {
            "type" | "tipo" => Facet::Type,
            "city" | "cidade" => Facet::City,
            "priceMin" | "price_min" | "precoMin" => Facet::PriceMin,
            "priceMax" | "price_max" | "precoMax" => Facet::PriceMax,
            "bedrooms" | "quartos" => Facet::Bedrooms,
            "bathrooms" | "banheiros" => Facet::Bathrooms,
            "areaMin" | "area_min" => Facet::AreaMin,
            "areaMax" | "area_max" => Facet::AreaMax,
            _ => return None,
        };
        Some(facet)
    }
}

/// Optional facet constraints, combined with AND. `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    pub property_type: Option<PropertyType>,
    pub city: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub area_min: Option<f64>,
    pub area_max: Option<f64>,
    pub room_match: RoomMatch,
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_count(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    raw.parse::<u32>().ok().or_else(|| {
        parse_amount(raw)
            .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= u32::MAX as f64)
            .map(|v| v as u32)
    })
}

fn parse_text(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

impl FilterSet {
    /// Build from raw form pairs. Unknown keys are ignored and any value that
    /// cannot be parsed leaves its facet unconstrained.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut set = Self::default();
        for (key, raw) in pairs {
            match Facet::from_key(key) {
                Some(facet) => set.set(facet, raw),
                None => debug!("Ignoring unknown filter key '{}'", key),
            }
        }
        set
    }

    /// Set a facet from user text. Empty or malformed input clears it.
    pub fn set(&mut self, facet: Facet, raw: &str) {
        match facet {
            Facet::Type => self.property_type = PropertyType::from_label(raw),
            Facet::City => self.city = parse_text(raw),
            Facet::PriceMin => self.price_min = parse_amount(raw),
            Facet::PriceMax => self.price_max = parse_amount(raw),
            Facet::Bedrooms => self.bedrooms = parse_count(raw),
            Facet::Bathrooms => self.bathrooms = parse_count(raw),
            Facet::AreaMin => self.area_min = parse_amount(raw),
            Facet::AreaMax => self.area_max = parse_amount(raw),
        }
    }

    pub fn clear(&mut self, facet: Facet) {
        self.set(facet, "");
    }

    /// Number of facets currently constraining results
    pub fn active_count(&self) -> usize {
        [
            self.property_type.is_some(),
            self.city.is_some(),
            self.price_min.is_some(),
            self.price_max.is_some(),
            self.bedrooms.is_some(),
            self.bathrooms.is_some(),
            self.area_min.is_some(),
            self.area_max.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Whether a listing satisfies every set facet. A listing missing the
    /// field a facet constrains never satisfies it.
    pub fn matches(&self, property: &Property) -> bool {
        if let Some(kind) = self.property_type {
            if property.property_type != Some(kind) {
                return false;
            }
        }
        if let Some(city) = &self.city {
            if &property.city != city {
                return false;
            }
        }
        if !within(property.price, self.price_min, self.price_max) {
            return false;
        }
        if !within(property.area, self.area_min, self.area_max) {
            return false;
        }
        if let Some(wanted) = self.bedrooms {
            if !self.room_match.accepts(wanted, property.bedrooms) {
                return false;
            }
        }
        if let Some(wanted) = self.bathrooms {
            if !self.room_match.accepts(wanted, property.bathrooms) {
                return false;
            }
        }
        true
    }
}

fn within(value: Option<f64>, min: Option<f64>, max: Option<f64>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
}

/// Lower-case and strip diacritics: `"São Paulo"` -> `"sao paulo"`.
pub fn normalize(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// Normalized text a query is matched against. Fields are newline-separated
/// so a query never matches across two of them.
pub fn searchable_text(property: &Property) -> String {
    let kind = property
        .property_type
        .map(|t| format!("{} {}", t.as_str(), t.cms_label()))
        .unwrap_or_default();

    [
        property.title.as_str(),
        property.description.as_str(),
        property.city.as_str(),
        property.address.as_str(),
        kind.as_str(),
    ]
    .iter()
    .map(|field| normalize(field))
    .collect::<Vec<_>>()
    .join("\n")
}

/// Apply the free-text query and facet constraints. Input order is kept.
pub fn filter(properties: &[Property], query: Option<&str>, facets: &FilterSet) -> Vec<Property> {
    let term = query.map(normalize).unwrap_or_default();

    let results: Vec<Property> = properties
        .iter()
        .filter(|p| term.is_empty() || searchable_text(p).contains(&term))
        .filter(|p| facets.matches(p))
        .cloned()
        .collect();

    debug!(
        "Filter '{}' with {} facets: {} -> {}",
        term,
        facets.active_count(),
        properties.len(),
        results.len()
    );
    results
}
