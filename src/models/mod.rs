use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod lead;

pub use lead::{Lead, LeadOrigin, LeadStatus};

/// Id carried by the placeholder tenant used when no tenant can be resolved.
pub const DEFAULT_TENANT_ID: &str = "default";

/// Kind of listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    House,
    Apartment,
    Land,
    Commercial,
    Rural,
}

impl PropertyType {
    pub const ALL: [PropertyType; 5] = [
        PropertyType::House,
        PropertyType::Apartment,
        PropertyType::Land,
        PropertyType::Commercial,
        PropertyType::Rural,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::House => "house",
            PropertyType::Apartment => "apartment",
            PropertyType::Land => "land",
            PropertyType::Commercial => "commercial",
            PropertyType::Rural => "rural",
        }
    }

    /// Label the CMS stores for this type
    pub fn cms_label(&self) -> &'static str {
        match self {
            PropertyType::House => "casa",
            PropertyType::Apartment => "apartamento",
            PropertyType::Land => "terreno",
            PropertyType::Commercial => "comercial",
            PropertyType::Rural => "rural",
        }
    }

    /// Parse either the English name or the CMS label, ignoring case.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == label || t.cms_label() == label)
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical listing record.
///
/// Prices are stored in USD. Anything the API leaves out is `None` rather
/// than a guessed default; sorting and filtering decide how to treat gaps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub id: String,
    pub title: String,
    pub description: String,
    pub city: String,
    pub address: String,
    pub property_type: Option<PropertyType>,
    pub price: Option<f64>,
    /// Square meters
    pub area: Option<f64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
    /// `None` means the listing is shared by every tenant
    pub tenant_id: Option<String>,
    pub images: Vec<String>,
    pub active: bool,
}

impl Property {
    /// Empty active listing with the given id, mostly useful as a builder base.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            description: String::new(),
            city: String::new(),
            address: String::new(),
            property_type: None,
            price: None,
            area: None,
            bedrooms: None,
            bathrooms: None,
            created_at: None,
            tenant_id: None,
            images: Vec::new(),
            active: true,
        }
    }

    /// Not owned by any tenant, so every tenant lists it
    pub fn is_shared(&self) -> bool {
        self.tenant_id.is_none()
    }
}

/// Subscription tier of a tenant
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TenantPlan {
    #[default]
    Basic,
    Premium,
    Enterprise,
}

impl TenantPlan {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_uppercase().as_str() {
            "BASIC" | "BASICO" | "BÁSICO" => Some(TenantPlan::Basic),
            "PREMIUM" => Some(TenantPlan::Premium),
            "ENTERPRISE" => Some(TenantPlan::Enterprise),
            _ => None,
        }
    }
}

/// Brand colors applied to the UI for a tenant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThemeConfig {
    pub primary_color: String,
    pub secondary_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            primary_color: "#3B82F6".to_string(),
            secondary_color: "#1E40AF".to_string(),
        }
    }
}

/// A customer brand of the white-label catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub contact_email: Option<String>,
    pub plan: TenantPlan,
    /// Default locale tag such as `pt-BR`
    pub locale: Option<String>,
    pub theme: ThemeConfig,
}

impl Tenant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            contact_email: None,
            plan: TenantPlan::default(),
            locale: None,
            theme: ThemeConfig::default(),
        }
    }

    /// Placeholder used when the API has no tenants to offer.
    pub fn fallback() -> Self {
        Self::new(DEFAULT_TENANT_ID, "Default Catalog")
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_TENANT_ID
    }
}
