//! Adapters from raw CMS payloads to the canonical models.
//!
//! The CMS has answered in two shapes over time: flat records
//! (`{"id": 1, "titulo": ...}`) and wrapped ones
//! (`{"id": 1, "attributes": {"titulo": ...}}`). Images show up as plain
//! strings, `[{url}]`, or `{data: [{attributes: {url}}]}`. Everything is
//! validated and defaulted here so the rest of the crate sees one schema.

use crate::models::{Lead, Property, PropertyType, Tenant, TenantPlan, ThemeConfig};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// One record of a CMS collection, flat or wrapped in `attributes`.
struct Record<'a> {
    outer: &'a Value,
    attrs: Option<&'a Value>,
}

impl<'a> Record<'a> {
    fn new(value: &'a Value) -> Self {
        Self {
            outer: value,
            attrs: value.get("attributes").filter(|a| a.is_object()),
        }
    }

    fn field(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter().find_map(|key| {
            self.attrs
                .and_then(|a| a.get(*key))
                .or_else(|| self.outer.get(*key))
                .filter(|v| !v.is_null())
        })
    }

    fn text(&self, keys: &[&str]) -> Option<String> {
        self.field(keys).and_then(value_text)
    }

    fn number(&self, keys: &[&str]) -> Option<f64> {
        self.field(keys).and_then(value_number)
    }

    fn id(&self) -> Option<String> {
        self.outer
            .get("id")
            .and_then(value_text)
            .or_else(|| self.outer.get("documentId").and_then(value_text))
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

fn count(value: Option<f64>) -> Option<u32> {
    non_negative(value).map(|v| v.trunc() as u32)
}

/// Items of a collection response. A single-object `data` counts as one item.
fn collection(body: &Value) -> Vec<&Value> {
    match body.get("data").unwrap_or(body) {
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![body.get("data").unwrap_or(body)],
        _ => Vec::new(),
    }
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (taken as UTC midnight).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn absolutize(url: &str, media_base: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!(
            "{}/{}",
            media_base.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

fn image_url(image: &Value) -> Option<&str> {
    match image {
        Value::String(s) => Some(s.as_str()),
        Value::Object(_) => image
            .get("url")
            .or_else(|| image.get("attributes").and_then(|a| a.get("url")))
            .and_then(Value::as_str),
        _ => None,
    }
}

fn images(value: Option<&Value>, media_base: &str) -> Vec<String> {
    let items = match value {
        Some(Value::Array(items)) => items.iter().collect::<Vec<_>>(),
        Some(obj @ Value::Object(_)) => match obj.get("data") {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(single @ Value::Object(_)) => vec![single],
            _ => vec![obj],
        },
        Some(s @ Value::String(_)) => vec![s],
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(image_url)
        .filter(|url| !url.is_empty())
        .map(|url| absolutize(url, media_base))
        .collect()
}

/// Tenant reference of a listing: an id, `{id}`, or `{data: {id}}`.
fn tenant_ref(value: Option<&Value>) -> Option<String> {
    let value = value?;
    match value {
        Value::String(_) | Value::Number(_) => value_text(value),
        Value::Object(_) => {
            let inner = value.get("data").unwrap_or(value);
            if inner.is_null() {
                None
            } else {
                inner.get("id").and_then(value_text)
            }
        }
        _ => None,
    }
}

/// Convert one raw listing record. Records without an id are rejected.
pub fn property_from_value(value: &Value, media_base: &str) -> Option<Property> {
    let record = Record::new(value);
    let id = record.id()?;

    let property_type = record.text(&["tipo", "type", "property_type"]).and_then(|label| {
        let parsed = PropertyType::from_label(&label);
        if parsed.is_none() {
            debug!("Unknown property type '{}' on listing {}", label, id);
        }
        parsed
    });

    Some(Property {
        title: record.text(&["titulo", "title"]).unwrap_or_default(),
        description: record.text(&["descricao", "description"]).unwrap_or_default(),
        city: record.text(&["cidade", "city"]).unwrap_or_default(),
        address: record.text(&["endereco", "address"]).unwrap_or_default(),
        property_type,
        price: non_negative(record.number(&["preco", "price"])),
        area: non_negative(record.number(&["area"])),
        bedrooms: count(record.number(&["quartos", "bedrooms"])),
        bathrooms: count(record.number(&["banheiros", "bathrooms"])),
        created_at: record
            .text(&["createdAt", "created_at"])
            .and_then(|raw| parse_timestamp(&raw)),
        tenant_id: tenant_ref(record.field(&["cliente", "tenant", "tenantId", "tenant_id"])),
        images: images(record.field(&["imagens", "images"]), media_base),
        active: record
            .field(&["ativo", "active"])
            .and_then(Value::as_bool)
            .unwrap_or(true),
        id,
    })
}

/// Convert a listing collection response, skipping records that cannot be read.
pub fn properties_from_response(body: &Value, media_base: &str) -> Vec<Property> {
    let items = collection(body);
    let total = items.len();
    let properties: Vec<Property> = items
        .into_iter()
        .filter_map(|item| property_from_value(item, media_base))
        .collect();

    if properties.len() < total {
        warn!(
            "Skipped {} listing records without an id",
            total - properties.len()
        );
    }
    properties
}

pub fn tenant_from_value(value: &Value) -> Option<Tenant> {
    let record = Record::new(value);
    let id = record.id()?;
    let defaults = ThemeConfig::default();

    Some(Tenant {
        name: record
            .text(&["nome", "name"])
            .unwrap_or_else(|| format!("Tenant {}", id)),
        contact_email: record.text(&["email_contato", "contactEmail", "email"]),
        plan: record
            .text(&["plano", "plan"])
            .and_then(|p| TenantPlan::from_label(&p))
            .unwrap_or_default(),
        locale: record.text(&["idiomaPadrao", "locale"]),
        theme: ThemeConfig {
            primary_color: record
                .text(&["primaryColor", "cor_primaria"])
                .unwrap_or(defaults.primary_color),
            secondary_color: record
                .text(&["secondaryColor", "cor_secundaria"])
                .unwrap_or(defaults.secondary_color),
        },
        id,
    })
}

pub fn tenants_from_response(body: &Value) -> Vec<Tenant> {
    collection(body)
        .into_iter()
        .filter_map(tenant_from_value)
        .collect()
}

/// Request body for `POST /leads`
pub fn lead_payload(lead: &Lead) -> Value {
    json!({
        "data": {
            "nome": lead.name,
            "email": lead.email,
            "telefone": lead.phone,
            "mensagem": lead.message,
            "imovel": lead.interest,
            "origem": lead.origin,
            "status": lead.status,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LeadOrigin, LeadStatus};

    const MEDIA: &str = "http://localhost:1337";

    #[test]
    fn test_flat_record() {
        let body = json!({
            "data": [{
                "id": 12,
                "titulo": "Casa no Centro",
                "descricao": "Ampla",
                "cidade": "São Paulo",
                "endereco": "Rua A, 1",
                "tipo": "casa",
                "preco": 100000,
                "area": "50",
                "quartos": 3,
                "banheiros": 2,
                "createdAt": "2024-01-01T10:00:00.000Z",
                "cliente": { "id": 1 },
                "imagens": [{ "url": "/uploads/a.jpg" }, { "url": "https://cdn.test/b.jpg" }]
            }]
        });

        let props = properties_from_response(&body, MEDIA);
        assert_eq!(props.len(), 1);
        let p = &props[0];
        assert_eq!(p.id, "12");
        assert_eq!(p.property_type, Some(PropertyType::House));
        assert_eq!(p.price, Some(100_000.0));
        assert_eq!(p.area, Some(50.0));
        assert_eq!(p.bedrooms, Some(3));
        assert_eq!(p.tenant_id.as_deref(), Some("1"));
        assert_eq!(
            p.images,
            vec![
                "http://localhost:1337/uploads/a.jpg".to_string(),
                "https://cdn.test/b.jpg".to_string()
            ]
        );
        assert!(p.active);
    }

    #[test]
    fn test_wrapped_record_with_nested_images() {
        let body = json!({
            "data": [{
                "id": 3,
                "attributes": {
                    "titulo": "Apto",
                    "tipo": "apartamento",
                    "preco": -5,
                    "ativo": false,
                    "createdAt": "2024-06-01",
                    "cliente": { "data": null },
                    "imagens": { "data": [{ "attributes": { "url": "/uploads/c.png" } }] }
                }
            }]
        });

        let props = properties_from_response(&body, MEDIA);
        let p = &props[0];
        assert_eq!(p.title, "Apto");
        assert_eq!(p.price, None);
        assert_eq!(p.tenant_id, None);
        assert!(!p.active);
        assert_eq!(p.images, vec!["http://localhost:1337/uploads/c.png".to_string()]);
        assert_eq!(p.created_at, parse_timestamp("2024-06-01T00:00:00Z"));
    }

    #[test]
    fn test_records_without_id_are_skipped() {
        let body = json!({ "data": [{ "titulo": "orphan" }, { "id": "x" }] });
        let props = properties_from_response(&body, MEDIA);
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].id, "x");
    }

    #[test]
    fn test_tenant_defaults() {
        let body = json!({
            "data": [
                { "id": 1, "nome": "Imobiliária Demo", "email_contato": "a@b.com", "plano": "PREMIUM" },
                { "id": 2 }
            ]
        });
        let tenants = tenants_from_response(&body);
        assert_eq!(tenants.len(), 2);
        assert_eq!(tenants[0].plan, TenantPlan::Premium);
        assert_eq!(tenants[0].contact_email.as_deref(), Some("a@b.com"));
        assert_eq!(tenants[1].name, "Tenant 2");
        assert_eq!(tenants[1].theme, ThemeConfig::default());
    }

    #[test]
    fn test_lead_payload_uses_cms_names() {
        let lead = Lead {
            name: "Ana".into(),
            email: "ana@x.com".into(),
            phone: "+595 981 123 456".into(),
            message: "Tenho interesse".into(),
            interest: Some("12".into()),
            origin: LeadOrigin::Site,
            status: LeadStatus::Novo,
        };
        let payload = lead_payload(&lead);
        assert_eq!(payload["data"]["nome"], "Ana");
        assert_eq!(payload["data"]["origem"], "site");
        assert_eq!(payload["data"]["status"], "novo");
        assert_eq!(payload["data"]["imovel"], "12");
    }
}
