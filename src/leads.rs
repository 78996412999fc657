//! Contact-form lead capture.

use crate::api::{ApiError, CatalogApi};
use crate::models::{Lead, LeadOrigin, LeadStatus, Property};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LeadField {
    Name,
    Email,
    Phone,
    Message,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LeadError {
    #[error("invalid lead: {0:?}")]
    Invalid(BTreeMap<LeadField, String>),

    #[error(transparent)]
    Api(#[from] ApiError),
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+?[\d\-()]{8,}$").expect("valid phone regex"))
}

/// Message prefilled into the form
pub fn default_message(property: Option<&Property>) -> String {
    match property {
        Some(p) => format!("Tenho interesse no imóvel: {}", p.title),
        None => "Gostaria de mais informações sobre os imóveis disponíveis.".to_string(),
    }
}

/// Fresh lead from the site form, optionally about one listing
pub fn new_lead(property: Option<&Property>) -> Lead {
    Lead {
        name: String::new(),
        email: String::new(),
        phone: String::new(),
        message: default_message(property),
        interest: property.map(|p| p.id.clone()),
        origin: LeadOrigin::Site,
        status: LeadStatus::Novo,
    }
}

/// Field problems, keyed by field. Empty means the lead can be sent.
pub fn validate(lead: &Lead) -> BTreeMap<LeadField, String> {
    let mut errors = BTreeMap::new();

    let name = lead.name.trim();
    if name.is_empty() {
        errors.insert(LeadField::Name, "Name is required".to_string());
    } else if name.chars().count() < 2 {
        errors.insert(LeadField::Name, "Name must have at least 2 characters".to_string());
    }

    let email = lead.email.trim();
    if email.is_empty() {
        errors.insert(LeadField::Email, "Email is required".to_string());
    } else if !email_pattern().is_match(email) {
        errors.insert(LeadField::Email, "Invalid email".to_string());
    }

    let phone: String = lead.phone.chars().filter(|c| !c.is_whitespace()).collect();
    if phone.is_empty() {
        errors.insert(LeadField::Phone, "Phone is required".to_string());
    } else if !phone_pattern().is_match(&phone) {
        errors.insert(LeadField::Phone, "Invalid phone".to_string());
    }

    let message = lead.message.trim();
    if message.is_empty() {
        errors.insert(LeadField::Message, "Message is required".to_string());
    } else if message.chars().count() < 10 {
        errors.insert(LeadField::Message, "Message must have at least 10 characters".to_string());
    }

    errors
}

/// Normalize phone input as typed. Paraguayan numbers get the
/// `+595 XXX XXX XXX` layout; anything unrecognized is returned unchanged.
pub fn format_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if let Some(rest) = digits.strip_prefix("595") {
        if rest.len() >= 9 {
            return format!("+595 {} {} {}", &rest[0..3], &rest[3..6], &rest[6..9]);
        }
    } else if let Some(rest) = digits.strip_prefix('0') {
        if rest.len() >= 9 {
            return format!("+595 {} {} {}", &rest[0..3], &rest[3..6], &rest[6..9]);
        }
    }

    if digits.len() == 9 {
        return format!("{} {} {}", &digits[0..3], &digits[3..6], &digits[6..9]);
    }
    raw.to_string()
}

/// Validate and send a lead
pub async fn submit_lead(api: &dyn CatalogApi, lead: &Lead) -> Result<(), LeadError> {
    let errors = validate(lead);
    if !errors.is_empty() {
        warn!("Lead rejected with {} invalid fields", errors.len());
        return Err(LeadError::Invalid(errors));
    }
    api.create_lead(lead).await?;
    info!(
        "Lead sent (interest: {})",
        lead.interest.as_deref().unwrap_or("catalog")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::{InMemoryCatalog, Operation};

    fn valid_lead() -> Lead {
        let mut lead = new_lead(None);
        lead.name = "Ana Souza".to_string();
        lead.email = "ana@example.com".to_string();
        lead.phone = "+595 981 123 456".to_string();
        lead
    }

    #[test]
    fn test_default_message_names_property() {
        let mut property = Property::new("42");
        property.title = "Casa com piscina".to_string();
        let lead = new_lead(Some(&property));
        assert_eq!(lead.message, "Tenho interesse no imóvel: Casa com piscina");
        assert_eq!(lead.interest.as_deref(), Some("42"));
        assert_eq!(lead.status, LeadStatus::Novo);
    }

    #[test]
    fn test_validation() {
        assert!(validate(&valid_lead()).is_empty());

        let mut lead = valid_lead();
        lead.name = " A ".to_string();
        lead.email = "ana@example".to_string();
        lead.phone = "12 34".to_string();
        lead.message = "oi".to_string();
        let errors = validate(&lead);
        assert_eq!(
            errors.keys().copied().collect::<Vec<_>>(),
            vec![LeadField::Name, LeadField::Email, LeadField::Phone, LeadField::Message]
        );
    }

    #[test]
    fn test_phone_formatting() {
        assert_eq!(format_phone("595981123456"), "+595 981 123 456");
        assert_eq!(format_phone("0981-123-456"), "+595 981 123 456");
        assert_eq!(format_phone("981123456"), "981 123 456");
        assert_eq!(format_phone("+55 11 99999-9999"), "+55 11 99999-9999");
    }

    #[tokio::test]
    async fn test_submit() {
        let catalog = InMemoryCatalog::demo();

        let mut bad = valid_lead();
        bad.email.clear();
        assert!(matches!(submit_lead(&catalog, &bad).await, Err(LeadError::Invalid(_))));
        assert!(catalog.submitted_leads().is_empty());

        submit_lead(&catalog, &valid_lead()).await.unwrap();
        assert_eq!(catalog.submitted_leads().len(), 1);

        catalog.fail(Operation::CreateLead, ApiError::Server(503));
        assert_eq!(
            submit_lead(&catalog, &valid_lead()).await,
            Err(LeadError::Api(ApiError::Server(503)))
        );
    }
}
