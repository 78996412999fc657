use serde::{Deserialize, Serialize};

/// Channel a lead arrived through
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeadOrigin {
    #[default]
    Site,
    Whatsapp,
    Telefone,
    Email,
    Indicacao,
}

/// CRM pipeline stage of a lead
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    Novo,
    Contato,
    Qualificado,
    Visita,
    Proposta,
    Convertido,
    Perdido,
}

/// Contact-form submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lead {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    /// Id of the property the contact asked about, if any
    pub interest: Option<String>,
    pub origin: LeadOrigin,
    pub status: LeadStatus,
}
