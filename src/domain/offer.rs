//! Job offers published by employers

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    pub location: String,
    /// Monthly salary in FCFA
    #[serde(default)]
    pub salary: Option<u64>,
    #[serde(default)]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Offer {
    pub fn salary_display(&self) -> String {
        self.salary
            .map(format_fcfa)
            .unwrap_or_else(|| "à négocier".to_string())
    }
}

/// Payload for `POST /offers`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOffer {
    pub title: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OfferError {
    #[error("title is required")]
    MissingTitle,
    #[error("location is required")]
    MissingLocation,
    #[error("salary must be a positive amount in FCFA, got `{0}`")]
    InvalidSalary(String),
}

impl NewOffer {
    /// Build an offer from raw form fields, trimming and validating them
    pub fn from_fields(
        title: &str,
        location: &str,
        salary: &str,
        contract_type: &str,
        description: &str,
    ) -> Result<Self, OfferError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(OfferError::MissingTitle);
        }
        let location = location.trim();
        if location.is_empty() {
            return Err(OfferError::MissingLocation);
        }
        let salary = parse_salary(salary)?;

        Ok(Self {
            title: title.to_string(),
            location: location.to_string(),
            salary,
            contract_type: non_empty(contract_type),
            description: non_empty(description),
        })
    }
}

fn parse_salary(raw: &str) -> Result<Option<u64>, OfferError> {
    let cleaned: String = raw
        .trim()
        .trim_end_matches("FCFA")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.' && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    match cleaned.parse::<u64>() {
        Ok(0) | Err(_) => Err(OfferError::InvalidSalary(raw.trim().to_string())),
        Ok(value) => Ok(Some(value)),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// "150 000 FCFA"
pub fn format_fcfa(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 5);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out.push_str(" FCFA");
    out
}
