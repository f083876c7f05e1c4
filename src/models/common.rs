use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TravelAgentError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
    Partial,
    Pending,
}

/// Envelope shared by every non-search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseResponse {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl BaseResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: Some(message.into()),
            timestamp: Utc::now(),
            request_id: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: Some(message.into()),
            timestamp: Utc::now(),
            request_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(
        message: impl Into<String>,
        error_code: impl Into<String>,
        error_details: Option<serde_json::Value>,
    ) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            timestamp: Utc::now(),
            request_id: None,
            error_code: error_code.into(),
            error_details,
        }
    }
}

/// One entry of a 422 body's `validation_errors` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Strict `YYYY-MM-DD` parsing used by both search domains. Padding, signs
/// and short fields are rejected.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let well_formed = value.len() == 10
        && value.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Checks a comma separated list of two character airline codes and
/// returns it normalized to upper case.
pub fn validate_airline_codes(codes: &str) -> Result<String> {
    let mut normalized = Vec::new();
    for code in codes.split(',') {
        let code = code.trim();
        if code.chars().count() != 2 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TravelAgentError::validation(format!(
                "Invalid airline code: {code}"
            )));
        }
        normalized.push(code.to_ascii_uppercase());
    }
    Ok(normalized.join(","))
}
