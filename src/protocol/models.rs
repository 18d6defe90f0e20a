//! License records and the request/response bodies that carry them.

use crate::LicenseGateError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored domain-bound license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseRecord {
    /// Store-assigned identifier, never reused.
    pub id: u64,

    /// Exact hostname or `*.base` wildcard pattern.
    pub domain: String,

    /// Shared secret presented together with the domain.
    pub token: String,

    /// `true` when the license may be used for verification.
    pub status: bool,

    /// Set once when the record is created.
    pub created_at: DateTime<Utc>,

    /// Refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
}

impl LicenseRecord {
    /// Whether this record takes part in verification.
    pub fn is_active(&self) -> bool {
        self.status
    }

    /// Apply a partial update. `id` and `created_at` are never touched.
    pub fn apply(&mut self, update: UpdateLicense, now: DateTime<Utc>) {
        if let Some(domain) = update.domain {
            self.domain = domain;
        }
        if let Some(token) = update.token {
            self.token = token;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.updated_at = now;
    }
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLicense {
    /// Domain pattern.
    pub domain: String,

    /// License token.
    pub token: String,

    /// Defaults to active when omitted.
    #[serde(default)]
    pub status: Option<bool>,
}

impl CreateLicense {
    /// Active license for `domain` with `token`.
    pub fn new(domain: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            token: token.into(),
            status: None,
        }
    }

    /// Set an explicit status.
    pub fn with_status(mut self, status: bool) -> Self {
        self.status = Some(status);
        self
    }

    /// Reject empty `domain` or `token`.
    pub fn validate(&self) -> Result<(), LicenseGateError> {
        require_non_empty("domain", &self.domain)?;
        require_non_empty("token", &self.token)
    }
}

/// Body of an update request. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateLicense {
    /// New domain pattern.
    #[serde(default)]
    pub domain: Option<String>,

    /// New token.
    #[serde(default)]
    pub token: Option<String>,

    /// New status.
    #[serde(default)]
    pub status: Option<bool>,
}

impl UpdateLicense {
    /// Present `domain`/`token` values must be non-empty.
    pub fn validate(&self) -> Result<(), LicenseGateError> {
        if let Some(domain) = &self.domain {
            require_non_empty("domain", domain)?;
        }
        if let Some(token) = &self.token {
            require_non_empty("token", token)?;
        }
        Ok(())
    }
}

/// Body of a verification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// Hostname of the page asking for access.
    pub domain: String,

    /// Token embedded in the loader.
    pub token: String,
}

impl VerifyRequest {
    /// Reject empty `domain` or `token`.
    pub fn validate(&self) -> Result<(), LicenseGateError> {
        require_non_empty("domain", &self.domain)?;
        require_non_empty("token", &self.token)
    }
}

/// Body of a verification response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// Whether an active license covers the domain with that token.
    pub valid: bool,
}

/// Parse a raw verification response body.
pub fn parse_verify_response(body: &[u8]) -> Result<VerifyResponse, LicenseGateError> {
    serde_json::from_slice(body).map_err(|e| {
        LicenseGateError::ProtocolError(format!("Failed to parse verification response: {}", e))
    })
}

fn require_non_empty(field: &str, value: &str) -> Result<(), LicenseGateError> {
    if value.trim().is_empty() {
        return Err(LicenseGateError::empty_field(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_record() -> LicenseRecord {
        let at = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        LicenseRecord {
            id: 7,
            domain: "*.shop.com".to_string(),
            token: "T1".to_string(),
            status: true,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let json = serde_json::to_value(make_record()).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["domain"], "*.shop.com");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_apply_partial_update() {
        let mut record = make_record();
        let later = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();

        record.apply(
            UpdateLicense {
                token: Some("T2".to_string()),
                ..Default::default()
            },
            later,
        );

        assert_eq!(record.id, 7);
        assert_eq!(record.domain, "*.shop.com");
        assert_eq!(record.token, "T2");
        assert!(record.status);
        assert_eq!(record.created_at.to_rfc3339(), "2025-01-15T12:00:00+00:00");
        assert_eq!(record.updated_at, later);
    }

    #[test]
    fn test_create_status_is_optional() {
        let create: CreateLicense =
            serde_json::from_str(r#"{"domain":"a.com","token":"X"}"#).unwrap();
        assert_eq!(create.status, None);
        assert!(create.validate().is_ok());
    }

    #[test]
    fn test_create_rejects_empty_fields() {
        let result = CreateLicense::new("", "X").validate();
        assert!(matches!(result, Err(LicenseGateError::Validation(msg)) if msg.contains("domain")));

        let result = CreateLicense::new("a.com", "   ").validate();
        assert!(matches!(result, Err(LicenseGateError::Validation(msg)) if msg.contains("token")));
    }

    #[test]
    fn test_update_rejects_present_empty_fields() {
        assert!(UpdateLicense::default().validate().is_ok());

        let update = UpdateLicense {
            domain: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(update.validate(), Err(LicenseGateError::Validation(_))));
    }

    #[test]
    fn test_verify_request_validation() {
        let ok = VerifyRequest {
            domain: "shop.com".to_string(),
            token: "T1".to_string(),
        };
        assert!(ok.validate().is_ok());

        let missing_token = VerifyRequest {
            domain: "shop.com".to_string(),
            token: String::new(),
        };
        assert!(missing_token.validate().is_err());
    }

    #[test]
    fn test_parse_verify_response() {
        assert!(parse_verify_response(br#"{"valid":true}"#).unwrap().valid);
        assert!(!parse_verify_response(br#"{"valid":false}"#).unwrap().valid);
        assert!(matches!(
            parse_verify_response(b"not json"),
            Err(LicenseGateError::ProtocolError(_))
        ));
        assert!(parse_verify_response(b"{}").is_err());
    }
}
