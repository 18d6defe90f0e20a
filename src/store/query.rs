//! Filtering, sorting and pagination for license listings.
//!
//! Every filterable and sortable field is an enum variant with its own
//! comparison, so nothing is looked up by name at match time.

use crate::protocol::models::LicenseRecord;
use crate::LicenseGateError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Default page length.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse `asc`/`desc`, case-insensitively.
    pub fn parse(value: &str) -> Result<Self, LicenseGateError> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(LicenseGateError::Validation(format!(
                "sortOrder must be asc or desc, got {}",
                other
            ))),
        }
    }
}

/// Columns a listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    /// Record id.
    #[default]
    Id,
    /// Domain pattern.
    Domain,
    /// Token.
    Token,
    /// Active flag.
    Status,
    /// Creation time.
    CreatedAt,
    /// Last mutation time.
    UpdatedAt,
}

impl SortField {
    /// Parse a field name as sent by the admin UI.
    pub fn parse(name: &str) -> Result<Self, LicenseGateError> {
        match name {
            "id" => Ok(Self::Id),
            "domain" => Ok(Self::Domain),
            "token" => Ok(Self::Token),
            "status" => Ok(Self::Status),
            "createdAt" | "created_at" => Ok(Self::CreatedAt),
            "updatedAt" | "updated_at" => Ok(Self::UpdatedAt),
            other => Err(LicenseGateError::Validation(format!(
                "cannot sort by unknown field {}",
                other
            ))),
        }
    }

    fn compare(self, a: &LicenseRecord, b: &LicenseRecord) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::Domain => a.domain.cmp(&b.domain),
            Self::Token => a.token.cmp(&b.token),
            Self::Status => a.status.cmp(&b.status),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

/// A single listing predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Domain contains the substring.
    DomainContains(String),
    /// Token contains the substring.
    TokenContains(String),
    /// Status equals the flag.
    Status(bool),
}

impl Filter {
    /// Build a filter from one `field -> value` entry.
    ///
    /// Returns `Ok(None)` for empty string values, which mean "no filter".
    pub fn from_entry(field: &str, value: &Value) -> Result<Option<Self>, LicenseGateError> {
        match field {
            "domain" => Ok(text_value(field, value)?.map(Self::DomainContains)),
            "token" => Ok(text_value(field, value)?.map(Self::TokenContains)),
            "status" => Ok(bool_value(value)?.map(Self::Status)),
            other => Err(LicenseGateError::Validation(format!(
                "cannot filter by unknown field {}",
                other
            ))),
        }
    }

    /// Whether a record satisfies this predicate.
    pub fn accepts(&self, record: &LicenseRecord) -> bool {
        match self {
            Self::DomainContains(needle) => record.domain.contains(needle.as_str()),
            Self::TokenContains(needle) => record.token.contains(needle.as_str()),
            Self::Status(status) => record.status == *status,
        }
    }
}

fn text_value(field: &str, value: &Value) -> Result<Option<String>, LicenseGateError> {
    match value {
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Null => Ok(None),
        _ => Err(LicenseGateError::Validation(format!(
            "filter {} must be a string",
            field
        ))),
    }
}

fn bool_value(value: &Value) -> Result<Option<bool>, LicenseGateError> {
    match value {
        Value::Bool(b) => Ok(Some(*b)),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) if s == "true" => Ok(Some(true)),
        Value::String(s) if s == "false" => Ok(Some(false)),
        Value::Null => Ok(None),
        _ => Err(LicenseGateError::Validation(
            "filter status must be true or false".to_string(),
        )),
    }
}

/// Validated listing options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// 1-based page number.
    pub page: u32,
    /// Records per page.
    pub page_size: u32,
    /// Sort column.
    pub sort_by: SortField,
    /// Sort direction.
    pub sort_order: SortOrder,
    /// All filters must accept a record for it to be listed.
    pub filters: Vec<Filter>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: SortField::Id,
            sort_order: SortOrder::Desc,
            filters: Vec::new(),
        }
    }
}

impl ListParams {
    /// Build params from a decoded `filters` object.
    pub fn with_filters(mut self, filters: &Map<String, Value>) -> Result<Self, LicenseGateError> {
        for (field, value) in filters {
            if let Some(filter) = Filter::from_entry(field, value)? {
                self.filters.push(filter);
            }
        }
        Ok(self)
    }

    /// Filter, sort and slice `records` into one page.
    pub fn apply<'a, I>(&self, records: I) -> Page<LicenseRecord>
    where
        I: IntoIterator<Item = &'a LicenseRecord>,
    {
        let mut matched: Vec<&LicenseRecord> = records
            .into_iter()
            .filter(|r| self.filters.iter().all(|f| f.accepts(r)))
            .collect();

        matched.sort_by(|a, b| {
            let ordering = self.sort_by.compare(a, b).then_with(|| a.id.cmp(&b.id));
            match self.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matched.len() as u64;
        let skip = (self.page.saturating_sub(1) as usize).saturating_mul(self.page_size as usize);
        let data = matched
            .into_iter()
            .skip(skip)
            .take(self.page_size as usize)
            .cloned()
            .collect();

        Page {
            data,
            total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Raw listing query as it arrives on the admin endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// 1-based page number.
    pub page: Option<u32>,
    /// Records per page.
    pub page_size: Option<u32>,
    /// Sort column name.
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub sort_order: Option<String>,
    /// JSON-encoded object of field -> string/boolean.
    pub filters: Option<String>,
}

impl ListQuery {
    /// Validate and convert into [`ListParams`], applying defaults.
    pub fn into_params(self) -> Result<ListParams, LicenseGateError> {
        let mut params = ListParams::default();

        if let Some(page) = self.page {
            if page == 0 {
                return Err(LicenseGateError::Validation(
                    "page must be at least 1".to_string(),
                ));
            }
            params.page = page;
        }
        if let Some(page_size) = self.page_size {
            if page_size == 0 {
                return Err(LicenseGateError::Validation(
                    "pageSize must be at least 1".to_string(),
                ));
            }
            params.page_size = page_size;
        }
        if let Some(sort_by) = self.sort_by.as_deref().filter(|s| !s.is_empty()) {
            params.sort_by = SortField::parse(sort_by)?;
        }
        if let Some(sort_order) = self.sort_order.as_deref().filter(|s| !s.is_empty()) {
            params.sort_order = SortOrder::parse(sort_order)?;
        }

        match self.filters.as_deref().map(str::trim) {
            None | Some("") => Ok(params),
            Some(raw) => {
                let decoded: Map<String, Value> = serde_json::from_str(raw).map_err(|e| {
                    LicenseGateError::Validation(format!("filters must be a JSON object: {}", e))
                })?;
                params.with_filters(&decoded)
            }
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Records on this page.
    pub data: Vec<T>,
    /// Number of records matching the filters across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Requested page length.
    pub page_size: u32,
}
