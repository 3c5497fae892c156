//! Pagination envelope and list query parameters.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Default page size when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// List envelope returned by every list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default, alias = "totalCount", alias = "totalItems")]
    pub total: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_previous: bool,
    #[serde(default = "first_page", alias = "pageNumber")]
    pub page: u32,
    #[serde(default, alias = "pageSize")]
    pub size: u32,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    /// Wrap a complete result set as a single page.
    pub fn single(data: Vec<T>) -> Self {
        let total = data.len() as u64;
        let size = data.len() as u32;
        Self {
            data,
            total,
            total_pages: 1,
            has_next: false,
            has_previous: false,
            page: 1,
            size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T: DeserializeOwned> Page<T> {
    /// Decode a list response.
    ///
    /// Most endpoints return the envelope; a few return a bare JSON array,
    /// which is treated as a single complete page.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        match value {
            serde_json::Value::Array(_) => {
                let data: Vec<T> = serde_json::from_value(value)?;
                Ok(Page::single(data))
            }
            serde_json::Value::Null => Ok(Page::single(Vec::new())),
            other => serde_json::from_value(other),
        }
    }
}

/// Pagination and filter parameters for list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageQuery {
    /// 1-based page number
    pub page: u32,
    pub size: u32,
    pub filters: BTreeMap<String, String>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
            filters: BTreeMap::new(),
        }
    }
}

impl PageQuery {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: page.max(1),
            size: size.max(1),
            filters: BTreeMap::new(),
        }
    }

    /// Add a filter parameter (builder style).
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    /// Query pairs sent on the wire.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("pageNumber".to_string(), self.page.to_string()),
            ("pageSize".to_string(), self.size.to_string()),
        ];
        pairs.extend(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        pairs
    }

    /// Stable string form, used as a cache scope.
    pub fn cache_key(&self) -> String {
        self.to_pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}
