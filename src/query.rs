//! Listing query input.
//!
//! [`ListingParams`] is the raw query string as the HTTP layer receives it.
//! [`ListingParams::validate`] turns it into a [`ListingQuery`], which the
//! engine trusts without re-checking.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sort::{SortField, SortOrder, SortSpec};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// Continuation token: the id of the last video on the previous page,
/// rendered as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor(pub i64);

impl Cursor {
    pub fn id(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Cursor {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.parse::<i64>() {
            Ok(id) if id > 0 && value.bytes().all(|byte| byte.is_ascii_digit()) => Ok(Self(id)),
            _ => Err(format!("nextPageToken is not a valid page token: {value:?}")),
        }
    }
}

impl Serialize for Cursor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A validated listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    /// Page size, always within `1..=MAX_LIMIT`.
    pub limit: usize,
    pub search: Option<String>,
    /// Comma separated tag terms, matched with OR semantics.
    pub tags: Option<String>,
    pub sort: SortSpec,
    pub next_page_token: Option<Cursor>,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            search: None,
            tags: None,
            sort: SortSpec::default(),
            next_page_token: None,
        }
    }
}

/// Raw listing parameters, one string per query-string key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingParams {
    pub limit: Option<String>,
    pub search: Option<String>,
    pub tags: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub next_page_token: Option<String>,
}

/// Every problem found while validating a request, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid query: {}", .issues.join("; "))]
pub struct QueryError {
    pub issues: Vec<String>,
}

impl ListingParams {
    pub fn validate(self) -> Result<ListingQuery, QueryError> {
        let mut issues = Vec::new();

        let limit = match self.limit.as_deref() {
            None => DEFAULT_LIMIT,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => limit,
                Ok(_) => {
                    issues.push(format!("limit must be between 1 and {MAX_LIMIT}"));
                    DEFAULT_LIMIT
                }
                Err(_) => {
                    issues.push("limit must be an integer".to_string());
                    DEFAULT_LIMIT
                }
            },
        };

        let field = self
            .sort
            .as_deref()
            .map(SortField::from_str)
            .transpose()
            .unwrap_or_else(|issue| {
                issues.push(issue);
                None
            });
        let order = self
            .order
            .as_deref()
            .map(SortOrder::from_str)
            .transpose()
            .unwrap_or_else(|issue| {
                issues.push(issue);
                None
            });
        let next_page_token = self
            .next_page_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .map(Cursor::from_str)
            .transpose()
            .unwrap_or_else(|issue| {
                issues.push(issue);
                None
            });

        if !issues.is_empty() {
            return Err(QueryError { issues });
        }

        Ok(ListingQuery {
            limit,
            search: self.search,
            tags: self.tags,
            sort: SortSpec::resolve(field, order),
            next_page_token,
        })
    }
}
