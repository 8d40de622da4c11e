//! Sort resolution for the listing query.
//!
//! Sortable columns form a closed enum, so the column name that ends up in
//! the SQL text always comes from this module and never from user input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Columns a listing can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Id,
    CreatedAt,
    Duration,
    Title,
    Views,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::Id,
        SortField::CreatedAt,
        SortField::Duration,
        SortField::Title,
        SortField::Views,
    ];

    /// Column name in the `videos` table, which is also the public query value.
    pub fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::CreatedAt => "created_at",
            Self::Duration => "duration",
            Self::Title => "title",
            Self::Views => "views",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.column() == value)
            .ok_or_else(|| {
                format!("sort must be one of id, created_at, duration, title, views (got {value:?})")
            })
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("order must be one of asc, desc (got {other:?})")),
        }
    }
}

/// Single-field ordering handed to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl SortSpec {
    /// Falls back to `id asc` for whatever part of the request is missing.
    pub fn resolve(field: Option<SortField>, order: Option<SortOrder>) -> Self {
        Self {
            field: field.unwrap_or_default(),
            order: order.unwrap_or_default(),
        }
    }

    /// Renders the ORDER BY body. Equal keys are always broken by `id ASC` so
    /// repeated calls return ties in the same order.
    pub fn order_by_sql(&self) -> String {
        match self.field {
            SortField::Id => format!("id {}", self.order.keyword()),
            field => format!("{} {}, id ASC", field.column(), self.order.keyword()),
        }
    }

    /// Renders the condition selecting rows that come strictly after an
    /// anchor in this ordering. The anchor is exposed as `anchor.sort_key`
    /// and `anchor.anchor_id`; the comparison mirrors `order_by_sql` so it
    /// can seek through the column indexes.
    pub fn after_anchor_sql(&self) -> String {
        let cmp = match self.order {
            SortOrder::Asc => ">",
            SortOrder::Desc => "<",
        };
        match self.field {
            SortField::Id => format!("id {cmp} anchor.anchor_id"),
            field => {
                let column = field.column();
                format!(
                    "({column} {cmp} anchor.sort_key OR ({column} = anchor.sort_key AND id > anchor.anchor_id))"
                )
            }
        }
    }
}
