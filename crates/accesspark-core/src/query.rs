// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row filters and their encoding as remote query strings.
//!
//! Queries are encoded the way the remote REST layer expects them:
//! `select=<columns>`, `<column>=eq.<value>`, `order=<column>.<dir>`, `limit=<n>`.

use std::fmt::Write;

use url::form_urlencoded::byte_serialize;

use crate::error::AccessParkError;

/// Sort direction for an ordered select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// An equality predicate `column = value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

/// Ordering clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

/// A table query: projected columns, equality filters, ordering and limit.
///
/// An empty filter list means every row the caller is authorized to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    columns: String,
    filters: Vec<Filter>,
    order: Option<Order>,
    limit: Option<usize>,
}

impl Default for Query {
    fn default() -> Self {
        Self::select("*")
    }
}

impl Query {
    /// Starts a query projecting the given columns.
    pub fn select(columns: impl Into<String>) -> Self {
        Self {
            columns: columns.into(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Adds an equality filter.
    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn columns(&self) -> &str {
        &self.columns
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn order(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Fails when a mutation would apply to the whole table.
    pub fn require_filter(&self, operation: &'static str) -> Result<(), AccessParkError> {
        if self.filters.is_empty() {
            Err(AccessParkError::MissingFilter { operation })
        } else {
            Ok(())
        }
    }

    /// Encodes only the filters, as used by update and delete.
    pub fn filter_string(&self) -> String {
        let mut out = String::new();
        for filter in &self.filters {
            push_pair(&mut out, &filter.column, &format!("eq.{}", filter.value));
        }
        out
    }

    /// Encodes the full select query.
    pub fn to_query_string(&self) -> String {
        let mut out = String::new();
        push_pair(&mut out, "select", &self.columns);
        for filter in &self.filters {
            push_pair(&mut out, &filter.column, &format!("eq.{}", filter.value));
        }
        if let Some(order) = &self.order {
            push_pair(
                &mut out,
                "order",
                &format!("{}.{}", order.column, order.direction.as_str()),
            );
        }
        if let Some(limit) = self.limit {
            push_pair(&mut out, "limit", &limit.to_string());
        }
        out
    }
}

fn push_pair(out: &mut String, key: &str, value: &str) {
    if !out.is_empty() {
        out.push('&');
    }
    let _ = write!(
        out,
        "{}={}",
        byte_serialize(key.as_bytes()).collect::<String>(),
        byte_serialize(value.as_bytes()).collect::<String>()
    );
}
