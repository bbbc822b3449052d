//! Expense filter builder for constructing dynamic SQL queries
//!
//! This module provides a builder pattern for constructing WHERE clauses
//! and related SQL components for expense queries.
//!
//! Every built filter carries the owner-equality condition; the optional
//! fields each contribute one ANDed condition when set and nothing when
//! absent. The builder is a pure transformation and holds no connection,
//! so one value can be built per request with no shared state.

use chrono::NaiveDate;

use crate::models::{SortField, SortOrder};

/// Builder for constructing expense query filters
///
/// This avoids duplicating the query building logic between the filtered
/// search, its COUNT twin, and the CSV report export.
///
/// The lifetime `'query` represents how long the borrowed description
/// substring must remain valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpenseFilter<'query> {
    pub description: Option<&'query str>,
    pub category_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Inclusive lower bound, in cents
    pub amount_min_cents: Option<i64>,
    /// Inclusive upper bound, in cents
    pub amount_max_cents: Option<i64>,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
}

/// Result of building a filter - contains SQL components and parameters
pub struct FilterResult {
    /// WHERE clause including the "WHERE" keyword; never empty because
    /// the owner condition is always present
    pub where_clause: String,
    /// ORDER BY clause including the "ORDER BY" keyword
    pub order_clause: String,
    /// Parameters for the query (boxed for rusqlite compatibility)
    pub params: Vec<Box<dyn rusqlite::ToSql>>,
}

impl<'query> ExpenseFilter<'query> {
    /// Create a new filter builder with no constraints beyond the owner
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the case-insensitive description substring match
    pub fn description(mut self, text: Option<&'query str>) -> Self {
        self.description = text;
        self
    }

    /// Set the category equality filter
    pub fn category_id(mut self, id: Option<i64>) -> Self {
        self.category_id = id;
        self
    }

    /// Set the inclusive start of the date range
    pub fn date_from(mut self, date: Option<NaiveDate>) -> Self {
        self.date_from = date;
        self
    }

    /// Set the inclusive end of the date range
    pub fn date_to(mut self, date: Option<NaiveDate>) -> Self {
        self.date_to = date;
        self
    }

    /// Set the inclusive minimum amount, in cents
    pub fn amount_min_cents(mut self, cents: Option<i64>) -> Self {
        self.amount_min_cents = cents;
        self
    }

    /// Set the inclusive maximum amount, in cents
    pub fn amount_max_cents(mut self, cents: Option<i64>) -> Self {
        self.amount_max_cents = cents;
        self
    }

    /// Set the sort field (defaults to expense date)
    pub fn sort_field(mut self, field: SortField) -> Self {
        self.sort_field = field;
        self
    }

    /// Set the sort direction (defaults to descending)
    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    /// Build the filter components for the given owner
    ///
    /// The owner condition is not optional: every expense query is scoped
    /// to the authenticated user. A min > max range is passed through
    /// as-is and simply matches nothing.
    pub fn build(self, owner_id: i64) -> FilterResult {
        let mut conditions = vec!["e.user_id = ?".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(owner_id)];

        if let Some(text) = self.description {
            if !text.trim().is_empty() {
                conditions.push("e.description LIKE ? COLLATE NOCASE".to_string());
                params.push(Box::new(format!("%{}%", text.trim())));
            }
        }

        if let Some(cid) = self.category_id {
            conditions.push("e.category_id = ?".to_string());
            params.push(Box::new(cid));
        }

        if let Some(from) = self.date_from {
            conditions.push("e.expense_date >= ?".to_string());
            params.push(Box::new(from.to_string()));
        }

        if let Some(to) = self.date_to {
            conditions.push("e.expense_date <= ?".to_string());
            params.push(Box::new(to.to_string()));
        }

        if let Some(min) = self.amount_min_cents {
            conditions.push("e.amount_cents >= ?".to_string());
            params.push(Box::new(min));
        }

        if let Some(max) = self.amount_max_cents {
            conditions.push("e.amount_cents <= ?".to_string());
            params.push(Box::new(max));
        }

        let where_clause = format!("WHERE {}", conditions.join(" AND "));

        // Stable tie-break on id so pagination never shuffles equal rows
        let order_clause = format!(
            "ORDER BY {} {}, e.id DESC",
            self.sort_field.column(),
            self.sort_order.as_sql()
        );

        FilterResult {
            where_clause,
            order_clause,
            params,
        }
    }
}

impl FilterResult {
    /// Build a COUNT query over the same predicate
    pub fn build_count_query(&self) -> String {
        format!("SELECT COUNT(*) FROM expenses e {}", self.where_clause)
    }

    /// Get parameter references for query execution
    pub fn params_refs(&self) -> Vec<&dyn rusqlite::ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }

    /// Take ownership of the parameter vector to append pagination params
    pub fn into_params(self) -> Vec<Box<dyn rusqlite::ToSql>> {
        self.params
    }
}
