//! Expense report export
//!
//! Serializes a filtered expense listing as CSV. The filter semantics are
//! exactly the search filter's; only the output shape differs.

use serde::Serialize;

use crate::db::{Database, ExpenseFilter};
use crate::error::Result;
use crate::models::Expense;

/// One CSV row of the expense report
#[derive(Debug, Clone, Serialize)]
struct ExpenseRow<'a> {
    date: String,
    description: &'a str,
    category: &'a str,
    amount: String,
    note: &'a str,
}

impl<'a> From<&'a Expense> for ExpenseRow<'a> {
    fn from(e: &'a Expense) -> Self {
        Self {
            date: e.expense_date.to_string(),
            description: &e.description,
            category: &e.category_name,
            amount: e.amount.to_string(),
            note: e.note.as_deref().unwrap_or(""),
        }
    }
}

impl Database {
    /// Render an owner's filtered expenses as CSV
    ///
    /// The report is not paged: it walks the full filtered set in pages of
    /// `batch` rows so a large export does not need one giant query result.
    pub fn export_expenses_csv(&self, owner_id: i64, filter: ExpenseFilter<'_>) -> Result<String> {
        const BATCH: i64 = 500;

        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut page = 0;
        loop {
            // ExpenseFilter is Copy, so each page re-issues the same query
            let result = self.search_expenses(owner_id, filter, page, BATCH)?;
            for expense in &result.items {
                writer.serialize(ExpenseRow::from(expense))?;
            }
            if (page + 1) * BATCH >= result.total {
                break;
            }
            page += 1;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| crate::error::Error::InvalidData(format!("CSV flush failed: {}", e)))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
