//! Expense operations
//!
//! Every function takes the owner id explicitly. A lookup that lands on
//! another owner's row reports NotFound, never a distinct "forbidden",
//! so the existence of other users' data is not observable.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use rust_decimal::Decimal;
use tracing::info;

use super::expense_filter::ExpenseFilter;
use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{DailySpending, Expense, ExpenseUpdate, NewExpense, Page};
use crate::money;

/// One row of the per-category grouping for a period
#[derive(Debug, Clone)]
pub struct CategoryTotal {
    pub name: String,
    pub color: Option<String>,
    pub total: Decimal,
    pub count: i64,
}

const EXPENSE_COLUMNS: &str = "e.id, e.description, e.amount_cents, e.category_id, \
     c.name, c.color, e.user_id, e.expense_date, e.note, e.created_at, e.updated_at";

impl Database {
    /// List an owner's expenses, paged, default sort (date descending)
    pub fn list_expenses(&self, owner_id: i64, page: i64, page_size: i64) -> Result<Page<Expense>> {
        self.search_expenses(owner_id, ExpenseFilter::new(), page, page_size)
    }

    /// List an owner's expenses in one category, paged
    ///
    /// Fails with NotFound when the category id does not resolve.
    pub fn list_expenses_by_category(
        &self,
        owner_id: i64,
        category_id: i64,
        page: i64,
        page_size: i64,
    ) -> Result<Page<Expense>> {
        if !self.category_exists(category_id)? {
            return Err(Error::NotFound(format!(
                "Category {} not found",
                category_id
            )));
        }
        let filter = ExpenseFilter::new().category_id(Some(category_id));
        self.search_expenses(owner_id, filter, page, page_size)
    }

    /// List an owner's expenses in an inclusive date range, paged
    pub fn list_expenses_by_period(
        &self,
        owner_id: i64,
        from: NaiveDate,
        to: NaiveDate,
        page: i64,
        page_size: i64,
    ) -> Result<Page<Expense>> {
        let filter = ExpenseFilter::new().date_from(Some(from)).date_to(Some(to));
        self.search_expenses(owner_id, filter, page, page_size)
    }

    /// Filtered, sorted, paged search over an owner's expenses
    ///
    /// The filter contributes every optional condition; owner scoping and
    /// pagination are added here. Also runs the COUNT twin of the query so
    /// the page carries the total row count.
    pub fn search_expenses(
        &self,
        owner_id: i64,
        filter: ExpenseFilter<'_>,
        page: i64,
        page_size: i64,
    ) -> Result<Page<Expense>> {
        let conn = self.conn()?;
        let built = filter.build(owner_id);

        let total: i64 = {
            let refs = built.params_refs();
            conn.query_row(&built.build_count_query(), refs.as_slice(), |row| {
                row.get(0)
            })?
        };

        let sql = format!(
            "SELECT {} FROM expenses e JOIN categories c ON e.category_id = c.id {} {} LIMIT ? OFFSET ?",
            EXPENSE_COLUMNS, built.where_clause, built.order_clause
        );

        let mut params = built.into_params();
        params.push(Box::new(page_size));
        // Saturate the offset; a page index past the data is an empty page
        params.push(Box::new(page.saturating_mul(page_size)));
        let refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(refs.as_slice(), Self::map_expense)?;
        let items = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Page {
            items,
            total,
            page,
            page_size,
        })
    }

    /// Fetch one expense by id, owner-scoped
    pub fn get_expense(&self, owner_id: i64, id: i64) -> Result<Expense> {
        let conn = self.conn()?;
        let expense = conn
            .query_row(
                &format!(
                    "SELECT {} FROM expenses e JOIN categories c ON e.category_id = c.id WHERE e.id = ?",
                    EXPENSE_COLUMNS
                ),
                params![id],
                Self::map_expense,
            )
            .optional()?;

        // An expense that exists but belongs to someone else is reported
        // exactly like one that does not exist.
        match expense {
            Some(e) if e.user_id == owner_id => Ok(e),
            _ => Err(Error::NotFound(format!("Expense {} not found", id))),
        }
    }

    /// Create an expense for the owner
    ///
    /// The category id must resolve; the owner comes from the caller's
    /// session, never from the payload. Nothing is persisted on failure.
    pub fn create_expense(&self, owner_id: i64, new: &NewExpense) -> Result<Expense> {
        if !self.category_exists(new.category_id)? {
            return Err(Error::NotFound(format!(
                "Category {} not found",
                new.category_id
            )));
        }

        let cents = money::try_to_cents(new.amount)
            .ok_or_else(|| Error::InvalidData(format!("Amount out of range: {}", new.amount)))?;
        let date = new.expense_date.unwrap_or_else(|| chrono::Utc::now().date_naive());

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO expenses (description, amount_cents, category_id, user_id, expense_date, note) \
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                new.description,
                cents,
                new.category_id,
                owner_id,
                date.to_string(),
                new.note,
            ],
        )?;
        let id = conn.last_insert_rowid();
        info!(expense_id = id, user_id = owner_id, "Expense created");

        self.get_expense(owner_id, id)
    }

    /// Partially update an owner's expense
    ///
    /// Only supplied fields overwrite the stored row; id, owner and
    /// created_at are untouched and updated_at is refreshed. An empty
    /// patch writes nothing and returns the row as-is.
    pub fn update_expense(&self, owner_id: i64, id: i64, patch: &ExpenseUpdate) -> Result<Expense> {
        let existing = self.get_expense(owner_id, id)?;

        if patch.is_empty() {
            return Ok(existing);
        }

        if let Some(cid) = patch.category_id {
            if !self.category_exists(cid)? {
                return Err(Error::NotFound(format!("Category {} not found", cid)));
            }
        }

        let description = patch.description.as_deref().unwrap_or(&existing.description);
        let amount = patch.amount.unwrap_or(existing.amount);
        let cents = money::try_to_cents(amount)
            .ok_or_else(|| Error::InvalidData(format!("Amount out of range: {}", amount)))?;
        let category_id = patch.category_id.unwrap_or(existing.category_id);
        let date = patch.expense_date.unwrap_or(existing.expense_date);
        let note = patch.note.as_deref().or(existing.note.as_deref());

        let conn = self.conn()?;
        conn.execute(
            "UPDATE expenses SET description = ?, amount_cents = ?, category_id = ?, \
             expense_date = ?, note = ?, updated_at = CURRENT_TIMESTAMP \
             WHERE id = ? AND user_id = ?",
            params![
                description,
                cents,
                category_id,
                date.to_string(),
                note,
                id,
                owner_id,
            ],
        )?;
        info!(expense_id = id, user_id = owner_id, "Expense updated");

        self.get_expense(owner_id, id)
    }

    /// Delete an owner's expense. Just the row; nothing cascades.
    pub fn delete_expense(&self, owner_id: i64, id: i64) -> Result<()> {
        // Owner check with the same NotFound masking as reads
        let _ = self.get_expense(owner_id, id)?;

        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM expenses WHERE id = ? AND user_id = ?",
            params![id, owner_id],
        )?;
        info!(expense_id = id, user_id = owner_id, "Expense deleted");

        Ok(())
    }

    /// Sum of an owner's expenses in an inclusive date range
    ///
    /// Zero when nothing matches; callers never see an absent total.
    pub fn sum_for_period(&self, owner_id: i64, from: NaiveDate, to: NaiveDate) -> Result<Decimal> {
        let conn = self.conn()?;
        let cents: i64 = conn.query_row(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM expenses \
             WHERE user_id = ? AND expense_date BETWEEN ? AND ?",
            params![owner_id, from.to_string(), to.to_string()],
            |row| row.get(0),
        )?;
        Ok(money::from_cents(cents))
    }

    /// Count of an owner's expenses in an inclusive date range
    pub fn count_for_period(&self, owner_id: i64, from: NaiveDate, to: NaiveDate) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM expenses \
             WHERE user_id = ? AND expense_date BETWEEN ? AND ?",
            params![owner_id, from.to_string(), to.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Largest expenses in a period, amount descending (id tie-break)
    pub fn top_expenses(
        &self,
        owner_id: i64,
        from: NaiveDate,
        to: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM expenses e JOIN categories c ON e.category_id = c.id \
             WHERE e.user_id = ? AND e.expense_date BETWEEN ? AND ? \
             ORDER BY e.amount_cents DESC, e.id DESC LIMIT ?",
            EXPENSE_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![owner_id, from.to_string(), to.to_string(), limit],
            Self::map_expense,
        )?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Per-category totals for a period, summed amount descending
    pub fn spending_by_category(
        &self,
        owner_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CategoryTotal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT c.name, c.color, SUM(e.amount_cents) AS total, COUNT(*) \
             FROM expenses e JOIN categories c ON e.category_id = c.id \
             WHERE e.user_id = ? AND e.expense_date BETWEEN ? AND ? \
             GROUP BY c.id, c.name, c.color \
             ORDER BY total DESC",
        )?;
        let rows = stmt.query_map(
            params![owner_id, from.to_string(), to.to_string()],
            |row| {
                Ok(CategoryTotal {
                    name: row.get(0)?,
                    color: row.get(1)?,
                    total: money::from_cents(row.get::<_, i64>(2)?),
                    count: row.get(3)?,
                })
            },
        )?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Per-day totals for a period, date ascending
    ///
    /// Sparse: days without expenses do not appear.
    pub fn spending_by_day(
        &self,
        owner_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailySpending>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT e.expense_date, SUM(e.amount_cents) \
             FROM expenses e \
             WHERE e.user_id = ? AND e.expense_date BETWEEN ? AND ? \
             GROUP BY e.expense_date \
             ORDER BY e.expense_date",
        )?;
        let rows = stmt.query_map(
            params![owner_id, from.to_string(), to.to_string()],
            |row| {
                let date_str: String = row.get(0)?;
                let cents: i64 = row.get(1)?;
                Ok((date_str, cents))
            },
        )?;

        let mut days = Vec::new();
        for row in rows {
            let (date_str, cents) = row?;
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                Error::InvalidData(format!("Bad expense_date in database: {}", e))
            })?;
            days.push(DailySpending {
                date,
                total: money::from_cents(cents),
            });
        }
        Ok(days)
    }

    fn map_expense(row: &rusqlite::Row<'_>) -> rusqlite::Result<Expense> {
        let date_str: String = row.get(7)?;
        let expense_date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                7,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;
        Ok(Expense {
            id: row.get(0)?,
            description: row.get(1)?,
            amount: money::from_cents(row.get::<_, i64>(2)?),
            category_id: row.get(3)?,
            category_name: row.get(4)?,
            category_color: row.get(5)?,
            user_id: row.get(6)?,
            expense_date,
            note: row.get(8)?,
            created_at: parse_datetime(&row.get::<_, String>(9)?),
            updated_at: parse_datetime(&row.get::<_, String>(10)?),
        })
    }
}
