//! Category operations
//!
//! Categories are a shared catalog. Names are unique; deleting a category
//! that still has expenses attached is a conflict.

use rusqlite::{params, OptionalExtension};
use tracing::info;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Category, NewCategory};

impl Database {
    /// List all categories ordered by name
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, color, icon, created_at FROM categories ORDER BY name",
        )?;
        let rows = stmt.query_map([], Self::map_category)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Fetch a category by id, failing with NotFound when absent
    pub fn get_category(&self, id: i64) -> Result<Category> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, description, color, icon, created_at FROM categories WHERE id = ?",
            params![id],
            Self::map_category,
        )
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("Category {} not found", id)))
    }

    /// Check a category id without fetching the row. Used by expense
    /// create/update to resolve the category reference.
    pub fn category_exists(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM categories WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Create a category. Duplicate names are a conflict.
    pub fn create_category(&self, new: &NewCategory) -> Result<Category> {
        let conn = self.conn()?;

        if self.category_name_taken(&conn, &new.name, None)? {
            return Err(Error::Conflict(format!(
                "A category named {} already exists",
                new.name
            )));
        }

        conn.execute(
            "INSERT INTO categories (name, description, color, icon) VALUES (?, ?, ?, ?)",
            params![new.name, new.description, new.color, new.icon],
        )?;
        let id = conn.last_insert_rowid();
        info!(category_id = id, name = %new.name, "Category created");

        self.get_category(id)
    }

    /// Update a category. Renaming onto an existing name is a conflict.
    pub fn update_category(&self, id: i64, new: &NewCategory) -> Result<Category> {
        let conn = self.conn()?;

        // Existence check first so the caller sees NotFound, not Conflict
        let _ = self.get_category(id)?;

        if self.category_name_taken(&conn, &new.name, Some(id))? {
            return Err(Error::Conflict(format!(
                "A category named {} already exists",
                new.name
            )));
        }

        conn.execute(
            "UPDATE categories SET name = ?, description = ?, color = ?, icon = ? WHERE id = ?",
            params![new.name, new.description, new.color, new.icon, id],
        )?;
        info!(category_id = id, "Category updated");

        self.get_category(id)
    }

    /// Delete a category. Blocked while any expense references it.
    pub fn delete_category(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;

        let _ = self.get_category(id)?;

        let dependents: i64 = conn.query_row(
            "SELECT COUNT(*) FROM expenses WHERE category_id = ?",
            params![id],
            |row| row.get(0),
        )?;
        if dependents > 0 {
            return Err(Error::Conflict(format!(
                "Category {} still has {} expense(s)",
                id, dependents
            )));
        }

        conn.execute("DELETE FROM categories WHERE id = ?", params![id])?;
        info!(category_id = id, "Category deleted");

        Ok(())
    }

    fn category_name_taken(
        &self,
        conn: &rusqlite::Connection,
        name: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        let taken: Option<i64> = match exclude_id {
            Some(id) => conn
                .query_row(
                    "SELECT id FROM categories WHERE name = ? AND id != ?",
                    params![name, id],
                    |row| row.get(0),
                )
                .optional()?,
            None => conn
                .query_row(
                    "SELECT id FROM categories WHERE name = ?",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?,
        };
        Ok(taken.is_some())
    }

    fn map_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            color: row.get(3)?,
            icon: row.get(4)?,
            created_at: parse_datetime(&row.get::<_, String>(5)?),
        })
    }
}
