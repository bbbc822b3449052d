//! Outlay core library
//!
//! Domain logic for the Outlay personal expense tracker:
//! - `models` - domain types shared across the workspace
//! - `db` - SQLite data access layer (users, categories, expenses)
//! - `dashboard` - monthly dashboard aggregation
//! - `export` - CSV report export
//! - `error` - error types
//!
//! Every expense read and write is scoped to an owner id passed in
//! explicitly by the caller; nothing in this crate reads ambient
//! session state.

pub mod dashboard;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod money;

pub use error::{Error, Result};
