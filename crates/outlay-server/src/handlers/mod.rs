//! HTTP request handlers organized by domain

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod expenses;
pub mod reports;

// Re-export all handlers for use in router
pub use auth::*;
pub use categories::*;
pub use dashboard::*;
pub use expenses::*;
pub use reports::*;
