//! Meetbrief storage crate - SQLite persistence for users, meetings and
//! action items.
//!
//! Provides a WAL-mode SQLite database with versioned migrations and
//! per-aggregate repositories that scope every query to the owning user.

pub mod db;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use repository::{ActionItemRepository, MeetingRepository, UserRepository};
