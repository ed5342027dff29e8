//! Conversation store - SQLite persistence for per-user chat history.
//!
//! Provides a WAL-mode SQLite database with migrations and the
//! `ConversationStore` trait with its SQLite-backed repository.

pub mod db;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use repository::{ConversationRepository, ConversationStore};
