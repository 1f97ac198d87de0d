/*!
 * Database module for persistent storage of terminology.
 *
 * This module provides SQLite-based persistence for:
 * - Languages and the TBX controlled vocabularies
 * - Glossaries and their concepts
 * - Translations, definitions and external resources
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

// Re-export main types
pub use connection::{DatabaseConnection, DatabaseStats};
pub use repository::Repository;
