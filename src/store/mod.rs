//! Persistent local state.

pub mod db;

pub use db::{CatalogDb, DbError};
