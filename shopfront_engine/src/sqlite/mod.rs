//! SQLite database module for the Shopfront Engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
