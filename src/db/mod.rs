pub mod models;
pub mod sqlite;

pub use sqlite::SqliteStore;
