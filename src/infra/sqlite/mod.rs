// Local SQLite backend. Implements the same ports as the hosted backend so
// the client can run offline.

pub mod sqlite_backend;
pub mod sqlite_board_store;

pub use sqlite_backend::SqliteBackend;
