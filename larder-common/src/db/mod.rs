//! Account database (SQLite)

pub mod init;
pub mod users;

pub use init::{init_database, init_memory_database};
pub use users::{SqliteUserStore, UserRecord, UserStore};
