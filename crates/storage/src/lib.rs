#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, ResponseRepository, SessionRepository, Storage, StorageError,
    StorageTotals,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
