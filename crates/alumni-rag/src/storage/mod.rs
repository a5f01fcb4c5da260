//! Persistent storage for alumni records

pub mod database;
pub mod memory;
pub mod seed;

pub use database::SqliteRecordStore;
pub use memory::MemoryRecordStore;
pub use seed::{load_seed_file, seed_if_empty};
