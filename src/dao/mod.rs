/// Storage traits the bot depends on.
pub mod bot_store;
/// In-process store used when no database is configured and in tests.
pub mod memory;
/// Database model definitions.
pub mod models;
/// MongoDB-backed store.
#[cfg(feature = "mongo-store")]
pub mod mongodb;
/// Storage abstraction layer for database operations.
pub mod storage;
