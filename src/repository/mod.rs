//! Repository layer for event persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! against a SQLite database.

pub mod context;
pub mod diesel_event;
pub mod diesel_models;
pub mod memory;
pub mod pool;
pub mod store;
pub mod util;

pub use context::DbContext;
pub use diesel_event::DieselEventRepository;
pub use memory::MemoryEventStore;
pub use pool::{DbError, DbPool};
pub use store::{EventStore, StoreError, StoreResult};
