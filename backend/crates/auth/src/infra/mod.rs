//! Infrastructure Layer
//!
//! Database implementations and in-memory counterparts.

pub mod memory;
pub mod pg_cache;
pub mod postgres;

pub use memory::{MemoryAuthRepository, MemoryOutbox, RecordingEventDispatcher};
pub use pg_cache::PgCacheStore;
pub use postgres::PgAuthRepository;
