//! Store Module
//!
//! Item persistence and queries over a Redis-style key-value backend.

mod backend;
mod item;
mod memory;
mod query;
mod redis_backend;
mod repository;


// Re-export public types
pub use backend::KeyValueBackend;
pub use item::Item;
pub use memory::MemoryBackend;
pub use query::{FieldValue, ItemAttribute};
pub use redis_backend::RedisBackend;
pub use repository::ItemStore;

// == Public Constants ==
/// Key holding the auto-increment id counter; never an item.
pub const INDEX_KEY: &str = "index";
