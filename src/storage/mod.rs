//! Persistence of session state

pub mod kv_store;

pub use kv_store::{JsonFileStore, KeyValueStore, LAST_CAMERA_KEY, MemoryStore};
