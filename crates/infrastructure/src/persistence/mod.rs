//! Storage adapters

mod json_file_store;
mod memory;

pub use json_file_store::JsonFileStore;
pub use memory::InMemoryStore;
