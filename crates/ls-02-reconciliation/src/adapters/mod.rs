//! # Adapters
//!
//! Mirror store and incident journal implementations.

pub mod memory_journal;
pub mod memory_store;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory_journal::InMemoryIncidentJournal;
pub use memory_store::InMemoryMirrorStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteMirrorStore;
