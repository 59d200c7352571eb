//! Note storage subsystem.
//!
//! # Data Flow
//! ```text
//! Note routes
//!     → connectivity gate (http/middleware/store_gate.rs) checks `is_connected`
//!     → note handlers call NoteStore CRUD
//!     → memory.rs (in-process document collection)
//! ```
//!
//! # Design Decisions
//! - The connected flag is a plain atomic; a stale read costs one failed call
//! - Every operation fails with `Unavailable` while disconnected

pub mod memory;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryNoteStore;
pub use types::{NewNote, Note, NoteFilter, NotePatch};

/// Errors reported by a note store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("note store unavailable: {0}")]
    Unavailable(String),

    #[error("note {0} not found")]
    NotFound(String),
}

/// Result type for note store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store holding user notes.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Current connection status. Must not block.
    fn is_connected(&self) -> bool;

    /// (Re)establish the connection.
    async fn connect(&self) -> StoreResult<()>;

    async fn create(&self, note: NewNote) -> StoreResult<Note>;

    async fn get(&self, id: &str) -> StoreResult<Option<Note>>;

    async fn update(&self, id: &str, patch: NotePatch) -> StoreResult<Note>;

    async fn delete(&self, id: &str) -> StoreResult<()>;

    async fn search(&self, filter: &NoteFilter) -> StoreResult<Vec<Note>>;
}
