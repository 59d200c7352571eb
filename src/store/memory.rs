//! In-process note store.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::store::types::{NewNote, Note, NoteFilter, NotePatch};
use crate::store::{NoteStore, StoreError, StoreResult};

/// Note collection kept in a concurrent map.
///
/// `set_reachable(false)` makes the next `connect` fail, which is how the
/// connectivity gate is exercised without a real database.
pub struct MemoryNoteStore {
    notes: DashMap<String, Note>,
    connected: AtomicBool,
    reachable: AtomicBool,
}

impl MemoryNoteStore {
    /// A store that is reachable but not yet connected.
    pub fn new() -> Self {
        Self {
            notes: DashMap::new(),
            connected: AtomicBool::new(false),
            reachable: AtomicBool::new(true),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Relaxed);
    }

    /// Drop the connection, as a server-side disconnect event would.
    pub fn disconnect(&self) {
        if self.connected.swap(false, Ordering::Relaxed) {
            tracing::warn!("Note store disconnected");
        }
    }

    fn ensure_connected(&self) -> StoreResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(StoreError::Unavailable("not connected".into()))
        }
    }
}

impl Default for MemoryNoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    async fn connect(&self) -> StoreResult<()> {
        if !self.reachable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("store unreachable".into()));
        }
        self.connected.store(true, Ordering::Relaxed);
        tracing::info!("Note store connected");
        Ok(())
    }

    async fn create(&self, note: NewNote) -> StoreResult<Note> {
        self.ensure_connected()?;
        let now = Utc::now();
        let stored = Note {
            id: Uuid::new_v4().to_string(),
            user_id: note.user_id,
            course_id: note.course_id,
            content_id: note.content_id,
            title: note.title,
            note: note.note,
            created_date: now,
            updated_date: now,
        };
        self.notes.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Note>> {
        self.ensure_connected()?;
        Ok(self.notes.get(id).map(|r| r.value().clone()))
    }

    async fn update(&self, id: &str, patch: NotePatch) -> StoreResult<Note> {
        self.ensure_connected()?;
        let mut entry = self
            .notes
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(title) = patch.title {
            entry.title = title;
        }
        if let Some(note) = patch.note {
            entry.note = note;
        }
        entry.updated_date = Utc::now();
        Ok(entry.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        self.ensure_connected()?;
        self.notes
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn search(&self, filter: &NoteFilter) -> StoreResult<Vec<Note>> {
        self.ensure_connected()?;
        let mut notes: Vec<Note> = self
            .notes
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        notes.sort_by(|a, b| b.updated_date.cmp(&a.updated_date));
        Ok(notes)
    }
}
