//! Per-chat session storage.
//!
//! Four kinds of state are kept per session key: the active-wizard marker
//! and one state struct per wizard. Dispatch is serialized per chat, so
//! handlers clone a session out, mutate it and write it back; the coarse
//! lock only has to guarantee that `clear` is atomic against other
//! operations on the same key.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::add::AddSeriesSession;
use super::delete::DeleteSeriesSession;
use super::library::LibrarySession;

/// Which wizard owns the next callback for a session key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveWizard {
    Add,
    Delete,
    Library(LibraryMode),
}

/// Sub-mode of the library wizard; each has its own dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryMode {
    Menu,
    Browse,
    SeriesEdit,
    SeasonEdit,
}

#[derive(Default)]
struct Inner {
    active: HashMap<i64, ActiveWizard>,
    add: HashMap<i64, AddSeriesSession>,
    delete: HashMap<i64, DeleteSeriesSession>,
    library: HashMap<i64, LibrarySession>,
}

/// Thread-safe store of all per-chat wizard state. No TTL: state lives
/// until explicitly cleared or the process restarts.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<Inner>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self, chat_id: i64) -> Option<ActiveWizard> {
        self.inner.read().active.get(&chat_id).copied()
    }

    pub fn set_active(&self, chat_id: i64, wizard: ActiveWizard) {
        self.inner.write().active.insert(chat_id, wizard);
    }

    pub fn add_session(&self, chat_id: i64) -> Option<AddSeriesSession> {
        self.inner.read().add.get(&chat_id).cloned()
    }

    pub fn set_add_session(&self, chat_id: i64, session: AddSeriesSession) {
        self.inner.write().add.insert(chat_id, session);
    }

    pub fn delete_session(&self, chat_id: i64) -> Option<DeleteSeriesSession> {
        self.inner.read().delete.get(&chat_id).cloned()
    }

    pub fn set_delete_session(&self, chat_id: i64, session: DeleteSeriesSession) {
        self.inner.write().delete.insert(chat_id, session);
    }

    pub fn library_session(&self, chat_id: i64) -> Option<LibrarySession> {
        self.inner.read().library.get(&chat_id).cloned()
    }

    pub fn set_library_session(&self, chat_id: i64, session: LibrarySession) {
        self.inner.write().library.insert(chat_id, session);
    }

    /// Remove every kind of state for one chat atomically.
    pub fn clear(&self, chat_id: i64) {
        let mut inner = self.inner.write();
        inner.active.remove(&chat_id);
        inner.add.remove(&chat_id);
        inner.delete.remove(&chat_id);
        inner.library.remove(&chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_removes_all_state_kinds() {
        let store = SessionStore::new();
        store.set_active(1, ActiveWizard::Add);
        store.set_add_session(1, AddSeriesSession::default());
        store.set_delete_session(1, DeleteSeriesSession::default());
        store.set_library_session(1, LibrarySession::default());

        store.clear(1);

        assert!(store.active(1).is_none());
        assert!(store.add_session(1).is_none());
        assert!(store.delete_session(1).is_none());
        assert!(store.library_session(1).is_none());
    }

    #[test]
    fn sessions_are_independent_per_chat() {
        let store = SessionStore::new();
        store.set_active(1, ActiveWizard::Add);
        store.set_active(2, ActiveWizard::Library(LibraryMode::Menu));

        store.clear(1);

        assert!(store.active(1).is_none());
        assert_eq!(store.active(2), Some(ActiveWizard::Library(LibraryMode::Menu)));
    }

    #[test]
    fn new_marker_overwrites_previous_wizard() {
        let store = SessionStore::new();
        store.set_active(1, ActiveWizard::Add);
        store.set_active(1, ActiveWizard::Delete);
        assert_eq!(store.active(1), Some(ActiveWizard::Delete));
    }
}
