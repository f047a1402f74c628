//! Session bookkeeping for the multiplexed transport.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque identifier of one multiplexed session (a UUID v4 string).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Live sessions, each mapped to the inbound queue of its worker.
///
/// Clones share the same table. Removing a session drops the table's
/// sender, which lets the session's worker drain and exit.
#[derive(Debug, Clone, Default)]
pub struct SessionTable {
    inner: Arc<Mutex<HashMap<SessionId, mpsc::Sender<String>>>>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<SessionId, mpsc::Sender<String>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new session and return its freshly generated id.
    pub fn open(&self, inbound: mpsc::Sender<String>) -> SessionId {
        let mut entries = self.entries();
        let mut id = SessionId::generate();
        while entries.contains_key(&id) {
            id = SessionId::generate();
        }
        entries.insert(id.clone(), inbound);
        tracing::debug!(session_id = %id, sessions = entries.len(), "Session opened");
        id
    }

    /// Inbound queue of a live session.
    pub fn lookup(&self, id: &SessionId) -> Option<mpsc::Sender<String>> {
        self.entries().get(id).cloned()
    }

    pub fn remove(&self, id: &SessionId) -> bool {
        let mut entries = self.entries();
        let removed = entries.remove(id).is_some();
        if removed {
            tracing::debug!(session_id = %id, sessions = entries.len(), "Session closed");
        }
        removed
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.entries().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_open_generates_distinct_ids() {
        let table = SessionTable::new();
        let mut seen = HashSet::new();
        for _ in 0..64 {
            let (tx, _rx) = mpsc::channel(1);
            assert!(seen.insert(table.open(tx)));
        }
        assert_eq!(table.len(), 64);
    }

    #[test]
    fn test_ids_are_uuid_v4() {
        let table = SessionTable::new();
        let (tx, _rx) = mpsc::channel(1);
        let id = table.open(tx);
        let parsed = Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_remove_and_lookup() {
        let table = SessionTable::new();
        let (tx, _rx) = mpsc::channel(1);
        let id = table.open(tx);

        assert!(table.lookup(&id).is_some());
        assert!(table.remove(&id));
        assert!(!table.remove(&id));
        assert!(table.lookup(&id).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_unknown_id_is_absent() {
        let table = SessionTable::new();
        assert!(!table.contains(&SessionId::from("not-a-session")));
    }

    #[tokio::test]
    async fn test_removal_closes_worker_queue() {
        let table = SessionTable::new();
        let (tx, mut rx) = mpsc::channel::<String>(1);
        let id = table.open(tx);

        table.remove(&id);
        assert!(rx.recv().await.is_none());
    }
}
