use crate::core::trash;
use crate::models::history::ActionHistoryEntry;
use crate::models::paths::DEFAULT_HISTORY_CAPACITY;
use std::collections::VecDeque;
use tracing::debug;

/// Bounded undo stack. Owns the trash files referenced by its `Uninstall`
/// entries and deletes them when those entries leave the stack for good.
#[derive(Debug)]
pub struct ActionHistory {
    entries: VecDeque<ActionHistoryEntry>,
    capacity: usize,
}

impl Default for ActionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl ActionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ActionHistoryEntry> {
        self.entries.iter()
    }

    pub fn peek(&self) -> Option<&ActionHistoryEntry> {
        self.entries.back()
    }

    /// Records an action, evicting the oldest entries past capacity.
    /// Evicted entries are returned after their trash files are purged.
    pub fn push(&mut self, entry: ActionHistoryEntry) -> Vec<ActionHistoryEntry> {
        debug!("history: {entry}");
        self.entries.push_back(entry);

        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            if let Some(old) = self.entries.pop_front() {
                if let Some(path) = old.trash_path() {
                    trash::purge(path);
                }
                evicted.push(old);
            }
        }
        evicted
    }

    pub fn pop(&mut self) -> Option<ActionHistoryEntry> {
        self.entries.pop_back()
    }

    /// Puts back an entry whose undo failed. Never evicts or purges.
    pub fn restore(&mut self, entry: ActionHistoryEntry) {
        self.entries.push_back(entry);
    }

    /// Drops every entry and purges the trash files they owned.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        for entry in self.entries.drain(..) {
            if let Some(path) = entry.trash_path() {
                trash::purge(path);
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    fn enable(n: usize) -> ActionHistoryEntry {
        ActionHistoryEntry::Enable {
            mod_name: format!("mod{n}.z2f"),
        }
    }

    #[test]
    fn eviction_purges_trash() {
        let tmp = tempfile::tempdir().unwrap();
        let trashed = Utf8PathBuf::from_path_buf(tmp.path().join("old.z2f")).unwrap();
        std::fs::write(&trashed, b"old").unwrap();

        let mut history = ActionHistory::new(3);
        history.push(ActionHistoryEntry::Uninstall {
            mod_name: "old.z2f".into(),
            trash_path: trashed.clone(),
            was_enabled: true,
        });
        for n in 0..2 {
            assert!(history.push(enable(n)).is_empty());
        }
        assert!(trashed.exists());

        let evicted = history.push(enable(2));
        assert_eq!(evicted.len(), 1);
        assert_eq!(history.len(), 3);
        assert!(!trashed.exists());
    }

    #[test]
    fn restore_keeps_order() {
        let mut history = ActionHistory::new(2);
        history.push(enable(0));
        history.push(enable(1));

        let top = history.pop().unwrap();
        history.restore(top.clone());
        assert_eq!(history.peek(), Some(&top));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn zero_capacity_still_holds_one() {
        let mut history = ActionHistory::new(0);
        history.push(enable(0));
        history.push(enable(1));
        assert_eq!(history.len(), 1);
        assert_eq!(history.peek(), Some(&enable(1)));
    }
}
