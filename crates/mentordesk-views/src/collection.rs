//! View-owned entity collections.
//!
//! Each view keeps its own copy: replaced wholesale on fetch, mutated in
//! place by identity key, cleared on failure.

use mentordesk_services::{Mentor, Task};

/// Records addressable by their server identity.
pub trait Entity {
    fn id(&self) -> &str;
}

impl Entity for Mentor {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Task {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone)]
pub struct EntityCollection<T> {
    items: Vec<T>,
}

impl<T> Default for EntityCollection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> EntityCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with a fresh server payload.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Apply `f` to the record with `id`. Returns false if it isn't present.
    pub fn update<F>(&mut self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        match self.items.iter_mut().find(|item| item.id() == id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    /// Replace the record with the same identity, if present.
    pub fn upsert_existing(&mut self, record: T) -> bool {
        match self.items.iter_mut().find(|item| item.id() == record.id()) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Remove a record, returning it with its former position.
    pub fn remove(&mut self, id: &str) -> Option<(usize, T)> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some((index, self.items.remove(index)))
    }

    /// Put a record back at (or as near as possible to) `index`.
    pub fn restore_at(&mut self, index: usize, record: T) {
        let index = index.min(self.items.len());
        self.items.insert(index, record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            title: format!("Task {}", id),
            description: String::new(),
            category: "Dev".to_string(),
            priority: Default::default(),
            progress: Default::default(),
            deadline: None,
            status: None,
            assigned_to: Vec::new(),
        }
    }

    #[test]
    fn update_by_identity() {
        let mut tasks = EntityCollection::new();
        tasks.replace_all(vec![task("a"), task("b")]);

        assert!(tasks.update("b", |t| t.title = "Renamed".to_string()));
        assert_eq!(tasks.get("b").map(|t| t.title.as_str()), Some("Renamed"));
        assert!(!tasks.update("zzz", |t| t.title.clear()));
    }

    #[test]
    fn remove_and_restore_keeps_position() {
        let mut tasks = EntityCollection::new();
        tasks.replace_all(vec![task("a"), task("b"), task("c")]);

        let (index, removed) = tasks.remove("b").unwrap();
        assert_eq!(index, 1);
        assert_eq!(tasks.len(), 2);

        tasks.restore_at(index, removed);
        let ids: Vec<_> = tasks.items().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn restore_past_end_appends() {
        let mut tasks = EntityCollection::new();
        tasks.restore_at(10, task("a"));
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn replace_and_clear() {
        let mut tasks = EntityCollection::new();
        tasks.replace_all(vec![task("a")]);
        assert!(!tasks.is_empty());
        assert!(tasks.upsert_existing(task("a")));
        assert!(!tasks.upsert_existing(task("b")));
        tasks.clear();
        assert!(tasks.is_empty());
    }
}
