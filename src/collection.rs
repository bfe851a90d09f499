use crate::photo::{PhotoId, PhotoItem};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Photos in insertion order, keyed by id, plus the focused item.
#[derive(Debug, Default)]
pub struct Collection {
    items: IndexMap<PhotoId, PhotoItem>,
    focused: Option<PhotoId>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new item unless `path` is already tracked. The first item
    /// added to an unfocused collection takes focus.
    pub fn insert(&mut self, path: PathBuf) -> Option<PhotoId> {
        if self.contains_path(&path) {
            log::debug!("Skipping duplicate photo {:?}", path);
            return None;
        }

        let item = PhotoItem::new(path);
        let id = item.id();
        self.items.insert(id, item);
        if self.focused.is_none() {
            self.focused = Some(id);
        }
        Some(id)
    }

    /// Removes an item, keeping the order of the rest. Focus falls back to
    /// the first remaining item if the removed one held it.
    pub fn remove(&mut self, id: PhotoId) -> Option<PhotoItem> {
        let removed = self.items.shift_remove(&id)?;
        if self.focused == Some(id) {
            self.focused = self.items.keys().next().copied();
        }
        Some(removed)
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.items.values().any(|item| item.source_path() == path)
    }

    pub fn get(&self, id: PhotoId) -> Option<&PhotoItem> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: PhotoId) -> Option<&mut PhotoItem> {
        self.items.get_mut(&id)
    }

    pub fn ids(&self) -> Vec<PhotoId> {
        self.items.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhotoItem> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn focused(&self) -> Option<&PhotoItem> {
        self.focused.and_then(|id| self.items.get(&id))
    }

    /// Ignored for ids that are not in the collection.
    pub fn set_focus(&mut self, id: PhotoId) -> bool {
        if self.items.contains_key(&id) {
            self.focused = Some(id);
            true
        } else {
            false
        }
    }
}
