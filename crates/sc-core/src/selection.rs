//! Selected prims and instances

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::path::PrimPath;

/// Hash of a selection, used to detect selection changes between frames
pub type SelectionHash = u64;

/// One selected prim, optionally narrowed to an instance of an instancer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionItem {
    pub path: PrimPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<usize>,
}

impl SelectionItem {
    pub fn prim(path: PrimPath) -> Self {
        Self {
            path,
            instance: None,
        }
    }

    pub fn instance(path: PrimPath, instance: usize) -> Self {
        Self {
            path,
            instance: Some(instance),
        }
    }
}

/// Ordered set of selected items. The first item is the edit target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    items: Vec<SelectionItem>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[SelectionItem] {
        &self.items
    }

    /// Path of the first selected item
    pub fn first_path(&self) -> Option<&PrimPath> {
        self.items.first().map(|item| &item.path)
    }

    /// Distinct selected prim paths in selection order
    pub fn paths(&self) -> Vec<PrimPath> {
        let mut paths: Vec<PrimPath> = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if !paths.contains(&item.path) {
                paths.push(item.path.clone());
            }
        }
        paths
    }

    pub fn contains(&self, item: &SelectionItem) -> bool {
        self.items.contains(item)
    }

    /// Replace the whole selection with a single item
    pub fn replace(&mut self, item: SelectionItem) {
        self.items.clear();
        self.items.push(item);
    }

    /// Append an item if not already selected
    pub fn add(&mut self, item: SelectionItem) {
        if !self.items.contains(&item) {
            self.items.push(item);
        }
    }

    /// Add the item, or remove it when already selected
    pub fn toggle(&mut self, item: SelectionItem) {
        if let Some(idx) = self.items.iter().position(|existing| *existing == item) {
            self.items.remove(idx);
        } else {
            self.items.push(item);
        }
    }

    /// Drop every item at or below `path`
    pub fn remove_prefixed(&mut self, path: &PrimPath) {
        self.items.retain(|item| !item.path.has_prefix(path));
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn hash(&self) -> SelectionHash {
        let mut hasher = DefaultHasher::new();
        self.items.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> PrimPath {
        PrimPath::new(s).unwrap()
    }

    #[test]
    fn test_hash_tracks_changes() {
        let mut selection = Selection::new();
        let empty = selection.hash();
        selection.replace(SelectionItem::prim(path("/A")));
        let one = selection.hash();
        assert_ne!(empty, one);

        selection.add(SelectionItem::prim(path("/A")));
        assert_eq!(selection.hash(), one);

        selection.replace(SelectionItem::instance(path("/A"), 2));
        assert_ne!(selection.hash(), one);
    }

    #[test]
    fn test_toggle_and_paths() {
        let mut selection = Selection::new();
        selection.toggle(SelectionItem::instance(path("/I"), 0));
        selection.toggle(SelectionItem::instance(path("/I"), 1));
        selection.toggle(SelectionItem::prim(path("/B")));
        assert_eq!(selection.paths(), vec![path("/I"), path("/B")]);

        selection.toggle(SelectionItem::instance(path("/I"), 0));
        assert_eq!(selection.len(), 2);
        assert_eq!(selection.first_path(), Some(&path("/I")));
    }

    #[test]
    fn test_remove_prefixed() {
        let mut selection = Selection::new();
        selection.add(SelectionItem::prim(path("/World/A")));
        selection.add(SelectionItem::prim(path("/Other")));
        selection.remove_prefixed(&path("/World"));
        assert_eq!(selection.paths(), vec![path("/Other")]);
    }
}
