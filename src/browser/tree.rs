use slotmap::SlotMap;

use super::item::{BrowserItem, ItemId, Population};
use crate::error::{AppError, Result};

/// Arena holding every materialized browser item.
///
/// The root is created with the tree and is never removed. Removing an
/// item removes its whole subtree.
#[derive(Debug)]
pub struct BrowserTree {
    items: SlotMap<ItemId, BrowserItem>,
    root: ItemId,
}

impl BrowserTree {
    pub fn new(root: BrowserItem) -> Self {
        let mut items = SlotMap::with_key();
        let root = items.insert(root);
        Self { items, root }
    }

    pub fn root(&self) -> ItemId {
        self.root
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(id)
    }

    pub fn get(&self, id: ItemId) -> Option<&BrowserItem> {
        self.items.get(id)
    }

    pub fn item(&self, id: ItemId) -> Result<&BrowserItem> {
        self.items.get(id).ok_or(AppError::UnknownItem)
    }

    pub(super) fn item_mut(&mut self, id: ItemId) -> Result<&mut BrowserItem> {
        self.items.get_mut(id).ok_or(AppError::UnknownItem)
    }

    /// Number of live items, root included.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Append `child` as the last child of `parent`. The parent counts as
    /// populated afterwards.
    pub fn append_child(&mut self, parent: ItemId, mut child: BrowserItem) -> Result<ItemId> {
        if !self.items.contains_key(parent) {
            return Err(AppError::UnknownItem);
        }
        child.parent = Some(parent);
        child.children.clear();
        let id = self.items.insert(child);
        let parent_item = self.item_mut(parent)?;
        parent_item.children.push(id);
        parent_item.set_population(Population::Populated);
        Ok(id)
    }

    /// Detach and drop `child` together with its subtree.
    pub fn remove_child(&mut self, parent: ItemId, child: ItemId) -> Result<()> {
        let parent_item = self.item_mut(parent)?;
        let pos = parent_item
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(AppError::ChildNotFound)?;
        parent_item.children.remove(pos);
        self.remove_subtree(child);
        Ok(())
    }

    /// Drop all children of `parent`; returns how many were removed.
    pub fn remove_children(&mut self, parent: ItemId) -> Result<usize> {
        let children = std::mem::take(&mut self.item_mut(parent)?.children);
        let count = children.len();
        for child in children {
            self.remove_subtree(child);
        }
        Ok(count)
    }

    fn remove_subtree(&mut self, id: ItemId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(item) = self.items.remove(current) {
                stack.extend(item.children);
            }
        }
    }

    pub fn child(&self, parent: ItemId, row: usize) -> Result<ItemId> {
        self.item(parent)?.child(row)
    }

    pub fn children(&self, parent: ItemId) -> &[ItemId] {
        self.items
            .get(parent)
            .map(|item| item.children())
            .unwrap_or(&[])
    }

    pub fn child_count(&self, parent: ItemId) -> usize {
        self.children(parent).len()
    }

    pub fn parent(&self, id: ItemId) -> Option<ItemId> {
        self.items.get(id).and_then(|item| item.parent)
    }

    /// Position of `id` within its parent's children.
    pub fn row(&self, id: ItemId) -> Result<usize> {
        let parent = self.item(id)?.parent.ok_or(AppError::NoParent)?;
        self.children(parent)
            .iter()
            .position(|&c| c == id)
            .ok_or(AppError::ChildNotFound)
    }

    /// Pre-order walk of the materialized items below (and including) `from`.
    pub fn descendants(&self, from: ItemId) -> Vec<ItemId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if let Some(item) = self.items.get(id) {
                out.push(id);
                stack.extend(item.children.iter().rev().copied());
            }
        }
        out
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::browser::item::ItemType;
    use std::path::Path;

    fn tree_with_dirs(names: &[&str]) -> (BrowserTree, Vec<ItemId>) {
        let mut tree = BrowserTree::new(BrowserItem::root("Name"));
        let root = tree.root();
        let ids = names
            .iter()
            .map(|n| {
                tree.append_child(root, BrowserItem::directory(Path::new(n), true))
                    .unwrap()
            })
            .collect();
        (tree, ids)
    }

    /// Every child's parent link points back at the item listing it.
    pub(crate) fn assert_links(tree: &BrowserTree) {
        for id in tree.descendants(tree.root()) {
            for (row, &child) in tree.children(id).iter().enumerate() {
                assert_eq!(tree.parent(child), Some(id));
                assert_eq!(tree.row(child).unwrap(), row);
            }
        }
    }

    #[test]
    fn append_sets_parent_and_row() {
        let (tree, ids) = tree_with_dirs(&["/a", "/b", "/c"]);
        assert_eq!(tree.child_count(tree.root()), 3);
        assert_eq!(tree.row(ids[2]).unwrap(), 2);
        assert_eq!(tree.child(tree.root(), 1).unwrap(), ids[1]);
        assert_links(&tree);
    }

    #[test]
    fn append_marks_parent_populated() {
        let (mut tree, ids) = tree_with_dirs(&["/a"]);
        assert!(!tree.item(ids[0]).unwrap().is_populated());
        tree.append_child(ids[0], BrowserItem::directory(Path::new("/a/x"), false))
            .unwrap();
        assert!(tree.item(ids[0]).unwrap().is_populated());
    }

    #[test]
    fn remove_child_cascades() {
        let (mut tree, ids) = tree_with_dirs(&["/a", "/b"]);
        let nested = tree
            .append_child(ids[0], BrowserItem::directory(Path::new("/a/x"), false))
            .unwrap();
        tree.remove_child(tree.root(), ids[0]).unwrap();

        assert!(!tree.contains(ids[0]));
        assert!(!tree.contains(nested));
        assert_eq!(tree.children(tree.root()), &[ids[1]]);
        assert_eq!(tree.row(ids[1]).unwrap(), 0);
        assert_links(&tree);
    }

    #[test]
    fn remove_unknown_child_fails() {
        let (mut tree, ids) = tree_with_dirs(&["/a", "/b"]);
        let err = tree.remove_child(ids[0], ids[1]).unwrap_err();
        assert!(matches!(err, AppError::ChildNotFound));
        assert_eq!(tree.child_count(tree.root()), 2);
    }

    #[test]
    fn remove_children_clears_everything() {
        let (mut tree, _) = tree_with_dirs(&["/a", "/b", "/c"]);
        let root = tree.root();
        assert_eq!(tree.remove_children(root).unwrap(), 3);
        assert_eq!(tree.child_count(root), 0);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn root_has_no_row() {
        let (tree, _) = tree_with_dirs(&[]);
        assert!(matches!(tree.row(tree.root()), Err(AppError::NoParent)));
        assert_eq!(tree.item(tree.root()).unwrap().item_type(), ItemType::Root);
    }

    #[test]
    fn child_row_out_of_range() {
        let (tree, _) = tree_with_dirs(&["/a"]);
        assert!(matches!(
            tree.child(tree.root(), 5),
            Err(AppError::RowOutOfRange { row: 5, count: 1 })
        ));
    }

    #[test]
    fn descendants_are_pre_order() {
        let (mut tree, ids) = tree_with_dirs(&["/a", "/b"]);
        let nested = tree
            .append_child(ids[0], BrowserItem::directory(Path::new("/a/x"), false))
            .unwrap();
        assert_eq!(
            tree.descendants(tree.root()),
            vec![tree.root(), ids[0], nested, ids[1]]
        );
    }
}
