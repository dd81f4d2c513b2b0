use std::collections::HashSet;

use super::change::ModelChange;
use super::item::{Icon, ItemId, ItemType};
use super::model::{BrowserModel, ItemData, ItemRole, ModelIndex};
use super::order::SortOrder;
use crate::error::Result;

/// A flattened row of the browser tree for rendering.
#[derive(Debug, Clone)]
pub struct FlatRow {
    pub index: ModelIndex,
    pub id: ItemId,
    pub label: String,
    pub icon: Icon,
    pub item_type: ItemType,
    pub depth: usize,
    pub is_expanded: bool,
    /// Whether the item has (or may lazily have) children.
    pub expandable: bool,
    pub is_last_sibling: bool,
    pub is_public: bool,
    pub line_number: Option<usize>,
}

/// Labels from the top-level entry down to an item. Survives
/// repopulation, unlike item ids.
pub type LabelPath = Vec<String>;

/// Expansion, selection and scroll state over a [`BrowserModel`].
#[derive(Debug)]
pub struct BrowserView {
    pub rows: Vec<FlatRow>,
    pub selected_index: usize,
    pub scroll_offset: usize,
    pub sort_order: SortOrder,
    pub sort_column: usize,
    expanded: HashSet<ItemId>,
}

impl BrowserView {
    pub fn new(model: &mut BrowserModel, sort_order: SortOrder) -> Self {
        let mut view = Self {
            rows: Vec::new(),
            selected_index: 0,
            scroll_offset: 0,
            sort_order,
            sort_column: 0,
            expanded: HashSet::new(),
        };
        view.flatten(model);
        view
    }

    pub fn selected(&self) -> Option<&FlatRow> {
        self.rows.get(self.selected_index)
    }

    pub fn find_index(&self, id: ItemId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    /// Rebuild the flat rows, keeping the selected item selected when it
    /// is still visible.
    pub fn flatten(&mut self, model: &mut BrowserModel) {
        let selected = self.selected().map(|row| row.id);
        self.expanded.retain(|&id| model.tree().contains(id));

        let mut rows = Vec::new();
        let top = model.sorted_indexes(None, self.sort_column, self.sort_order);
        self.flatten_children(model, &top, 0, &mut rows);
        self.rows = rows;

        if let Some(index) = selected.and_then(|id| self.find_index(id)) {
            self.selected_index = index;
        }
        if !self.rows.is_empty() && self.selected_index >= self.rows.len() {
            self.selected_index = self.rows.len() - 1;
        }
        if self.rows.is_empty() {
            self.selected_index = 0;
        }
    }

    fn flatten_children(
        &self,
        model: &mut BrowserModel,
        indexes: &[ModelIndex],
        depth: usize,
        rows: &mut Vec<FlatRow>,
    ) {
        for (i, index) in indexes.iter().enumerate() {
            self.flatten_item(model, index, depth, i + 1 == indexes.len(), rows);
        }
    }

    fn flatten_item(
        &self,
        model: &mut BrowserModel,
        index: &ModelIndex,
        depth: usize,
        is_last: bool,
        rows: &mut Vec<FlatRow>,
    ) {
        let is_expanded = self.expanded.contains(&index.item);
        // Listing the children populates an expanded item before its
        // expander is decided.
        let children = if is_expanded {
            model.sorted_indexes(Some(index), self.sort_column, self.sort_order)
        } else {
            Vec::new()
        };
        let expandable = model.has_children(Some(index));
        let label = match model.data(index, ItemRole::Display) {
            Some(ItemData::Text(text)) => text,
            _ => String::new(),
        };
        let icon = match model.data(index, ItemRole::Decoration) {
            Some(ItemData::Icon(icon)) => icon,
            _ => Icon::Empty,
        };
        let Some(item) = model.item(index) else {
            return;
        };
        rows.push(FlatRow {
            index: *index,
            id: index.item,
            label,
            icon,
            item_type: item.item_type(),
            depth,
            is_expanded: is_expanded && expandable,
            expandable,
            is_last_sibling: is_last,
            is_public: item.is_public(),
            line_number: item.line_number(),
        });

        self.flatten_children(model, &children, depth + 1, rows);
    }

    pub fn select_next(&mut self) {
        if !self.rows.is_empty() && self.selected_index < self.rows.len() - 1 {
            self.selected_index += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        if !self.rows.is_empty() {
            self.selected_index = self.rows.len() - 1;
        }
    }

    /// Expand the selected item; populates it on first expansion.
    pub fn expand_selected(&mut self, model: &mut BrowserModel) {
        let Some(row) = self.selected() else {
            return;
        };
        if !row.expandable || row.is_expanded {
            return;
        }
        let id = row.id;
        self.expanded.insert(id);
        self.flatten(model);
    }

    /// Collapse the selected item, or jump to its parent.
    pub fn collapse_selected(&mut self, model: &mut BrowserModel) {
        let Some(row) = self.selected() else {
            return;
        };
        let (id, index, is_expanded) = (row.id, row.index, row.is_expanded);
        if is_expanded {
            self.expanded.remove(&id);
            self.flatten(model);
            return;
        }
        if let Some(position) = model
            .parent(&index)
            .and_then(|parent| self.find_index(parent.item))
        {
            self.selected_index = position;
        }
    }

    pub fn toggle_selected(&mut self, model: &mut BrowserModel) {
        match self.selected().map(|row| row.is_expanded) {
            Some(true) => self.collapse_selected(model),
            Some(false) => self.expand_selected(model),
            None => {}
        }
    }

    pub fn set_sort_order(&mut self, model: &mut BrowserModel, sort_order: SortOrder) {
        self.sort_order = sort_order;
        self.flatten(model);
    }

    /// Update the scroll offset to ensure the selected row is visible.
    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if self.selected_index >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected_index - visible_height + 1;
        }
    }

    /// Bring the view up to date with a model diff.
    pub fn apply_changes(&mut self, model: &mut BrowserModel, changes: &[ModelChange]) {
        if changes.is_empty() {
            return;
        }
        if changes.iter().any(|c| matches!(c, ModelChange::Reset)) {
            self.expanded.clear();
            self.selected_index = 0;
            self.scroll_offset = 0;
        }
        self.flatten(model);
    }

    /// Run a model mutation and restore expansion and selection by label
    /// afterwards.
    pub fn mutate<F>(&mut self, model: &mut BrowserModel, mutation: F) -> Result<Vec<ModelChange>>
    where
        F: FnOnce(&mut BrowserModel) -> Result<Vec<ModelChange>>,
    {
        let expanded = self.expanded_label_paths(model);
        let selected = self.selected().map(|row| label_path(model, row.id));
        let changes = mutation(model)?;
        self.apply_changes(model, &changes);
        self.restore_expanded(model, &expanded);
        if let Some(id) = selected.and_then(|path| find_by_label_path(model, &path)) {
            if let Some(index) = self.find_index(id) {
                self.selected_index = index;
            }
        }
        Ok(changes)
    }

    /// Label paths of all expanded items.
    pub fn expanded_label_paths(&self, model: &BrowserModel) -> Vec<LabelPath> {
        self.expanded
            .iter()
            .filter(|&&id| model.tree().contains(id))
            .map(|&id| label_path(model, id))
            .collect()
    }

    /// Re-expand items by label path, ancestors before descendants.
    pub fn restore_expanded(&mut self, model: &mut BrowserModel, paths: &[LabelPath]) {
        let mut ordered: Vec<&LabelPath> = paths.iter().collect();
        ordered.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        for path in ordered {
            let mut current = model.root();
            let mut found = true;
            for label in path {
                if model.ensure_populated(current).is_err() {
                    found = false;
                    break;
                }
                match model
                    .tree()
                    .children(current)
                    .iter()
                    .copied()
                    .find(|&c| model.tree().get(c).map_or(false, |i| i.data(0) == label))
                {
                    Some(child) => current = child,
                    None => {
                        found = false;
                        break;
                    }
                }
            }
            if found && current != model.root() {
                self.expanded.insert(current);
            }
        }
        self.flatten(model);
    }
}

/// Labels of `id` and its ancestors, excluding the root.
pub fn label_path(model: &BrowserModel, id: ItemId) -> LabelPath {
    let mut labels = Vec::new();
    let mut current = Some(id);
    while let Some(cur) = current {
        if cur == model.root() {
            break;
        }
        if let Some(item) = model.tree().get(cur) {
            labels.push(item.data(0).to_string());
        }
        current = model.tree().parent(cur);
    }
    labels.reverse();
    labels
}

/// Materialized item at `path`, if any.
pub fn find_by_label_path(model: &BrowserModel, path: &[String]) -> Option<ItemId> {
    let mut current = model.root();
    for label in path {
        current = model
            .tree()
            .children(current)
            .iter()
            .copied()
            .find(|&c| model.tree().get(c).map_or(false, |i| i.data(0) == *label))?;
    }
    (current != model.root()).then_some(current)
}
