use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use super::change::{ModelChange, ModelObserver, ModelSignals};
use super::item::{BrowserItem, Icon, ItemId, ItemKind, ItemType, Population};
use super::order::{SortOrder, SortPolicy};
use super::populate;
use super::tree::BrowserTree;
use crate::clbr::{ClassBrowsers, SourceExtensions, SourceReader};
use crate::error::Result;

/// Header text of the single visible column.
pub const HEADER: &str = "Name";

/// Settings that influence discovery and ordering.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub sort: SortPolicy,
    pub extensions: SourceExtensions,
    /// Directories listed under the `sys.path` node.
    pub sys_path: Vec<PathBuf>,
    pub show_hidden: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            sort: SortPolicy::default(),
            extensions: SourceExtensions::default(),
            sys_path: default_sys_path(),
            show_hidden: false,
        }
    }
}

/// The interpreter search path: the current directory followed by
/// `$PYTHONPATH`.
pub fn default_sys_path() -> Vec<PathBuf> {
    let mut path = vec![PathBuf::new()];
    if let Some(value) = std::env::var_os("PYTHONPATH") {
        path.extend(std::env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()));
    }
    path
}

/// Position of an item as seen by a view: row within its parent, column,
/// and the item itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelIndex {
    pub row: usize,
    pub column: usize,
    pub item: ItemId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRole {
    Display,
    Decoration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemData {
    Text(String),
    Icon(Icon),
}

/// Lazily populated tree of directories, files and source outlines.
///
/// Addressing follows the usual item-model conventions: `None` as a parent
/// index means the invisible root. Asking for the row count of an
/// unpopulated item populates it first.
pub struct BrowserModel {
    tree: BrowserTree,
    toplevel_dirs: Vec<PathBuf>,
    prog_dir: Option<ItemId>,
    settings: BrowserSettings,
    reader: Box<dyn SourceReader>,
    signals: ModelSignals,
}

impl std::fmt::Debug for BrowserModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserModel")
            .field("items", &self.tree.len())
            .field("toplevel_dirs", &self.toplevel_dirs)
            .field("settings", &self.settings)
            .finish()
    }
}

impl BrowserModel {
    pub fn new(settings: BrowserSettings, toplevel_dirs: &[PathBuf]) -> Self {
        Self::with_reader(settings, toplevel_dirs, Box::new(ClassBrowsers))
    }

    /// Build a model using `reader` to outline source files.
    pub fn with_reader(
        settings: BrowserSettings,
        toplevel_dirs: &[PathBuf],
        reader: Box<dyn SourceReader>,
    ) -> Self {
        let mut model = Self {
            tree: BrowserTree::new(BrowserItem::root(HEADER)),
            toplevel_dirs: Vec::new(),
            prog_dir: None,
            settings,
            reader,
            signals: ModelSignals::default(),
        };
        let items = model.toplevel_items(toplevel_dirs);
        let root = model.tree.root();
        if let Err(err) = model.insert_rows(root, items, false) {
            tracing::warn!(%err, "initial population failed");
        }
        tracing::debug!(dirs = model.toplevel_dirs.len(), "model populated");
        model
    }

    /// The `sys.path` entry plus one item per new top-level directory.
    fn toplevel_items(&mut self, dirs: &[PathBuf]) -> Vec<BrowserItem> {
        let mut items = vec![BrowserItem::sys_path()];
        for dir in dirs {
            let item = BrowserItem::directory(dir, true);
            let Some(path) = item.path().map(Path::to_path_buf) else {
                continue;
            };
            if self.toplevel_dirs.contains(&path) {
                continue;
            }
            self.toplevel_dirs.push(path);
            items.push(item);
        }
        items
    }

    /// Register an observer for bracketed change notifications.
    pub fn connect(&mut self, observer: Box<dyn ModelObserver>) {
        self.signals.connect(observer);
    }

    pub fn tree(&self) -> &BrowserTree {
        &self.tree
    }

    pub fn root(&self) -> ItemId {
        self.tree.root()
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    pub fn toplevel_dirs(&self) -> &[PathBuf] {
        &self.toplevel_dirs
    }

    pub fn program_dir(&self) -> Option<ItemId> {
        self.prog_dir
    }

    pub fn set_sort_policy(&mut self, policy: SortPolicy) {
        self.settings.sort = policy;
    }

    /// Change hidden-file visibility; populated directories are rescanned.
    pub fn set_show_hidden(&mut self, show_hidden: bool) -> Result<Vec<ModelChange>> {
        if self.settings.show_hidden == show_hidden {
            return Ok(Vec::new());
        }
        self.settings.show_hidden = show_hidden;
        let dirs: Vec<ItemId> = self
            .tree
            .descendants(self.tree.root())
            .into_iter()
            .filter(|&id| {
                self.tree
                    .get(id)
                    .map_or(false, |i| i.item_type() == ItemType::Directory && i.is_populated())
            })
            .collect();
        self.repopulate_all(dirs)
    }

    // ── Addressing ──────────────────────────────────────────────────────

    fn parent_item(&self, parent: Option<&ModelIndex>) -> ItemId {
        parent.map_or(self.tree.root(), |index| index.item)
    }

    pub fn item(&self, index: &ModelIndex) -> Option<&BrowserItem> {
        self.tree.get(index.item)
    }

    /// Index of the child at `row`, populating `parent` if needed.
    pub fn index(&mut self, row: usize, column: usize, parent: Option<&ModelIndex>) -> Option<ModelIndex> {
        if row >= self.row_count(parent) || column >= self.column_count(parent) {
            return None;
        }
        let parent = self.parent_item(parent);
        let item = self.tree.child(parent, row).ok()?;
        Some(ModelIndex { row, column, item })
    }

    /// Index of the parent of `index`; `None` for top-level items.
    pub fn parent(&self, index: &ModelIndex) -> Option<ModelIndex> {
        let parent = self.tree.parent(index.item)?;
        if parent == self.tree.root() {
            return None;
        }
        let row = self.tree.row(parent).ok()?;
        Some(ModelIndex {
            row,
            column: 0,
            item: parent,
        })
    }

    pub fn row_count(&mut self, parent: Option<&ModelIndex>) -> usize {
        if parent.map_or(false, |p| p.column > 0) {
            return 0;
        }
        let id = self.parent_item(parent);
        if let Err(err) = self.ensure_populated(id) {
            tracing::debug!(%err, "row count of unknown item");
            return 0;
        }
        self.tree.child_count(id)
    }

    pub fn column_count(&self, parent: Option<&ModelIndex>) -> usize {
        let id = self.parent_item(parent);
        self.tree.get(id).map_or(0, |item| item.column_count() + 1)
    }

    /// Lazily populated items report children before they are populated.
    pub fn has_children(&self, parent: Option<&ModelIndex>) -> bool {
        if parent.map_or(false, |p| p.column > 0) {
            return false;
        }
        let id = self.parent_item(parent);
        match self.tree.get(id) {
            Some(item) if item.is_lazy_populated() && !item.is_populated() => true,
            Some(item) => item.child_count() > 0,
            None => false,
        }
    }

    pub fn data(&self, index: &ModelIndex, role: ItemRole) -> Option<ItemData> {
        let item = self.item(index)?;
        match role {
            ItemRole::Display => {
                if index.column < item.column_count() {
                    Some(ItemData::Text(item.data(index.column).to_string()))
                } else if index.column < self.column_count(self.parent(index).as_ref()) {
                    Some(ItemData::Text(String::new()))
                } else {
                    None
                }
            }
            ItemRole::Decoration if index.column == 0 => Some(ItemData::Icon(item.icon())),
            ItemRole::Decoration => None,
        }
    }

    pub fn header_data(&self, section: usize) -> Option<String> {
        let root = self.tree.get(self.tree.root())?;
        (section < root.column_count()).then(|| root.data(section).to_string())
    }

    fn display_order(&self, a: ItemId, b: ItemId, column: usize, sort_order: SortOrder) -> Ordering {
        let policy = &self.settings.sort;
        match (self.tree.get(a), self.tree.get(b)) {
            (Some(x), Some(y)) if x.less_than(y, column, sort_order, policy) => Ordering::Less,
            (Some(x), Some(y)) if y.less_than(x, column, sort_order, policy) => Ordering::Greater,
            _ => Ordering::Equal,
        }
    }

    /// Children of `id` in display order.
    pub fn sorted_children(&self, id: ItemId, column: usize, sort_order: SortOrder) -> Vec<ItemId> {
        let mut children = self.tree.children(id).to_vec();
        children.sort_by(|&a, &b| self.display_order(a, b, column, sort_order));
        children
    }

    /// Column-0 indexes of the rows under `parent` in display order,
    /// populating `parent` first.
    pub fn sorted_indexes(
        &mut self,
        parent: Option<&ModelIndex>,
        column: usize,
        sort_order: SortOrder,
    ) -> Vec<ModelIndex> {
        let count = self.row_count(parent);
        let mut indexes: Vec<ModelIndex> = (0..count)
            .filter_map(|row| self.index(row, 0, parent))
            .collect();
        indexes.sort_by(|a, b| {
            self.display_order(a.item, b.item, column, sort_order)
                .then(a.row.cmp(&b.row))
        });
        indexes
    }

    // ── Population ──────────────────────────────────────────────────────

    /// Populate `id` if it has not been populated yet.
    pub fn ensure_populated(&mut self, id: ItemId) -> Result<Vec<ModelChange>> {
        if self.tree.item(id)?.is_populated() {
            return Ok(Vec::new());
        }
        self.populate_item(id, false)
    }

    /// Discover and attach the children of `id`.
    ///
    /// Observers are only notified when `repopulate` is set; the returned
    /// diff always describes the insertion.
    pub fn populate_item(&mut self, id: ItemId, repopulate: bool) -> Result<Vec<ModelChange>> {
        if self.tree.item(id)?.population() != Population::Unpopulated {
            return Ok(Vec::new());
        }
        self.tree.item_mut(id)?.set_population(Population::Populating);
        let children = self.discover(self.tree.item(id)?);
        self.tree.item_mut(id)?.set_population(Population::Populated);
        tracing::debug!(item = self.tree.item(id)?.data(0), count = children.len(), "populated");
        self.insert_rows(id, children, repopulate)
    }

    fn discover(&self, item: &BrowserItem) -> Vec<BrowserItem> {
        let settings = &self.settings;
        match item.kind() {
            ItemKind::Directory { path } => {
                populate::directory_children(path, &settings.extensions, settings.show_hidden)
            }
            ItemKind::SysPath => populate::sys_path_children(&settings.sys_path),
            ItemKind::File {
                path,
                language: Some(language),
                module_name,
            } => populate::file_children(self.reader.as_ref(), path, module_name, *language),
            ItemKind::Class { class } => populate::class_children(class),
            ItemKind::Method { function } => populate::method_children(function),
            ItemKind::Attributes { attributes } => populate::attribute_children(attributes),
            _ => Vec::new(),
        }
    }

    fn insert_rows(
        &mut self,
        parent: ItemId,
        items: Vec<BrowserItem>,
        notify: bool,
    ) -> Result<Vec<ModelChange>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let first = self.tree.child_count(parent);
        let last = first + items.len() - 1;
        let tree = &mut self.tree;
        let insert = || -> Result<()> {
            for item in items {
                tree.append_child(parent, item)?;
            }
            Ok(())
        };
        if notify {
            self.signals.emit_rows_inserted(parent, first, last, insert)?;
        } else {
            insert()?;
        }
        Ok(vec![ModelChange::RowsInserted {
            parent,
            first,
            last,
        }])
    }

    /// Drop the children of `id` and populate it again.
    pub fn repopulate_item(&mut self, id: ItemId) -> Result<Vec<ModelChange>> {
        let item = self.tree.item(id)?;
        if !item.is_lazy_populated() {
            return Ok(Vec::new());
        }
        let mut changes = Vec::new();
        let count = item.child_count();
        if count > 0 {
            let tree = &mut self.tree;
            self.signals
                .emit_rows_removed(id, 0, count - 1, || tree.remove_children(id))?;
            changes.push(ModelChange::RowsRemoved {
                parent: id,
                first: 0,
                last: count - 1,
            });
        }
        self.tree.item_mut(id)?.set_population(Population::Unpopulated);
        changes.extend(self.populate_item(id, true)?);
        Ok(changes)
    }

    /// Repopulate every populated file or directory item for `path`.
    pub fn repopulate_path(&mut self, path: &Path) -> Result<Vec<ModelChange>> {
        let targets: Vec<ItemId> = self
            .tree
            .descendants(self.tree.root())
            .into_iter()
            .filter(|&id| {
                self.tree.get(id).map_or(false, |item| {
                    matches!(item.item_type(), ItemType::Directory | ItemType::File)
                        && item.is_lazy_populated()
                        && item.is_populated()
                        && item.path() == Some(path)
                })
            })
            .collect();
        self.repopulate_all(targets)
    }

    fn repopulate_all(&mut self, ids: Vec<ItemId>) -> Result<Vec<ModelChange>> {
        let mut changes = Vec::new();
        for id in ids {
            // An earlier repopulation may have dropped this item.
            if self.tree.contains(id) {
                changes.extend(self.repopulate_item(id)?);
            }
        }
        Ok(changes)
    }

    // ── Top-level entries ───────────────────────────────────────────────

    /// Append `item` under `parent` (the root when `None`) with notifications.
    pub fn add_item(&mut self, item: BrowserItem, parent: Option<ItemId>) -> Result<(ItemId, ModelChange)> {
        let parent = parent.unwrap_or(self.tree.root());
        self.tree.item(parent)?;
        let row = self.tree.child_count(parent);
        let tree = &mut self.tree;
        let id = self
            .signals
            .emit_rows_inserted(parent, row, row, || tree.append_child(parent, item))?;
        Ok((
            id,
            ModelChange::RowsInserted {
                parent,
                first: row,
                last: row,
            },
        ))
    }

    /// Add `dir` as a top-level entry unless it already is one.
    pub fn add_toplevel_dir(&mut self, dir: &Path) -> Result<Vec<ModelChange>> {
        let item = BrowserItem::directory(dir, true);
        let Some(path) = item.path().map(Path::to_path_buf) else {
            return Ok(Vec::new());
        };
        if self.toplevel_dirs.contains(&path) {
            return Ok(Vec::new());
        }
        let (_, change) = self.add_item(item, None)?;
        tracing::info!(dir = %path.display(), "added top-level directory");
        self.toplevel_dirs.push(path);
        Ok(vec![change])
    }

    /// Remove a top-level directory entry. Other items are left alone.
    pub fn remove_toplevel_dir(&mut self, id: ItemId) -> Result<Vec<ModelChange>> {
        let root = self.tree.root();
        let item = self.tree.item(id)?;
        if item.parent() != Some(root) || item.item_type() != ItemType::Directory {
            return Ok(Vec::new());
        }
        let path = item.path().map(Path::to_path_buf);
        let row = self.tree.row(id)?;
        let tree = &mut self.tree;
        self.signals
            .emit_rows_removed(root, row, row, || tree.remove_child(root, id))?;
        if let Some(path) = path {
            tracing::info!(dir = %path.display(), "removed top-level directory");
            self.toplevel_dirs.retain(|d| d != &path);
        }
        if self.prog_dir == Some(id) {
            self.prog_dir = None;
        }
        Ok(vec![ModelChange::RowsRemoved {
            parent: root,
            first: row,
            last: row,
        }])
    }

    /// Show `dir` as the directory of the program being debugged, replacing
    /// the previous one.
    pub fn program_change(&mut self, dir: &Path) -> Result<Vec<ModelChange>> {
        let item = BrowserItem::directory(dir, true);
        let mut changes = Vec::new();
        if let Some(old) = self.prog_dir {
            if self.tree.get(old).and_then(|i| i.path()) == item.path() {
                return Ok(changes);
            }
            let root = self.tree.root();
            let row = self.tree.row(old)?;
            let tree = &mut self.tree;
            self.signals
                .emit_rows_removed(root, row, row, || tree.remove_child(root, old))?;
            changes.push(ModelChange::RowsRemoved {
                parent: root,
                first: row,
                last: row,
            });
            self.prog_dir = None;
        }
        let (id, change) = self.add_item(item, None)?;
        self.prog_dir = Some(id);
        changes.push(change);
        Ok(changes)
    }

    /// Discard every item below the root.
    pub fn clear(&mut self) -> Result<Vec<ModelChange>> {
        let root = self.tree.root();
        let tree = &mut self.tree;
        self.signals.emit_reset(|| tree.remove_children(root))?;
        self.toplevel_dirs.clear();
        self.prog_dir = None;
        Ok(vec![ModelChange::Reset])
    }

    /// Clear the model and rebuild its top-level entries, the program
    /// directory included. Everything is read from disk again on demand.
    pub fn reload(&mut self) -> Result<Vec<ModelChange>> {
        let dirs = self.toplevel_dirs.clone();
        let program = self
            .program_dir()
            .and_then(|id| self.tree.get(id))
            .and_then(|item| item.path())
            .map(Path::to_path_buf);

        let mut changes = self.clear()?;
        let items = self.toplevel_items(&dirs);
        let root = self.tree.root();
        changes.extend(self.insert_rows(root, items, true)?);
        if let Some(dir) = program {
            changes.extend(self.program_change(&dir)?);
        }
        tracing::info!(dirs = self.toplevel_dirs.len(), "model reloaded");
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::change::tests::Recorder;
    use crate::browser::tree::tests::assert_links;
    use crate::clbr::{ModuleOutline, SourceLanguage};
    use crate::error::AppError;
    use std::cell::Cell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn settings() -> BrowserSettings {
        BrowserSettings {
            sys_path: Vec::new(),
            ..BrowserSettings::default()
        }
    }

    fn setup_project() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(
            root.join("a.py"),
            "# -*- coding: latin-1 -*-\nclass A(object):\n    def __init__(self):\n        self.x = 1\n\n    def run(self):\n        pass\n\ndef helper():\n    pass\n",
        )
        .unwrap();
        fs::write(root.join("b.txt"), "notes").unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub").join("c.py"), "X = 1\n").unwrap();
        tmp
    }

    fn model_for(tmp: &TempDir) -> BrowserModel {
        BrowserModel::new(settings(), &[tmp.path().to_path_buf()])
    }

    fn toplevel(model: &BrowserModel) -> ItemId {
        model.tree().children(model.root())[1]
    }

    fn child_named(model: &BrowserModel, parent: ItemId, label: &str) -> ItemId {
        model
            .tree()
            .children(parent)
            .iter()
            .copied()
            .find(|&id| model.tree().get(id).unwrap().data(0) == label)
            .unwrap_or_else(|| panic!("no child {}", label))
    }

    fn labels(model: &BrowserModel, parent: ItemId) -> Vec<String> {
        model
            .sorted_children(parent, 0, SortOrder::Ascending)
            .iter()
            .map(|&id| model.tree().get(id).unwrap().data(0).to_string())
            .collect()
    }

    /// Populate everything materialized below `from`.
    fn populate_all(model: &mut BrowserModel, from: ItemId) {
        let mut pending = vec![from];
        while let Some(id) = pending.pop() {
            model.ensure_populated(id).unwrap();
            pending.extend(model.tree().children(id).iter().copied());
        }
    }

    fn text(model: &BrowserModel, index: &ModelIndex) -> String {
        match model.data(index, ItemRole::Display) {
            Some(ItemData::Text(text)) => text,
            other => panic!("unexpected display data {:?}", other),
        }
    }

    /// Reader that counts calls and returns an empty outline.
    struct CountingReader(Rc<Cell<usize>>);

    impl SourceReader for CountingReader {
        fn read_module(&self, _: &str, _: &[PathBuf], _: SourceLanguage) -> Result<ModuleOutline> {
            self.0.set(self.0.get() + 1);
            Ok(ModuleOutline::default())
        }
    }

    /// Reader that always fails.
    struct FailingReader;

    impl SourceReader for FailingReader {
        fn read_module(&self, module: &str, _: &[PathBuf], _: SourceLanguage) -> Result<ModuleOutline> {
            Err(AppError::ModuleNotFound(module.to_string()))
        }
    }

    #[test]
    fn initial_population_has_sys_path_and_dirs() {
        let tmp = setup_project();
        let model = model_for(&tmp);
        let top = model.tree().children(model.root());
        assert_eq!(top.len(), 2);
        assert_eq!(model.tree().get(top[0]).unwrap().item_type(), ItemType::SysPath);
        let dir = model.tree().get(top[1]).unwrap();
        assert_eq!(dir.data(0), tmp.path().display().to_string());
        assert!(!dir.is_populated());
        assert_eq!(model.toplevel_dirs(), &[tmp.path().to_path_buf()]);
    }

    #[test]
    fn directory_population_creates_unpopulated_children() {
        let tmp = setup_project();
        let mut model = model_for(&tmp);
        let dir = toplevel(&model);
        let index = ModelIndex {
            row: 1,
            column: 0,
            item: dir,
        };
        assert!(model.has_children(Some(&index)));
        assert_eq!(model.row_count(Some(&index)), 3);

        let a = child_named(&model, dir, "a.py");
        let sub = child_named(&model, dir, "sub");
        let txt = child_named(&model, dir, "b.txt");
        assert!(!model.tree().get(a).unwrap().is_populated());
        assert!(!model.tree().get(sub).unwrap().is_populated());
        assert!(model.tree().get(txt).unwrap().is_populated());
        assert_eq!(labels(&model, dir), vec!["sub", "a.py", "b.txt"]);
    }

    #[test]
    fn populate_is_idempotent() {
        let tmp = setup_project();
        let mut model = model_for(&tmp);
        let dir = toplevel(&model);
        let first = model.populate_item(dir, false).unwrap();
        assert_eq!(
            first,
            vec![ModelChange::RowsInserted {
                parent: dir,
                first: 0,
                last: 2
            }]
        );
        assert!(model.populate_item(dir, false).unwrap().is_empty());
        assert_eq!(model.tree().child_count(dir), 3);
    }

    #[test]
    fn empty_directory_is_populated_with_no_children() {
        let tmp = TempDir::new().unwrap();
        let mut model = model_for(&tmp);
        let dir = toplevel(&model);
        assert!(model.populate_item(dir, false).unwrap().is_empty());
        assert!(model.tree().get(dir).unwrap().is_populated());
        let index = ModelIndex {
            row: 1,
            column: 0,
            item: dir,
        };
        assert!(!model.has_children(Some(&index)));
    }

    #[test]
    fn file_outline_shows_coding_first() {
        let tmp = setup_project();
        let mut model = model_for(&tmp);
        let dir = toplevel(&model);
        model.ensure_populated(dir).unwrap();
        let a = child_named(&model, dir, "a.py");
        model.ensure_populated(a).unwrap();
        assert_eq!(labels(&model, a), vec!["Coding: latin-1", "A(object)", "helper()"]);

        let class = child_named(&model, a, "A(object)");
        model.ensure_populated(class).unwrap();
        assert_eq!(labels(&model, class), vec!["__init__(self)", "run(self)", "Attributes"]);

        let attrs = child_named(&model, class, "Attributes");
        model.ensure_populated(attrs).unwrap();
        assert_eq!(labels(&model, attrs), vec!["x"]);
    }

    #[test]
    fn reader_failure_yields_empty_populated_file() {
        let tmp = setup_project();
        let mut model =
            BrowserModel::with_reader(settings(), &[tmp.path().to_path_buf()], Box::new(FailingReader));
        let dir = toplevel(&model);
        model.ensure_populated(dir).unwrap();
        let a = child_named(&model, dir, "a.py");
        assert!(model.ensure_populated(a).unwrap().is_empty());
        let item = model.tree().get(a).unwrap();
        assert!(item.is_populated());
        assert_eq!(item.child_count(), 0);
    }

    #[test]
    fn reader_called_once_per_population() {
        let tmp = setup_project();
        let calls = Rc::new(Cell::new(0));
        let mut model = BrowserModel::with_reader(
            settings(),
            &[tmp.path().to_path_buf()],
            Box::new(CountingReader(Rc::clone(&calls))),
        );
        let dir = toplevel(&model);
        model.ensure_populated(dir).unwrap();
        let a = child_named(&model, dir, "a.py");
        model.ensure_populated(a).unwrap();
        model.ensure_populated(a).unwrap();
        assert_eq!(calls.get(), 1);
        model.repopulate_item(a).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn repopulate_brackets_removal_and_insertion() {
        let tmp = setup_project();
        let mut model = model_for(&tmp);
        let recorder = Recorder::default();
        model.connect(Box::new(recorder.clone()));

        let dir = toplevel(&model);
        model.ensure_populated(dir).unwrap();
        // Lazy population through addressing does not notify.
        assert!(recorder.events().is_empty());

        fs::write(tmp.path().join("d.py"), "").unwrap();
        let changes = model.repopulate_item(dir).unwrap();
        assert_eq!(
            changes,
            vec![
                ModelChange::RowsRemoved {
                    parent: dir,
                    first: 0,
                    last: 2
                },
                ModelChange::RowsInserted {
                    parent: dir,
                    first: 0,
                    last: 3
                },
            ]
        );
        assert_eq!(
            recorder.events(),
            vec![
                ("about_to_remove", 0, 2),
                ("removed", 0, 2),
                ("about_to_insert", 0, 3),
                ("inserted", 0, 3),
            ]
        );
    }

    #[test]
    fn repopulate_path_only_touches_populated_matches() {
        let tmp = setup_project();
        let mut model = model_for(&tmp);
        // Not populated yet: nothing to do.
        assert!(model.repopulate_path(tmp.path()).unwrap().is_empty());

        let dir = toplevel(&model);
        model.ensure_populated(dir).unwrap();
        fs::write(tmp.path().join("e.py"), "").unwrap();
        let changes = model.repopulate_path(tmp.path()).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(model.tree().child_count(dir), 4);
    }

    #[test]
    fn addressing_round_trip() {
        let tmp = setup_project();
        let mut model = model_for(&tmp);
        assert_eq!(model.row_count(None), 2);
        assert_eq!(model.column_count(None), 2);
        assert_eq!(model.header_data(0).as_deref(), Some(HEADER));
        assert_eq!(model.header_data(1), None);

        let dir = model.index(1, 0, None).unwrap();
        assert_eq!(model.parent(&dir), None);
        let child = model.index(0, 0, Some(&dir)).unwrap();
        assert_eq!(model.parent(&child), Some(dir));
        assert!(model.index(7, 0, Some(&dir)).is_none());

        let beside = ModelIndex { column: 1, ..dir };
        assert_eq!(model.row_count(Some(&beside)), 0);
        assert!(!model.has_children(Some(&beside)));
        assert_eq!(
            model.data(&beside, ItemRole::Display),
            Some(ItemData::Text(String::new()))
        );
        assert_eq!(
            model.data(&dir, ItemRole::Decoration),
            Some(ItemData::Icon(Icon::DirClosed))
        );
    }

    #[test]
    fn sorted_indexes_follow_display_order() {
        let tmp = setup_project();
        let mut model = model_for(&tmp);
        let top = model.sorted_indexes(None, 0, SortOrder::Ascending);
        assert_eq!(top.len(), 2);
        let dir = top
            .iter()
            .copied()
            .find(|index| index.item == toplevel(&model))
            .unwrap();

        let children = model.sorted_indexes(Some(&dir), 0, SortOrder::Ascending);
        let names: Vec<String> = children.iter().map(|i| text(&model, i)).collect();
        assert_eq!(names, vec!["sub", "a.py", "b.txt"]);
        for index in &children {
            assert_eq!(model.parent(index), Some(dir));
            assert_eq!(model.tree().row(index.item).unwrap(), index.row);
        }

        let reversed = model.sorted_indexes(Some(&dir), 0, SortOrder::Descending);
        let names: Vec<String> = reversed.iter().map(|i| text(&model, i)).collect();
        assert_eq!(names, vec!["sub", "b.txt", "a.py"]);
    }

    #[test]
    fn repopulating_twice_yields_same_children() {
        let tmp = setup_project();
        let mut model = model_for(&tmp);
        let dir = toplevel(&model);
        model.ensure_populated(dir).unwrap();
        let before = labels(&model, dir);
        model.repopulate_item(dir).unwrap();
        model.repopulate_item(dir).unwrap();
        assert_eq!(labels(&model, dir), before);

        let a = child_named(&model, dir, "a.py");
        model.ensure_populated(a).unwrap();
        let before = labels(&model, a);
        model.repopulate_item(a).unwrap();
        model.repopulate_item(a).unwrap();
        assert_eq!(labels(&model, a), before);

        let class = child_named(&model, a, "A(object)");
        model.ensure_populated(class).unwrap();
        let before = labels(&model, class);
        model.repopulate_item(class).unwrap();
        model.repopulate_item(class).unwrap();
        assert_eq!(labels(&model, class), before);
        assert_eq!(before, vec!["__init__(self)", "run(self)", "Attributes"]);
    }

    #[test]
    fn populated_model_keeps_parent_links() {
        let tmp = setup_project();
        let mut model = model_for(&tmp);
        let dir = toplevel(&model);
        populate_all(&mut model, dir);
        assert!(model.tree().len() > 10);
        assert_links(model.tree());

        let a = child_named(&model, dir, "a.py");
        model.repopulate_item(a).unwrap();
        assert_links(model.tree());

        let class = child_named(&model, a, "A(object)");
        model.ensure_populated(class).unwrap();
        model.repopulate_item(class).unwrap();
        assert_links(model.tree());
    }

    #[test]
    fn reload_rebuilds_toplevel_entries() {
        let tmp = setup_project();
        let prog = TempDir::new().unwrap();
        let mut model = model_for(&tmp);
        model.program_change(prog.path()).unwrap();
        let dir = toplevel(&model);
        model.ensure_populated(dir).unwrap();
        let recorder = Recorder::default();
        model.connect(Box::new(recorder.clone()));

        let changes = model.reload().unwrap();
        assert_eq!(changes[0], ModelChange::Reset);
        assert!(!model.tree().contains(dir));
        assert_eq!(model.toplevel_dirs(), &[tmp.path().to_path_buf()]);
        assert_eq!(model.tree().child_count(model.root()), 3);
        let prog_id = model.program_dir().unwrap();
        assert_eq!(model.tree().get(prog_id).unwrap().path(), Some(prog.path()));

        let events = recorder.events();
        assert_eq!(&events[..2], &[("about_to_reset", 0, 0), ("reset", 0, 0)]);
        assert!(events.contains(&("inserted", 0, 1)));
        assert!(events.contains(&("inserted", 2, 2)));
    }

    #[test]
    fn toplevel_dirs_add_remove() {
        let tmp = setup_project();
        let other = TempDir::new().unwrap();
        let mut model = model_for(&tmp);
        let recorder = Recorder::default();
        model.connect(Box::new(recorder.clone()));

        assert_eq!(model.add_toplevel_dir(other.path()).unwrap().len(), 1);
        assert!(model.add_toplevel_dir(other.path()).unwrap().is_empty());
        assert_eq!(model.toplevel_dirs().len(), 2);

        let first = toplevel(&model);
        let changes = model.remove_toplevel_dir(first).unwrap();
        assert_eq!(
            changes,
            vec![ModelChange::RowsRemoved {
                parent: model.root(),
                first: 1,
                last: 1
            }]
        );
        assert_eq!(model.toplevel_dirs(), &[other.path().to_path_buf()]);
        assert!(!model.tree().contains(first));
        assert_eq!(
            recorder.events(),
            vec![
                ("about_to_insert", 2, 2),
                ("inserted", 2, 2),
                ("about_to_remove", 1, 1),
                ("removed", 1, 1),
            ]
        );

        // The sys.path entry is not a top-level directory.
        let sys = model.tree().children(model.root())[0];
        assert!(model.remove_toplevel_dir(sys).unwrap().is_empty());
    }

    #[test]
    fn program_change_replaces_entry() {
        let tmp = setup_project();
        let prog_a = TempDir::new().unwrap();
        let prog_b = TempDir::new().unwrap();
        let mut model = model_for(&tmp);

        assert_eq!(model.program_change(prog_a.path()).unwrap().len(), 1);
        assert!(model.program_change(prog_a.path()).unwrap().is_empty());
        assert_eq!(model.tree().child_count(model.root()), 3);

        let changes = model.program_change(prog_b.path()).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(model.tree().child_count(model.root()), 3);
        let prog = model.program_dir().unwrap();
        assert_eq!(model.tree().get(prog).unwrap().path(), Some(prog_b.path()));
    }

    #[test]
    fn clear_resets_model() {
        let tmp = setup_project();
        let mut model = model_for(&tmp);
        let dir = toplevel(&model);
        model.ensure_populated(dir).unwrap();
        assert_eq!(model.clear().unwrap(), vec![ModelChange::Reset]);
        assert_eq!(model.tree().len(), 1);
        assert!(model.toplevel_dirs().is_empty());
        assert!(!model.tree().contains(dir));
    }

    #[test]
    fn show_hidden_rescans_directories() {
        let tmp = setup_project();
        fs::write(tmp.path().join(".hidden"), "").unwrap();
        let mut model = model_for(&tmp);
        let dir = toplevel(&model);
        model.ensure_populated(dir).unwrap();
        assert_eq!(model.tree().child_count(dir), 3);
        model.set_show_hidden(true).unwrap();
        assert_eq!(model.tree().child_count(dir), 4);
    }

    #[test]
    fn sys_path_lists_configured_directories() {
        let tmp = setup_project();
        let mut model = BrowserModel::new(
            BrowserSettings {
                sys_path: vec![tmp.path().join("sub")],
                ..BrowserSettings::default()
            },
            &[],
        );
        let sys = model.tree().children(model.root())[0];
        model.ensure_populated(sys).unwrap();
        assert_eq!(
            labels(&model, sys),
            vec![tmp.path().join("sub").display().to_string()]
        );
    }

    #[test]
    fn unknown_item_is_an_error() {
        let tmp = setup_project();
        let mut model = model_for(&tmp);
        let dir = toplevel(&model);
        model.remove_toplevel_dir(dir).unwrap();
        assert!(matches!(
            model.populate_item(dir, false),
            Err(AppError::UnknownItem)
        ));
    }
}
