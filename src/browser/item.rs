use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use slotmap::new_key_type;

use super::order::{self, SortOrder, SortPolicy};
use crate::clbr::{
    Attribute, AttributeMap, Class, Coding, Function, SourceExtensions, SourceLanguage, Visibility,
};
use crate::error::{AppError, Result};
use crate::fs::filetype::{file_ext, FileKind};

new_key_type! {
    /// Stable handle to an item in a [`BrowserTree`](super::tree::BrowserTree).
    ///
    /// Ids become invalid when the item (or one of its ancestors) is removed.
    pub struct ItemId;
}

/// Type tag of a browser item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Root,
    Directory,
    SysPath,
    File,
    Class,
    Method,
    Attributes,
    Attribute,
    Coding,
}

impl ItemType {
    pub fn label(&self) -> &'static str {
        match self {
            ItemType::Root => "root",
            ItemType::Directory => "directory",
            ItemType::SysPath => "sys_path",
            ItemType::File => "file",
            ItemType::Class => "class",
            ItemType::Method => "method",
            ItemType::Attributes => "attributes",
            ItemType::Attribute => "attribute",
            ItemType::Coding => "coding",
        }
    }
}

/// Icon identifiers; the front end maps them to glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Icon {
    Empty,
    DirClosed,
    FilePython,
    FilePython2,
    FileRuby,
    FileDesigner,
    FileLinguist,
    FileLinguist2,
    FileResource,
    FileProject,
    FileMultiProject,
    FileIdl,
    FilePixmap,
    FileSvg,
    FileD,
    FileMisc,
    Class,
    ClassProtected,
    ClassPrivate,
    Method,
    MethodProtected,
    MethodPrivate,
    Attributes,
    Attribute,
    AttributeProtected,
    AttributePrivate,
    TextEncoding,
}

impl Icon {
    pub fn name(&self) -> &'static str {
        match self {
            Icon::Empty => "empty",
            Icon::DirClosed => "dirClosed",
            Icon::FilePython => "filePython",
            Icon::FilePython2 => "filePython2",
            Icon::FileRuby => "fileRuby",
            Icon::FileDesigner => "fileDesigner",
            Icon::FileLinguist => "fileLinguist",
            Icon::FileLinguist2 => "fileLinguist2",
            Icon::FileResource => "fileResource",
            Icon::FileProject => "fileProject",
            Icon::FileMultiProject => "fileMultiProject",
            Icon::FileIdl => "fileIDL",
            Icon::FilePixmap => "filePixmap",
            Icon::FileSvg => "fileSvg",
            Icon::FileD => "fileD",
            Icon::FileMisc => "fileMisc",
            Icon::Class => "class",
            Icon::ClassProtected => "class_protected",
            Icon::ClassPrivate => "class_private",
            Icon::Method => "method",
            Icon::MethodProtected => "method_protected",
            Icon::MethodPrivate => "method_private",
            Icon::Attributes => "attributes",
            Icon::Attribute => "attribute",
            Icon::AttributeProtected => "attribute_protected",
            Icon::AttributePrivate => "attribute_private",
            Icon::TextEncoding => "textencoding",
        }
    }

    fn for_class(v: Visibility) -> Self {
        match v {
            Visibility::Public => Icon::Class,
            Visibility::Protected => Icon::ClassProtected,
            Visibility::Private => Icon::ClassPrivate,
        }
    }

    fn for_method(v: Visibility) -> Self {
        match v {
            Visibility::Public => Icon::Method,
            Visibility::Protected => Icon::MethodProtected,
            Visibility::Private => Icon::MethodPrivate,
        }
    }

    fn for_attribute(v: Visibility) -> Self {
        match v {
            Visibility::Public => Icon::Attribute,
            Visibility::Protected => Icon::AttributeProtected,
            Visibility::Private => Icon::AttributePrivate,
        }
    }
}

/// Lazy population state of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Population {
    Unpopulated,
    Populating,
    Populated,
}

/// Type-specific payload of a browser item.
#[derive(Debug, Clone)]
pub enum ItemKind {
    Root,
    Directory {
        path: PathBuf,
    },
    SysPath,
    File {
        path: PathBuf,
        /// Reader language; `None` for files without an outline.
        language: Option<SourceLanguage>,
        module_name: String,
    },
    Class {
        class: Arc<Class>,
    },
    Method {
        function: Arc<Function>,
    },
    Attributes {
        attributes: AttributeMap,
    },
    Attribute {
        attribute: Arc<Attribute>,
    },
    Coding {
        lineno: usize,
    },
}

/// One entry of the browser hierarchy.
///
/// Children are owned by the tree; an item only records their ids and the
/// id of its parent.
#[derive(Debug, Clone)]
pub struct BrowserItem {
    pub(super) parent: Option<ItemId>,
    pub(super) children: Vec<ItemId>,
    item_data: Vec<String>,
    icon: Icon,
    kind: ItemKind,
    population: Population,
    lazy_population: bool,
}

impl BrowserItem {
    fn new(label: String, icon: Icon, kind: ItemKind, lazy: bool) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            item_data: vec![label],
            icon,
            kind,
            population: if lazy {
                Population::Unpopulated
            } else {
                Population::Populated
            },
            lazy_population: lazy,
        }
    }

    /// The invisible root; its single column is the header text.
    pub fn root(header: &str) -> Self {
        Self::new(header.to_string(), Icon::Empty, ItemKind::Root, false)
    }

    /// A directory, labelled with its full path or just its name.
    pub fn directory(path: &Path, full: bool) -> Self {
        let path = absolute(path);
        let label = if full {
            path.display().to_string()
        } else {
            file_name(&path)
        };
        Self::new(label, Icon::DirClosed, ItemKind::Directory { path }, true)
    }

    /// The interpreter search path entry.
    pub fn sys_path() -> Self {
        Self::new("sys.path".to_string(), Icon::FilePython, ItemKind::SysPath, true)
    }

    /// A file; source files get a module name and lazy population.
    pub fn file(path: &Path, exts: &SourceExtensions, language: Option<SourceLanguage>) -> Self {
        let path = absolute(path);
        let ext = file_ext(&path);
        let kind = FileKind::classify(&ext, exts, language);
        let icon = match kind {
            FileKind::Source(SourceLanguage::Python) if ext == ".py" => Icon::FilePython,
            FileKind::Source(SourceLanguage::Python) => Icon::FilePython2,
            FileKind::Source(SourceLanguage::Python3) => Icon::FilePython,
            FileKind::Source(SourceLanguage::Ruby) => Icon::FileRuby,
            FileKind::Source(SourceLanguage::Idl) => Icon::FileIdl,
            FileKind::Designer | FileKind::DesignerHeader => Icon::FileDesigner,
            FileKind::Linguist if ext == ".ts" => Icon::FileLinguist,
            FileKind::Linguist => Icon::FileLinguist2,
            FileKind::Resources => Icon::FileResource,
            FileKind::Project => Icon::FileProject,
            FileKind::MultiProject => Icon::FileMultiProject,
            FileKind::Pixmap => Icon::FilePixmap,
            FileKind::Svg => Icon::FileSvg,
            FileKind::D => Icon::FileD,
            FileKind::Misc => Icon::FileMisc,
        };
        let language = kind.language();
        let name = file_name(&path);
        let module_name = if language.is_some() {
            name.clone()
        } else {
            String::new()
        };
        Self::new(
            name,
            icon,
            ItemKind::File {
                path,
                language,
                module_name,
            },
            language.is_some(),
        )
    }

    /// A class, labelled `Name(Base, ...)`.
    pub fn class(class: Arc<Class>) -> Self {
        let label = if class.supers.is_empty() {
            class.name.clone()
        } else {
            format!("{}({})", class.name, class.supers.join(", "))
        };
        let lazy = !class.methods.is_empty()
            || !class.classes.is_empty()
            || !class.attributes.is_empty()
            || !class.globals.is_empty();
        let icon = Icon::for_class(class.visibility);
        Self::new(label, icon, ItemKind::Class { class }, lazy)
    }

    /// A function or method, labelled `name(param, ...)`.
    pub fn method(function: Arc<Function>) -> Self {
        let label = format!("{}({})", function.name, function.parameters.join(", "));
        let lazy = !function.methods.is_empty() || !function.classes.is_empty();
        let icon = Icon::for_method(function.visibility);
        Self::new(label, icon, ItemKind::Method { function }, lazy)
    }

    /// A group of attributes shown under `label`.
    pub fn attributes(attributes: AttributeMap, label: &str) -> Self {
        Self::new(
            label.to_string(),
            Icon::Attributes,
            ItemKind::Attributes { attributes },
            true,
        )
    }

    pub fn attribute(attribute: Arc<Attribute>) -> Self {
        let icon = Icon::for_attribute(attribute.visibility);
        Self::new(
            attribute.name.clone(),
            icon,
            ItemKind::Attribute { attribute },
            false,
        )
    }

    /// The encoding marker of a source file.
    pub fn coding(coding: &Coding) -> Self {
        Self::new(
            format!("Coding: {}", coding.coding),
            Icon::TextEncoding,
            ItemKind::Coding {
                lineno: coding.lineno,
            },
            false,
        )
    }

    pub fn item_type(&self) -> ItemType {
        match self.kind {
            ItemKind::Root => ItemType::Root,
            ItemKind::Directory { .. } => ItemType::Directory,
            ItemKind::SysPath => ItemType::SysPath,
            ItemKind::File { .. } => ItemType::File,
            ItemKind::Class { .. } => ItemType::Class,
            ItemKind::Method { .. } => ItemType::Method,
            ItemKind::Attributes { .. } => ItemType::Attributes,
            ItemKind::Attribute { .. } => ItemType::Attribute,
            ItemKind::Coding { .. } => ItemType::Coding,
        }
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    /// Display value of `column`, empty when out of range.
    pub fn data(&self, column: usize) -> &str {
        self.item_data.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn column_count(&self) -> usize {
        self.item_data.len()
    }

    pub fn icon(&self) -> Icon {
        self.icon
    }

    pub fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    pub fn children(&self) -> &[ItemId] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Id of the child at `row`.
    pub fn child(&self, row: usize) -> Result<ItemId> {
        self.children
            .get(row)
            .copied()
            .ok_or(AppError::RowOutOfRange {
                row,
                count: self.children.len(),
            })
    }

    pub fn is_populated(&self) -> bool {
        self.population == Population::Populated
    }

    pub fn is_lazy_populated(&self) -> bool {
        self.lazy_population
    }

    pub fn population(&self) -> Population {
        self.population
    }

    pub(super) fn set_population(&mut self, population: Population) {
        self.population = population;
    }

    pub fn is_public(&self) -> bool {
        match &self.kind {
            ItemKind::Class { class, .. } => class.visibility == Visibility::Public,
            ItemKind::Method { function, .. } => function.visibility == Visibility::Public,
            ItemKind::Attribute { attribute } => attribute.visibility == Visibility::Public,
            _ => true,
        }
    }

    /// Source line for classes, methods, attributes and the coding marker.
    pub fn line_number(&self) -> Option<usize> {
        match &self.kind {
            ItemKind::Class { class } => Some(class.lineno),
            ItemKind::Method { function } => Some(function.lineno),
            ItemKind::Attribute { attribute } => Some(attribute.lineno),
            ItemKind::Coding { lineno } => Some(*lineno),
            _ => None,
        }
    }

    /// Filesystem path the item was created from.
    pub fn path(&self) -> Option<&Path> {
        match &self.kind {
            ItemKind::Directory { path } | ItemKind::File { path, .. } => Some(path),
            ItemKind::Class { class } => Some(&class.file),
            ItemKind::Method { function } => Some(&function.file),
            ItemKind::Attribute { attribute } => Some(&attribute.file),
            _ => None,
        }
    }

    /// Module a class or method was read from.
    pub fn module(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Class { class } => Some(&class.module),
            ItemKind::Method { function } => Some(&function.module),
            _ => None,
        }
    }

    /// Bare name of a class or method (without base list or parameters).
    pub fn definition_name(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Class { class, .. } => Some(&class.name),
            ItemKind::Method { function, .. } => Some(&function.name),
            _ => None,
        }
    }

    /// Whether this item sorts before `other` when sorting `column` in `order`.
    pub fn less_than(
        &self,
        other: &BrowserItem,
        column: usize,
        order: SortOrder,
        policy: &SortPolicy,
    ) -> bool {
        order::compare(self, other, column, order, policy) == Ordering::Less
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn function(name: &str, params: &[&str]) -> Arc<Function> {
        Arc::new(Function {
            name: name.into(),
            module: "m.py".into(),
            file: PathBuf::from("/src/m.py"),
            lineno: 3,
            parameters: params.iter().map(|p| p.to_string()).collect(),
            visibility: Visibility::from_name(name),
            classes: BTreeMap::new(),
            methods: BTreeMap::new(),
        })
    }

    #[test]
    fn data_out_of_range_is_empty() {
        let item = BrowserItem::root("Name");
        assert_eq!(item.data(0), "Name");
        assert_eq!(item.data(3), "");
        assert_eq!(item.column_count(), 1);
    }

    #[test]
    fn directory_labels() {
        let full = BrowserItem::directory(Path::new("/tmp/project"), true);
        assert_eq!(full.data(0), "/tmp/project");
        let short = BrowserItem::directory(Path::new("/tmp/project"), false);
        assert_eq!(short.data(0), "project");
        assert_eq!(short.item_type(), ItemType::Directory);
        assert!(short.is_lazy_populated());
        assert!(!short.is_populated());
    }

    #[test]
    fn python_file_is_lazy_with_module_name() {
        let item = BrowserItem::file(Path::new("/src/tool.py"), &SourceExtensions::default(), None);
        assert_eq!(item.data(0), "tool.py");
        assert!(matches!(
            item.kind(),
            ItemKind::File { module_name, language: Some(SourceLanguage::Python), .. } if module_name == "tool.py"
        ));
        assert_eq!(item.icon(), Icon::FilePython);
        assert!(item.is_lazy_populated());
    }

    #[test]
    fn plain_file_is_populated_leaf() {
        let exts = SourceExtensions::default();
        let item = BrowserItem::file(Path::new("/src/notes.txt"), &exts, None);
        assert!(item.is_populated());
        assert!(!item.is_lazy_populated());
        assert!(matches!(item.kind(), ItemKind::File { language: None, .. }));
        assert_eq!(item.icon(), Icon::FileMisc);
    }

    #[test]
    fn method_label_includes_parameters() {
        let item = BrowserItem::method(function("_run", &["self", "x=1"]));
        assert_eq!(item.data(0), "_run(self, x=1)");
        assert_eq!(item.icon(), Icon::MethodProtected);
        assert!(!item.is_public());
        assert_eq!(item.line_number(), Some(3));
        assert_eq!(item.path(), Some(Path::new("/src/m.py")));
        assert_eq!(item.module(), Some("m.py"));
        assert!(!item.is_lazy_populated());
    }

    #[test]
    fn class_label_includes_supers() {
        let class = Arc::new(Class {
            name: "Child".into(),
            module: "m.py".into(),
            file: PathBuf::from("/src/m.py"),
            lineno: 10,
            supers: vec!["Base".into(), "mixins.Loggable".into()],
            visibility: Visibility::Public,
            classes: BTreeMap::new(),
            methods: BTreeMap::from([("run".to_string(), function("run", &["self"]))]),
            attributes: AttributeMap::new(),
            globals: AttributeMap::new(),
        });
        let item = BrowserItem::class(class);
        assert_eq!(item.data(0), "Child(Base, mixins.Loggable)");
        assert_eq!(item.definition_name(), Some("Child"));
        assert!(item.is_lazy_populated());
    }

    #[test]
    fn coding_item() {
        let item = BrowserItem::coding(&Coding {
            coding: "utf-8".into(),
            lineno: 2,
        });
        assert_eq!(item.data(0), "Coding: utf-8");
        assert_eq!(item.line_number(), Some(2));
        assert_eq!(item.item_type(), ItemType::Coding);
        assert_eq!(item.icon().name(), "textencoding");
    }

    #[test]
    fn child_out_of_range_fails() {
        let item = BrowserItem::root("Name");
        let err = item.child(0).unwrap_err();
        assert!(matches!(err, AppError::RowOutOfRange { row: 0, count: 0 }));
    }
}
