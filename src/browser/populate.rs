//! Child discovery for each lazily populated item type.
//!
//! These functions only build the new child items; inserting them into the
//! tree and notifying observers is up to the model.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::item::BrowserItem;
use crate::clbr::{
    nested_definitions, AttributeMap, Class, Definition, Function, ModuleOutline,
    SourceExtensions, SourceLanguage, SourceReader,
};

/// One child per directory entry, sorted by name. Unreadable directories
/// yield no children.
pub fn directory_children(path: &Path, exts: &SourceExtensions, show_hidden: bool) -> Vec<BrowserItem> {
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "cannot list directory");
            return Vec::new();
        }
    };

    let mut paths: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| (entry.file_name().to_string_lossy().to_string(), entry.path()))
        .filter(|(name, _)| show_hidden || !name.starts_with('.'))
        .collect();
    paths.sort_by(|a, b| a.0.cmp(&b.0));

    paths
        .into_iter()
        .map(|(_, path)| {
            if path.is_dir() {
                BrowserItem::directory(&path, false)
            } else {
                BrowserItem::file(&path, exts, None)
            }
        })
        .collect()
}

/// One full-path directory per search path entry; an empty entry is the
/// current directory.
pub fn sys_path_children(sys_path: &[PathBuf]) -> Vec<BrowserItem> {
    sys_path
        .iter()
        .map(|entry| {
            if entry.as_os_str().is_empty() {
                std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
            } else {
                entry.clone()
            }
        })
        .map(|dir| BrowserItem::directory(&dir, true))
        .collect()
}

/// Outline children of a source file. Reader failures yield no children.
pub fn file_children(
    reader: &dyn SourceReader,
    path: &Path,
    module_name: &str,
    language: SourceLanguage,
) -> Vec<BrowserItem> {
    let search_path: Vec<PathBuf> = path.parent().map(Path::to_path_buf).into_iter().collect();
    match reader.read_module(module_name, &search_path, language) {
        Ok(outline) => outline_children(&outline),
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "no outline");
            Vec::new()
        }
    }
}

/// Top-level definitions, then the encoding marker, then module globals.
pub fn outline_children(outline: &ModuleOutline) -> Vec<BrowserItem> {
    let mut items: Vec<BrowserItem> = outline
        .definitions
        .iter()
        .map(|(_, def)| definition_item(def))
        .collect();
    if let Some(coding) = &outline.coding {
        items.push(BrowserItem::coding(coding));
    }
    if !outline.globals.is_empty() {
        items.push(BrowserItem::attributes(outline.globals.clone(), "Globals"));
    }
    items
}

/// Nested definitions followed by the attribute groups.
pub fn class_children(class: &Class) -> Vec<BrowserItem> {
    let mut items: Vec<BrowserItem> = nested_definitions(&class.classes, &class.methods)
        .iter()
        .map(definition_item)
        .collect();
    if !class.attributes.is_empty() {
        items.push(BrowserItem::attributes(class.attributes.clone(), "Attributes"));
    }
    if !class.globals.is_empty() {
        items.push(BrowserItem::attributes(
            class.globals.clone(),
            "Attributes (global)",
        ));
    }
    items
}

pub fn method_children(function: &Function) -> Vec<BrowserItem> {
    nested_definitions(&function.classes, &function.methods)
        .iter()
        .map(definition_item)
        .collect()
}

pub fn attribute_children(attributes: &AttributeMap) -> Vec<BrowserItem> {
    attributes
        .values()
        .map(|attr| BrowserItem::attribute(Arc::clone(attr)))
        .collect()
}

fn definition_item(def: &Definition) -> BrowserItem {
    match def {
        Definition::Class(class) => BrowserItem::class(Arc::clone(class)),
        Definition::Function(function) => BrowserItem::method(Arc::clone(function)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::item::ItemType;
    use crate::clbr::python::parse_source;
    use std::fs;
    use tempfile::TempDir;

    fn labels(items: &[BrowserItem]) -> Vec<String> {
        items.iter().map(|i| i.data(0).to_string()).collect()
    }

    #[test]
    fn directory_lists_entries_and_skips_hidden() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.py"), "x = 1\n").unwrap();
        fs::write(tmp.path().join("b.txt"), "").unwrap();
        fs::write(tmp.path().join(".secret"), "").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();

        let exts = SourceExtensions::default();
        let items = directory_children(tmp.path(), &exts, false);
        assert_eq!(labels(&items), vec!["a.py", "b.txt", "sub"]);
        assert_eq!(items[2].item_type(), ItemType::Directory);

        let items = directory_children(tmp.path(), &exts, true);
        assert_eq!(items.len(), 4);
    }

    #[test]
    fn missing_directory_has_no_children() {
        let tmp = TempDir::new().unwrap();
        let gone = tmp.path().join("gone");
        assert!(directory_children(&gone, &SourceExtensions::default(), false).is_empty());
    }

    #[test]
    fn sys_path_entries_are_full_paths() {
        let items = sys_path_children(&[PathBuf::from("/usr/lib/python3"), PathBuf::new()]);
        assert_eq!(items[0].data(0), "/usr/lib/python3");
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(items[1].data(0), cwd.display().to_string());
    }

    #[test]
    fn outline_children_in_declaration_order() {
        let src = "# -*- coding: utf-8 -*-\nLIMIT = 3\n\nclass A:\n    def __init__(self):\n        self.x = 1\n\ndef helper(a, b):\n    pass\n";
        let file = Path::new("/src/m.py");
        let outline = parse_source("m.py", file, src);
        let items = outline_children(&outline);
        assert_eq!(
            labels(&items),
            vec!["A", "helper(a, b)", "Coding: utf-8", "Globals"]
        );

        let class_items = match items[0].kind() {
            crate::browser::item::ItemKind::Class { class } => class_children(class),
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(labels(&class_items), vec!["__init__(self)", "Attributes"]);
    }

    #[test]
    fn attribute_children_per_entry() {
        let file = Path::new("/src/m.py");
        let outline = parse_source("m.py", file, "A = 1\nB = 2\n");
        let items = attribute_children(&outline.globals);
        assert_eq!(labels(&items), vec!["A", "B"]);
        assert!(items.iter().all(|i| i.item_type() == ItemType::Attribute));
    }
}
