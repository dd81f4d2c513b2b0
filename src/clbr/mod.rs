//! Source outline readers ("class browsers").
//!
//! A reader turns a source module into a [`ModuleOutline`]: the top-level
//! classes and functions in declaration order, an optional encoding
//! declaration and the module-level globals. Nested classes, methods and
//! attributes hang off the descriptors and are shared by reference with the
//! browser items that display them.

pub mod python;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{AppError, Result};

/// Visibility classification derived from leading underscores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// `__name` is private, `_name` is protected, everything else is public.
    pub fn from_name(name: &str) -> Self {
        if name.starts_with("__") {
            Visibility::Private
        } else if name.starts_with('_') {
            Visibility::Protected
        } else {
            Visibility::Public
        }
    }
}

/// A class attribute, instance attribute or module global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub file: PathBuf,
    pub lineno: usize,
    pub visibility: Visibility,
}

/// Attribute descriptors keyed by name.
pub type AttributeMap = BTreeMap<String, Arc<Attribute>>;

/// A function or method definition.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub module: String,
    pub file: PathBuf,
    pub lineno: usize,
    pub parameters: Vec<String>,
    pub visibility: Visibility,
    pub classes: BTreeMap<String, Arc<Class>>,
    pub methods: BTreeMap<String, Arc<Function>>,
}

/// A class definition.
#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    pub module: String,
    pub file: PathBuf,
    pub lineno: usize,
    /// Base classes as written in the class statement.
    pub supers: Vec<String>,
    pub visibility: Visibility,
    pub classes: BTreeMap<String, Arc<Class>>,
    pub methods: BTreeMap<String, Arc<Function>>,
    /// Instance attributes (`self.name = ...`).
    pub attributes: AttributeMap,
    /// Class-level variables.
    pub globals: AttributeMap,
}

/// A class or function found in a module or nested in another definition.
#[derive(Debug, Clone)]
pub enum Definition {
    Class(Arc<Class>),
    Function(Arc<Function>),
}

impl Definition {
    pub fn name(&self) -> &str {
        match self {
            Definition::Class(c) => &c.name,
            Definition::Function(f) => &f.name,
        }
    }

    pub fn lineno(&self) -> usize {
        match self {
            Definition::Class(c) => c.lineno,
            Definition::Function(f) => f.lineno,
        }
    }
}

/// Nested classes and methods merged into declaration order.
pub fn nested_definitions(
    classes: &BTreeMap<String, Arc<Class>>,
    methods: &BTreeMap<String, Arc<Function>>,
) -> Vec<Definition> {
    let mut defs: Vec<Definition> = classes
        .values()
        .map(|c| Definition::Class(Arc::clone(c)))
        .chain(methods.values().map(|f| Definition::Function(Arc::clone(f))))
        .collect();
    defs.sort_by(|a, b| a.lineno().cmp(&b.lineno()).then_with(|| a.name().cmp(b.name())));
    defs
}

/// Encoding declaration found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coding {
    pub coding: String,
    pub lineno: usize,
}

/// Everything a reader extracts from one module.
#[derive(Debug, Clone, Default)]
pub struct ModuleOutline {
    /// Top-level definitions in declaration order, keyed by their unique name.
    pub definitions: Vec<(String, Definition)>,
    pub coding: Option<Coding>,
    pub globals: AttributeMap,
}

#[cfg(test)]
impl ModuleOutline {
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty() && self.coding.is_none() && self.globals.is_empty()
    }

    /// Look up a top-level definition by key.
    pub fn get(&self, key: &str) -> Option<&Definition> {
        self.definitions
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, def)| def)
    }
}

/// Languages the browser knows how to classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    Python,
    Python3,
    Ruby,
    Idl,
}

impl SourceLanguage {
    pub fn label(&self) -> &'static str {
        match self {
            SourceLanguage::Python => "Python",
            SourceLanguage::Python3 => "Python3",
            SourceLanguage::Ruby => "Ruby",
            SourceLanguage::Idl => "IDL",
        }
    }
}

/// Extensions that identify Python sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceExtensions {
    pub python: Vec<String>,
    pub python3: Vec<String>,
}

impl Default for SourceExtensions {
    fn default() -> Self {
        Self {
            python: vec![".py".into(), ".pyw".into(), ".ptl".into()],
            python3: vec![".py3".into(), ".pyw3".into()],
        }
    }
}

impl SourceExtensions {
    /// Map a lowercase extension (with leading dot) to a language.
    pub fn language_for(&self, ext: &str) -> Option<SourceLanguage> {
        if self.python.iter().any(|e| e == ext) {
            Some(SourceLanguage::Python)
        } else if self.python3.iter().any(|e| e == ext) {
            Some(SourceLanguage::Python3)
        } else if ext == ".rb" {
            Some(SourceLanguage::Ruby)
        } else if ext == ".idl" {
            Some(SourceLanguage::Idl)
        } else {
            None
        }
    }
}

/// The "read module" collaborator used to populate file items.
pub trait SourceReader {
    /// Read `module` (a file name) from the first directory of
    /// `search_path` that contains it.
    fn read_module(
        &self,
        module: &str,
        search_path: &[PathBuf],
        language: SourceLanguage,
    ) -> Result<ModuleOutline>;
}

/// Default reader dispatching on the source language.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassBrowsers;

impl SourceReader for ClassBrowsers {
    fn read_module(
        &self,
        module: &str,
        search_path: &[PathBuf],
        language: SourceLanguage,
    ) -> Result<ModuleOutline> {
        match language {
            SourceLanguage::Python | SourceLanguage::Python3 => {
                python::read_module(module, search_path)
            }
            SourceLanguage::Ruby | SourceLanguage::Idl => {
                Err(AppError::UnsupportedLanguage(language.label().to_string()))
            }
        }
    }
}

/// Locate `name` in the search path. A bare module name also matches
/// `name.py`.
pub fn find_module(name: &str, search_path: &[PathBuf]) -> Result<PathBuf> {
    let has_ext = Path::new(name).extension().is_some();
    for dir in search_path {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Ok(candidate);
        }
        if !has_ext {
            let candidate = dir.join(format!("{}.py", name));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }
    Err(AppError::ModuleNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn visibility_from_leading_underscores() {
        assert_eq!(Visibility::from_name("run"), Visibility::Public);
        assert_eq!(Visibility::from_name("_helper"), Visibility::Protected);
        assert_eq!(Visibility::from_name("__secret"), Visibility::Private);
        assert_eq!(Visibility::from_name("__init__"), Visibility::Private);
    }

    #[test]
    fn language_for_default_extensions() {
        let exts = SourceExtensions::default();
        assert_eq!(exts.language_for(".py"), Some(SourceLanguage::Python));
        assert_eq!(exts.language_for(".pyw"), Some(SourceLanguage::Python));
        assert_eq!(exts.language_for(".py3"), Some(SourceLanguage::Python3));
        assert_eq!(exts.language_for(".rb"), Some(SourceLanguage::Ruby));
        assert_eq!(exts.language_for(".idl"), Some(SourceLanguage::Idl));
        assert_eq!(exts.language_for(".txt"), None);
    }

    #[test]
    fn find_module_searches_path_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(second.path().join("mod.py"), "x = 1\n").unwrap();

        let path = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let found = find_module("mod.py", &path).unwrap();
        assert_eq!(found, second.path().join("mod.py"));

        // Bare module names resolve to `.py` files.
        let found = find_module("mod", &path).unwrap();
        assert_eq!(found, second.path().join("mod.py"));
    }

    #[test]
    fn find_module_missing() {
        let dir = TempDir::new().unwrap();
        let err = find_module("nope.py", &[dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, AppError::ModuleNotFound(ref m) if m == "nope.py"));
    }

    #[test]
    fn ruby_has_no_reader() {
        let err = ClassBrowsers
            .read_module("x.rb", &[], SourceLanguage::Ruby)
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedLanguage(_)));
    }

    #[test]
    fn nested_definitions_follow_line_order() {
        let file = PathBuf::from("/tmp/m.py");
        let method = |name: &str, lineno| {
            Arc::new(Function {
                name: name.into(),
                module: "m.py".into(),
                file: file.clone(),
                lineno,
                parameters: vec![],
                visibility: Visibility::from_name(name),
                classes: BTreeMap::new(),
                methods: BTreeMap::new(),
            })
        };
        let inner = Arc::new(Class {
            name: "Inner".into(),
            module: "m.py".into(),
            file: file.clone(),
            lineno: 5,
            supers: vec![],
            visibility: Visibility::Public,
            classes: BTreeMap::new(),
            methods: BTreeMap::new(),
            attributes: AttributeMap::new(),
            globals: AttributeMap::new(),
        });

        let mut classes = BTreeMap::new();
        classes.insert("Inner".to_string(), inner);
        let mut methods = BTreeMap::new();
        methods.insert("a_late".to_string(), method("a_late", 9));
        methods.insert("z_early".to_string(), method("z_early", 2));

        let names: Vec<String> = nested_definitions(&classes, &methods)
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        assert_eq!(names, vec!["z_early", "Inner", "a_late"]);
    }
}
