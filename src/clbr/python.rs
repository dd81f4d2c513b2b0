//! Python outline reader.
//!
//! Scans a Python source file with a single alternation regex, the same way
//! the standard library's `pyclbr` does: strings and comments are skipped,
//! `class`/`def` statements open scopes on an indentation stack, and
//! assignments are attributed to the innermost enclosing class.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use regex::Regex;

use super::{
    find_module, Attribute, AttributeMap, Class, Coding, Definition, Function, ModuleOutline,
    Visibility,
};
use crate::error::Result;

/// Column width of a tab when measuring indentation.
const TAB_WIDTH: usize = 4;

const STRING: &str = r#"(?P<String>"""(?s:.*?)"""|'''(?s:.*?)'''|"[^"\\\n]*(?:\\.[^"\\\n]*)*"|'[^'\\\n]*(?:\\.[^'\\\n]*)*')"#;
const CODING_LINE: &str =
    r"(?P<CodingLine>^#[ \t]*[*_-]*[ \t]*coding[:=][ \t]*(?P<Coding>[-\w.]+)[^\n]*$)";
const COMMENT: &str = r"(?P<Comment>#[^\n]*)";
const PUBLICS: &str = r"(?P<Publics>^[ \t]*__all__[ \t]*=[ \t]*\[(?P<Identifiers>[^\]]*?)\])";
const METHOD: &str = r"(?P<Method>^(?P<MethodIndent>[ \t]*)(?:async[ \t]+)?def[ \t]+(?P<MethodName>[a-zA-Z_]\w*)[ \t]*\((?P<MethodSignature>(?:[^)]|\)[ \t]*,?)*?)\)[ \t]*(?:->[^:\n]*)?:)";
const CLASS: &str = r"(?P<Class>^(?P<ClassIndent>[ \t]*)class[ \t]+(?P<ClassName>[a-zA-Z_]\w*)[ \t]*(?P<ClassSupers>\([^)]*\))?[ \t]*:)";
const ATTRIBUTE: &str = r"(?P<Attribute>^(?P<AttributeIndent>[ \t]*)self[ \t]*\.[ \t]*(?P<AttributeName>[a-zA-Z_]\w*)[ \t]*=)";
const VARIABLE: &str = r"(?P<Variable>^(?P<VariableIndent>[ \t]*)(?P<VariableName>[a-zA-Z_]\w*)[ \t]*(?::[^=\n]*)?=)";
const CONDITIONAL_DEFINE: &str = r"(?P<ConditionalDefine>^(?P<ConditionalDefineIndent>[ \t]*)(?:(?:if|elif)[ \t]+[^:\n]*|else[ \t]*):)";

/// Python keywords that the variable pattern would otherwise pick up.
const KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

fn outline_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            "(?m){}",
            [
                STRING,
                CODING_LINE,
                COMMENT,
                PUBLICS,
                METHOD,
                CLASS,
                ATTRIBUTE,
                VARIABLE,
                CONDITIONAL_DEFINE,
            ]
            .join("|")
        );
        Regex::new(&pattern).expect("outline pattern is a valid regex")
    })
}

fn comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#[^\n]*").expect("comment pattern is a valid regex"))
}

/// Read and parse `module` from the search path.
pub fn read_module(module: &str, search_path: &[PathBuf]) -> Result<ModuleOutline> {
    let path = find_module(module, search_path)?;
    let bytes = fs::read(&path)?;
    let source = String::from_utf8_lossy(&bytes);
    tracing::debug!(module, path = %path.display(), "parsing python module");
    Ok(parse_source(module, &path, &source))
}

#[derive(Debug, Clone, Copy)]
enum Scope {
    Class(usize),
    Function(usize),
}

#[derive(Debug)]
struct ClassBuilder {
    name: String,
    lineno: usize,
    supers: Vec<String>,
    visibility: Visibility,
    classes: Vec<(String, usize)>,
    methods: Vec<(String, usize)>,
    attributes: AttributeMap,
    globals: AttributeMap,
}

#[derive(Debug)]
struct FunctionBuilder {
    name: String,
    lineno: usize,
    parameters: Vec<String>,
    visibility: Visibility,
    classes: Vec<(String, usize)>,
    methods: Vec<(String, usize)>,
}

/// Mutable parse state; frozen into shared descriptors at the end.
struct OutlineBuilder<'a> {
    module: &'a str,
    file: &'a Path,
    classes: Vec<ClassBuilder>,
    functions: Vec<FunctionBuilder>,
    top: Vec<(String, Scope)>,
    top_counts: HashMap<String, usize>,
    globals: AttributeMap,
    coding: Option<Coding>,
    publics: Option<Vec<String>>,
}

impl<'a> OutlineBuilder<'a> {
    fn new(module: &'a str, file: &'a Path) -> Self {
        Self {
            module,
            file,
            classes: Vec::new(),
            functions: Vec::new(),
            top: Vec::new(),
            top_counts: HashMap::new(),
            globals: AttributeMap::new(),
            coding: None,
            publics: None,
        }
    }

    fn attribute(&self, name: &str, lineno: usize) -> Arc<Attribute> {
        Arc::new(Attribute {
            name: name.to_string(),
            file: self.file.to_path_buf(),
            lineno,
            visibility: Visibility::from_name(name),
        })
    }

    /// Register a top-level definition, renaming repeats to `name_1`, `name_2`, ...
    fn add_top_level(&mut self, name: &str, scope: Scope) {
        let key = match self.top_counts.get_mut(name) {
            Some(count) => {
                *count += 1;
                format!("{}_{}", name, count)
            }
            None => {
                self.top_counts.insert(name.to_string(), 0);
                name.to_string()
            }
        };
        self.top.push((key, scope));
    }

    fn add_nested(&mut self, parent: Scope, name: &str, child: Scope) {
        let (classes, methods) = match parent {
            Scope::Class(idx) => {
                let c = &mut self.classes[idx];
                (&mut c.classes, &mut c.methods)
            }
            Scope::Function(idx) => {
                let f = &mut self.functions[idx];
                (&mut f.classes, &mut f.methods)
            }
        };
        match child {
            Scope::Class(idx) => classes.push((name.to_string(), idx)),
            Scope::Function(idx) => methods.push((name.to_string(), idx)),
        }
    }

    fn freeze_class(&self, idx: usize) -> Arc<Class> {
        let b = &self.classes[idx];
        Arc::new(Class {
            name: b.name.clone(),
            module: self.module.to_string(),
            file: self.file.to_path_buf(),
            lineno: b.lineno,
            supers: b.supers.clone(),
            visibility: b.visibility,
            classes: self.freeze_classes(&b.classes),
            methods: self.freeze_methods(&b.methods),
            attributes: b.attributes.clone(),
            globals: b.globals.clone(),
        })
    }

    fn freeze_function(&self, idx: usize) -> Arc<Function> {
        let b = &self.functions[idx];
        Arc::new(Function {
            name: b.name.clone(),
            module: self.module.to_string(),
            file: self.file.to_path_buf(),
            lineno: b.lineno,
            parameters: b.parameters.clone(),
            visibility: b.visibility,
            classes: self.freeze_classes(&b.classes),
            methods: self.freeze_methods(&b.methods),
        })
    }

    // Later definitions with the same name replace earlier ones.
    fn freeze_classes(&self, entries: &[(String, usize)]) -> BTreeMap<String, Arc<Class>> {
        entries
            .iter()
            .map(|(name, idx)| (name.clone(), self.freeze_class(*idx)))
            .collect()
    }

    fn freeze_methods(&self, entries: &[(String, usize)]) -> BTreeMap<String, Arc<Function>> {
        entries
            .iter()
            .map(|(name, idx)| (name.clone(), self.freeze_function(*idx)))
            .collect()
    }

    fn finish(mut self) -> ModuleOutline {
        if let Some(publics) = self.publics.take() {
            for (key, scope) in &self.top {
                let visibility = if publics.iter().any(|p| p == key) {
                    Visibility::Public
                } else {
                    Visibility::Private
                };
                match *scope {
                    Scope::Class(idx) => self.classes[idx].visibility = visibility,
                    Scope::Function(idx) => self.functions[idx].visibility = visibility,
                }
            }
        }

        let definitions = self
            .top
            .iter()
            .map(|(key, scope)| {
                let def = match *scope {
                    Scope::Class(idx) => Definition::Class(self.freeze_class(idx)),
                    Scope::Function(idx) => Definition::Function(self.freeze_function(idx)),
                };
                (key.clone(), def)
            })
            .collect();

        ModuleOutline {
            definitions,
            coding: self.coding,
            globals: self.globals,
        }
    }
}

/// Tracks `if`/`elif`/`else` blocks that guard `def` statements so the
/// guarded definitions are treated as if they were not indented.
#[derive(Default)]
struct ConditionalIndent {
    conditionals: Vec<usize>,
    deltas: Vec<usize>,
    delta: usize,
    delta_calculated: bool,
}

impl ConditionalIndent {
    fn open(&mut self, indent: usize) {
        self.close_to(indent);
        self.conditionals.push(indent);
        self.delta_calculated = false;
    }

    fn close_to(&mut self, indent: usize) {
        while let Some(&last) = self.conditionals.last() {
            if last < indent {
                break;
            }
            self.conditionals.pop();
            self.deltas.pop();
        }
    }

    fn adjust(&mut self, indent: usize) -> usize {
        let Some(&last) = self.conditionals.last() else {
            return indent;
        };
        if indent > last {
            if !self.delta_calculated {
                self.deltas.push(indent - last);
                self.delta = self.deltas.iter().sum();
                self.delta_calculated = true;
            }
            indent.saturating_sub(self.delta)
        } else {
            self.close_to(indent);
            self.delta_calculated = false;
            indent
        }
    }
}

/// Parse Python source text into an outline.
pub fn parse_source(module: &str, file: &Path, src: &str) -> ModuleOutline {
    let re = outline_regex();
    let mut out = OutlineBuilder::new(module, file);
    let mut stack: Vec<(Scope, usize)> = Vec::new();
    let mut conditional = ConditionalIndent::default();

    let mut lineno = 1;
    let mut last_pos = 0;
    let mut pos = 0;

    while let Some(caps) = re.captures_at(src, pos) {
        let Some(whole) = caps.get(0) else { break };
        let start = whole.start();
        pos = whole.end();

        let mut line_at_start = || {
            lineno += src[last_pos..start].matches('\n').count();
            last_pos = start;
            lineno
        };

        if caps.name("String").is_some() || caps.name("Comment").is_some() {
            continue;
        }

        if let Some(coding) = caps.name("Coding") {
            let line = line_at_start();
            if out.coding.is_none() {
                out.coding = Some(Coding {
                    coding: coding.as_str().to_string(),
                    lineno: line,
                });
            }
        } else if let Some(idents) = caps.name("Identifiers") {
            line_at_start();
            out.publics = Some(
                idents
                    .as_str()
                    .split(',')
                    .map(|e| e.replace(['"', '\''], "").trim().to_string())
                    .filter(|e| !e.is_empty())
                    .collect(),
            );
        } else if let Some(name) = caps.name("MethodName") {
            let indent_ws = caps.name("MethodIndent").map_or("", |m| m.as_str());
            let signature = caps.name("MethodSignature").map_or("", |m| m.as_str());
            let line = line_at_start();
            let indent = conditional.adjust(indent_width(indent_ws));

            while stack.last().is_some_and(|(_, i)| *i >= indent) {
                stack.pop();
            }

            let name = name.as_str();
            let idx = out.functions.len();
            out.functions.push(FunctionBuilder {
                name: name.to_string(),
                lineno: line,
                parameters: split_parameters(signature),
                visibility: Visibility::from_name(name),
                classes: Vec::new(),
                methods: Vec::new(),
            });
            let scope = Scope::Function(idx);
            match stack.last() {
                Some(&(parent, _)) => out.add_nested(parent, name, scope),
                None => out.add_top_level(name, scope),
            }
            stack.push((scope, indent));
        } else if let Some(name) = caps.name("ClassName") {
            let indent_ws = caps.name("ClassIndent").map_or("", |m| m.as_str());
            let indent = indent_width(indent_ws);
            while stack.last().is_some_and(|(_, i)| *i >= indent) {
                stack.pop();
            }
            let line = line_at_start();

            let name = name.as_str();
            let supers = caps
                .name("ClassSupers")
                .map(|m| split_supers(m.as_str()))
                .unwrap_or_default();
            let idx = out.classes.len();
            out.classes.push(ClassBuilder {
                name: name.to_string(),
                lineno: line,
                supers,
                visibility: Visibility::from_name(name),
                classes: Vec::new(),
                methods: Vec::new(),
                attributes: AttributeMap::new(),
                globals: AttributeMap::new(),
            });
            let scope = Scope::Class(idx);
            match stack.last() {
                Some(&(parent, _)) => out.add_nested(parent, name, scope),
                None => out.add_top_level(name, scope),
            }
            stack.push((scope, indent));
        } else if let Some(name) = caps.name("AttributeName") {
            // `self.x == y` is a comparison.
            if src[pos..].starts_with('=') {
                continue;
            }
            let line = line_at_start();
            let owner = stack.iter().rev().find_map(|(scope, _)| match scope {
                Scope::Class(idx) => Some(*idx),
                Scope::Function(_) => None,
            });
            if let Some(idx) = owner {
                let attr = out.attribute(name.as_str(), line);
                out.classes[idx]
                    .attributes
                    .entry(name.as_str().to_string())
                    .or_insert(attr);
            }
        } else if let Some(name) = caps.name("VariableName") {
            let name = name.as_str();
            // `x == y` comparisons and keywords are not assignments.
            if src[pos..].starts_with('=') || KEYWORDS.contains(&name) {
                continue;
            }
            let indent_ws = caps.name("VariableIndent").map_or("", |m| m.as_str());
            let indent = indent_width(indent_ws);
            let line = line_at_start();
            let attr = out.attribute(name, line);
            if indent == 0 {
                out.globals.entry(name.to_string()).or_insert(attr);
            } else if let Some(&(scope, _)) = stack.iter().rev().find(|(_, i)| *i < indent) {
                if let Scope::Class(idx) = scope {
                    out.classes[idx]
                        .globals
                        .entry(name.to_string())
                        .or_insert(attr);
                }
            }
        } else if caps.name("ConditionalDefine").is_some() {
            if !src[pos..].trim_start().starts_with("def") {
                continue;
            }
            let indent_ws = caps
                .name("ConditionalDefineIndent")
                .map_or("", |m| m.as_str());
            conditional.open(indent_width(indent_ws));
        }
    }

    out.finish()
}

/// Indentation width with tabs expanded to `TAB_WIDTH` columns.
fn indent_width(ws: &str) -> usize {
    ws.chars().fold(0, |col, c| {
        if c == '\t' {
            (col / TAB_WIDTH + 1) * TAB_WIDTH
        } else {
            col + 1
        }
    })
}

/// Collapse line continuations, comments and runs of whitespace.
fn clean(text: &str) -> String {
    let text = text.replace("\\\n", "");
    let text = comment_regex().replace_all(&text, "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a parameter list on top-level commas.
fn split_parameters(signature: &str) -> Vec<String> {
    let signature = clean(signature);
    let mut params = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in signature.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                params.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    params.push(current);
    params
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split `(Base, other.Base)` into base names.
fn split_supers(group: &str) -> Vec<String> {
    let inner = group
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(group);
    clean(inner)
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
