//! Non-interactive JSON rendering of the browser tree.

use serde::Serialize;

use crate::browser::{BrowserModel, ItemId, ItemType, SortOrder};
use crate::error::Result;

#[derive(Debug, Serialize)]
pub struct DumpNode {
    pub label: String,
    #[serde(rename = "type")]
    pub item_type: &'static str,
    pub icon: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Module a class or method definition was read from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DumpNode>,
}

#[derive(Debug, Clone, Copy)]
pub struct DumpOptions {
    /// Levels below the top-level entries to populate.
    pub depth: usize,
    pub sort_order: SortOrder,
    /// Descend into the `sys.path` entry as well.
    pub include_sys_path: bool,
}

/// Populate the model down to `options.depth` and collect the top-level
/// entries in display order.
pub fn build(model: &mut BrowserModel, options: &DumpOptions) -> Result<Vec<DumpNode>> {
    let root = model.root();
    let top = model.sorted_children(root, 0, options.sort_order);
    top.into_iter()
        .map(|id| build_node(model, id, options.depth, options))
        .collect()
}

fn build_node(
    model: &mut BrowserModel,
    id: ItemId,
    depth: usize,
    options: &DumpOptions,
) -> Result<DumpNode> {
    let item = model.tree().item(id)?;
    let item_type = item.item_type();
    let mut node = DumpNode {
        label: item.data(0).to_string(),
        item_type: item_type.label(),
        icon: item.icon().name(),
        line: item.line_number(),
        path: match item_type {
            ItemType::Directory | ItemType::File => item.path().map(|p| p.display().to_string()),
            _ => None,
        },
        module: item.module().map(str::to_string),
        children: Vec::new(),
    };
    let descend = depth > 0 && (item_type != ItemType::SysPath || options.include_sys_path);
    if descend && item.is_lazy_populated() {
        model.ensure_populated(id)?;
        for child in model.sorted_children(id, 0, options.sort_order) {
            node.children.push(build_node(model, child, depth - 1, options)?);
        }
    }
    Ok(node)
}

/// Render the tree as pretty-printed JSON.
pub fn run(model: &mut BrowserModel, options: &DumpOptions) -> Result<String> {
    let nodes = build(model, options)?;
    tracing::debug!(top = nodes.len(), depth = options.depth, "dumping tree");
    Ok(serde_json::to_string_pretty(&nodes)?)
}
