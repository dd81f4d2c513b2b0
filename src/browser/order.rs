use std::cmp::Ordering;

use super::item::{BrowserItem, ItemType};

/// Direction of a sort; group ranks are not affected by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggle(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ascending" | "asc" => Some(SortOrder::Ascending),
            "descending" | "desc" => Some(SortOrder::Descending),
            _ => None,
        }
    }
}

/// Ordering switches read from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortPolicy {
    pub folders_first: bool,
    pub by_occurrence: bool,
}

impl Default for SortPolicy {
    fn default() -> Self {
        Self {
            folders_first: true,
            by_occurrence: true,
        }
    }
}

fn group_rank(item: &BrowserItem, policy: &SortPolicy) -> u8 {
    match item.item_type() {
        ItemType::Root => 0,
        ItemType::SysPath | ItemType::Directory => {
            if policy.folders_first {
                1
            } else {
                2
            }
        }
        ItemType::File => 2,
        ItemType::Coding => 3,
        ItemType::Class | ItemType::Method | ItemType::Attribute => 4,
        ItemType::Attributes => 5,
    }
}

fn is_initializer(item: &BrowserItem) -> bool {
    match item.item_type() {
        ItemType::File => item.data(0).starts_with("__init__.py"),
        ItemType::Method => item
            .definition_name()
            .map_or(false, |name| name.starts_with("__init__")),
        _ => false,
    }
}

/// Package initializers lead other files and constructors lead other
/// methods. Pairs of different types fall through to the key.
fn initializer_cmp(a: &BrowserItem, b: &BrowserItem) -> Ordering {
    if a.item_type() != b.item_type() {
        return Ordering::Equal;
    }
    is_initializer(b).cmp(&is_initializer(a))
}

fn key_cmp(a: &BrowserItem, b: &BrowserItem, column: usize, policy: &SortPolicy) -> Ordering {
    if policy.by_occurrence && column == 0 {
        if let (Some(la), Some(lb)) = (a.line_number(), b.line_number()) {
            return la.cmp(&lb);
        }
    }
    if column >= a.column_count() || column >= b.column_count() {
        return Ordering::Equal;
    }
    let (x, y) = (a.data(column), b.data(column));
    x.to_lowercase()
        .cmp(&y.to_lowercase())
        .then_with(|| x.cmp(y))
}

/// Total order of two siblings when sorting `column` in `order`.
///
/// Items are grouped first (folders, files, encoding marker, definitions,
/// attribute groups) and the groups keep their place in both directions;
/// only the key inside a group is reversed for descending sorts.
pub fn compare(
    a: &BrowserItem,
    b: &BrowserItem,
    column: usize,
    order: SortOrder,
    policy: &SortPolicy,
) -> Ordering {
    group_rank(a, policy)
        .cmp(&group_rank(b, policy))
        .then_with(|| initializer_cmp(a, b))
        .then_with(|| {
            let key = key_cmp(a, b, column, policy);
            match order {
                SortOrder::Ascending => key,
                SortOrder::Descending => key.reverse(),
            }
        })
}
