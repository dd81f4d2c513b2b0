use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Widget},
};

use crate::browser::{BrowserView, FlatRow, Icon, ItemType};
use crate::theme::ThemeColors;

/// Tree widget that renders the browser rows with box-drawing characters.
pub struct TreeWidget<'a> {
    view: &'a BrowserView,
    theme: &'a ThemeColors,
    use_icons: bool,
    block: Option<Block<'a>>,
}

impl<'a> TreeWidget<'a> {
    pub fn new(view: &'a BrowserView, theme: &'a ThemeColors, use_icons: bool) -> Self {
        Self {
            view,
            theme,
            use_icons,
            block: None,
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = block.into();
        self
    }

    /// Build the prefix string for tree indentation using box-drawing characters.
    ///
    /// Continuation lines depend on whether each ancestor was a last sibling,
    /// found by walking back to the nearest row at that depth.
    fn build_prefix(row: &FlatRow, rows: &[FlatRow], row_index: usize) -> String {
        if row.depth == 0 {
            return String::new();
        }

        let mut parts: Vec<&str> = Vec::new();
        for d in 1..row.depth {
            let ancestor_is_last = rows[..row_index]
                .iter()
                .rev()
                .take_while(|r| r.depth >= d)
                .find(|r| r.depth == d)
                .map_or(false, |r| r.is_last_sibling);
            parts.push(if ancestor_is_last { "   " } else { "│  " });
        }
        parts.push(if row.is_last_sibling { "└──" } else { "├──" });
        parts.join("")
    }

    fn expander(row: &FlatRow) -> &'static str {
        if !row.expandable {
            "  "
        } else if row.is_expanded {
            "▾ "
        } else {
            "▸ "
        }
    }

    /// Glyph for an item icon.
    fn indicator(&self, row: &FlatRow) -> &'static str {
        if self.use_icons {
            match row.icon {
                Icon::DirClosed if row.is_expanded => "\u{f07c} ",
                Icon::DirClosed => "\u{f07b} ",
                Icon::FilePython | Icon::FilePython2 => "\u{e73c} ",
                Icon::FileRuby => "\u{e739} ",
                Icon::FileDesigner => "\u{f2d0} ",
                Icon::FileLinguist | Icon::FileLinguist2 => "\u{f1ab} ",
                Icon::FileResource => "\u{f187} ",
                Icon::FileProject | Icon::FileMultiProject => "\u{f503} ",
                Icon::FileIdl => "\u{f471} ",
                Icon::FilePixmap | Icon::FileSvg => "\u{f1c5} ",
                Icon::FileD => "\u{e7af} ",
                Icon::FileMisc | Icon::Empty => "\u{f15b} ",
                Icon::Class | Icon::ClassProtected | Icon::ClassPrivate => "\u{eb5b} ",
                Icon::Method | Icon::MethodProtected | Icon::MethodPrivate => "\u{ea8c} ",
                Icon::Attributes => "\u{eb62} ",
                Icon::Attribute | Icon::AttributeProtected | Icon::AttributePrivate => {
                    "\u{eb5f} "
                }
                Icon::TextEncoding => "\u{f031} ",
            }
        } else {
            match row.item_type {
                ItemType::Root | ItemType::Directory | ItemType::SysPath => "[D] ",
                ItemType::File => "[F] ",
                ItemType::Class => "[C] ",
                ItemType::Method => "[M] ",
                ItemType::Attributes => "[A] ",
                ItemType::Attribute => "[a] ",
                ItemType::Coding => "[E] ",
            }
        }
    }

    fn row_style(&self, row: &FlatRow, is_selected: bool) -> Style {
        if is_selected {
            return Style::default()
                .bg(self.theme.tree_selected_bg)
                .fg(self.theme.tree_selected_fg)
                .add_modifier(Modifier::BOLD);
        }
        if !row.is_public {
            return Style::default().fg(self.theme.tree_private_fg);
        }
        let style = Style::default().fg(self.theme.item_fg(row.item_type));
        match row.item_type {
            ItemType::Directory | ItemType::SysPath | ItemType::Class => {
                style.add_modifier(Modifier::BOLD)
            }
            ItemType::Coding | ItemType::Attributes => style.add_modifier(Modifier::ITALIC),
            _ => style,
        }
    }
}

impl<'a> Widget for TreeWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_area = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        let rows = &self.view.rows;
        let visible_height = inner_area.height as usize;
        if rows.is_empty() || visible_height == 0 {
            return;
        }

        let visible = rows
            .iter()
            .enumerate()
            .skip(self.view.scroll_offset)
            .take(visible_height);

        for (i, (idx, row)) in visible.enumerate() {
            let y = inner_area.y + i as u16;
            let prefix = Self::build_prefix(row, rows, idx);
            let style = self.row_style(row, idx == self.view.selected_index);

            let mut spans = vec![
                Span::styled(
                    format!(
                        "{}{}{}{}",
                        prefix,
                        Self::expander(row),
                        self.indicator(row),
                        row.label
                    ),
                    style,
                ),
            ];
            if let Some(line) = row.line_number {
                spans.push(Span::styled(
                    format!("  :{}", line),
                    Style::default().fg(self.theme.dim_fg),
                ));
            }
            buf.set_line(inner_area.x, y, &Line::from(spans), inner_area.width);
        }
    }
}
