use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

use crate::theme::ThemeColors;

/// A single keybinding entry for display.
struct KeyEntry {
    key: &'static str,
    description: &'static str,
}

/// A category of keybindings.
struct KeyCategory {
    name: &'static str,
    entries: &'static [KeyEntry],
}

macro_rules! keys {
    ($($key:expr => $desc:expr),* $(,)?) => {
        &[$(KeyEntry { key: $key, description: $desc }),*]
    };
}

const CATEGORIES: &[KeyCategory] = &[
    KeyCategory {
        name: "Navigation",
        entries: keys![
            "j / ↓" => "Move down",
            "k / ↑" => "Move up",
            "g / Home" => "Jump to first item",
            "G / End" => "Jump to last item",
            "Enter / l / →" => "Expand item",
            "h / ←" => "Collapse item or go to parent",
            "Space" => "Toggle expansion",
        ],
    },
    KeyCategory {
        name: "Browser",
        entries: keys![
            "r" => "Reload selected item",
            "R" => "Reload all entries from disk",
            "a" => "Add selected directory as top-level entry",
            "d" => "Remove selected top-level directory",
            "s" => "Toggle ascending / descending order",
            "f" => "Toggle folders first",
            "o" => "Toggle ordering by occurrence",
            "." => "Toggle hidden files",
        ],
    },
    KeyCategory {
        name: "General",
        entries: keys![
            "w" => "Pause / resume filesystem watcher",
            "?" => "Toggle this help",
            "q / Ctrl+C" => "Quit",
        ],
    },
];

/// Help overlay widget showing all keybindings.
pub struct HelpOverlay<'a> {
    theme: &'a ThemeColors,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a ThemeColors) -> Self {
        Self { theme }
    }

    fn build_content_lines(&self) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = Vec::new();
        for category in CATEGORIES {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("── {} ", category.name),
                    Style::default()
                        .fg(self.theme.info_fg)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled("─".repeat(30), Style::default().fg(self.theme.dim_fg)),
            ]));
            for entry in category.entries {
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("  {:<16}", entry.key),
                        Style::default()
                            .fg(self.theme.tree_class_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        entry.description.to_string(),
                        Style::default().fg(self.theme.tree_file_fg),
                    ),
                ]));
            }
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            " Press ? or Esc to close ",
            Style::default().fg(self.theme.dim_fg),
        )));
        lines
    }

    /// Number of content lines.
    pub fn total_lines() -> usize {
        CATEGORIES.iter().map(|c| c.entries.len() + 2).sum::<usize>() + 1
    }
}

impl<'a> Widget for HelpOverlay<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let overlay_width = (area.width as f32 * 0.70).min(70.0) as u16;
        let overlay_height = (area.height as f32 * 0.80).min(Self::total_lines() as f32 + 2.0) as u16;
        let x = area.x + area.width.saturating_sub(overlay_width) / 2;
        let y = area.y + area.height.saturating_sub(overlay_height) / 2;
        let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

        Clear.render(overlay_area, buf);
        let block = Block::default()
            .title(" Keys ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border_fg))
            .style(Style::default().bg(self.theme.status_bg));
        let inner = block.inner(overlay_area);
        block.render(overlay_area, buf);

        for (i, line) in self
            .build_content_lines()
            .iter()
            .take(inner.height as usize)
            .enumerate()
        {
            buf.set_line(inner.x + 1, inner.y + i as u16, line, inner.width.saturating_sub(2));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_categories_have_entries() {
        for cat in CATEGORIES {
            assert!(!cat.entries.is_empty(), "Category '{}' has no entries", cat.name);
        }
    }

    #[test]
    fn content_lines_match_total() {
        let theme = crate::theme::dark_theme();
        let overlay = HelpOverlay::new(&theme);
        assert_eq!(overlay.build_content_lines().len(), HelpOverlay::total_lines());
    }

    #[test]
    fn renders_inside_small_area() {
        let theme = crate::theme::dark_theme();
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        HelpOverlay::new(&theme).render(area, &mut buf);
    }
}
