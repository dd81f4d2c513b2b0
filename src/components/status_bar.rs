use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

const KEY_HINTS: &str = " r:reload  a:add  d:remove  s:sort  ?:keys  q:quit ";

/// Status bar widget: location of the selected item, browser flags, key
/// hints, or a transient status message.
pub struct StatusBarWidget<'a> {
    location: &'a str,
    flags: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
    watcher_status: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(location: &'a str, flags: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            location,
            flags,
            theme,
            status_message: None,
            is_error: false,
            watcher_status: None,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    pub fn watcher_status(mut self, status: &'a str) -> Self {
        self.watcher_status = Some(status);
        self
    }
}

/// Keep the last `budget` characters, marking the cut with `...`.
fn truncate_left(s: &str, budget: usize) -> String {
    let len = s.chars().count();
    if len <= budget {
        return s.to_string();
    }
    if budget <= 3 {
        return s.chars().take(budget).collect();
    }
    let tail: String = s.chars().skip(len - (budget - 3)).collect();
    format!("...{}", tail)
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_bg)
            } else {
                Style::default().fg(self.theme.success_fg)
            };
            let display: String = msg.chars().take(width).collect();
            let line = Line::from(Span::styled(
                format!("{:<width$}", display, width = width),
                style,
            ));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        // Normal bar: [location] [flags] [watcher] [key hints]
        let watcher = self.watcher_status.map(|w| format!(" {}", w)).unwrap_or_default();
        let fixed = self.flags.chars().count() + watcher.chars().count() + 1;
        let remaining = width.saturating_sub(KEY_HINTS.len());
        let location = truncate_left(self.location, remaining.saturating_sub(fixed));
        let gap = remaining
            .saturating_sub(location.chars().count())
            .saturating_sub(fixed - 1);

        let mut spans = vec![
            Span::styled(location, Style::default().fg(self.theme.status_fg)),
            Span::raw(" ".repeat(gap.max(1))),
            Span::styled(self.flags.to_string(), Style::default().fg(self.theme.info_fg)),
        ];
        if !watcher.is_empty() {
            spans.push(Span::styled(
                watcher,
                Style::default()
                    .fg(self.theme.error_fg)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        spans.push(Span::styled(
            KEY_HINTS,
            Style::default()
                .fg(self.theme.dim_fg)
                .add_modifier(Modifier::DIM),
        ));

        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}
