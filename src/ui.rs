use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::Style,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::App;
use crate::components::help::HelpOverlay;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    // Keep the selected row visible inside the border.
    let visible_height = chunks[0].height.saturating_sub(2) as usize;
    app.view.update_scroll(visible_height);

    let header = app.model.header_data(0).unwrap_or_default();
    let block = Block::default()
        .title(format!(" {} ", header))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border_fg));
    let tree_widget = TreeWidget::new(&app.view, &app.theme, app.use_icons).block(block);
    frame.render_widget(tree_widget, chunks[0]);

    let location = app.selected_location();
    let flags = app.flags_summary();
    let mut status = StatusBarWidget::new(&location, &flags, &app.theme);
    if let Some((msg, _, is_error)) = &app.status_message {
        status = status.status_message(msg, *is_error);
    }
    if !app.watcher_active {
        status = status.watcher_status("[watch off]");
    }
    frame.render_widget(status, chunks[1]);

    if app.show_help {
        frame.render_widget(HelpOverlay::new(&app.theme), frame.area());
    }
}
