use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::App;

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    if app.show_help {
        match key.code {
            KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => app.toggle_help(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Char('g') | KeyCode::Home => app.select_first(),
        KeyCode::Char('G') | KeyCode::End => app.select_last(),
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => app.expand_selected(),
        KeyCode::Char('h') | KeyCode::Left => app.collapse_selected(),
        KeyCode::Char(' ') => app.toggle_selected(),
        KeyCode::Char('r') => app.repopulate_selected(),
        KeyCode::Char('R') => app.reload_all(),
        KeyCode::Char('a') => app.add_selected_as_toplevel(),
        KeyCode::Char('d') => app.remove_selected_toplevel(),
        KeyCode::Char('s') => app.toggle_sort_order(),
        KeyCode::Char('f') => app.toggle_folders_first(),
        KeyCode::Char('o') => app.toggle_by_occurrence(),
        KeyCode::Char('.') => app.toggle_hidden(),
        KeyCode::Char('w') => app.toggle_watcher(),
        KeyCode::Char('?') => app.toggle_help(),
        _ => {}
    }
}

/// Handle a mouse event: the wheel moves the selection.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.select_next(),
        MouseEventKind::ScrollUp => app.select_previous(),
        _ => {}
    }
}
