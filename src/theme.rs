//! Built-in color palettes for the browser.

use ratatui::style::Color;

use crate::browser::ItemType;

/// All runtime colors used in the UI.
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Tree panel
    pub tree_selected_bg: Color,
    pub tree_selected_fg: Color,
    pub tree_dir_fg: Color,
    pub tree_file_fg: Color,
    pub tree_class_fg: Color,
    pub tree_method_fg: Color,
    pub tree_attribute_fg: Color,
    pub tree_private_fg: Color,

    // Status bar
    pub status_bg: Color,
    pub status_fg: Color,

    // Borders
    pub border_fg: Color,

    // Semantic colors
    pub error_fg: Color,
    pub success_fg: Color,
    pub info_fg: Color,
    pub dim_fg: Color,
}

impl ThemeColors {
    /// Foreground for an item of the given type.
    pub fn item_fg(&self, item_type: ItemType) -> Color {
        match item_type {
            ItemType::Root | ItemType::Directory | ItemType::SysPath => self.tree_dir_fg,
            ItemType::File => self.tree_file_fg,
            ItemType::Class => self.tree_class_fg,
            ItemType::Method => self.tree_method_fg,
            ItemType::Attributes | ItemType::Attribute => self.tree_attribute_fg,
            ItemType::Coding => self.dim_fg,
        }
    }
}

/// Dark theme using the Catppuccin Mocha palette.
pub fn dark_theme() -> ThemeColors {
    ThemeColors {
        tree_selected_bg: Color::Rgb(69, 71, 90), // #45475a (surface1)
        tree_selected_fg: Color::Rgb(205, 214, 244), // #cdd6f4
        tree_dir_fg: Color::Rgb(137, 180, 250),   // #89b4fa (blue)
        tree_file_fg: Color::Rgb(205, 214, 244),  // #cdd6f4 (text)
        tree_class_fg: Color::Rgb(249, 226, 175), // #f9e2af (yellow)
        tree_method_fg: Color::Rgb(166, 227, 161), // #a6e3a1 (green)
        tree_attribute_fg: Color::Rgb(203, 166, 247), // #cba6f7 (mauve)
        tree_private_fg: Color::Rgb(108, 112, 134), // #6c7086 (overlay0)

        status_bg: Color::Rgb(30, 30, 46), // #1e1e2e (base)
        status_fg: Color::Rgb(205, 214, 244),

        border_fg: Color::Rgb(88, 91, 112), // #585b70 (surface2)

        error_fg: Color::Rgb(243, 139, 168),   // #f38ba8 (red)
        success_fg: Color::Rgb(166, 227, 161), // #a6e3a1 (green)
        info_fg: Color::Rgb(137, 180, 250),    // #89b4fa (blue)
        dim_fg: Color::Rgb(108, 112, 134),     // #6c7086
    }
}

/// Light theme using the Catppuccin Latte palette.
pub fn light_theme() -> ThemeColors {
    ThemeColors {
        tree_selected_bg: Color::Rgb(204, 208, 218), // #ccd0da (surface1)
        tree_selected_fg: Color::Rgb(76, 79, 105),   // #4c4f69 (text)
        tree_dir_fg: Color::Rgb(30, 102, 245),       // #1e66f5 (blue)
        tree_file_fg: Color::Rgb(76, 79, 105),
        tree_class_fg: Color::Rgb(223, 142, 29), // #df8e1d (yellow)
        tree_method_fg: Color::Rgb(64, 160, 43), // #40a02b (green)
        tree_attribute_fg: Color::Rgb(136, 57, 239), // #8839ef (mauve)
        tree_private_fg: Color::Rgb(156, 160, 176), // #9ca0b0 (overlay0)

        status_bg: Color::Rgb(239, 241, 245), // #eff1f5 (base)
        status_fg: Color::Rgb(76, 79, 105),

        border_fg: Color::Rgb(172, 176, 190), // #acb0be (surface2)

        error_fg: Color::Rgb(210, 15, 57),  // #d20f39 (red)
        success_fg: Color::Rgb(64, 160, 43), // #40a02b (green)
        info_fg: Color::Rgb(30, 102, 245),  // #1e66f5 (blue)
        dim_fg: Color::Rgb(156, 160, 176),
    }
}

/// Palette for a scheme name; unknown names fall back to dark.
pub fn resolve_theme(scheme: &str) -> ThemeColors {
    match scheme {
        "light" => light_theme(),
        _ => dark_theme(),
    }
}
