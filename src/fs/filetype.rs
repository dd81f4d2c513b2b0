use std::path::Path;

use crate::clbr::{SourceExtensions, SourceLanguage};

/// Image formats shown with the pixmap icon.
const PIXMAP_EXTENSIONS: &[&str] = &[
    "bmp", "gif", "ico", "jpeg", "jpg", "pbm", "pgm", "png", "ppm", "tif", "tiff", "webp", "xbm",
    "xpm",
];

/// Classification of a file by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Source(SourceLanguage),
    Designer,
    DesignerHeader,
    Linguist,
    Resources,
    Project,
    MultiProject,
    Pixmap,
    Svg,
    D,
    Misc,
}

impl FileKind {
    /// Classify a file extension (lowercase, with leading dot).
    ///
    /// Extensionless files fall back to `language` when one is given.
    pub fn classify(ext: &str, exts: &SourceExtensions, language: Option<SourceLanguage>) -> Self {
        if ext.is_empty() {
            return match language {
                Some(lang) => FileKind::Source(lang),
                None => FileKind::Misc,
            };
        }
        if let Some(lang) = exts.language_for(ext) {
            return FileKind::Source(lang);
        }
        match ext {
            ".ui" => FileKind::Designer,
            ".ui.h" => FileKind::DesignerHeader,
            ".ts" | ".qm" => FileKind::Linguist,
            ".qrc" => FileKind::Resources,
            ".e3p" | ".e3pz" | ".e4p" | ".e4pz" => FileKind::Project,
            ".e4m" | ".e4mz" => FileKind::MultiProject,
            ".svg" => FileKind::Svg,
            ".d" | ".di" => FileKind::D,
            _ if PIXMAP_EXTENSIONS.contains(&&ext[1..]) => FileKind::Pixmap,
            _ => FileKind::Misc,
        }
    }

    /// Source files get an outline reader and are populated lazily.
    pub fn language(&self) -> Option<SourceLanguage> {
        match self {
            FileKind::Source(lang) => Some(*lang),
            _ => None,
        }
    }
}

/// Lowercase extension with its leading dot; `.ui.h` is kept whole.
pub fn file_ext(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if name.ends_with(".ui.h") {
        return ".ui.h".to_string();
    }
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}
