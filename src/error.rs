use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// I/O errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal initialization or rendering errors.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// An item id that no longer refers to a live tree item.
    #[error("Unknown browser item")]
    UnknownItem,

    /// `remove_child` was asked to remove an item its parent does not own.
    #[error("Child is not present in the parent's child list")]
    ChildNotFound,

    /// A child row outside the parent's current bounds.
    #[error("Row {row} out of range (item has {count} children)")]
    RowOutOfRange { row: usize, count: usize },

    /// A parent-relative query on the root item.
    #[error("Item has no parent")]
    NoParent,

    /// The source reader could not locate the requested module.
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    /// No outline reader exists for the module's language.
    #[error("No source reader for {0}")]
    UnsupportedLanguage(String),

    /// Session state could not be serialized.
    #[error("Session error: {0}")]
    Session(#[from] toml::ser::Error),

    /// JSON output errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
