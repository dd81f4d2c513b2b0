pub mod filetype;
pub mod watcher;
