//! The browser model: a lazily populated tree of directories, files and
//! source outlines, plus a flattened view over it.

pub mod change;
pub mod item;
pub mod model;
pub mod order;
pub mod populate;
pub mod tree;
pub mod view;

pub use change::{ModelChange, TraceObserver};
pub use item::{Icon, ItemId, ItemType};
pub use model::BrowserModel;
pub use order::{SortOrder, SortPolicy};
pub use view::{BrowserView, FlatRow};
