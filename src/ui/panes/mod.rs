//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`tree`]: Flattened syntax tree with the selected node highlighted
//! - [`source`]: Template source with the selected node's span highlighted
//! - [`status`]: Status bar with keybindings and selection info
//!
//! Each pane module exports a primary `render_*` function plus the scroll
//! state it keeps between frames.

pub mod source;
pub mod status;
pub mod tree;

// Re-export render functions for convenience
pub use source::{render_source_pane, SourceScrollState};
pub use status::{render_status_bar, StatusRenderData};
pub use tree::{flatten_tree, render_tree_pane, TreeRow, TreeScrollState};
