//! # Introduction
//!
//! twig-ast parses Twig-style templates (`{{ output }}` and `{% control %}`
//! tags embedded in text) into a syntax tree in which every node knows the
//! byte span it was derived from. Control tags are linked to their closing
//! tags, and `if` chains are threaded through their `elseif`/`else` branches.
//! Nothing is rendered or evaluated.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Engine (step functions + operator memo) → Node arena → Tree
//!                                                              ├→ JSON
//!                                                              ├→ Printer
//!                                                              └→ TUI
//! ```
//!
//! 1. [`parser`]: scans the source, builds the arena and links tags.
//!    [`parse`] and [`parse_with_options`] are the entry points.
//! 2. [`parser::node`]: the resulting [`Tree`], walked through [`NodeRef`]
//!    handles and serializable with serde.
//! 3. [`print`]: a plain-text tree dump for debugging.
//! 4. [`ui`]: ratatui-based tree viewer; not part of the stable library API.
//!
//! ## Error handling
//!
//! By default the first syntax error is returned as a [`SyntaxError`]. With
//! [`ParseOptions::tolerant`] parsing always succeeds, and errors are recorded
//! on the nodes where they happened:
//!
//! ```
//! use twig_ast::{parse_with_options, ParseOptions};
//!
//! let tree = parse_with_options("{% if a %}{{ b", ParseOptions::tolerant()).unwrap();
//! assert!(tree.has_errors());
//! ```

pub mod parser;
pub mod print;
pub mod ui;

pub use parser::{
    parse, parse_with_options, FaultKind, Node, NodeId, NodeKind, NodeRef, ParseOptions,
    SyntaxError, Tree, Value,
};
