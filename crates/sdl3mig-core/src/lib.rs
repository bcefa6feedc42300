//! sdl3mig-core: Core abstractions for SDL2 → SDL3 source migration
//!
//! This crate provides:
//! - `SyntaxTree`: An arena of source-range-annotated nodes filled in by a front end
//! - `TreeBuilder`: The population API front ends use to lower their parse
//! - `TextEdit`: A located replacement or insertion against the original buffer
//! - `RewriteResult`: The message plus edits produced by one rule firing
//! - `apply_edits()`: Function to apply edits to an in-memory buffer
//! - `Visitor`: Trait for pre-order traversal of a `SyntaxTree`

mod edit;
mod tree;
pub mod visitor;

pub use edit::{apply_edits, collect_edits, EditError, RewriteResult, TextEdit};
pub use tree::{
    Ancestors, BinaryOp, DeclInfo, InclusionDirective, LiteralKind, Node, NodeId, NodeKind,
    SourceRange, SyntaxTree, TreeBuilder, UnaryOp,
};
pub use visitor::{visit, Visitor};
