//! sdl3mig-cpp: C/C++ front end for the migration engine
//!
//! Parses a translation unit with tree-sitter's C++ grammar (which also
//! accepts the C subset SDL programs are usually written in) and lowers the
//! concrete syntax tree into an `sdl3mig_core::SyntaxTree`.

mod error;
mod lower;
mod parser;

pub use error::FrontendError;
pub use parser::{parse_source, CppParser};
