use thiserror::Error;

/// Errors raised while producing a syntax tree
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("Failed to set tree-sitter language to C++")]
    LanguageSet,

    #[error("tree-sitter failed to produce a parse tree")]
    ParseFailed,
}
