use sdl3mig_core::SyntaxTree;
use tree_sitter::{Node, Parser};

use crate::error::FrontendError;
use crate::lower::lower;

/// Tree-sitter parser wrapper for C and C++ source code.
pub struct CppParser {
    parser: Parser,
}

impl CppParser {
    pub fn new() -> Result<Self, FrontendError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_cpp::LANGUAGE.into())
            .map_err(|_| FrontendError::LanguageSet)?;

        Ok(Self { parser })
    }

    /// Parse a translation unit and lower it into an engine syntax tree.
    ///
    /// Syntax errors are tolerated: tree-sitter recovers locally and the
    /// unparsable regions simply lower to opaque nodes.
    pub fn parse<'src>(&mut self, source: &'src str) -> Result<SyntaxTree<'src>, FrontendError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or(FrontendError::ParseFailed)?;

        let root = tree.root_node();
        if root.has_error() {
            tracing::debug!(errors = count_error_nodes(root), "translation unit has syntax errors");
        }

        Ok(lower(root, source))
    }
}

/// Parse with a throwaway parser
pub fn parse_source(source: &str) -> Result<SyntaxTree<'_>, FrontendError> {
    CppParser::new()?.parse(source)
}

fn count_error_nodes(node: Node<'_>) -> usize {
    let mut count = usize::from(node.is_error() || node.is_missing());
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        count += count_error_nodes(child);
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdl3mig_core::NodeKind;

    #[test]
    fn parse_valid_c() {
        let mut parser = CppParser::new().unwrap();
        let tree = parser.parse("int main(void) { return 0; }").unwrap();

        assert!(matches!(tree.kind(tree.root()), NodeKind::TranslationUnit));
        assert!(tree.len() > 1);
    }

    #[test]
    fn parse_recovers_from_errors() {
        let tree = parse_source("int main( { SDL_Quit(); }").unwrap();
        assert!(matches!(tree.kind(tree.root()), NodeKind::TranslationUnit));
    }
}
