//! Include-path rewriting
//!
//! `IncludeRewriter` maps SDL2 header spellings to their SDL3 location. It is
//! used both by the preprocessor hook (`MigrationEngine::on_inclusion`) and,
//! through `IncludeRule`, for include nodes found during traversal.
//!
//! Resolution order: exact aliases (configured ones first, then the built-in
//! ones), then the `SDL2/` prefix, then the bare `SDL_` prefix.

use sdl3mig_core::{InclusionDirective, NodeId, RewriteResult, SyntaxTree};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::matcher::match_include;
use crate::registry::{Captures, MatchKind, Rule};

const RULE_NAME: &str = "include_path";

const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("SDL2/SDL.h", "SDL3/SDL.h"),
    ("SDL2/SDL_gamecontroller.h", "SDL3/SDL_gamepad.h"),
    ("SDL2/SDL_rwops.h", "SDL3/SDL_iostream.h"),
    ("SDL.h", "SDL3/SDL.h"),
    ("SDL_gamecontroller.h", "SDL3/SDL_gamepad.h"),
    ("SDL_rwops.h", "SDL3/SDL_iostream.h"),
];

#[derive(Debug, Clone, Default)]
pub struct IncludeRewriter {
    aliases: BTreeMap<String, String>,
}

impl IncludeRewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extra exact aliases, consulted before the built-in ones
    pub fn with_aliases(aliases: BTreeMap<String, String>) -> Self {
        Self { aliases }
    }

    /// The SDL3 spelling for a header name written without delimiters, or
    /// `None` when the header is not an SDL2 header
    pub fn remap(&self, file_name: &str) -> Option<String> {
        if file_name.starts_with("SDL3/") {
            return None;
        }

        if let Some(target) = self.aliases.get(file_name) {
            return Some(target.clone());
        }
        if let Some((_, target)) = BUILTIN_ALIASES.iter().find(|(alias, _)| *alias == file_name) {
            return Some((*target).to_string());
        }

        if let Some(rest) = file_name.strip_prefix("SDL2/") {
            return Some(format!("SDL3/{}", rest));
        }
        if file_name.starts_with("SDL_") {
            return Some(format!("SDL3/{}", file_name));
        }
        None
    }

    /// Rewrite one directive, keeping its delimiter style
    pub fn rewrite(&self, directive: &InclusionDirective) -> Option<RewriteResult> {
        if !directive.in_main_file {
            return None;
        }
        let target = self.remap(&directive.file_name)?;
        if target == directive.file_name {
            return None;
        }

        let old = directive.delimit(&directive.file_name);
        let new = directive.delimit(&target);
        let message = format!("#include {} should be replaced with {} in SDL3", old, new);

        Some(
            RewriteResult::new(RULE_NAME, directive.file_name_range.start, message)
                .replace(directive.file_name_range, new),
        )
    }
}

/// Include directives that appear as nodes in the tree
pub struct IncludeRule {
    rewriter: Arc<IncludeRewriter>,
}

impl IncludeRule {
    pub fn new(rewriter: Arc<IncludeRewriter>) -> Self {
        Self { rewriter }
    }
}

impl Rule for IncludeRule {
    fn name(&self) -> &str {
        RULE_NAME
    }

    fn description(&self) -> &str {
        "Move SDL2 header includes to their SDL3 paths"
    }

    fn match_kind(&self) -> MatchKind {
        MatchKind::IncludeDirective
    }

    fn matches(&self, tree: &SyntaxTree<'_>, node: NodeId) -> Option<Captures> {
        let directive = match_include(tree, node)?;
        self.rewriter.remap(&directive.file_name)?;
        Some(Captures::Include(directive.clone()))
    }

    fn rewrite(
        &self,
        tree: &SyntaxTree<'_>,
        node: NodeId,
        captures: &Captures,
    ) -> Option<RewriteResult> {
        let Captures::Include(directive) = captures else {
            return None;
        };
        let mut result = self.rewriter.rewrite(directive)?;
        result.anchor = tree.range(node).start;
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{check_with, transform_with};
    use sdl3mig_core::SourceRange;

    fn rule() -> IncludeRule {
        IncludeRule::new(Arc::new(IncludeRewriter::new()))
    }

    fn directive(file_name: &str, angled: bool) -> InclusionDirective {
        InclusionDirective {
            file_name: file_name.to_string(),
            angled,
            file_name_range: SourceRange::new(9, 11 + file_name.len()),
            in_main_file: true,
        }
    }

    // ==================== remap ====================

    #[test]
    fn test_exact_aliases() {
        let rewriter = IncludeRewriter::new();
        assert_eq!(rewriter.remap("SDL2/SDL.h").as_deref(), Some("SDL3/SDL.h"));
        assert_eq!(rewriter.remap("SDL.h").as_deref(), Some("SDL3/SDL.h"));
        assert_eq!(
            rewriter.remap("SDL2/SDL_gamecontroller.h").as_deref(),
            Some("SDL3/SDL_gamepad.h")
        );
        assert_eq!(
            rewriter.remap("SDL_gamecontroller.h").as_deref(),
            Some("SDL3/SDL_gamepad.h")
        );
    }

    #[test]
    fn test_prefix_rules() {
        let rewriter = IncludeRewriter::new();
        assert_eq!(rewriter.remap("SDL2/SDL_audio.h").as_deref(), Some("SDL3/SDL_audio.h"));
        assert_eq!(rewriter.remap("SDL_mixer.h").as_deref(), Some("SDL3/SDL_mixer.h"));
    }

    #[test]
    fn test_non_sdl2_headers_ignored() {
        let rewriter = IncludeRewriter::new();
        assert!(rewriter.remap("SDL3/SDL.h").is_none());
        assert!(rewriter.remap("stdio.h").is_none());
        assert!(rewriter.remap("vendor/SDL_ttf.h").is_none());
    }

    #[test]
    fn test_configured_alias_wins() {
        let mut aliases = BTreeMap::new();
        aliases.insert("SDL.h".to_string(), "SDL3/SDL_main.h".to_string());
        aliases.insert("sdl_compat.h".to_string(), "SDL3/SDL.h".to_string());
        let rewriter = IncludeRewriter::with_aliases(aliases);

        assert_eq!(rewriter.remap("SDL.h").as_deref(), Some("SDL3/SDL_main.h"));
        assert_eq!(rewriter.remap("sdl_compat.h").as_deref(), Some("SDL3/SDL.h"));
        assert_eq!(rewriter.remap("SDL2/SDL.h").as_deref(), Some("SDL3/SDL.h"));
    }

    // ==================== rewrite ====================

    #[test]
    fn test_rewrite_angled() {
        let result = IncludeRewriter::new()
            .rewrite(&directive("SDL2/SDL.h", true))
            .unwrap();

        assert_eq!(result.rule, "include_path");
        assert_eq!(
            result.message,
            "#include <SDL2/SDL.h> should be replaced with <SDL3/SDL.h> in SDL3"
        );
        assert_eq!(result.edits.len(), 1);
        assert_eq!(result.edits[0].replacement, "<SDL3/SDL.h>");
    }

    #[test]
    fn test_rewrite_quoted() {
        let result = IncludeRewriter::new()
            .rewrite(&directive("SDL.h", false))
            .unwrap();

        assert_eq!(result.edits[0].replacement, "\"SDL3/SDL.h\"");
        assert_eq!(
            result.message,
            "#include \"SDL.h\" should be replaced with \"SDL3/SDL.h\" in SDL3"
        );
    }

    #[test]
    fn test_rewrite_outside_main_file() {
        let mut system = directive("SDL2/SDL.h", true);
        system.in_main_file = false;
        assert!(IncludeRewriter::new().rewrite(&system).is_none());
    }

    // ==================== Tree rule ====================

    #[test]
    fn test_rule_on_parsed_include() {
        let source = "#include <SDL2/SDL_gamecontroller.h>\n#include \"game.h\"\nint x;\n";
        assert_eq!(
            transform_with(rule(), source),
            "#include <SDL3/SDL_gamepad.h>\n#include \"game.h\"\nint x;\n"
        );

        let results = check_with(rule(), source);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].anchor, 0);
    }

    #[test]
    fn test_rule_skips_sdl3_include() {
        assert!(check_with(rule(), "#include <SDL3/SDL.h>\n").is_empty());
    }
}
