//! Rule: condition_polarity
//!
//! SDL3 functions that used to return an int error code now return `bool`.
//! The legacy error checks around them are rewritten to test the result
//! directly:
//!
//! ```c
//! if (SDL_Init(f) == -1)   // -> if (!SDL_Init(f))
//! if (SDL_Init(f) < 0)     // -> if (!SDL_Init(f))
//! if (SDL_Init(f) == 0)    // -> if (SDL_Init(f))
//! if (!SDL_Init(f))        // -> if (SDL_Init(f))
//! ```
//!
//! Only the text around the call is edited. The call itself stays untouched
//! so a rename of its callee can land in the same pass.

use regex::Regex;
use sdl3mig_core::{NodeId, RewriteResult, SourceRange, SyntaxTree};

use crate::matcher::{match_condition, ConditionShape};
use crate::registry::{Captures, MatchKind, Rule};

pub struct ConditionRule {
    namespace: Regex,
}

impl ConditionRule {
    /// `namespace` selects which callees count as migrated SDL functions
    pub fn new(namespace: Regex) -> Self {
        Self { namespace }
    }
}

fn message(shape: ConditionShape) -> String {
    if shape.negates() {
        format!(
            "SDL3 functions that returned a negative error now return bool; remove '{}' and negate to indicate failure",
            shape.operator()
        )
    } else {
        format!(
            "SDL3 functions that returned 0 for success now return bool; remove '{}' for the success branch",
            shape.operator()
        )
    }
}

impl Rule for ConditionRule {
    fn name(&self) -> &str {
        "condition_polarity"
    }

    fn description(&self) -> &str {
        "Rewrite int error checks around SDL calls into bool tests"
    }

    fn match_kind(&self) -> MatchKind {
        MatchKind::ConditionShape
    }

    fn matches(&self, tree: &SyntaxTree<'_>, node: NodeId) -> Option<Captures> {
        match_condition(tree, node, &self.namespace).map(Captures::Condition)
    }

    fn rewrite(
        &self,
        tree: &SyntaxTree<'_>,
        _node: NodeId,
        captures: &Captures,
    ) -> Option<RewriteResult> {
        let Captures::Condition(condition) = captures else {
            return None;
        };

        let outer = tree.range(condition.test);
        let call = tree.range(condition.call.call);
        if !outer.contains(call) {
            return None;
        }
        let prefix = SourceRange::new(outer.start, call.start);
        let suffix = SourceRange::new(call.end, outer.end);

        let mut result = RewriteResult::new(
            self.name(),
            tree.range(condition.conditional).start,
            message(condition.shape),
        );

        match (condition.shape.negates(), prefix.is_empty()) {
            (true, true) => result = result.insert(call.start, "!"),
            (true, false) => result = result.replace(prefix, "!"),
            (false, false) => result = result.replace(prefix, ""),
            (false, true) => {}
        }
        if !suffix.is_empty() {
            result = result.replace(suffix, "");
        }

        Some(result)
    }
}
