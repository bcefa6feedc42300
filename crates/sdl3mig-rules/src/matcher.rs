//! Node predicates shared by the rewrite rules
//!
//! Each `match_*` function inspects a single node and returns the captured
//! sub-nodes a rule needs to build its edits, or `None`. Nothing here looks
//! at more than the node and its descendants, except parent walks done by
//! the rules themselves.

use regex::Regex;
use sdl3mig_core::{BinaryOp, InclusionDirective, NodeId, NodeKind, SourceRange, SyntaxTree, UnaryOp};

/// Constraint on one argument position of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgPattern {
    /// Any expression; the argument must merely exist
    Any,
    /// An integer literal, optionally negated
    IntegerLiteral,
}

impl ArgPattern {
    fn accepts(self, tree: &SyntaxTree<'_>, arg: NodeId) -> bool {
        match self {
            ArgPattern::Any => true,
            ArgPattern::IntegerLiteral => tree.integer_value(arg).is_some(),
        }
    }
}

/// A call whose callee is a plain named reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMatch {
    pub call: NodeId,
    /// The reference node naming the function, wrappers already peeled
    pub callee: NodeId,
    pub name: String,
    pub args: Vec<NodeId>,
}

impl CallMatch {
    pub fn arg(&self, index: usize) -> Option<NodeId> {
        self.args.get(index).copied()
    }
}

/// Match any call whose callee resolves to a named function
pub fn match_call(tree: &SyntaxTree<'_>, node: NodeId) -> Option<CallMatch> {
    if !matches!(tree.kind(node), NodeKind::Call) {
        return None;
    }
    let callee = tree.ignore_parens_and_implicit(tree.call_callee(node)?);
    if !matches!(tree.kind(callee), NodeKind::Reference) {
        return None;
    }

    Some(CallMatch {
        call: node,
        callee,
        name: tree.node_text(callee)?.to_string(),
        args: tree.call_args(node).to_vec(),
    })
}

/// Match a call to `name`, independent of its arguments
pub fn match_call_named(tree: &SyntaxTree<'_>, node: NodeId, name: &str) -> Option<CallMatch> {
    match_call(tree, node).filter(|call| call.name == name)
}

/// Match a call to `name` whose leading arguments satisfy `patterns`
/// position by position. Extra trailing arguments are allowed.
pub fn match_call_with_args(
    tree: &SyntaxTree<'_>,
    node: NodeId,
    name: &str,
    patterns: &[ArgPattern],
) -> Option<CallMatch> {
    let call = match_call_named(tree, node, name)?;
    if call.args.len() < patterns.len() {
        return None;
    }
    let accepted = patterns
        .iter()
        .zip(&call.args)
        .all(|(pattern, arg)| pattern.accepts(tree, *arg));
    if accepted {
        Some(call)
    } else {
        None
    }
}

/// A variable or parameter declaration and its written type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclMatch {
    pub decl: NodeId,
    pub type_spelling: String,
    pub type_range: SourceRange,
}

pub fn match_typed_decl(tree: &SyntaxTree<'_>, node: NodeId) -> Option<DeclMatch> {
    match tree.kind(node) {
        NodeKind::Declaration(info) => Some(DeclMatch {
            decl: node,
            type_spelling: info.type_spelling.clone(),
            type_range: info.type_range,
        }),
        _ => None,
    }
}

/// A named reference in expression position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceMatch {
    pub node: NodeId,
    pub name: String,
    pub range: SourceRange,
}

pub fn match_reference(tree: &SyntaxTree<'_>, node: NodeId) -> Option<ReferenceMatch> {
    if !matches!(tree.kind(node), NodeKind::Reference) {
        return None;
    }
    Some(ReferenceMatch {
        node,
        name: tree.node_text(node)?.to_string(),
        range: tree.range(node),
    })
}

/// The legacy error-check idioms around an SDL call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionShape {
    /// `call == -1`
    EqualsMinusOne,
    /// `call < 0`
    LessThanZero,
    /// `call == 0`
    EqualsZero,
    /// `!call`
    Negated,
}

impl ConditionShape {
    /// Whether the rewritten test is `!call` rather than the bare call
    pub fn negates(self) -> bool {
        matches!(self, ConditionShape::EqualsMinusOne | ConditionShape::LessThanZero)
    }

    /// The operator text the rewrite removes, as shown to the user
    pub fn operator(self) -> &'static str {
        match self {
            ConditionShape::EqualsMinusOne => "== -1",
            ConditionShape::LessThanZero => "< 0",
            ConditionShape::EqualsZero => "== 0",
            ConditionShape::Negated => "!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionMatch {
    pub conditional: NodeId,
    /// The whole test expression as written, parentheses included
    pub test: NodeId,
    pub call: CallMatch,
    pub shape: ConditionShape,
}

/// Match an `if` whose test is one of the four legacy shapes around a call
/// to a function whose name matches `namespace`
pub fn match_condition(tree: &SyntaxTree<'_>, node: NodeId, namespace: &Regex) -> Option<ConditionMatch> {
    if !matches!(tree.kind(node), NodeKind::Conditional) {
        return None;
    }
    let test = tree.child(node, 0)?;
    let expr = tree.ignore_parens_and_implicit(test);

    let (operand, shape) = match tree.kind(expr) {
        NodeKind::Binary(op @ (BinaryOp::Eq | BinaryOp::Lt)) => {
            let lhs = tree.child(expr, 0)?;
            let rhs = tree.integer_value(tree.child(expr, 1)?)?;
            let shape = match (op, rhs) {
                (BinaryOp::Eq, -1) => ConditionShape::EqualsMinusOne,
                (BinaryOp::Eq, 0) => ConditionShape::EqualsZero,
                (BinaryOp::Lt, 0) => ConditionShape::LessThanZero,
                _ => return None,
            };
            (lhs, shape)
        }
        NodeKind::Unary(UnaryOp::Not) => (tree.child(expr, 0)?, ConditionShape::Negated),
        _ => return None,
    };

    let call = match_call(tree, tree.ignore_parens_and_implicit(operand))?;
    if !namespace.is_match(&call.name) {
        return None;
    }

    Some(ConditionMatch {
        conditional: node,
        test,
        call,
        shape,
    })
}

/// An include directive written in the file under analysis
pub fn match_include<'t>(tree: &'t SyntaxTree<'_>, node: NodeId) -> Option<&'t InclusionDirective> {
    match tree.kind(node) {
        NodeKind::Include(directive) if directive.in_main_file => Some(directive),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdl3mig_cpp::parse_source;

    fn namespace() -> Regex {
        Regex::new(crate::engine::DEFAULT_NAMESPACE).unwrap()
    }

    fn find(tree: &SyntaxTree<'_>, pred: impl Fn(&NodeKind) -> bool) -> NodeId {
        tree.ids().find(|id| pred(tree.kind(*id))).unwrap()
    }

    fn condition_of(source: &str) -> Option<(ConditionShape, String)> {
        let tree = parse_source(source).unwrap();
        let node = find(&tree, |k| matches!(k, NodeKind::Conditional));
        match_condition(&tree, node, &namespace())
            .map(|m| (m.shape, tree.node_text(m.call.call).unwrap().to_string()))
    }

    // ==================== Calls ====================

    #[test]
    fn test_exact_call_ignores_arguments() {
        let tree = parse_source("void f() { SDL_GameControllerOpen(0); }").unwrap();
        let call = find(&tree, |k| matches!(k, NodeKind::Call));

        let m = match_call_named(&tree, call, "SDL_GameControllerOpen").unwrap();
        assert_eq!(tree.node_text(m.callee), Some("SDL_GameControllerOpen"));
        assert_eq!(m.args.len(), 1);
        assert!(match_call_named(&tree, call, "SDL_GameControllerClose").is_none());
    }

    #[test]
    fn test_member_callee_is_not_a_function() {
        let tree = parse_source("void f() { obj.SDL_FreeSurface(s); }").unwrap();
        let call = find(&tree, |k| matches!(k, NodeKind::Call));
        assert!(match_call(&tree, call).is_none());
    }

    #[test]
    fn test_argument_patterns() {
        let tree = parse_source("void f() { SDL_PauseAudioDevice(dev, 0); SDL_PauseAudioDevice(dev, paused); }")
            .unwrap();
        let calls: Vec<_> = tree
            .ids()
            .filter(|id| matches!(tree.kind(*id), NodeKind::Call))
            .collect();
        let patterns = [ArgPattern::Any, ArgPattern::IntegerLiteral];

        assert!(match_call_with_args(&tree, calls[0], "SDL_PauseAudioDevice", &patterns).is_some());
        assert!(match_call_with_args(&tree, calls[1], "SDL_PauseAudioDevice", &patterns).is_none());
    }

    #[test]
    fn test_missing_argument_slot() {
        let tree = parse_source("void f() { SDL_MixAudioFormat(d, s, AUDIO_S16, len); }").unwrap();
        let call = find(&tree, |k| matches!(k, NodeKind::Call));
        let patterns = [ArgPattern::Any; 5];

        assert!(match_call_with_args(&tree, call, "SDL_MixAudioFormat", &patterns).is_none());
    }

    // ==================== Declarations and references ====================

    #[test]
    fn test_typed_decl() {
        let tree = parse_source("void f() { SDL_cond *cond = SDL_CreateCond(); }").unwrap();
        let decl = find(&tree, |k| matches!(k, NodeKind::Declaration(_)));

        let m = match_typed_decl(&tree, decl).unwrap();
        assert_eq!(m.type_spelling, "SDL_cond *");
        assert_eq!(tree.text(m.type_range), Some("SDL_cond *"));
    }

    #[test]
    fn test_reference() {
        let tree = parse_source("void f() { int t = SDL_QUIT; }").unwrap();
        let node = find(&tree, |k| matches!(k, NodeKind::Reference));

        let m = match_reference(&tree, node).unwrap();
        assert_eq!(m.name, "SDL_QUIT");
        assert_eq!(tree.text(m.range), Some("SDL_QUIT"));
    }

    // ==================== Condition shapes ====================

    #[test]
    fn test_condition_equals_minus_one() {
        assert_eq!(
            condition_of("void f() { if (SDL_Init(SDL_INIT_VIDEO) == -1) { return; } }"),
            Some((ConditionShape::EqualsMinusOne, "SDL_Init(SDL_INIT_VIDEO)".into()))
        );
    }

    #[test]
    fn test_condition_less_than_zero() {
        assert_eq!(
            condition_of("void f() { if (SDL_SetRenderDrawColor(r, 0, 0, 0, 255) < 0) return; }"),
            Some((
                ConditionShape::LessThanZero,
                "SDL_SetRenderDrawColor(r, 0, 0, 0, 255)".into()
            ))
        );
    }

    #[test]
    fn test_condition_equals_zero() {
        assert_eq!(
            condition_of("void f() { if (SDL_GL_SetSwapInterval(1) == 0) { ok(); } }"),
            Some((ConditionShape::EqualsZero, "SDL_GL_SetSwapInterval(1)".into()))
        );
    }

    #[test]
    fn test_condition_negated() {
        assert_eq!(
            condition_of("void f() { if (!SDL_RenderClear(r)) { ok(); } }"),
            Some((ConditionShape::Negated, "SDL_RenderClear(r)".into()))
        );
    }

    #[test]
    fn test_condition_parenthesized_call() {
        assert_eq!(
            condition_of("void f() { if ((SDL_Init(0)) < 0) return; }"),
            Some((ConditionShape::LessThanZero, "SDL_Init(0)".into()))
        );
    }

    #[test]
    fn test_condition_outside_namespace() {
        assert_eq!(condition_of("void f() { if (init_audio(0) < 0) return; }"), None);
        assert_eq!(condition_of("void f() { if (SDL_strlen(s) == 0) return; }"), None);
    }

    #[test]
    fn test_condition_other_comparisons() {
        assert_eq!(condition_of("void f() { if (SDL_Init(0) != 0) return; }"), None);
        assert_eq!(condition_of("void f() { if (SDL_Init(0) < 1) return; }"), None);
        assert_eq!(condition_of("void f() { if (SDL_Init(0) == -2) return; }"), None);
        assert_eq!(condition_of("void f() { if (SDL_Init(0)) return; }"), None);
    }
}
