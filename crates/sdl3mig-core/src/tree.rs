//! Arena-indexed syntax tree handed to the engine by a front end
//!
//! Nodes live in a flat `Vec` and refer to each other by `NodeId`. Parent
//! links are indices too, so upward walks (statement-boundary discovery)
//! never chase owning pointers.

use std::fmt;

/// A half-open byte range `[start, end)` into the original source buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SourceRange {
    pub start: usize,
    pub end: usize,
}

impl SourceRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "inverted range {}..{}", start, end);
        Self { start, end }
    }

    /// A zero-length range, used for insertions
    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `other` lies entirely within this range
    pub fn contains(&self, other: SourceRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True if the two ranges would clobber each other when both applied.
    ///
    /// Touching ranges do not overlap, and an insertion only overlaps a
    /// replacement when it falls strictly inside it.
    pub fn overlaps(&self, other: SourceRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Index of a node inside its `SyntaxTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Literal flavours the matcher distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Integer,
    Float,
    String,
    Char,
    Bool,
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    LogicalAnd,
    LogicalOr,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Other,
}

impl BinaryOp {
    pub fn from_token(token: &str) -> Self {
        match token {
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            "&&" | "and" => BinaryOp::LogicalAnd,
            "||" | "or" => BinaryOp::LogicalOr,
            "&" | "bitand" => BinaryOp::BitAnd,
            "|" | "bitor" => BinaryOp::BitOr,
            "^" | "xor" => BinaryOp::BitXor,
            "<<" => BinaryOp::Shl,
            ">>" => BinaryOp::Shr,
            _ => BinaryOp::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    BitNot,
    AddressOf,
    Deref,
    Other,
}

impl UnaryOp {
    pub fn from_token(token: &str) -> Self {
        match token {
            "!" | "not" => UnaryOp::Not,
            "-" => UnaryOp::Neg,
            "+" => UnaryOp::Plus,
            "~" | "compl" => UnaryOp::BitNot,
            "&" => UnaryOp::AddressOf,
            "*" => UnaryOp::Deref,
            _ => UnaryOp::Other,
        }
    }
}

/// Declared-type information carried by a variable declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclInfo {
    /// Normalized spelling, e.g. `SDL_mutex *` for `SDL_mutex* m`
    pub type_spelling: String,
    /// Range of the written type, from the type specifier through the last `*`
    pub type_range: SourceRange,
}

/// A `#include` directive as reported by the front end or preprocessor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionDirective {
    /// The header name without delimiters, e.g. `SDL2/SDL.h`
    pub file_name: String,
    /// `<...>` when true, `"..."` otherwise
    pub angled: bool,
    /// Range of the header name including its delimiters
    pub file_name_range: SourceRange,
    /// Whether the directive is written in the file under analysis
    pub in_main_file: bool,
}

impl InclusionDirective {
    /// Wrap a header name in this directive's delimiter style
    pub fn delimit(&self, file_name: &str) -> String {
        if self.angled {
            format!("<{}>", file_name)
        } else {
            format!("\"{}\"", file_name)
        }
    }
}

/// What a node is. Child layout per kind:
///
/// - `Call`: `[callee, arg0, arg1, ...]`
/// - `Conditional`: `[test, then, else?]`
/// - `Binary`: `[lhs, rhs]`
/// - `Unary`, `Paren`, `ImplicitCast`: `[operand]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    TranslationUnit,
    /// A braced compound statement
    Block,
    /// Any statement that is not a block, declaration or conditional
    Statement,
    /// A `case`, `default` or goto label together with the statements it
    /// prefixes
    Labeled,
    Declaration(DeclInfo),
    Conditional,
    Call,
    /// A named reference in expression position
    Reference,
    Literal(LiteralKind),
    Binary(BinaryOp),
    Unary(UnaryOp),
    Paren,
    /// Decay or coercion inserted by a semantic front end
    ImplicitCast,
    Include(InclusionDirective),
    Other,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub range: SourceRange,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// An immutable, fully lowered tree plus the buffer its ranges point into
#[derive(Debug, Clone)]
pub struct SyntaxTree<'src> {
    source: &'src str,
    nodes: Vec<Node>,
}

impl<'src> SyntaxTree<'src> {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn range(&self, id: NodeId) -> SourceRange {
        self.node(id).range
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    /// Iterate over every node id in arena order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Verbatim source text for a range, `None` if the range is not valid in
    /// this buffer
    pub fn text(&self, range: SourceRange) -> Option<&'src str> {
        self.source.get(range.start..range.end)
    }

    pub fn node_text(&self, id: NodeId) -> Option<&'src str> {
        self.text(self.range(id))
    }

    /// Walk parent links upward, nearest first
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, 'src> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Strip parentheses and `ImplicitCast` wrappers
    pub fn ignore_parens_and_implicit(&self, mut id: NodeId) -> NodeId {
        while matches!(self.kind(id), NodeKind::ImplicitCast | NodeKind::Paren) {
            match self.child(id, 0) {
                Some(inner) => id = inner,
                None => break,
            }
        }
        id
    }

    pub fn call_callee(&self, id: NodeId) -> Option<NodeId> {
        match self.kind(id) {
            NodeKind::Call => self.child(id, 0),
            _ => None,
        }
    }

    pub fn call_args(&self, id: NodeId) -> &[NodeId] {
        match self.kind(id) {
            NodeKind::Call if !self.children(id).is_empty() => &self.children(id)[1..],
            _ => &[],
        }
    }

    /// Name of the function a call invokes, looking through decay wrappers
    /// around the callee reference
    pub fn callee_name(&self, call: NodeId) -> Option<&'src str> {
        let callee = self.ignore_parens_and_implicit(self.call_callee(call)?);
        match self.kind(callee) {
            NodeKind::Reference => self.node_text(callee),
            _ => None,
        }
    }

    /// Value of an integer literal, also accepting a unary minus applied to one
    pub fn integer_value(&self, id: NodeId) -> Option<i64> {
        let id = self.ignore_parens_and_implicit(id);
        match self.kind(id) {
            NodeKind::Literal(LiteralKind::Integer) => parse_integer(self.node_text(id)?),
            NodeKind::Unary(UnaryOp::Neg) => {
                let operand = self.ignore_parens_and_implicit(self.child(id, 0)?);
                match self.kind(operand) {
                    NodeKind::Literal(LiteralKind::Integer) => {
                        parse_integer(self.node_text(operand)?)?.checked_neg()
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// The nearest ancestor-or-self that sits directly inside a `Block`.
    ///
    /// Returns `None` when the walk reaches the root without crossing a block,
    /// e.g. for file-scope initializers.
    pub fn enclosing_block_statement(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if matches!(self.kind(parent), NodeKind::Block) {
                return Some(current);
            }
            current = parent;
        }
        None
    }

    /// Leading whitespace of the line containing `offset`
    pub fn indentation_at(&self, offset: usize) -> &'src str {
        let offset = offset.min(self.source.len());
        let line_start = self.source[..offset].rfind('\n').map_or(0, |i| i + 1);
        let line = &self.source[line_start..];
        let width = line
            .find(|c: char| c != ' ' && c != '\t')
            .unwrap_or(line.len());
        &line[..width]
    }

    /// True if only whitespace precedes `offset` on its line
    pub fn starts_line(&self, offset: usize) -> bool {
        let offset = offset.min(self.source.len());
        let line_start = self.source[..offset].rfind('\n').map_or(0, |i| i + 1);
        self.indentation_at(offset).len() == offset - line_start
    }
}

pub struct Ancestors<'t, 'src> {
    tree: &'t SyntaxTree<'src>,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_, '_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Parse a C integer literal: sign, radix prefix, digit separators and
/// `u`/`l` suffixes
fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let body = body.trim_end_matches(&['u', 'U', 'l', 'L'][..]);
    let digits: String = body.chars().filter(|c| *c != '\'').collect();

    let (radix, digits) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex.to_string())
    } else if let Some(bin) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        (2, bin.to_string())
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, digits[1..].to_string())
    } else {
        (10, digits)
    };

    let value = i64::from_str_radix(&digits, radix).ok()?;
    Some(if negative { -value } else { value })
}

/// Incremental construction API used by front ends.
///
/// Nodes must be pushed parent-first; children keep push order, which is the
/// order the engine visits them in.
pub struct TreeBuilder<'src> {
    source: &'src str,
    nodes: Vec<Node>,
}

impl<'src> TreeBuilder<'src> {
    /// Start a tree whose root is a `TranslationUnit` spanning the whole buffer
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            nodes: vec![Node {
                kind: NodeKind::TranslationUnit,
                range: SourceRange::new(0, source.len()),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn push(&mut self, parent: NodeId, kind: NodeKind, range: SourceRange) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            range,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Text of a range in the buffer being lowered
    pub fn text(&self, range: SourceRange) -> Option<&'src str> {
        self.source.get(range.start..range.end)
    }

    pub fn finish(self) -> SyntaxTree<'src> {
        SyntaxTree {
            source: self.source,
            nodes: self.nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range_of(source: &str, needle: &str) -> SourceRange {
        let start = source.find(needle).unwrap();
        SourceRange::new(start, start + needle.len())
    }

    /// `void f() { int n = g(-1); }` lowered by hand
    fn sample() -> (SyntaxTree<'static>, NodeId, NodeId, NodeId) {
        let source = "void f() {\n    int n = g(-1);\n}\n";
        let mut b = TreeBuilder::new(source);
        let func = b.push(b.root(), NodeKind::Other, range_of(source, "void f() {\n    int n = g(-1);\n}"));
        let block = b.push(func, NodeKind::Block, range_of(source, "{\n    int n = g(-1);\n}"));
        let decl = b.push(
            block,
            NodeKind::Declaration(DeclInfo {
                type_spelling: "int".to_string(),
                type_range: range_of(source, "int"),
            }),
            range_of(source, "int n = g(-1);"),
        );
        let call = b.push(decl, NodeKind::Call, range_of(source, "g(-1)"));
        b.push(call, NodeKind::Reference, range_of(source, "g"));
        let neg = b.push(call, NodeKind::Unary(UnaryOp::Neg), range_of(source, "-1"));
        let one = range_of(source, "1)");
        b.push(neg, NodeKind::Literal(LiteralKind::Integer), SourceRange::new(one.start, one.start + 1));
        (b.finish(), decl, call, neg)
    }

    #[test]
    fn test_parent_and_children_links() {
        let (tree, decl, call, _) = sample();
        assert_eq!(tree.parent(call), Some(decl));
        assert_eq!(tree.children(call).len(), 3);
        assert_eq!(tree.call_args(call).len(), 1);
        assert_eq!(tree.callee_name(call), Some("g"));
    }

    #[test]
    fn test_ancestors_walk_to_root() {
        let (tree, decl, call, _) = sample();
        let chain: Vec<NodeId> = tree.ancestors(call).collect();
        assert_eq!(chain.first(), Some(&decl));
        assert_eq!(chain.last(), Some(&tree.root()));
    }

    #[test]
    fn test_enclosing_block_statement() {
        let (tree, decl, call, _) = sample();
        assert_eq!(tree.enclosing_block_statement(call), Some(decl));
    }

    #[test]
    fn test_no_enclosing_block_at_file_scope() {
        let source = "int n = g(1);";
        let mut b = TreeBuilder::new(source);
        let decl = b.push(
            b.root(),
            NodeKind::Declaration(DeclInfo {
                type_spelling: "int".to_string(),
                type_range: SourceRange::new(0, 3),
            }),
            SourceRange::new(0, 13),
        );
        let call = b.push(decl, NodeKind::Call, SourceRange::new(8, 12));
        let tree = b.finish();
        assert_eq!(tree.enclosing_block_statement(call), None);
    }

    #[test]
    fn test_integer_value_through_unary_minus() {
        let (tree, _, _, neg) = sample();
        assert_eq!(tree.integer_value(neg), Some(-1));
    }

    #[test]
    fn test_parse_integer_forms() {
        assert_eq!(parse_integer("0"), Some(0));
        assert_eq!(parse_integer("-1"), Some(-1));
        assert_eq!(parse_integer("0x10"), Some(16));
        assert_eq!(parse_integer("010"), Some(8));
        assert_eq!(parse_integer("1'000u"), Some(1000));
        assert_eq!(parse_integer("42UL"), Some(42));
        assert_eq!(parse_integer("abc"), None);
    }

    #[test]
    fn test_indentation_at() {
        let (tree, decl, _, _) = sample();
        assert_eq!(tree.indentation_at(tree.range(decl).start), "    ");
        assert_eq!(tree.indentation_at(0), "");
    }

    #[test]
    fn test_starts_line() {
        let (tree, decl, call, _) = sample();
        assert!(tree.starts_line(tree.range(decl).start));
        assert!(!tree.starts_line(tree.range(call).start));
        assert!(tree.starts_line(0));
    }

    #[test]
    fn test_range_overlap_rules() {
        let replaced = SourceRange::new(10, 20);
        assert!(!replaced.overlaps(SourceRange::empty(10)));
        assert!(!replaced.overlaps(SourceRange::empty(20)));
        assert!(replaced.overlaps(SourceRange::empty(15)));
        assert!(!replaced.overlaps(SourceRange::new(20, 25)));
        assert!(replaced.overlaps(SourceRange::new(19, 25)));
        assert!(!SourceRange::empty(5).overlaps(SourceRange::empty(5)));
    }
}
