//! Lowering from tree-sitter's concrete syntax tree to the engine arena
//!
//! Only the shapes the matcher cares about get dedicated kinds; everything
//! else becomes `NodeKind::Other` with its named children lowered in order,
//! so references buried in unfamiliar syntax are still visited.

use sdl3mig_core::{
    BinaryOp, DeclInfo, InclusionDirective, LiteralKind, NodeId, NodeKind, SourceRange,
    SyntaxTree, TreeBuilder, UnaryOp,
};
use tree_sitter::Node;

/// Whether identifiers in the current subtree are expression references
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Expr,
    Declarator,
    Type,
}

impl Mode {
    fn for_field(self, field: Option<&str>) -> Mode {
        match field {
            Some("declarator") => Mode::Declarator,
            Some("type") => Mode::Type,
            Some("value" | "size" | "default_value" | "body" | "arguments") => Mode::Expr,
            _ => self,
        }
    }
}

pub(crate) fn lower<'src>(root: Node<'_>, source: &'src str) -> SyntaxTree<'src> {
    let mut lowerer = Lowerer {
        builder: TreeBuilder::new(source),
    };
    let parent = lowerer.builder.root();
    lowerer.lower_children(root, parent, Mode::Expr);
    lowerer.builder.finish()
}

struct Lowerer<'src> {
    builder: TreeBuilder<'src>,
}

fn range_of(node: Node<'_>) -> SourceRange {
    let bytes = node.byte_range();
    SourceRange::new(bytes.start, bytes.end)
}

fn is_trivia(node: Node<'_>) -> bool {
    !node.is_named() || node.kind() == "comment"
}

impl<'src> Lowerer<'src> {
    fn text(&self, node: Node<'_>) -> &'src str {
        self.builder.text(range_of(node)).unwrap_or("")
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind, node: Node<'_>) -> NodeId {
        self.builder.push(parent, kind, range_of(node))
    }

    fn lower_children(&mut self, node: Node<'_>, parent: NodeId, mode: Mode) {
        let mut cursor = node.walk();
        if !cursor.goto_first_child() {
            return;
        }
        loop {
            let child = cursor.node();
            if !is_trivia(child) {
                let child_mode = mode.for_field(cursor.field_name());
                self.lower_node(child, parent, child_mode);
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }

    fn lower_node(&mut self, node: Node<'_>, parent: NodeId, mode: Mode) {
        match node.kind() {
            "compound_statement" => {
                let id = self.push(parent, NodeKind::Block, node);
                self.lower_children(node, id, Mode::Expr);
            }
            "declaration" | "parameter_declaration" | "optional_parameter_declaration" => {
                let kind = match self.decl_info(node) {
                    Some(info) => NodeKind::Declaration(info),
                    None => NodeKind::Other,
                };
                let id = self.push(parent, kind, node);
                self.lower_children(node, id, Mode::Expr);
            }
            "if_statement" => self.lower_if(node, parent),
            "call_expression" => self.lower_call(node, parent),
            "identifier" => {
                let kind = if mode == Mode::Expr {
                    NodeKind::Reference
                } else {
                    NodeKind::Other
                };
                self.push(parent, kind, node);
            }
            "number_literal" => {
                let kind = literal_number_kind(self.text(node));
                self.push(parent, NodeKind::Literal(kind), node);
            }
            "string_literal" | "raw_string_literal" | "concatenated_string" => {
                self.push(parent, NodeKind::Literal(LiteralKind::String), node);
            }
            "char_literal" => {
                self.push(parent, NodeKind::Literal(LiteralKind::Char), node);
            }
            "true" | "false" => {
                self.push(parent, NodeKind::Literal(LiteralKind::Bool), node);
            }
            "null" | "nullptr" => {
                self.push(parent, NodeKind::Literal(LiteralKind::Null), node);
            }
            "binary_expression" => {
                let op = node
                    .child_by_field_name("operator")
                    .map_or(BinaryOp::Other, |op| BinaryOp::from_token(op.kind()));
                let id = self.push(parent, NodeKind::Binary(op), node);
                self.lower_children(node, id, Mode::Expr);
            }
            "unary_expression" | "pointer_expression" => {
                let op = node
                    .child_by_field_name("operator")
                    .map_or(UnaryOp::Other, |op| UnaryOp::from_token(op.kind()));
                let id = self.push(parent, NodeKind::Unary(op), node);
                self.lower_children(node, id, Mode::Expr);
            }
            "parenthesized_expression" => {
                let id = self.push(parent, NodeKind::Paren, node);
                self.lower_children(node, id, Mode::Expr);
            }
            "preproc_include" => self.lower_include(node, parent),
            "case_statement" | "labeled_statement" => {
                let id = self.push(parent, NodeKind::Labeled, node);
                self.lower_children(node, id, Mode::Expr);
            }
            kind if kind.ends_with("_statement") => {
                let id = self.push(parent, NodeKind::Statement, node);
                self.lower_children(node, id, mode);
            }
            _ => {
                let id = self.push(parent, NodeKind::Other, node);
                self.lower_children(node, id, mode);
            }
        }
    }

    /// `if` statements drop the grammar's own parentheses (C) or condition
    /// clause (C++) so child 0 is the test expression itself
    fn lower_if(&mut self, node: Node<'_>, parent: NodeId) {
        let id = self.push(parent, NodeKind::Conditional, node);

        if let Some(condition) = node.child_by_field_name("condition") {
            match condition_test(condition) {
                Some(test) => self.lower_node(test, id, Mode::Expr),
                None => {
                    let clause = self.push(id, NodeKind::Other, condition);
                    self.lower_children(condition, clause, Mode::Expr);
                }
            }
        }
        for field in ["consequence", "alternative"] {
            if let Some(branch) = node.child_by_field_name(field) {
                self.lower_node(branch, id, Mode::Expr);
            }
        }
    }

    /// Calls flatten their argument list so children read `[callee, args...]`
    fn lower_call(&mut self, node: Node<'_>, parent: NodeId) {
        let id = self.push(parent, NodeKind::Call, node);

        if let Some(function) = node.child_by_field_name("function") {
            self.lower_node(function, id, Mode::Expr);
        }
        if let Some(arguments) = node.child_by_field_name("arguments") {
            self.lower_children(arguments, id, Mode::Expr);
        }
    }

    fn lower_include(&mut self, node: Node<'_>, parent: NodeId) {
        let directive = node.child_by_field_name("path").and_then(|path| {
            let spelled = self.text(path);
            let angled = path.kind() == "system_lib_string";
            let quoted = path.kind() == "string_literal";
            if !(angled || quoted) || spelled.len() < 2 {
                return None;
            }
            Some(InclusionDirective {
                file_name: spelled[1..spelled.len() - 1].to_string(),
                angled,
                file_name_range: range_of(path),
                in_main_file: true,
            })
        });

        let kind = directive.map_or(NodeKind::Other, NodeKind::Include);
        self.push(parent, kind, node);
    }

    /// Declared type of the first declarator, spelled the way a C type
    /// printer would (`SDL_mutex *`), or `None` for declarations that do not
    /// introduce a variable
    fn decl_info(&self, node: Node<'_>) -> Option<DeclInfo> {
        let type_node = node.child_by_field_name("type")?;
        let mut declarator = node.child_by_field_name("declarator")?;

        let mut start = type_node.start_byte();
        let mut spelling = String::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.start_byte() >= type_node.start_byte() {
                break;
            }
            if child.kind() == "type_qualifier" {
                start = start.min(child.start_byte());
                spelling.push_str(self.text(child));
                spelling.push(' ');
            }
        }
        spelling.push_str(&collapse_whitespace(self.text(type_node)));

        if declarator.kind() == "init_declarator" {
            declarator = declarator.child_by_field_name("declarator")?;
        }

        let mut end = type_node.end_byte();
        let mut stars = 0usize;
        while declarator.kind() == "pointer_declarator" {
            let mut cursor = declarator.walk();
            let star = declarator
                .children(&mut cursor)
                .find(|child| child.kind() == "*");
            if let Some(star) = star {
                end = star.end_byte();
            }
            stars += 1;
            declarator = declarator.child_by_field_name("declarator")?;
        }

        if declarator.kind() == "function_declarator" {
            return None;
        }

        if stars > 0 {
            spelling.push(' ');
            spelling.push_str(&"*".repeat(stars));
        }

        Some(DeclInfo {
            type_spelling: spelling,
            type_range: SourceRange::new(start, end),
        })
    }
}

fn condition_test(condition: Node<'_>) -> Option<Node<'_>> {
    match condition.kind() {
        "condition_clause" => condition.child_by_field_name("value"),
        "parenthesized_expression" => {
            let mut cursor = condition.walk();
            let inner = condition.named_children(&mut cursor).find(|c| !is_trivia(*c));
            inner
        }
        _ => None,
    }
}

fn literal_number_kind(text: &str) -> LiteralKind {
    let lower = text.to_ascii_lowercase();
    let hex = lower.trim_start_matches(&['-', '+'][..]).starts_with("0x");
    let float = if hex {
        lower.contains('.') || lower.contains('p')
    } else {
        lower.contains('.') || lower.contains('e')
    };
    if float {
        LiteralKind::Float
    } else {
        LiteralKind::Integer
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
