//! Rule: one area table (renames, removed, symbols or types)
//!
//! A single rule type covers every per-area table. The table kind decides
//! what the rule matches and what it emits:
//!
//! ```c
//! // functions: callee only
//! SDL_GameControllerOpen(0);        // -> SDL_OpenGamepad(0);
//! // symbols: the reference
//! if (e.type == SDL_QUIT)           // -> SDL_EVENT_QUIT
//! // types: the written declaration type
//! SDL_mutex *lock;                  // -> SDL_Mutex *lock;
//! // removed: diagnostic only
//! SDL_NumHaptics();
//! ```

use sdl3mig_core::{NodeId, RewriteResult, SyntaxTree};
use std::sync::Arc;

use crate::matcher::{match_call, match_reference, match_typed_decl};
use crate::registry::{Captures, MatchKind, Rule};
use crate::symbols::{AreaTables, MigrationTables, SymbolEntry, TableKind};

pub struct TableRule {
    name: String,
    description: String,
    tables: Arc<MigrationTables>,
    area: usize,
    kind: TableKind,
}

impl TableRule {
    /// Rule over the `kind` table of the area at `area` in `tables`
    pub fn new(tables: Arc<MigrationTables>, area: usize, kind: TableKind) -> Self {
        let (area_name, header) = tables
            .areas()
            .get(area)
            .map(|a| (a.area.clone(), a.header.clone()))
            .unwrap_or_default();

        let description = match kind {
            TableKind::Functions => format!("Rename {} functions to their SDL3 names", header),
            TableKind::Removed => format!("Report {} functions removed in SDL3", header),
            TableKind::Symbols => format!("Rename {} constants and enumerators", header),
            TableKind::Types => format!("Rename {} types in declarations", header),
        };

        Self {
            name: format!("{}_{}", area_name, kind.rule_suffix()),
            description,
            tables,
            area,
            kind,
        }
    }

    fn area(&self) -> Option<&AreaTables> {
        self.tables.areas().get(self.area)
    }

    fn lookup(&self, key: &str) -> Option<&SymbolEntry> {
        self.area()?.table(self.kind).lookup(key)
    }
}

fn with_note(message: String, note: Option<&str>) -> String {
    match note {
        Some(note) => format!("{} ({})", message, note),
        None => message,
    }
}

impl Rule for TableRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn match_kind(&self) -> MatchKind {
        match self.kind {
            TableKind::Functions | TableKind::Removed => MatchKind::ExactCall,
            TableKind::Symbols => MatchKind::SymbolReference,
            TableKind::Types => MatchKind::TypedDecl,
        }
    }

    fn matches(&self, tree: &SyntaxTree<'_>, node: NodeId) -> Option<Captures> {
        match self.kind {
            TableKind::Functions | TableKind::Removed => {
                let call = match_call(tree, node)?;
                self.lookup(&call.name)?;
                Some(Captures::Call(call))
            }
            TableKind::Symbols => {
                let reference = match_reference(tree, node)?;
                self.lookup(&reference.name)?;
                Some(Captures::Reference(reference))
            }
            TableKind::Types => {
                let decl = match_typed_decl(tree, node)?;
                self.lookup(&decl.type_spelling)?;
                Some(Captures::Decl(decl))
            }
        }
    }

    fn rewrite(
        &self,
        tree: &SyntaxTree<'_>,
        _node: NodeId,
        captures: &Captures,
    ) -> Option<RewriteResult> {
        match (self.kind, captures) {
            (TableKind::Functions, Captures::Call(call)) => {
                let entry = self.lookup(&call.name)?;
                let message = with_note(
                    format!("{}() has been renamed to {}() in SDL3", entry.old_name, entry.new_name),
                    entry.note.as_deref(),
                );
                Some(
                    RewriteResult::new(&self.name, tree.range(call.call).start, message)
                        .replace(tree.range(call.callee), entry.new_name.as_str()),
                )
            }
            (TableKind::Removed, Captures::Call(call)) => {
                let entry = self.lookup(&call.name)?;
                let message = match &entry.note {
                    Some(guidance) => format!("{}() has been removed in SDL3; {}", entry.old_name, guidance),
                    None => format!("{}() has been removed in SDL3", entry.old_name),
                };
                Some(RewriteResult::new(&self.name, tree.range(call.call).start, message))
            }
            (TableKind::Symbols, Captures::Reference(reference)) => {
                let entry = self.lookup(&reference.name)?;
                let message = with_note(
                    format!("{} has been renamed to {} in SDL3", entry.old_name, entry.new_name),
                    entry.note.as_deref(),
                );
                Some(
                    RewriteResult::new(&self.name, reference.range.start, message)
                        .replace(reference.range, entry.new_name.as_str()),
                )
            }
            (TableKind::Types, Captures::Decl(decl)) => {
                let entry = self.lookup(&decl.type_spelling)?;
                let message = with_note(
                    format!("{} has been renamed to {} in SDL3", entry.old_name, entry.new_name),
                    entry.note.as_deref(),
                );
                Some(
                    RewriteResult::new(&self.name, decl.type_range.start, message)
                        .replace(decl.type_range, entry.new_name.as_str()),
                )
            }
            _ => None,
        }
    }
}
