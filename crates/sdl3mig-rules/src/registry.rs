//! Rule trait and registry for SDL3 migration rules

use regex::Regex;
use sdl3mig_core::{InclusionDirective, NodeId, RewriteResult, SyntaxTree};
use std::collections::HashSet;
use std::sync::Arc;

use crate::audio;
use crate::condition::ConditionRule;
use crate::include::{IncludeRewriter, IncludeRule};
use crate::matcher::{CallMatch, ConditionMatch, DeclMatch, ReferenceMatch};
use crate::rename::TableRule;
use crate::symbols::{MigrationTables, TableKind};

/// The predicate family a rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    ExactCall,
    CallWithArgPattern,
    TypedDecl,
    SymbolReference,
    ConditionShape,
    IncludeDirective,
}

/// Sub-nodes captured by a successful match, handed back to the same rule's
/// `rewrite`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Captures {
    Call(CallMatch),
    Decl(DeclMatch),
    Reference(ReferenceMatch),
    Condition(ConditionMatch),
    Include(InclusionDirective),
}

/// A migration rule: a predicate over one node and the rewrite it triggers.
///
/// `matches` decides whether the rule claims the node. Once claimed, no
/// later rule sees the node even if `rewrite` declines by returning `None`.
pub trait Rule: Send + Sync {
    /// The unique identifier for this rule (e.g., "gamepad_renames")
    fn name(&self) -> &str;

    /// A short description of what this rule does
    fn description(&self) -> &str;

    fn match_kind(&self) -> MatchKind;

    fn matches(&self, tree: &SyntaxTree<'_>, node: NodeId) -> Option<Captures>;

    fn rewrite(
        &self,
        tree: &SyntaxTree<'_>,
        node: NodeId,
        captures: &Captures,
    ) -> Option<RewriteResult>;
}

/// Ordered rule list; registration order is evaluation priority
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Register every built-in rule over the given tables.
    ///
    /// Priority: condition normalization, include paths, the argument-aware
    /// audio rules, then each area's tables (renames, removed, symbols,
    /// types) in area order. Removed-function reports therefore only fire
    /// for calls no richer rule claimed.
    pub fn builtin(tables: Arc<MigrationTables>, namespace: Regex, includes: Option<Arc<IncludeRewriter>>) -> Self {
        let mut registry = Self::new();

        registry.register(Box::new(ConditionRule::new(namespace)));
        if let Some(includes) = includes {
            registry.register(Box::new(IncludeRule::new(includes)));
        }

        for rule in audio::rules(Arc::clone(&tables)) {
            registry.register(rule);
        }

        for (index, area) in tables.areas().iter().enumerate() {
            for kind in TableKind::ALL {
                if !area.table(kind).is_empty() {
                    registry.register(Box::new(TableRule::new(Arc::clone(&tables), index, kind)));
                }
            }
        }

        registry
    }

    /// Register a new rule at the lowest priority
    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    /// Get all rule names
    pub fn all_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Get rules filtered by enabled names
    pub fn get_enabled(&self, enabled: &HashSet<String>) -> Vec<&dyn Rule> {
        self.rules
            .iter()
            .filter(|r| enabled.contains(r.name()))
            .map(|r| r.as_ref())
            .collect()
    }

    /// Drop every rule whose name is not in `enabled`, keeping priority order
    pub fn retain_enabled(&mut self, enabled: &HashSet<String>) {
        self.rules.retain(|r| enabled.contains(r.name()));
    }

    /// Get all rules with their descriptions
    pub fn list_rules(&self) -> Vec<(&str, &str)> {
        self.rules
            .iter()
            .map(|r| (r.name(), r.description()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
