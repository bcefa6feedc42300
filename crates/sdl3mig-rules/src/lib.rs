//! sdl3mig-rules: SDL2 to SDL3 migration rules
//!
//! Rule families, in priority order:
//! - condition_polarity: `if (SDL_Init(f) < 0)` to `if (!SDL_Init(f))`
//! - include_path: `<SDL2/SDL.h>` to `<SDL3/SDL.h>`
//! - audio_*: argument-aware audio rewrites (dispatch, pause/resume, volume
//!   scaling, stream construction)
//! - `{area}_renames`, `{area}_removed`, `{area}_symbols`, `{area}_types`:
//!   one rule per non-empty table of each API area
//!
//! `MigrationEngine` runs the registered rules over a `SyntaxTree` and
//! returns one `RewriteResult` per firing.

pub mod audio;
pub mod condition;
pub mod config;
pub mod engine;
pub mod include;
pub mod loader;
pub mod matcher;
pub mod registry;
pub mod rename;
pub mod symbols;

pub use config::{ConfigError, MigrationConfig};
pub use engine::{MigrationEngine, DEFAULT_NAMESPACE};
pub use include::IncludeRewriter;
pub use loader::{load_area_from_file, load_area_from_str, load_areas_from_dir, LoadError};
pub use registry::{Captures, MatchKind, Rule, RuleRegistry};
pub use symbols::{AreaTables, MigrationTables, SymbolEntry, SymbolTable, TableKind};

#[cfg(test)]
pub(crate) mod testing {
    use sdl3mig_core::{apply_edits, collect_edits, RewriteResult};
    use sdl3mig_cpp::parse_source;

    use crate::engine::MigrationEngine;
    use crate::registry::{Rule, RuleRegistry};

    fn run(engine: &MigrationEngine, source: &str) -> Vec<RewriteResult> {
        let tree = parse_source(source).unwrap();
        engine.run(&tree)
    }

    fn apply(source: &str, results: &[RewriteResult]) -> String {
        apply_edits(source, &collect_edits(results)).unwrap()
    }

    /// Run a single rule over `source`
    pub fn check_with(rule: impl Rule + 'static, source: &str) -> Vec<RewriteResult> {
        let mut registry = RuleRegistry::new();
        registry.register(Box::new(rule));
        run(&MigrationEngine::new(registry), source)
    }

    pub fn transform_with(rule: impl Rule + 'static, source: &str) -> String {
        let results = check_with(rule, source);
        apply(source, &results)
    }

    /// Run every built-in rule over `source`
    pub fn check_builtin(source: &str) -> Vec<RewriteResult> {
        run(&MigrationEngine::builtin().unwrap(), source)
    }

    pub fn transform_builtin(source: &str) -> String {
        let results = check_builtin(source);
        apply(source, &results)
    }
}
