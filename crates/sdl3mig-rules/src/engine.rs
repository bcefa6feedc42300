//! Dispatch driver
//!
//! Walks a tree in pre-order and offers every node to the registered rules
//! in priority order. The first rule whose predicate matches claims the
//! node; later rules never see it, even when the claiming rule's rewrite
//! declines.
//!
//! Firings are checked against the ranges already edited in the pass.
//! Parents are visited before their children, so when an enclosing rewrite
//! already replaced a range, a nested firing that overlaps it is dropped.

use sdl3mig_core::{InclusionDirective, NodeId, RewriteResult, SourceRange, SyntaxTree, Visitor};
use std::sync::Arc;

use crate::config::{ConfigError, MigrationConfig};
use crate::include::IncludeRewriter;
use crate::loader::{load_area_from_file, load_areas_from_dir};
use crate::registry::RuleRegistry;
use crate::symbols::MigrationTables;

/// Callee pattern for condition rewrites when none is configured
pub const DEFAULT_NAMESPACE: &str = "^SDL_[A-Z]";

/// A frozen rule set plus the include hook.
///
/// Immutable once built; one engine can serve passes on many threads.
pub struct MigrationEngine {
    registry: RuleRegistry,
    includes: Option<Arc<IncludeRewriter>>,
}

impl MigrationEngine {
    /// Engine over an explicit registry, with no include hook
    pub fn new(registry: RuleRegistry) -> Self {
        Self {
            registry,
            includes: None,
        }
    }

    pub fn with_includes(mut self, includes: Arc<IncludeRewriter>) -> Self {
        self.includes = Some(includes);
        self
    }

    /// Every built-in rule over the built-in tables
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_config(&MigrationConfig::default())
    }

    /// Build the rule set a configuration describes
    pub fn from_config(config: &MigrationConfig) -> Result<Self, ConfigError> {
        let mut tables = MigrationTables::builtin()?;
        for path in &config.tables.extra {
            let areas = if path.is_dir() {
                load_areas_from_dir(path)?
            } else {
                vec![load_area_from_file(path)?]
            };
            for area in areas {
                tracing::debug!(path = %path.display(), area = %area.area, "adding area table");
                tables.add_area(area);
            }
        }
        tables.retain_areas(|area| config.area_enabled(&area.area));

        let includes = if config.includes.enabled {
            Some(Arc::new(IncludeRewriter::with_aliases(config.includes.aliases.clone())))
        } else {
            None
        };

        let mut registry = RuleRegistry::builtin(
            Arc::new(tables),
            config.namespace_pattern()?,
            includes.clone(),
        );
        let enabled = config.effective_rules(&registry.all_names());
        registry.retain_enabled(&enabled);

        tracing::debug!(rules = registry.len(), "migration engine ready");

        Ok(Self { registry, includes })
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.registry.all_names()
    }

    /// Run one pass over a translation unit. Results come out in traversal
    /// order; their edits never overlap each other.
    pub fn run(&self, tree: &SyntaxTree<'_>) -> Vec<RewriteResult> {
        let mut pass = DispatchPass {
            registry: &self.registry,
            ledger: EditLedger::default(),
            results: Vec::new(),
        };
        pass.visit_tree(tree);
        pass.results
    }

    /// Preprocessor hook for include directives reported outside the tree
    pub fn on_inclusion(&self, directive: &InclusionDirective) -> Option<RewriteResult> {
        self.includes.as_ref()?.rewrite(directive)
    }
}

/// Ranges edited so far in one pass
#[derive(Debug, Default)]
struct EditLedger {
    claimed: Vec<SourceRange>,
}

impl EditLedger {
    fn conflicts(&self, result: &RewriteResult) -> bool {
        self.claimed.iter().any(|range| result.touches(*range))
    }

    fn claim(&mut self, result: &RewriteResult) {
        self.claimed.extend(result.edits.iter().map(|edit| edit.range));
    }
}

struct DispatchPass<'r> {
    registry: &'r RuleRegistry,
    ledger: EditLedger,
    results: Vec<RewriteResult>,
}

impl Visitor for DispatchPass<'_> {
    fn visit_node(&mut self, tree: &SyntaxTree<'_>, id: NodeId) -> bool {
        for rule in self.registry.iter() {
            let Some(captures) = rule.matches(tree, id) else {
                continue;
            };

            match rule.rewrite(tree, id, &captures) {
                Some(result) => {
                    if let Err(e) = result.validate() {
                        tracing::debug!(rule = rule.name(), error = %e, "dropping invalid rewrite");
                    } else if self.ledger.conflicts(&result) {
                        tracing::debug!(
                            rule = rule.name(),
                            offset = result.anchor,
                            "suppressed rewrite overlapping an earlier edit"
                        );
                    } else {
                        tracing::debug!(
                            rule = rule.name(),
                            kind = ?rule.match_kind(),
                            offset = result.anchor,
                            "rule fired"
                        );
                        self.ledger.claim(&result);
                        self.results.push(result);
                    }
                }
                None => {
                    tracing::trace!(rule = rule.name(), node = id.index(), "rewrite declined");
                }
            }
            break;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{IncludesConfig, RulesConfig, TablesConfig};
    use crate::testing::{check_builtin, transform_builtin};
    use sdl3mig_cpp::parse_source;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    // ==================== Dispatch ====================

    #[test]
    fn test_results_in_traversal_order() {
        let source = "void f() {\n  SDL_GameControllerOpen(0);\n  SDL_RenderCopy(r, t, NULL, NULL);\n}\n";
        let results = check_builtin(source);

        let rules: Vec<_> = results.iter().map(|r| r.rule.as_str()).collect();
        assert_eq!(rules, vec!["gamepad_renames", "render_renames"]);
        assert!(results[0].anchor < results[1].anchor);
    }

    #[test]
    fn test_first_match_claims_node() {
        // audio_device_count is registered before init_removed
        let results = check_builtin("void f() { SDL_GetNumAudioDevices(0); }");

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].rule, "audio_device_count");
    }

    #[test]
    fn test_condition_and_nested_rename_both_apply() {
        assert_eq!(
            transform_builtin("void f() { if (SDL_GameControllerAddMapping(m) == -1) {} }"),
            "void f() { if (!SDL_AddGamepadMapping(m)) {} }"
        );
    }

    #[test]
    fn test_overlapping_nested_firing_suppressed() {
        let results = check_builtin(
            "void f() { SDL_MixAudioFormat(d, s, AUDIO_S16, len, SDL_MIX_MAXVOLUME); }",
        );

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].rule, "audio_mix_format");
    }

    #[test]
    fn test_edits_never_overlap() {
        let source = "void f() {\n  SDL_AudioStream *s = SDL_NewAudioStream(AUDIO_S16, 1, 44100, AUDIO_F32, 2, 48000);\n  \
                      if (SDL_Init(SDL_INIT_AUDIO) < 0) { return; }\n  SDL_PauseAudioDevice(dev, 0);\n}\n";
        let results = check_builtin(source);
        let edits = sdl3mig_core::collect_edits(&results);

        for (i, a) in edits.iter().enumerate() {
            for b in edits.iter().skip(i + 1) {
                assert!(!a.range.overlaps(b.range), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_unrelated_code_untouched() {
        let source = "int add(int a, int b) { if (a < 0) return b; return a + b; }";
        assert!(check_builtin(source).is_empty());
    }

    // ==================== Include hook ====================

    fn directive(file_name: &str, in_main_file: bool) -> InclusionDirective {
        InclusionDirective {
            file_name: file_name.to_string(),
            angled: true,
            file_name_range: SourceRange::new(9, 11 + file_name.len()),
            in_main_file,
        }
    }

    #[test]
    fn test_on_inclusion() {
        let engine = MigrationEngine::builtin().unwrap();

        let result = engine.on_inclusion(&directive("SDL2/SDL_audio.h", true)).unwrap();
        assert_eq!(result.edits[0].replacement, "<SDL3/SDL_audio.h>");
        assert!(engine.on_inclusion(&directive("SDL2/SDL_audio.h", false)).is_none());
        assert!(engine.on_inclusion(&directive("SDL3/SDL.h", true)).is_none());
    }

    #[test]
    fn test_on_inclusion_disabled() {
        let config = MigrationConfig {
            includes: IncludesConfig {
                enabled: false,
                aliases: BTreeMap::new(),
            },
            ..Default::default()
        };
        let engine = MigrationEngine::from_config(&config).unwrap();

        assert!(engine.on_inclusion(&directive("SDL2/SDL.h", true)).is_none());
        assert!(!engine.rule_names().contains(&"include_path"));
    }

    // ==================== Configuration ====================

    #[test]
    fn test_disabled_rule_not_run() {
        let config = MigrationConfig {
            rules: RulesConfig {
                enabled: None,
                disabled: vec!["gamepad_renames".to_string()],
            },
            ..Default::default()
        };
        let engine = MigrationEngine::from_config(&config).unwrap();
        let tree = parse_source("void f() { SDL_GameControllerOpen(0); }").unwrap();

        assert!(engine.run(&tree).is_empty());
        assert!(!engine.rule_names().contains(&"gamepad_renames"));
    }

    #[test]
    fn test_disabled_area_drops_its_rules() {
        let config: MigrationConfig = toml::from_str("[areas]\ndisabled = [\"mutex\"]\n").unwrap();
        let engine = MigrationEngine::from_config(&config).unwrap();

        assert!(!engine.rule_names().iter().any(|name| name.starts_with("mutex_")));
        assert!(engine.rule_names().contains(&"render_renames"));
    }

    #[test]
    fn test_extra_tables_loaded() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("net.yaml");
        fs::write(
            &path,
            "area: net\nheader: SDL_net.h\nfunctions:\n  - { old: SDLNet_Init, new: NET_Init }\n",
        )
        .unwrap();

        let config = MigrationConfig {
            tables: TablesConfig { extra: vec![path] },
            ..Default::default()
        };
        let engine = MigrationEngine::from_config(&config).unwrap();
        let tree = parse_source("void f() { SDLNet_Init(); }").unwrap();
        let results = engine.run(&tree);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].rule, "net_renames");
        assert_eq!(results[0].edits[0].replacement, "NET_Init");
    }

    #[test]
    fn test_extra_table_missing_is_an_error() {
        let temp = TempDir::new().unwrap();
        let config = MigrationConfig {
            tables: TablesConfig {
                extra: vec![temp.path().join("absent.yaml")],
            },
            ..Default::default()
        };
        assert!(matches!(
            MigrationEngine::from_config(&config),
            Err(ConfigError::Tables(_))
        ));
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MigrationEngine>();
    }
}
