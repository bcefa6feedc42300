//! Audio rules that need more than a rename
//!
//! The SDL3 audio API changed shape, not just names. Each rule here reads
//! the call's arguments before deciding what to emit:
//!
//! - `audio_init`, `audio_quit`: the whole call becomes a subsystem call
//! - `audio_device_count`: the 0/1 selector picks the target function
//! - `audio_device_pause`: the toggle picks pause or resume and is dropped
//! - `audio_mix_format`: the 0..128 volume becomes a 0.0..1.0 float
//! - `audio_stream_split`: six scalars become two hoisted `SDL_AudioSpec`s

use sdl3mig_core::{NodeId, NodeKind, RewriteResult, SourceRange, SyntaxTree};
use std::sync::Arc;

use crate::matcher::{match_call_named, match_call_with_args, ArgPattern, CallMatch};
use crate::registry::{Captures, MatchKind, Rule};
use crate::symbols::MigrationTables;

/// The argument-aware audio rules, in priority order
pub fn rules(tables: Arc<MigrationTables>) -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(audio_init()),
        Box::new(audio_quit()),
        Box::new(audio_device_count()),
        Box::new(audio_device_pause()),
        Box::new(audio_mix_format(Arc::clone(&tables))),
        Box::new(audio_stream_split(tables)),
    ]
}

fn audio_init() -> CallReplacementRule {
    CallReplacementRule {
        name: "audio_init",
        description: "Replace SDL_AudioInit() with SDL_InitSubSystem(SDL_INIT_AUDIO)",
        function: "SDL_AudioInit",
        replacement: "SDL_InitSubSystem(SDL_INIT_AUDIO)",
        message: "SDL_AudioInit() has been removed in SDL3. Use SDL_InitSubSystem(SDL_INIT_AUDIO) instead. \
                  To choose a specific driver, use the SDL_AUDIO_DRIVER hint",
    }
}

fn audio_quit() -> CallReplacementRule {
    CallReplacementRule {
        name: "audio_quit",
        description: "Replace SDL_AudioQuit() with SDL_QuitSubSystem(SDL_INIT_AUDIO)",
        function: "SDL_AudioQuit",
        replacement: "SDL_QuitSubSystem(SDL_INIT_AUDIO)",
        message: "SDL_AudioQuit() has been removed in SDL3. Use SDL_QuitSubSystem(SDL_INIT_AUDIO) instead",
    }
}

fn audio_device_count() -> ValueDispatchRule {
    ValueDispatchRule {
        name: "audio_device_count",
        description: "Pick the playback or recording device list from the SDL_GetNumAudioDevices() selector",
        function: "SDL_GetNumAudioDevices",
        selector: 0,
        zero_target: "SDL_GetAudioPlaybackDevices",
        nonzero_target: "SDL_GetAudioRecordingDevices",
        fill: &["NULL"],
    }
}

fn audio_device_pause() -> PauseToggleRule {
    PauseToggleRule {
        name: "audio_device_pause",
        description: "Split SDL_PauseAudioDevice(dev, flag) into pause and resume calls",
        function: "SDL_PauseAudioDevice",
        toggle: 1,
        pause: "SDL_PauseAudioDevice",
        resume: "SDL_ResumeAudioDevice",
    }
}

fn audio_mix_format(tables: Arc<MigrationTables>) -> ScaleConversionRule {
    ScaleConversionRule {
        name: "audio_mix_format",
        description: "Rewrite SDL_MixAudioFormat() to SDL_MixAudio() with a float volume",
        function: "SDL_MixAudioFormat",
        target: "SDL_MixAudio",
        format_arg: 2,
        scaled_arg: 4,
        sentinel: "SDL_MIX_MAXVOLUME",
        denominator: 128,
        tables,
    }
}

fn audio_stream_split(tables: Arc<MigrationTables>) -> CallSplitRule {
    CallSplitRule {
        name: "audio_stream_split",
        description: "Split SDL_NewAudioStream() into SDL_AudioSpec declarations and SDL_CreateAudioStream()",
        function: "SDL_NewAudioStream",
        target: "SDL_CreateAudioStream",
        spec_type: "SDL_AudioSpec",
        specs: [("srcspec", 0), ("dstspec", 3)],
        tables,
    }
}

/// Text of `arg`, replaced by its SDL3 name when it is a renamed constant
fn remapped_arg(tables: &MigrationTables, tree: &SyntaxTree<'_>, arg: NodeId) -> Option<String> {
    let text = tree.node_text(arg)?;
    let inner = tree.ignore_parens_and_implicit(arg);
    if matches!(tree.kind(inner), NodeKind::Reference) {
        if let Some(entry) = tree.node_text(inner).and_then(|name| tables.lookup_symbol(name)) {
            return Some(entry.new_name.clone());
        }
    }
    Some(text.to_string())
}

/// Whole-identifier occurrence of `ident` in `text`
fn mentions(text: &str, ident: &str) -> bool {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|word| word == ident)
}

fn call_capture(captures: &Captures) -> Option<&CallMatch> {
    match captures {
        Captures::Call(call) => Some(call),
        _ => None,
    }
}

// ==================== Whole-call replacement ====================

/// Replace an entire call expression with fixed text
pub struct CallReplacementRule {
    name: &'static str,
    description: &'static str,
    function: &'static str,
    replacement: &'static str,
    message: &'static str,
}

impl Rule for CallReplacementRule {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn match_kind(&self) -> MatchKind {
        MatchKind::ExactCall
    }

    fn matches(&self, tree: &SyntaxTree<'_>, node: NodeId) -> Option<Captures> {
        match_call_named(tree, node, self.function).map(Captures::Call)
    }

    fn rewrite(
        &self,
        tree: &SyntaxTree<'_>,
        _node: NodeId,
        captures: &Captures,
    ) -> Option<RewriteResult> {
        let call = call_capture(captures)?;
        let range = tree.range(call.call);
        Some(RewriteResult::new(self.name, range.start, self.message).replace(range, self.replacement))
    }
}

// ==================== Value-dependent dispatch ====================

/// Choose the target function from an integer selector argument.
///
/// The selector is dropped, the remaining arguments are kept in order and
/// `fill` arguments are appended.
pub struct ValueDispatchRule {
    name: &'static str,
    description: &'static str,
    function: &'static str,
    selector: usize,
    zero_target: &'static str,
    nonzero_target: &'static str,
    fill: &'static [&'static str],
}

impl ValueDispatchRule {
    fn patterns(&self) -> Vec<ArgPattern> {
        let mut patterns = vec![ArgPattern::Any; self.selector + 1];
        patterns[self.selector] = ArgPattern::IntegerLiteral;
        patterns
    }
}

impl Rule for ValueDispatchRule {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn match_kind(&self) -> MatchKind {
        MatchKind::CallWithArgPattern
    }

    fn matches(&self, tree: &SyntaxTree<'_>, node: NodeId) -> Option<Captures> {
        match_call_with_args(tree, node, self.function, &self.patterns()).map(Captures::Call)
    }

    fn rewrite(
        &self,
        tree: &SyntaxTree<'_>,
        _node: NodeId,
        captures: &Captures,
    ) -> Option<RewriteResult> {
        let call = call_capture(captures)?;
        let selector = tree.integer_value(call.arg(self.selector)?)?;
        let target = if selector == 0 {
            self.zero_target
        } else {
            self.nonzero_target
        };

        let mut args = Vec::with_capacity(call.args.len() + self.fill.len());
        for (index, arg) in call.args.iter().enumerate() {
            if index != self.selector {
                args.push(tree.node_text(*arg)?.to_string());
            }
        }
        args.extend(self.fill.iter().map(|fill| fill.to_string()));

        let first = tree.range(*call.args.first()?);
        let last = tree.range(*call.args.last()?);
        let message = format!(
            "{}() has been removed in SDL3; use {}() which returns an array of device IDs",
            self.function, target
        );

        Some(
            RewriteResult::new(self.name, tree.range(call.call).start, message)
                .replace(tree.range(call.callee), target)
                .replace(SourceRange::new(first.start, last.end), args.join(", ")),
        )
    }
}

// ==================== Arity change with polarity flip ====================

/// Drop a boolean-like argument and encode it in the function name instead
pub struct PauseToggleRule {
    name: &'static str,
    description: &'static str,
    function: &'static str,
    toggle: usize,
    pause: &'static str,
    resume: &'static str,
}

impl Rule for PauseToggleRule {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn match_kind(&self) -> MatchKind {
        MatchKind::CallWithArgPattern
    }

    fn matches(&self, tree: &SyntaxTree<'_>, node: NodeId) -> Option<Captures> {
        let mut patterns = vec![ArgPattern::Any; self.toggle + 1];
        patterns[self.toggle] = ArgPattern::IntegerLiteral;
        match_call_with_args(tree, node, self.function, &patterns).map(Captures::Call)
    }

    fn rewrite(
        &self,
        tree: &SyntaxTree<'_>,
        _node: NodeId,
        captures: &Captures,
    ) -> Option<RewriteResult> {
        let call = call_capture(captures)?;
        let toggle = call.arg(self.toggle)?;
        let retained = call.arg(self.toggle.checked_sub(1)?)?;
        let pausing = tree.integer_value(toggle)? != 0;

        let anchor = tree.range(call.call).start;
        let elided = SourceRange::new(tree.range(retained).end, tree.range(toggle).end);

        let result = if pausing {
            let message = format!(
                "{}() no longer takes a second argument; call {}() with one argument to pause",
                self.function, self.pause
            );
            let result = RewriteResult::new(self.name, anchor, message);
            if self.pause == call.name {
                result
            } else {
                result.replace(tree.range(call.callee), self.pause)
            }
        } else {
            let message = format!(
                "{}() no longer takes a second argument; use {}() to unpause",
                self.function, self.resume
            );
            RewriteResult::new(self.name, anchor, message).replace(tree.range(call.callee), self.resume)
        };

        Some(result.replace(elided, ""))
    }
}

// ==================== Unit/scale conversion ====================

/// Move an integer fixed-range argument to a float ratio, remapping a format
/// constant along the way
pub struct ScaleConversionRule {
    name: &'static str,
    description: &'static str,
    function: &'static str,
    target: &'static str,
    format_arg: usize,
    scaled_arg: usize,
    sentinel: &'static str,
    denominator: u32,
    tables: Arc<MigrationTables>,
}

impl ScaleConversionRule {
    fn scaled(&self, tree: &SyntaxTree<'_>, arg: NodeId) -> Option<String> {
        let text = tree.node_text(arg)?.trim();
        if text == self.sentinel {
            return Some("1.0".to_string());
        }
        let operand = match tree.kind(arg) {
            NodeKind::Literal(_) | NodeKind::Reference | NodeKind::Call | NodeKind::Paren => text.to_string(),
            _ => format!("({})", text),
        };
        Some(format!("(float){} / {}", operand, self.denominator))
    }
}

impl Rule for ScaleConversionRule {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn match_kind(&self) -> MatchKind {
        MatchKind::CallWithArgPattern
    }

    fn matches(&self, tree: &SyntaxTree<'_>, node: NodeId) -> Option<Captures> {
        let arity = self.format_arg.max(self.scaled_arg) + 1;
        match_call_with_args(tree, node, self.function, &vec![ArgPattern::Any; arity]).map(Captures::Call)
    }

    fn rewrite(
        &self,
        tree: &SyntaxTree<'_>,
        _node: NodeId,
        captures: &Captures,
    ) -> Option<RewriteResult> {
        let call = call_capture(captures)?;
        let format = call.arg(self.format_arg)?;
        let volume = call.arg(self.scaled_arg)?;

        let message = format!(
            "{}() has been renamed to {}() in SDL3; the volume is now a float between 0.0 and 1.0",
            self.function, self.target
        );
        let mut result = RewriteResult::new(self.name, tree.range(call.call).start, message)
            .replace(tree.range(call.callee), self.target);

        let remapped = remapped_arg(&self.tables, tree, format)?;
        if Some(remapped.as_str()) != tree.node_text(format) {
            result = result.replace(tree.range(format), remapped);
        }

        Some(result.replace(tree.range(volume), self.scaled(tree, volume)?))
    }
}

// ==================== Call splitting ====================

/// Replace a many-scalar constructor call with aggregate declarations hoisted
/// above the enclosing statement and a call taking their addresses
pub struct CallSplitRule {
    name: &'static str,
    description: &'static str,
    function: &'static str,
    target: &'static str,
    spec_type: &'static str,
    /// Variable name and first argument index of each `{format, channels, rate}` group
    specs: [(&'static str, usize); 2],
    tables: Arc<MigrationTables>,
}

impl CallSplitRule {
    /// The statement the declarations go above. `None` outside a block, or
    /// when a `case` or goto label sits between the call and its block.
    fn hoist_point(&self, tree: &SyntaxTree<'_>, call: NodeId) -> Option<NodeId> {
        let statement = tree.enclosing_block_statement(call)?;
        let block = tree.parent(statement);
        let labeled = tree
            .ancestors(call)
            .take_while(|id| Some(*id) != block)
            .any(|id| matches!(tree.kind(id), NodeKind::Labeled));
        (!labeled).then_some(statement)
    }

    /// Variable name suffix for this firing. Names already spelled in the
    /// block are skipped, and each earlier split into the same block takes
    /// one free suffix.
    fn suffix(&self, tree: &SyntaxTree<'_>, call: NodeId, block: NodeId) -> Option<String> {
        let start = tree.range(call).start;
        let earlier = tree
            .ids()
            .filter(|id| tree.range(*id).start < start)
            .filter(|id| self.matches(tree, *id).is_some())
            .filter(|id| self.hoist_point(tree, *id).and_then(|s| tree.parent(s)) == Some(block))
            .count();

        let text = tree.node_text(block)?;
        let taken = |suffix: &str| {
            self.specs
                .iter()
                .any(|(var, _)| mentions(text, &format!("{}{}", var, suffix)))
        };
        std::iter::once(String::new())
            .chain((2u32..).map(|n| n.to_string()))
            .filter(|suffix| !taken(suffix.as_str()))
            .nth(earlier)
    }

    fn declaration(&self, tree: &SyntaxTree<'_>, call: &CallMatch, var: &str, first: usize) -> Option<String> {
        let format = remapped_arg(&self.tables, tree, call.arg(first)?)?;
        let channels = tree.node_text(call.arg(first + 1)?)?;
        let rate = tree.node_text(call.arg(first + 2)?)?;
        Some(format!(
            "{} {} = {{{}, {}, {}}};",
            self.spec_type, var, format, channels, rate
        ))
    }
}

impl Rule for CallSplitRule {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn match_kind(&self) -> MatchKind {
        MatchKind::CallWithArgPattern
    }

    fn matches(&self, tree: &SyntaxTree<'_>, node: NodeId) -> Option<Captures> {
        match_call_with_args(tree, node, self.function, &[ArgPattern::Any; 6]).map(Captures::Call)
    }

    fn rewrite(
        &self,
        tree: &SyntaxTree<'_>,
        _node: NodeId,
        captures: &Captures,
    ) -> Option<RewriteResult> {
        let call = call_capture(captures)?;
        let Some(statement) = self.hoist_point(tree, call.call) else {
            tracing::trace!(rule = self.name, "no statement to hoist above, call left as is");
            return None;
        };
        let suffix = self.suffix(tree, call.call, tree.parent(statement)?)?;
        let at = tree.range(statement).start;
        let separator = if tree.starts_line(at) {
            format!("\n{}", tree.indentation_at(at))
        } else {
            " ".to_string()
        };

        let mut hoisted = String::new();
        let mut vars = Vec::with_capacity(self.specs.len());
        for (var, first) in self.specs {
            let var = format!("{}{}", var, suffix);
            hoisted.push_str(&self.declaration(tree, call, &var, first)?);
            hoisted.push_str(&separator);
            vars.push(format!("&{}", var));
        }

        let message = format!(
            "{}() has been replaced by {}() in SDL3; the formats are now passed as {} structures",
            self.function, self.target, self.spec_type
        );
        Some(
            RewriteResult::new(self.name, tree.range(call.call).start, message)
                .insert(at, hoisted)
                .replace(tree.range(call.call), format!("{}({})", self.target, vars.join(", "))),
        )
    }
}
