//! Old to new identifier tables, grouped by SDL API area
//!
//! Every area carries four tables: renamed functions, removed functions,
//! renamed symbols (macros and enumerators) and renamed type spellings. The
//! tables are plain data; the generic table rule in `rename.rs` turns each
//! non-empty one into a rule.

use std::collections::HashMap;
use std::fmt;

use crate::loader::{self, LoadError};

/// One row of a table.
///
/// For removed functions `new_name` is empty and `note` carries the
/// migration guidance, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub old_name: String,
    pub new_name: String,
    pub note: Option<String>,
}

impl SymbolEntry {
    pub fn new(old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self {
            old_name: old_name.into(),
            new_name: new_name.into(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Which of an area's tables an entry lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Functions,
    Removed,
    Symbols,
    Types,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Functions,
        TableKind::Removed,
        TableKind::Symbols,
        TableKind::Types,
    ];

    /// Suffix used in rule names, e.g. `gamepad_renames`
    pub fn rule_suffix(self) -> &'static str {
        match self {
            TableKind::Functions => "renames",
            TableKind::Removed => "removed",
            TableKind::Symbols => "symbols",
            TableKind::Types => "types",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableKind::Functions => "functions",
            TableKind::Removed => "removed",
            TableKind::Symbols => "symbols",
            TableKind::Types => "types",
        };
        f.write_str(name)
    }
}

/// Exact-match lookup table keyed by old name, iterable in insertion order
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
    index: HashMap<String, usize>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. Returns `false` and leaves the table unchanged if the
    /// key is already present.
    pub fn insert(&mut self, entry: SymbolEntry) -> bool {
        if self.index.contains_key(&entry.old_name) {
            return false;
        }
        self.index.insert(entry.old_name.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    /// Add an entry, replacing any existing entry with the same key in place
    pub fn upsert(&mut self, entry: SymbolEntry) {
        match self.index.get(&entry.old_name) {
            Some(&slot) => self.entries[slot] = entry,
            None => {
                self.insert(entry);
            }
        }
    }

    pub fn lookup(&self, old_name: &str) -> Option<&SymbolEntry> {
        self.index.get(old_name).map(|&slot| &self.entries[slot])
    }

    pub fn contains(&self, old_name: &str) -> bool {
        self.index.contains_key(old_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolEntry> {
        self.entries.iter()
    }
}

/// The four tables of one API area
#[derive(Debug, Clone, Default)]
pub struct AreaTables {
    /// Short area name, e.g. `gamepad`
    pub area: String,
    /// The SDL3 header the area corresponds to
    pub header: String,
    pub functions: SymbolTable,
    pub removed: SymbolTable,
    pub symbols: SymbolTable,
    pub types: SymbolTable,
}

impl AreaTables {
    pub fn new(area: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            area: area.into(),
            header: header.into(),
            ..Default::default()
        }
    }

    pub fn table(&self, kind: TableKind) -> &SymbolTable {
        match kind {
            TableKind::Functions => &self.functions,
            TableKind::Removed => &self.removed,
            TableKind::Symbols => &self.symbols,
            TableKind::Types => &self.types,
        }
    }

    pub fn table_mut(&mut self, kind: TableKind) -> &mut SymbolTable {
        match kind {
            TableKind::Functions => &mut self.functions,
            TableKind::Removed => &mut self.removed,
            TableKind::Symbols => &mut self.symbols,
            TableKind::Types => &mut self.types,
        }
    }

    /// Fold another set of tables for the same area into this one; entries
    /// from `other` win on key collisions
    pub fn merge(&mut self, other: AreaTables) {
        if self.header.is_empty() {
            self.header = other.header;
        }
        let AreaTables {
            functions,
            removed,
            symbols,
            types,
            ..
        } = other;
        for (kind, table) in [
            (TableKind::Functions, functions),
            (TableKind::Removed, removed),
            (TableKind::Symbols, symbols),
            (TableKind::Types, types),
        ] {
            for entry in table.entries {
                self.table_mut(kind).upsert(entry);
            }
        }
    }

    pub fn entry_count(&self) -> usize {
        TableKind::ALL.iter().map(|kind| self.table(*kind).len()).sum()
    }
}

/// Every area known to an engine, in registration order
#[derive(Debug, Clone, Default)]
pub struct MigrationTables {
    areas: Vec<AreaTables>,
}

impl MigrationTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tables compiled into the crate
    pub fn builtin() -> Result<Self, LoadError> {
        let mut tables = Self::new();
        for area in loader::builtin_areas()? {
            tables.add_area(area);
        }
        Ok(tables)
    }

    /// Add an area, merging into an existing area of the same name
    pub fn add_area(&mut self, area: AreaTables) {
        match self.areas.iter_mut().find(|known| known.area == area.area) {
            Some(known) => known.merge(area),
            None => self.areas.push(area),
        }
    }

    pub fn areas(&self) -> &[AreaTables] {
        &self.areas
    }

    pub fn area(&self, name: &str) -> Option<&AreaTables> {
        self.areas.iter().find(|area| area.area == name)
    }

    pub fn retain_areas(&mut self, mut keep: impl FnMut(&AreaTables) -> bool) {
        self.areas.retain(|area| keep(area));
    }

    /// Look a constant up across every area's symbol table. Used when a
    /// rewrite re-emits an argument that may itself be a renamed constant.
    pub fn lookup_symbol(&self, name: &str) -> Option<&SymbolEntry> {
        self.areas.iter().find_map(|area| area.symbols.lookup(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str)]) -> SymbolTable {
        let mut table = SymbolTable::new();
        for (old, new) in entries {
            assert!(table.insert(SymbolEntry::new(*old, *new)));
        }
        table
    }

    #[test]
    fn test_exact_lookup_only() {
        let table = table(&[("SDL_RenderCopy", "SDL_RenderTexture")]);

        assert_eq!(
            table.lookup("SDL_RenderCopy").map(|e| e.new_name.as_str()),
            Some("SDL_RenderTexture")
        );
        assert!(table.lookup("SDL_RenderCopyEx").is_none());
        assert!(table.lookup("sdl_rendercopy").is_none());
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut table = table(&[("SDL_FreeFormat", "")]);

        assert!(!table.insert(SymbolEntry::new("SDL_FreeFormat", "other")));
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("SDL_FreeFormat").unwrap().new_name, "");
    }

    #[test]
    fn test_upsert_keeps_position() {
        let mut table = table(&[("A", "a"), ("B", "b")]);
        table.upsert(SymbolEntry::new("A", "z").with_note("changed"));

        let names: Vec<_> = table.iter().map(|e| e.new_name.as_str()).collect();
        assert_eq!(names, vec!["z", "b"]);
        assert_eq!(table.lookup("A").unwrap().note.as_deref(), Some("changed"));
    }

    #[test]
    fn test_add_area_merges_same_name() {
        let mut tables = MigrationTables::new();
        let mut first = AreaTables::new("audio", "SDL_audio.h");
        first.symbols.insert(SymbolEntry::new("AUDIO_S8", "SDL_AUDIO_S8"));
        let mut second = AreaTables::new("audio", "");
        second.symbols.insert(SymbolEntry::new("AUDIO_U8", "SDL_AUDIO_U8"));

        tables.add_area(first);
        tables.add_area(second);

        assert_eq!(tables.areas().len(), 1);
        assert_eq!(tables.area("audio").unwrap().header, "SDL_audio.h");
        assert_eq!(tables.area("audio").unwrap().symbols.len(), 2);
    }

    #[test]
    fn test_lookup_symbol_across_areas() {
        let mut tables = MigrationTables::new();
        let mut audio = AreaTables::new("audio", "SDL_audio.h");
        audio.symbols.insert(SymbolEntry::new("AUDIO_F32", "SDL_AUDIO_F32LE"));
        let mut log = AreaTables::new("log", "SDL_log.h");
        log.symbols.insert(SymbolEntry::new("SDL_NUM_LOG_PRIORITIES", "SDL_LOG_PRIORITY_COUNT"));
        tables.add_area(audio);
        tables.add_area(log);

        assert_eq!(
            tables.lookup_symbol("SDL_NUM_LOG_PRIORITIES").unwrap().new_name,
            "SDL_LOG_PRIORITY_COUNT"
        );
        assert!(tables.lookup_symbol("SDL_RenderCopy").is_none());
    }

    #[test]
    fn test_builtin_tables_cover_every_area() {
        let tables = MigrationTables::builtin().unwrap();
        let names: Vec<_> = tables.areas().iter().map(|a| a.area.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "init", "audio", "atomic", "gamepad", "joystick", "haptic", "mouse", "render",
                "mutex", "rect", "surface", "iostream", "log", "pixels"
            ]
        );
        assert_eq!(
            tables.lookup_symbol("AUDIO_S16").unwrap().new_name,
            "SDL_AUDIO_S16LE"
        );
        assert_eq!(
            tables
                .area("gamepad")
                .unwrap()
                .functions
                .lookup("SDL_GameControllerOpen")
                .unwrap()
                .new_name,
            "SDL_OpenGamepad"
        );
    }

    #[test]
    fn test_builtin_superseded_entries() {
        let tables = MigrationTables::builtin().unwrap();
        let init = tables.area("init").unwrap();

        // Rewritten by dedicated rules rather than reported as removed
        assert!(!init.removed.contains("SDL_GetAudioDeviceStatus"));
        assert!(!init.removed.contains("SDL_MixAudioFormat"));
        // Kept as the fallback for non-literal selectors
        assert!(init.removed.contains("SDL_GetNumAudioDevices"));
        // Reported once, from the pixels area
        assert!(!tables.area("surface").unwrap().removed.contains("SDL_FreeFormat"));
        assert!(tables.area("pixels").unwrap().removed.contains("SDL_FreeFormat"));
    }
}
