//! YAML table loader
//!
//! Load area tables from the embedded defaults, files, directories, or strings.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

use crate::symbols::{AreaTables, SymbolEntry, TableKind};

/// Errors that can occur when loading area tables
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid table: {0}")]
    Validation(String),
}

/// Areas compiled into the crate, in rule priority order
const BUILTIN_TABLES: [(&str, &str); 14] = [
    ("init", include_str!("../tables/init.yaml")),
    ("audio", include_str!("../tables/audio.yaml")),
    ("atomic", include_str!("../tables/atomic.yaml")),
    ("gamepad", include_str!("../tables/gamepad.yaml")),
    ("joystick", include_str!("../tables/joystick.yaml")),
    ("haptic", include_str!("../tables/haptic.yaml")),
    ("mouse", include_str!("../tables/mouse.yaml")),
    ("render", include_str!("../tables/render.yaml")),
    ("mutex", include_str!("../tables/mutex.yaml")),
    ("rect", include_str!("../tables/rect.yaml")),
    ("surface", include_str!("../tables/surface.yaml")),
    ("iostream", include_str!("../tables/iostream.yaml")),
    ("log", include_str!("../tables/log.yaml")),
    ("pixels", include_str!("../tables/pixels.yaml")),
];

/// On-disk shape of one area file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AreaFile {
    area: String,
    #[serde(default)]
    header: String,
    #[serde(default)]
    functions: Vec<RenameRow>,
    #[serde(default)]
    removed: Vec<RemovedRow>,
    #[serde(default)]
    symbols: Vec<RenameRow>,
    #[serde(default)]
    types: Vec<RenameRow>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RenameRow {
    old: String,
    new: String,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RemovedRow {
    name: String,
    #[serde(default)]
    guidance: Option<String>,
}

impl AreaFile {
    fn into_tables(self) -> Result<AreaTables, LoadError> {
        let area_name = self.area.trim().to_string();
        if area_name.is_empty() {
            return Err(LoadError::Validation("area name must not be empty".into()));
        }

        let mut area = AreaTables::new(area_name, self.header);

        for (kind, rows) in [
            (TableKind::Functions, self.functions),
            (TableKind::Symbols, self.symbols),
            (TableKind::Types, self.types),
        ] {
            for row in rows {
                if row.new.trim().is_empty() {
                    return Err(LoadError::Validation(format!(
                        "{} '{}' in area '{}' has no replacement",
                        kind, row.old, area.area
                    )));
                }
                let entry = SymbolEntry {
                    old_name: row.old,
                    new_name: row.new,
                    note: row.note.filter(|note| !note.is_empty()),
                };
                insert_checked(&mut area, kind, entry)?;
            }
        }

        for row in self.removed {
            let entry = SymbolEntry {
                old_name: row.name,
                new_name: String::new(),
                note: row.guidance.filter(|guidance| !guidance.is_empty()),
            };
            insert_checked(&mut area, TableKind::Removed, entry)?;
        }

        Ok(area)
    }
}

fn insert_checked(area: &mut AreaTables, kind: TableKind, entry: SymbolEntry) -> Result<(), LoadError> {
    let key_ok = match kind {
        TableKind::Types => !entry.old_name.trim().is_empty(),
        _ => is_identifier(&entry.old_name),
    };
    if !key_ok {
        return Err(LoadError::Validation(format!(
            "invalid {} entry '{}' in area '{}'",
            kind, entry.old_name, area.area
        )));
    }

    let name = entry.old_name.clone();
    if !area.table_mut(kind).insert(entry) {
        return Err(LoadError::Validation(format!(
            "duplicate {} entry '{}' in area '{}'",
            kind, name, area.area
        )));
    }
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Load one area from a YAML string
pub fn load_area_from_str(yaml: &str) -> Result<AreaTables, LoadError> {
    let file: AreaFile = serde_yaml::from_str(yaml)?;
    file.into_tables()
}

/// Load one area from a YAML file
pub fn load_area_from_file(path: &Path) -> Result<AreaTables, LoadError> {
    let content = fs::read_to_string(path)?;
    load_area_from_str(&content)
}

/// Load every `.yaml`/`.yml` area file below a directory.
///
/// Files that fail to load are skipped with a warning so one bad table does
/// not disable the rest.
pub fn load_areas_from_dir(dir: &Path) -> Result<Vec<AreaTables>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory not found: {}", dir.display()),
        )));
    }

    let mut areas = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let is_table = path.is_file()
            && path
                .extension()
                .map(|ext| ext == "yaml" || ext == "yml")
                .unwrap_or(false);
        if !is_table {
            continue;
        }

        match load_area_from_file(path) {
            Ok(area) => {
                tracing::debug!(
                    path = %path.display(),
                    area = %area.area,
                    entries = area.entry_count(),
                    "loaded area table"
                );
                areas.push(area);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping area table");
            }
        }
    }

    Ok(areas)
}

/// Parse the tables compiled into the crate
pub fn builtin_areas() -> Result<Vec<AreaTables>, LoadError> {
    BUILTIN_TABLES
        .iter()
        .map(|(name, yaml)| {
            let area = load_area_from_str(yaml)?;
            if area.area != *name {
                return Err(LoadError::Validation(format!(
                    "embedded table '{}' declares area '{}'",
                    name, area.area
                )));
            }
            Ok(area)
        })
        .collect()
}
