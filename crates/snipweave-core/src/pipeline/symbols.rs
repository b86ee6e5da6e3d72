//! Global symbol table built from extracted units.
//!
//! One deterministic insertion pass in file-discovery order, then frozen;
//! the resolver only ever holds it by shared reference. Insertion keeps the
//! first definition on key collisions and records a DuplicateSymbol
//! diagnostic for the discarded one.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::warn;

use crate::models::{Diagnostic, ModuleUnit, SymbolKey};

/// Frozen lookup structure over the unit arena. Maps are insertion-ordered
/// so iteration anywhere downstream stays deterministic.
#[derive(Debug, Default)]
pub struct SymbolTable {
    /// `(file_path, name)` → arena index of the defining unit.
    map: IndexMap<SymbolKey, usize>,
    /// Per file: arena indices of its named units, in source order.
    named_by_file: IndexMap<String, Vec<usize>>,
    /// Per file: arena index of its synthetic header unit.
    header_by_file: IndexMap<String, usize>,
    /// All file paths that produced at least one unit.
    known_files: HashSet<String>,
}

impl SymbolTable {
    /// Populate the table from the unit arena. `units` must already be in
    /// file-discovery order; that order decides which duplicate wins.
    pub fn build(units: &[ModuleUnit], diagnostics: &mut Vec<Diagnostic>) -> Self {
        let mut table = SymbolTable::default();
        for (index, unit) in units.iter().enumerate() {
            table.insert(index, unit, units, diagnostics);
        }
        table
    }

    fn insert(
        &mut self,
        index: usize,
        unit: &ModuleUnit,
        units: &[ModuleUnit],
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let path = unit.id.file_path.clone();
        self.known_files.insert(path.clone());

        if unit.id.is_file_header() {
            // One header per file by construction.
            self.header_by_file.insert(path, index);
            return;
        }

        self.named_by_file.entry(path.clone()).or_default().push(index);

        let key = SymbolKey {
            file_path: path,
            name: unit.id.name.clone(),
        };
        if let Some(&kept_index) = self.map.get(&key) {
            // Keep-first policy: the earlier definition stays authoritative.
            warn!(key = %key, "duplicate symbol, keeping first definition");
            diagnostics.push(Diagnostic::DuplicateSymbol {
                key,
                kept: units[kept_index].id.clone(),
                discarded: unit.id.clone(),
            });
            return;
        }
        self.map.insert(key, index);
    }

    /// Resolution-time lookup. Read-only and referentially stable.
    pub fn lookup(&self, key: &SymbolKey) -> Option<usize> {
        self.map.get(key).copied()
    }

    /// Arena index of a file's synthetic header unit.
    pub fn header_unit(&self, file_path: &str) -> Option<usize> {
        self.header_by_file.get(file_path).copied()
    }

    /// Arena indices of a file's named units, in source order.
    pub fn named_units(&self, file_path: &str) -> &[usize] {
        self.named_by_file
            .get(file_path)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `file_path` produced any unit (used by the extension
    /// candidate tie-break during resolution).
    pub fn has_file(&self, file_path: &str) -> bool {
        self.known_files.contains(file_path)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
