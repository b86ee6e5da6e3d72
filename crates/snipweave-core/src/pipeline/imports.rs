//! Relative import resolution against the frozen symbol table.
//!
//! Each import specifier yields at most one edge per target unit. Bare
//! package imports carry no path hint and are skipped outright; everything
//! else either resolves to concrete units or becomes an UnresolvedImport
//! diagnostic. Resolution never fails the run.

use rayon::prelude::*;
use tracing::debug;

use crate::models::{DependencyEdge, Diagnostic, ImportSpecifier, ModuleUnit, SymbolKey};
use crate::pipeline::symbols::SymbolTable;

/// Collapse `.` and `..` components of a `/`-separated path. `..` at the
/// repository root pops nothing, so escaping imports degrade to root-level
/// paths rather than panicking.
pub fn normalize_posix_path(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            _ => stack.push(part),
        }
    }
    stack.join("/")
}

/// Join an import hint onto the importing file's directory and normalize.
fn target_base(from_file: &str, hint: &str) -> String {
    let dir = match from_file.rfind('/') {
        Some(pos) => &from_file[..pos],
        None => "",
    };
    normalize_posix_path(&format!("{dir}/{hint}"))
}

/// Find the file a normalized extensionless base refers to. Tries the base
/// verbatim (hints may carry an explicit extension), then each configured
/// extension, then the directory-module convention `<base>/__init__<ext>`.
fn candidate_file(base: &str, table: &SymbolTable, extensions: &[String]) -> Option<String> {
    if table.has_file(base) {
        return Some(base.to_string());
    }
    for ext in extensions {
        let with_ext = format!("{base}{ext}");
        if table.has_file(&with_ext) {
            return Some(with_ext);
        }
    }
    for ext in extensions {
        let init = format!("{base}/__init__{ext}");
        if table.has_file(&init) {
            return Some(init);
        }
    }
    None
}

/// Fallback for paths whose last segment is a symbol rather than a module:
/// `from .a.b import c` where `a.py` defines `b`. Returns the arena index
/// of that symbol when it exists.
fn parent_symbol_fallback(
    base: &str,
    table: &SymbolTable,
    extensions: &[String],
) -> Option<usize> {
    let split = base.rfind('/')?;
    let (parent, segment) = (&base[..split], &base[split + 1..]);
    if parent.is_empty() || segment.is_empty() {
        return None;
    }
    let parent_file = extensions
        .iter()
        .map(|ext| format!("{parent}{ext}"))
        .find(|p| table.has_file(p))?;
    table.lookup(&SymbolKey {
        file_path: parent_file,
        name: segment.to_string(),
    })
}

fn resolve_specifier(
    unit: &ModuleUnit,
    specifier: &ImportSpecifier,
    units: &[ModuleUnit],
    table: &SymbolTable,
    extensions: &[String],
    edges: &mut Vec<DependencyEdge>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let hint = match &specifier.relative_path_hint {
        Some(h) => h,
        // Bare package import: external dependency, out of scope.
        None => return,
    };
    let base = target_base(&unit.id.file_path, hint);
    let target_file = candidate_file(&base, table, extensions);

    let mut push_edge = |to_index: usize| {
        edges.push(DependencyEdge {
            from: unit.id.clone(),
            to: units[to_index].id.clone(),
            via: specifier.clone(),
        });
    };

    match (&target_file, &specifier.symbol_name) {
        (Some(file), Some(name)) => {
            let key = SymbolKey {
                file_path: file.clone(),
                name: name.clone(),
            };
            match table.lookup(&key) {
                Some(index) => push_edge(index),
                None => {
                    diagnostics.push(Diagnostic::UnresolvedImport {
                        from: unit.id.clone(),
                        specifier: specifier.raw_text.clone(),
                    });
                }
            }
        }
        (Some(file), None) => {
            // Whole-module import: depends on the header unit plus every
            // named unit of the target file, in file order.
            if let Some(header) = table.header_unit(file) {
                push_edge(header);
            }
            for &index in table.named_units(file) {
                push_edge(index);
            }
        }
        (None, _) => match parent_symbol_fallback(&base, table, extensions) {
            Some(index) => push_edge(index),
            None => {
                diagnostics.push(Diagnostic::UnresolvedImport {
                    from: unit.id.clone(),
                    specifier: specifier.raw_text.clone(),
                });
            }
        },
    }
}

/// Resolve every unit's raw imports. Units are processed in parallel, but
/// results are merged back in arena order so that edges and diagnostics
/// are byte-identical across runs.
pub fn resolve_imports(
    units: &[ModuleUnit],
    table: &SymbolTable,
    extensions: &[String],
) -> (Vec<DependencyEdge>, Vec<Diagnostic>) {
    let per_unit: Vec<(Vec<DependencyEdge>, Vec<Diagnostic>)> = units
        .par_iter()
        .map(|unit| {
            let mut edges = Vec::new();
            let mut diagnostics = Vec::new();
            for specifier in &unit.raw_imports {
                resolve_specifier(
                    unit,
                    specifier,
                    units,
                    table,
                    extensions,
                    &mut edges,
                    &mut diagnostics,
                );
            }
            (edges, diagnostics)
        })
        .collect();

    let mut edges = Vec::new();
    let mut diagnostics = Vec::new();
    for (unit_edges, unit_diagnostics) in per_unit {
        edges.extend(unit_edges);
        diagnostics.extend(unit_diagnostics);
    }
    debug!(
        edges = edges.len(),
        unresolved = diagnostics.len(),
        "import resolution complete"
    );
    (edges, diagnostics)
}
