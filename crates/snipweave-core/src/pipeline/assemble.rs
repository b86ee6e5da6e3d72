//! Snippet assembly from the ordered unit sequence.
//!
//! Emits each unit's exact source bytes once, each preceded by a stable
//! header line naming its file and symbol. File-header units are pulled in
//! front of the first named unit of their file when the traversal reaches
//! the named unit first.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::models::{ModuleUnit, Snippet, SnippetSection, SourceFile};

/// Header line for one unit. Stable format, safe to grep.
fn section_header(unit: &ModuleUnit) -> String {
    if unit.id.is_file_header() {
        format!("==== {} ====", unit.id.file_path)
    } else {
        format!(
            "==== {} :: {} ({}) ====",
            unit.id.file_path,
            unit.id.name,
            unit.kind.label()
        )
    }
}

/// Assemble the final snippet from the dependency-first order.
///
/// `order` must contain every arena index exactly once. The emitted-set
/// enforces the dedup invariant when header units are pulled forward.
pub fn assemble(
    order: &[usize],
    units: &[ModuleUnit],
    files: &IndexMap<String, SourceFile>,
) -> Snippet {
    let header_of_file: HashMap<&str, usize> = units
        .iter()
        .enumerate()
        .filter(|(_, u)| u.id.is_file_header())
        .map(|(i, u)| (u.id.file_path.as_str(), i))
        .collect();

    let mut emitted = vec![false; units.len()];
    let mut sections = Vec::with_capacity(units.len());

    let mut emit = |index: usize, emitted: &mut Vec<bool>, sections: &mut Vec<SnippetSection>| {
        if emitted[index] {
            return;
        }
        emitted[index] = true;
        let unit = &units[index];
        let body = files
            .get(&unit.id.file_path)
            .map(|f| unit.text(&f.text).to_string())
            .unwrap_or_default();
        sections.push(SnippetSection {
            header: section_header(unit),
            body,
        });
    };

    for &index in order {
        let unit = &units[index];
        if !unit.id.is_file_header() {
            if let Some(&header) = header_of_file.get(unit.id.file_path.as_str()) {
                emit(header, &mut emitted, &mut sections);
            }
        }
        emit(index, &mut emitted, &mut sections);
    }

    Snippet { sections }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UnitId, UnitKind};

    fn file(path: &str, text: &str) -> SourceFile {
        SourceFile {
            path: path.to_string(),
            text: text.to_string(),
            language: "python".to_string(),
            content_hash: String::new(),
        }
    }

    fn unit(path: &str, name: &str, kind: UnitKind, span: (usize, usize)) -> ModuleUnit {
        ModuleUnit {
            id: UnitId {
                file_path: path.to_string(),
                name: name.to_string(),
                ordinal: 0,
            },
            kind,
            span,
            raw_imports: Vec::new(),
        }
    }

    fn fixture() -> (Vec<ModuleUnit>, IndexMap<String, SourceFile>) {
        let text = "X = 1\ndef f():\n    pass\n";
        let units = vec![
            unit("a.py", "", UnitKind::Other, (0, 6)),
            unit("a.py", "f", UnitKind::Function, (6, text.len())),
        ];
        let mut files = IndexMap::new();
        files.insert("a.py".to_string(), file("a.py", text));
        (units, files)
    }

    #[test]
    fn test_bodies_are_exact_byte_spans() {
        let (units, files) = fixture();
        let snippet = assemble(&[0, 1], &units, &files);
        assert_eq!(snippet.sections.len(), 2);
        assert_eq!(snippet.sections[0].header, "==== a.py ====");
        assert_eq!(snippet.sections[0].body, "X = 1\n");
        assert_eq!(
            snippet.sections[1].header,
            "==== a.py :: f (function) ===="
        );
        assert_eq!(snippet.sections[1].body, "def f():\n    pass\n");
    }

    #[test]
    fn test_header_pulled_before_first_named_unit() {
        let (units, files) = fixture();
        // Traversal reached the named unit before its file header.
        let snippet = assemble(&[1, 0], &units, &files);
        assert_eq!(snippet.sections[0].header, "==== a.py ====");
        assert_eq!(
            snippet.sections[1].header,
            "==== a.py :: f (function) ===="
        );
        // Header is not emitted twice.
        assert_eq!(snippet.sections.len(), 2);
    }

    #[test]
    fn test_empty_order_empty_snippet() {
        let snippet = assemble(&[], &[], &IndexMap::new());
        assert!(snippet.is_empty());
    }
}
