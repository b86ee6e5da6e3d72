//! Module extraction from raw source text.
//!
//! Regex-based line scanning turns one source file into an ordered list of
//! module units: one synthetic file-header unit holding the file's
//! anonymous top-level code, followed by one unit per top-level definition.
//! Unit spans are contiguous byte ranges that cover the whole file, so no
//! top-level code is ever dropped from the assembled snippet.
//!
//! Two language families are supported, selected by the walker's language
//! tag: Python (`def`/`class` at column zero, indentation-scoped) and
//! TypeScript/JavaScript (declarations at brace depth zero).

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::{Diagnostic, ImportSpecifier, ModuleUnit, SourceFile, UnitId, UnitKind};

// ---------------------------------------------------------------------------
// Compiled regex patterns (LazyLock for one-time init)
// ---------------------------------------------------------------------------

// -- Python --

static PY_DEF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:async\s+)?def\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());

static PY_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^class\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());

static PY_FROM_IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^from\s+([A-Za-z0-9_.]+)\s+import\s+(.*)$").unwrap());

static PY_IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^import\s+([A-Za-z0-9_.]+(?:\s*,\s*[A-Za-z0-9_.]+)*)").unwrap());

// -- TypeScript / JavaScript --

static TS_NAMED_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:export\s+|import(?:\s+type)?\s+)\{([^}]*)\}\s+from\s+['"]([^'"]+)['"]"#)
        .unwrap()
});

static TS_DEFAULT_IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^import(?:\s+type)?\s+(?:[A-Za-z_$][A-Za-z0-9_$]*|\*\s+as\s+[A-Za-z_$][A-Za-z0-9_$]*)\s+from\s+['"]([^'"]+)['"]"#,
    )
    .unwrap()
});

static TS_SIDE_EFFECT_IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^import\s+['"]([^'"]+)['"]"#).unwrap());

static TS_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:export\s+)?(?:default\s+)?(?:abstract\s+)?(class|interface)\s+([A-Za-z_$][A-Za-z0-9_$]*)",
    )
    .unwrap()
});

static TS_TYPE_ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:export\s+)?type\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=").unwrap()
});

static TS_FUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s*\*?\s*([A-Za-z_$][A-Za-z0-9_$]*)",
    )
    .unwrap()
});

static TS_ARROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:\([^)]*\)|[A-Za-z_$][A-Za-z0-9_$]*)\s*(?::[^=]+)?=>",
    )
    .unwrap()
});

static TS_CONST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:export\s+)?(?:const|let|var)\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*(?::[^=]+)?=")
        .unwrap()
});

// ---------------------------------------------------------------------------
// Shared unit-building machinery
// ---------------------------------------------------------------------------

/// Start of one named top-level definition, in line indices.
struct UnitStart {
    /// First attached line (decorator / leading comment block).
    attach_line: usize,
    /// The declaration line itself.
    decl_line: usize,
    name: String,
    kind: UnitKind,
}

/// Byte offset of the start of every line.
fn line_start_offsets(text: &str) -> Vec<usize> {
    let mut offsets = vec![0usize];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' && i + 1 < text.len() {
            offsets.push(i + 1);
        }
    }
    offsets
}

/// Chain unit starts into contiguous spans and prepend the synthetic
/// file-header unit. Ordinals count per-name occurrences in file order.
fn build_units(
    path: &str,
    text: &str,
    line_starts: &[usize],
    starts: Vec<UnitStart>,
    header_imports: Vec<ImportSpecifier>,
) -> Vec<ModuleUnit> {
    let mut ordinals: HashMap<String, u32> = HashMap::new();
    let mut next_ordinal = |name: &str| -> u32 {
        let counter = ordinals.entry(name.to_string()).or_insert(0);
        let ordinal = *counter;
        *counter += 1;
        ordinal
    };

    let header_end = starts
        .first()
        .map(|s| line_starts[s.attach_line])
        .unwrap_or(text.len());

    let mut units = Vec::with_capacity(starts.len() + 1);
    units.push(ModuleUnit {
        id: UnitId {
            file_path: path.to_string(),
            name: String::new(),
            ordinal: next_ordinal(""),
        },
        kind: UnitKind::Other,
        span: (0, header_end),
        raw_imports: header_imports,
    });

    for (i, start) in starts.iter().enumerate() {
        let begin = line_starts[start.attach_line];
        let end = starts
            .get(i + 1)
            .map(|s| line_starts[s.attach_line])
            .unwrap_or(text.len());
        units.push(ModuleUnit {
            id: UnitId {
                file_path: path.to_string(),
                name: start.name.clone(),
                ordinal: next_ordinal(&start.name),
            },
            kind: start.kind,
            span: (begin, end),
            raw_imports: Vec::new(),
        });
    }

    units
}

/// Walk back from `decl_line` over attached lines. `is_attached` decides
/// per trimmed line; the walk never crosses `floor` (the previous
/// declaration line) or a blank line.
fn attach_start(
    lines: &[&str],
    decl_line: usize,
    floor: Option<usize>,
    is_attached: impl Fn(&str) -> bool,
) -> usize {
    let mut attach = decl_line;
    while attach > 0 {
        let candidate = attach - 1;
        if let Some(f) = floor {
            if candidate <= f {
                break;
            }
        }
        let line = lines[candidate].trim_end();
        if line.is_empty() || !is_attached(line) {
            break;
        }
        attach = candidate;
    }
    attach
}

// ---------------------------------------------------------------------------
// Python extraction
// ---------------------------------------------------------------------------

/// Triple-quote scanner state: the active delimiter, if any.
fn scan_triple_quotes(line: &str, mut state: Option<&'static str>) -> Option<&'static str> {
    let mut rest = line;
    loop {
        match state {
            None => {
                let dq = rest.find("\"\"\"");
                let sq = rest.find("'''");
                let (pos, delim) = match (dq, sq) {
                    (Some(d), Some(s)) if s < d => (s, "'''"),
                    (Some(d), _) => (d, "\"\"\""),
                    (None, Some(s)) => (s, "'''"),
                    (None, None) => return None,
                };
                state = Some(delim);
                rest = &rest[pos + 3..];
            }
            Some(delim) => match rest.find(delim) {
                Some(pos) => {
                    state = None;
                    rest = &rest[pos + delim.len()..];
                }
                None => return state,
            },
        }
    }
}

/// Turn a Python relative module path (leading dots plus dotted segments)
/// into a slash-separated path hint relative to the importing file's
/// directory. `None` when the import is absolute or names no module
/// (`from . import x`), both of which are out of resolution scope.
fn python_path_hint(module: &str) -> Option<String> {
    let dots = module.chars().take_while(|&c| c == '.').count();
    if dots == 0 {
        return None;
    }
    let rest = &module[dots..];
    if rest.is_empty() {
        return None;
    }
    let mut hint = if dots == 1 {
        String::from("./")
    } else {
        "../".repeat(dots - 1)
    };
    hint.push_str(&rest.replace('.', "/"));
    Some(hint)
}

/// Split the names clause of a `from X import ...` statement into
/// specifiers. A `*` entry collapses the whole statement into one
/// whole-module specifier.
fn python_from_specifiers(
    raw_text: &str,
    hint: Option<&str>,
    names: &str,
    line_number: i64,
) -> Vec<ImportSpecifier> {
    let cleaned = names.replace(['(', ')'], "");
    let mut specifiers = Vec::new();
    for chunk in cleaned.split(',') {
        let name = chunk.split_whitespace().next().unwrap_or("");
        if name.is_empty() {
            continue;
        }
        if name == "*" {
            return vec![ImportSpecifier {
                raw_text: raw_text.to_string(),
                relative_path_hint: hint.map(|h| h.to_string()),
                symbol_name: None,
                line_number,
            }];
        }
        specifiers.push(ImportSpecifier {
            raw_text: raw_text.to_string(),
            relative_path_hint: hint.map(|h| h.to_string()),
            symbol_name: Some(name.to_string()),
            line_number,
        });
    }
    specifiers
}

fn python_units(
    file: &SourceFile,
    include_header_comments: bool,
) -> Result<Vec<ModuleUnit>, Diagnostic> {
    let text = &file.text;
    let lines: Vec<&str> = text.split('\n').collect();
    let line_starts = line_start_offsets(text);

    let mut starts: Vec<UnitStart> = Vec::new();
    let mut imports: Vec<ImportSpecifier> = Vec::new();
    let mut string_state: Option<&'static str> = None;
    // Pending parenthesized from-import: (raw accumulated, hint, names, line).
    let mut pending_from: Option<(String, Option<String>, String, i64)> = None;
    let mut last_decl_line: Option<usize> = None;

    for (line_idx, line) in lines.iter().enumerate() {
        let line_number = (line_idx + 1) as i64;

        if string_state.is_some() {
            string_state = scan_triple_quotes(line, string_state);
            continue;
        }

        if let Some((mut raw, hint, mut names, start_line)) = pending_from.take() {
            raw.push('\n');
            raw.push_str(line.trim_end());
            names.push(' ');
            names.push_str(line.trim());
            if line.contains(')') {
                imports.extend(python_from_specifiers(
                    &raw,
                    hint.as_deref(),
                    &names,
                    start_line,
                ));
            } else {
                pending_from = Some((raw, hint, names, start_line));
            }
            continue;
        }

        if let Some(caps) = PY_DEF_RE.captures(line) {
            let decl_line = line_idx;
            let attach = attach_line_python(
                &lines,
                decl_line,
                last_decl_line,
                include_header_comments,
            );
            starts.push(UnitStart {
                attach_line: attach,
                decl_line,
                name: caps[1].to_string(),
                kind: UnitKind::Function,
            });
            last_decl_line = Some(decl_line);
        } else if let Some(caps) = PY_CLASS_RE.captures(line) {
            let decl_line = line_idx;
            let attach = attach_line_python(
                &lines,
                decl_line,
                last_decl_line,
                include_header_comments,
            );
            starts.push(UnitStart {
                attach_line: attach,
                decl_line,
                name: caps[1].to_string(),
                kind: UnitKind::Class,
            });
            last_decl_line = Some(decl_line);
        } else if let Some(caps) = PY_FROM_IMPORT_RE.captures(line) {
            let hint = python_path_hint(&caps[1]);
            let names = caps[2].to_string();
            if names.contains('(') && !names.contains(')') {
                pending_from = Some((line.trim_end().to_string(), hint, names, line_number));
            } else {
                imports.extend(python_from_specifiers(
                    line.trim_end(),
                    hint.as_deref(),
                    &names,
                    line_number,
                ));
            }
        } else if let Some(caps) = PY_IMPORT_RE.captures(line) {
            // `import pkg.mod` is always absolute in Python: recorded as
            // unresolvable-by-design, one specifier per comma-separated module.
            for module in caps[1].split(',') {
                if module.trim().is_empty() {
                    continue;
                }
                imports.push(ImportSpecifier {
                    raw_text: line.trim_end().to_string(),
                    relative_path_hint: None,
                    symbol_name: None,
                    line_number,
                });
            }
        }

        string_state = scan_triple_quotes(line, string_state);
    }

    if string_state.is_some() {
        return Err(Diagnostic::ParseFailure {
            file_path: file.path.clone(),
            message: "unterminated triple-quoted string".to_string(),
        });
    }
    if pending_from.is_some() {
        return Err(Diagnostic::ParseFailure {
            file_path: file.path.clone(),
            message: "unterminated parenthesized import".to_string(),
        });
    }

    Ok(build_units(&file.path, text, &line_starts, starts, imports))
}

fn attach_line_python(
    lines: &[&str],
    decl_line: usize,
    floor: Option<usize>,
    include_header_comments: bool,
) -> usize {
    // Decorators always attach; leading comment blocks only when configured.
    attach_start(lines, decl_line, floor, |line| {
        line.starts_with('@') || (include_header_comments && line.starts_with('#'))
    })
}

// ---------------------------------------------------------------------------
// TypeScript / JavaScript extraction
// ---------------------------------------------------------------------------

/// Net brace depth change of one line, skipping braces inside string or
/// template literal text and anything behind a `//` comment. Literals are
/// assumed to open and close on the same line; multiline template bodies
/// are not tracked.
fn brace_delta(line: &str) -> i64 {
    let mut delta = 0i64;
    let mut quote: Option<char> = None;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match quote {
            Some(q) => match c {
                '\\' => {
                    chars.next();
                }
                _ if c == q => quote = None,
                _ => {}
            },
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '/' if chars.peek() == Some(&'/') => break,
                '{' => delta += 1,
                '}' => delta -= 1,
                _ => {}
            },
        }
    }
    delta
}

fn ts_import_specifiers(line: &str, line_number: i64) -> Option<Vec<ImportSpecifier>> {
    let raw = line.trim_end().to_string();
    let hint_of = |module: &str| -> Option<String> {
        if module.starts_with('.') {
            Some(module.to_string())
        } else {
            None
        }
    };

    if let Some(caps) = TS_NAMED_IMPORT_RE.captures(line) {
        let module = caps[2].to_string();
        let hint = hint_of(&module);
        let mut specifiers = Vec::new();
        for chunk in caps[1].split(',') {
            // `foo as bar` imports `foo`; the local alias is irrelevant here.
            let name = chunk.split_whitespace().next().unwrap_or("");
            if name.is_empty() {
                continue;
            }
            specifiers.push(ImportSpecifier {
                raw_text: raw.clone(),
                relative_path_hint: hint.clone(),
                symbol_name: Some(name.to_string()),
                line_number,
            });
        }
        return Some(specifiers);
    }
    if let Some(caps) = TS_DEFAULT_IMPORT_RE.captures(line) {
        let module = caps[1].to_string();
        return Some(vec![ImportSpecifier {
            raw_text: raw,
            relative_path_hint: hint_of(&module),
            symbol_name: None,
            line_number,
        }]);
    }
    if let Some(caps) = TS_SIDE_EFFECT_IMPORT_RE.captures(line) {
        let module = caps[1].to_string();
        return Some(vec![ImportSpecifier {
            raw_text: raw,
            relative_path_hint: hint_of(&module),
            symbol_name: None,
            line_number,
        }]);
    }
    None
}

fn typescript_units(
    file: &SourceFile,
    include_header_comments: bool,
) -> Result<Vec<ModuleUnit>, Diagnostic> {
    let text = &file.text;
    let lines: Vec<&str> = text.split('\n').collect();
    let line_starts = line_start_offsets(text);

    let mut starts: Vec<UnitStart> = Vec::new();
    let mut imports: Vec<ImportSpecifier> = Vec::new();
    let mut depth: i64 = 0;
    let mut in_block_comment = false;
    let mut last_decl_line: Option<usize> = None;

    for (line_idx, line) in lines.iter().enumerate() {
        let line_number = (line_idx + 1) as i64;

        if in_block_comment {
            if line.contains("*/") {
                in_block_comment = false;
            }
            continue;
        }
        let trimmed = line.trim_start();
        if trimmed.starts_with("//") {
            continue;
        }
        if trimmed.starts_with("/*") && !line.contains("*/") {
            in_block_comment = true;
            continue;
        }

        if depth == 0 {
            if let Some(specifiers) = ts_import_specifiers(line, line_number) {
                imports.extend(specifiers);
            } else if let Some(start) = ts_unit_start(
                &lines,
                line,
                line_idx,
                last_decl_line,
                include_header_comments,
            ) {
                last_decl_line = Some(start.decl_line);
                starts.push(start);
            }
        }

        depth += brace_delta(line);
        if depth < 0 {
            return Err(Diagnostic::ParseFailure {
                file_path: file.path.clone(),
                message: format!("unbalanced braces at line {line_number}"),
            });
        }
    }

    if in_block_comment {
        return Err(Diagnostic::ParseFailure {
            file_path: file.path.clone(),
            message: "unterminated block comment".to_string(),
        });
    }
    if depth != 0 {
        return Err(Diagnostic::ParseFailure {
            file_path: file.path.clone(),
            message: "unbalanced braces at end of file".to_string(),
        });
    }

    Ok(build_units(&file.path, text, &line_starts, starts, imports))
}

fn ts_unit_start(
    lines: &[&str],
    line: &str,
    line_idx: usize,
    floor: Option<usize>,
    include_header_comments: bool,
) -> Option<UnitStart> {
    let (name, kind) = if let Some(caps) = TS_CLASS_RE.captures(line) {
        (caps[2].to_string(), UnitKind::Class)
    } else if let Some(caps) = TS_FUNCTION_RE.captures(line) {
        (caps[1].to_string(), UnitKind::Function)
    } else if let Some(caps) = TS_ARROW_RE.captures(line) {
        (caps[1].to_string(), UnitKind::Function)
    } else if let Some(caps) = TS_TYPE_ALIAS_RE.captures(line) {
        (caps[1].to_string(), UnitKind::Other)
    } else if let Some(caps) = TS_CONST_RE.captures(line) {
        (caps[1].to_string(), UnitKind::Other)
    } else {
        return None;
    };

    let attach = attach_start(lines, line_idx, floor, |l| {
        l.starts_with('@')
            || (include_header_comments
                && (l.starts_with("//")
                    || l.starts_with("/*")
                    || l.starts_with('*')
                    || l.ends_with("*/")))
    });
    Some(UnitStart {
        attach_line: attach,
        decl_line: line_idx,
        name,
        kind,
    })
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Extract module units from one source file.
///
/// Dispatches on the walker's language tag. A file that fails the
/// language's structural checks yields zero units plus one
/// [`Diagnostic::ParseFailure`]; extraction of other files is unaffected.
pub fn extract_units(
    file: &SourceFile,
    include_header_comments: bool,
) -> (Vec<ModuleUnit>, Vec<Diagnostic>) {
    let result = match file.language.as_str() {
        "python" => python_units(file, include_header_comments),
        "typescript" => typescript_units(file, include_header_comments),
        other => {
            debug!(path = %file.path, language = other, "no extractor for language");
            return (Vec::new(), Vec::new());
        }
    };
    match result {
        Ok(units) => {
            debug!(path = %file.path, units = units.len(), "extracted units");
            (units, Vec::new())
        }
        Err(diagnostic) => (Vec::new(), vec![diagnostic]),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
