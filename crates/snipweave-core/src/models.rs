//! Shared typed models used across the extraction, resolution, and
//! assembly stages.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{WeaveError, WeaveResult};

// ---------------------------------------------------------------------------
// Source files
// ---------------------------------------------------------------------------

/// One file of the repository snapshot, as produced by the filesystem
/// walker. Immutable once read; `path` is repo-relative with `/` separators.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub path: String,
    pub text: String,
    pub language: String,
    /// SHA-256 hex digest of the raw file bytes.
    pub content_hash: String,
}

// ---------------------------------------------------------------------------
// Module units
// ---------------------------------------------------------------------------

/// Identity of one extracted unit. The ordinal disambiguates same-named
/// units within a single file; `name` is empty for the synthetic
/// file-header unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct UnitId {
    pub file_path: String,
    pub name: String,
    pub ordinal: u32,
}

impl UnitId {
    pub fn is_file_header(&self) -> bool {
        self.name.is_empty()
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.file_path)
        } else {
            write!(f, "{}::{}#{}", self.file_path, self.name, self.ordinal)
        }
    }
}

/// Kind of a named unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Function,
    Class,
    Other,
}

impl UnitKind {
    pub fn label(self) -> &'static str {
        match self {
            UnitKind::Function => "function",
            UnitKind::Class => "class",
            UnitKind::Other => "other",
        }
    }
}

/// An unresolved import reference exactly as written in source. Resolution
/// reads these but never mutates them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImportSpecifier {
    pub raw_text: String,
    /// Relative path to the target module, without extension, relative to
    /// the importing file's directory (e.g. `./sibling`, `../pkg/x`).
    /// `None` for bare package imports, which are out of scope.
    pub relative_path_hint: Option<String>,
    /// Imported symbol name; `None` for whole-module imports.
    pub symbol_name: Option<String>,
    pub line_number: i64,
}

/// One extracted code unit: a named top-level definition or the synthetic
/// file-header unit holding a file's anonymous top-level code.
#[derive(Clone, Debug)]
pub struct ModuleUnit {
    pub id: UnitId,
    pub kind: UnitKind,
    /// Byte span into the owning file's text. Spans of a file's units are
    /// contiguous and cover the whole file.
    pub span: (usize, usize),
    pub raw_imports: Vec<ImportSpecifier>,
}

impl ModuleUnit {
    /// Slice this unit's exact source bytes out of the owning file text.
    pub fn text<'a>(&self, file_text: &'a str) -> &'a str {
        &file_text[self.span.0..self.span.1]
    }
}

// ---------------------------------------------------------------------------
// Symbol keys and edges
// ---------------------------------------------------------------------------

/// Lookup key into the symbol table: a normalized file path plus the
/// symbol name defined in that file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SymbolKey {
    pub file_path: String,
    pub name: String,
}

impl std::fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.file_path, self.name)
    }
}

/// A resolved relative import: `from`'s snippet will include `to`'s text.
#[derive(Clone, Debug)]
pub struct DependencyEdge {
    pub from: UnitId,
    pub to: UnitId,
    pub via: ImportSpecifier,
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// A non-fatal per-item anomaly collected during the run and surfaced to
/// the caller as one ordered list. None of these abort the pipeline.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    ParseFailure {
        file_path: String,
        message: String,
    },
    DuplicateSymbol {
        key: SymbolKey,
        kept: UnitId,
        discarded: UnitId,
    },
    UnresolvedImport {
        from: UnitId,
        specifier: String,
    },
    ImportCycle {
        unit_ids: Vec<UnitId>,
    },
}

// ---------------------------------------------------------------------------
// Snippet output
// ---------------------------------------------------------------------------

/// One section of the assembled document: a stable header line plus the
/// exact source bytes of one unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SnippetSection {
    pub header: String,
    pub body: String,
}

/// The assembled output: an ordered, deduplicated sequence of unit texts.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Snippet {
    pub sections: Vec<SnippetSection>,
}

impl Snippet {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Concatenate all sections into the final document. The writer
    /// performs no reordering beyond this.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str(&section.header);
            out.push('\n');
            out.push_str(&section.body);
            if !section.body.ends_with('\n') {
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn default_extension_candidates() -> Vec<String> {
    [".py", ".ts", ".tsx", ".js", ".jsx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_include_header_comments() -> bool {
    true
}

/// Caller-facing configuration surface.
#[derive(Clone, Debug, Deserialize)]
pub struct PipelineConfig {
    pub root_path: PathBuf,
    /// Extension priority order tried when a relative import's normalized
    /// path does not name a file directly.
    #[serde(default = "default_extension_candidates")]
    pub extension_candidates: Vec<String>,
    /// Whether leading comment blocks are captured in a unit's span.
    #[serde(default = "default_include_header_comments")]
    pub include_header_comments: bool,
    /// Extraction worker count; 0 uses the rayon default.
    #[serde(default)]
    pub workers: usize,
}

impl PipelineConfig {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            extension_candidates: default_extension_candidates(),
            include_header_comments: default_include_header_comments(),
            workers: 0,
        }
    }

    /// Load configuration from a JSON file. Omitted fields fall back to
    /// their defaults; `root_path` is required.
    pub fn from_file(path: &Path) -> WeaveResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|err| WeaveError::Config(format!("{}: {err}", path.display())))
    }
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Result of one pipeline run: the snippet, the complete ordered
/// diagnostics list, and summary counters.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub snippet: Snippet,
    pub diagnostics: Vec<Diagnostic>,
    pub files_seen: usize,
    pub units_extracted: usize,
    pub edges_resolved: usize,
    pub elapsed_ms: u64,
}
