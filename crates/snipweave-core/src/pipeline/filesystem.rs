//! Filesystem walking for the pipeline's input boundary.
//!
//! Produces the ordered, deduplicated `(path, text)` snapshot the core
//! stages run on. Ignore rules (`.gitignore`, `.ignore`) are applied by the
//! `ignore` crate; everything downstream of this module is pure in-memory
//! transformation.

use std::collections::BTreeMap;
use std::path::Path;

use ignore::WalkBuilder;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::errors::WeaveResult;
use crate::models::{Diagnostic, SourceFile};

const LANGUAGE_BY_EXTENSION: &[(&str, &str)] = &[
    (".py", "python"),
    (".ts", "typescript"),
    (".tsx", "typescript"),
    (".js", "typescript"),
    (".jsx", "typescript"),
];

/// Map a file path to its language family by extension.
pub fn detect_language(path: &str) -> Option<&'static str> {
    let ext = Path::new(path)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))?;
    LANGUAGE_BY_EXTENSION
        .iter()
        .find(|(e, _)| *e == ext.as_str())
        .map(|(_, lang)| *lang)
}

/// Compute a SHA-256 hex digest of raw file bytes.
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Walk `root` and materialize every recognized source file.
///
/// Paths are repo-relative with `/` separators and returned in
/// lexicographic order, which fixes the insertion order used for
/// duplicate-symbol tie-breaking later on. Files that cannot be read or
/// are not valid UTF-8 become [`Diagnostic::ParseFailure`] records instead
/// of aborting the walk.
pub fn collect_source_files(root: &Path) -> WeaveResult<(Vec<SourceFile>, Vec<Diagnostic>)> {
    // BTreeMap keyed by relative path: lexicographic order plus dedup.
    let mut by_path: BTreeMap<String, SourceFile> = BTreeMap::new();
    let mut diagnostics = Vec::new();

    // require_git(false) so .gitignore rules apply to bare snapshots too.
    let walker = WalkBuilder::new(root)
        .follow_links(false)
        .require_git(false)
        .build();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(error = %err, "walk entry error");
                continue;
            }
        };
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        let rel = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let language = match detect_language(&rel) {
            Some(l) => l,
            None => continue,
        };
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(err) => {
                diagnostics.push(Diagnostic::ParseFailure {
                    file_path: rel.clone(),
                    message: format!("read failed: {err}"),
                });
                continue;
            }
        };
        let hash = content_hash(&bytes);
        let text = match String::from_utf8(bytes) {
            Ok(t) => t,
            Err(_) => {
                diagnostics.push(Diagnostic::ParseFailure {
                    file_path: rel.clone(),
                    message: "not valid UTF-8".to_string(),
                });
                continue;
            }
        };
        debug!(path = %rel, language, "collected source file");
        by_path.insert(
            rel.clone(),
            SourceFile {
                path: rel,
                text,
                language: language.to_string(),
                content_hash: hash,
            },
        );
    }

    // Read diagnostics follow the same lexicographic discipline as the
    // file list so reruns produce identical output.
    diagnostics.sort_by(|a, b| {
        let key = |d: &Diagnostic| match d {
            Diagnostic::ParseFailure { file_path, .. } => file_path.clone(),
            _ => String::new(),
        };
        key(a).cmp(&key(b))
    });

    Ok((by_path.into_values().collect(), diagnostics))
}
