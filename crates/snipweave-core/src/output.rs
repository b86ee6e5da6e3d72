//! Output boundary: writes the assembled document and the diagnostics
//! report. Performs no reordering or transformation of the snippet.

use std::path::Path;

use tracing::info;

use crate::errors::WeaveResult;
use crate::models::{Diagnostic, Snippet};

/// Write the concatenated snippet document to `path`.
pub fn write_document(snippet: &Snippet, path: &Path) -> WeaveResult<()> {
    let document = snippet.render();
    std::fs::write(path, &document)?;
    info!(
        path = %path.display(),
        sections = snippet.sections.len(),
        bytes = document.len(),
        "wrote snippet document"
    );
    Ok(())
}

/// Serialize the run's diagnostics to pretty-printed JSON at `path`.
pub fn write_diagnostics_json(diagnostics: &[Diagnostic], path: &Path) -> WeaveResult<()> {
    let json = serde_json::to_string_pretty(diagnostics)?;
    std::fs::write(path, json)?;
    info!(
        path = %path.display(),
        count = diagnostics.len(),
        "wrote diagnostics report"
    );
    Ok(())
}
