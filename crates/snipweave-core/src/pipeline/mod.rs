//! The extraction, resolution, and assembly pipeline.
//!
//! Stage order is fixed: walk → extract (parallel) → symbol table (one
//! deterministic pass) → resolve (parallel, read-only) → graph traversal →
//! assembly. File reads all happen in the walk; every later stage is a
//! pure in-memory transformation.

pub mod assemble;
pub mod extract;
pub mod filesystem;
pub mod graph;
pub mod imports;
pub mod symbols;

use std::time::Instant;

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::errors::WeaveResult;
use crate::models::{Diagnostic, ModuleUnit, PipelineConfig, RunReport, SourceFile};
use crate::pipeline::graph::DependencyGraph;
use crate::pipeline::symbols::SymbolTable;

/// Extract units from all files on a rayon pool.
///
/// `workers == 0` uses the global pool; otherwise a dedicated pool is
/// built, with a sequential fallback when that fails. Results come back
/// in input order either way, so the merge is deterministic.
fn parallel_extract(
    files: &[SourceFile],
    include_header_comments: bool,
    workers: usize,
) -> Vec<(Vec<ModuleUnit>, Vec<Diagnostic>)> {
    if files.is_empty() {
        return Vec::new();
    }
    let job = || {
        files
            .par_iter()
            .map(|file| extract::extract_units(file, include_header_comments))
            .collect()
    };
    if workers == 0 {
        return job();
    }
    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(job),
        Err(err) => {
            warn!(error = %err, "thread pool build failed, extracting sequentially");
            files
                .iter()
                .map(|file| extract::extract_units(file, include_header_comments))
                .collect()
        }
    }
}

/// Run the full pipeline against the filesystem.
pub fn run(config: &PipelineConfig) -> WeaveResult<RunReport> {
    let started = Instant::now();
    let (files, walk_diagnostics) = filesystem::collect_source_files(&config.root_path)?;
    Ok(run_on_files(files, walk_diagnostics, config, started))
}

/// Run the core pipeline on an already-materialized file snapshot.
///
/// `files` must be ordered (the walker sorts lexicographically); that
/// order is the file-discovery order all tie-breaking derives from.
pub fn run_on_files(
    files: Vec<SourceFile>,
    mut diagnostics: Vec<Diagnostic>,
    config: &PipelineConfig,
    started: Instant,
) -> RunReport {
    let files_seen = files.len();
    info!(files = files_seen, "pipeline start");

    // Stage 1: extraction, parallel per file, merged in file order.
    let extracted = parallel_extract(&files, config.include_header_comments, config.workers);
    let mut units: Vec<ModuleUnit> = Vec::new();
    for (file_units, file_diagnostics) in extracted {
        units.extend(file_units);
        diagnostics.extend(file_diagnostics);
    }
    let units_extracted = units.len();

    // Stage 2: symbol table, single deterministic insertion pass.
    let table = SymbolTable::build(&units, &mut diagnostics);

    // Stage 3: import resolution against the frozen table.
    let (edges, resolve_diagnostics) =
        imports::resolve_imports(&units, &table, &config.extension_candidates);
    diagnostics.extend(resolve_diagnostics);
    let edges_resolved = edges.len();

    // Stage 4: ordering and assembly.
    let dependency_graph = DependencyGraph::build(&units, &edges);
    let (order, cycle_diagnostics) = dependency_graph.topological_order(&units);
    diagnostics.extend(cycle_diagnostics);

    let files_by_path: IndexMap<String, SourceFile> =
        files.into_iter().map(|f| (f.path.clone(), f)).collect();
    let snippet = assemble::assemble(&order, &units, &files_by_path);

    let elapsed_ms = started.elapsed().as_millis() as u64;
    info!(
        files = files_seen,
        units = units_extracted,
        edges = edges_resolved,
        diagnostics = diagnostics.len(),
        elapsed_ms,
        "pipeline complete"
    );

    RunReport {
        snippet,
        diagnostics,
        files_seen,
        units_extracted,
        edges_resolved,
        elapsed_ms,
    }
}
