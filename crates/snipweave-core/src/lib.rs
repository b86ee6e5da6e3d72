//! snipweave core library: turns a source repository into one
//! dependency-ordered text document.
//!
//! The pipeline extracts named code units from every file, resolves
//! relative imports against a global symbol table, orders units so that
//! dependencies precede their dependents, and assembles the deduplicated
//! snippet stream. All per-item anomalies (parse failures, duplicate
//! symbols, unresolved imports, import cycles) are collected as
//! diagnostics; a run always completes.
//!
//! ```no_run
//! use snipweave_core::models::PipelineConfig;
//!
//! let config = PipelineConfig::new("path/to/repo");
//! let report = snipweave_core::pipeline::run(&config).unwrap();
//! println!("{}", report.snippet.render());
//! ```

pub mod errors;
pub mod models;
pub mod output;
pub mod pipeline;

pub use errors::{WeaveError, WeaveResult};
pub use models::{Diagnostic, PipelineConfig, RunReport, Snippet};
