//! Criterion benchmarks for snipweave-core.
//!
//! Everything here runs against in-memory `SourceFile` values, so no
//! filesystem setup is needed and the walker stays out of the measurement.
//!
//! ## Benchmark groups
//!
//! 1. **extraction** — Per-file unit extraction for each language.
//! 2. **resolution** — Symbol table build + import resolution at scale.
//! 3. **ordering** — Graph build + topological traversal on synthetic shapes.
//! 4. **pipeline** — Full in-memory run at several repository sizes.
//!
//! ## Running
//!
//! ```sh
//! cargo bench --manifest-path crates/snipweave-core/Cargo.toml
//! # Run only the resolution group:
//! cargo bench --manifest-path crates/snipweave-core/Cargo.toml -- resolution
//! ```

use std::time::Instant;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use snipweave_core::models::{PipelineConfig, SourceFile};
use snipweave_core::pipeline::graph::DependencyGraph;
use snipweave_core::pipeline::symbols::SymbolTable;
use snipweave_core::pipeline::{self, extract, filesystem, imports};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const PYTHON_SOURCE: &str = r#"import os
from .auth import validate
from .models import User, Role

DEFAULT_LIMIT = 100


class UserService:
    def __init__(self, repo):
        self.repo = repo

    def find_user(self, user_id):
        if not validate(user_id):
            return None
        return self.repo.get(user_id)


def list_users(service, limit=DEFAULT_LIMIT):
    return service.repo.all()[:limit]


@cached
def build_index(users):
    return {u.id: u for u in users}
"#;

const TYPESCRIPT_SOURCE: &str = r#"import { validate } from './auth';
import { User, Role } from './models';

export const DEFAULT_LIMIT = 100;

export interface UserPort {
  findUser(id: string): Promise<User | null>;
}

export class UserService implements UserPort {
  async findUser(id: string): Promise<User | null> {
    if (!validate(id)) return null;
    return this.fetch(id);
  }

  private async fetch(id: string): Promise<User | null> {
    return null;
  }
}

export const createService = (): UserPort => {
  return new UserService();
};
"#;

fn file(path: &str, language: &str, text: &str) -> SourceFile {
    SourceFile {
        path: path.to_string(),
        text: text.to_string(),
        language: language.to_string(),
        content_hash: filesystem::content_hash(text.as_bytes()),
    }
}

/// Synthetic repository: `n` Python files, each importing a symbol from the
/// previous file so resolution and ordering have a full chain to walk.
fn chain_repo(n: usize) -> Vec<SourceFile> {
    (0..n)
        .map(|i| {
            let text = if i == 0 {
                "def func_0():\n    return 0\n".to_string()
            } else {
                format!(
                    "from .mod_{prev} import func_{prev}\n\ndef func_{i}():\n    return func_{prev}()\n",
                    prev = i - 1
                )
            };
            file(&format!("mod_{i}.py"), "python", &text)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Benchmark: extraction per language
// ---------------------------------------------------------------------------

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");

    group.bench_function("extract_units/python", |b| {
        let f = file("service.py", "python", PYTHON_SOURCE);
        b.iter(|| {
            let (units, diagnostics) = extract::extract_units(black_box(&f), true);
            black_box((units, diagnostics));
        });
    });

    group.bench_function("extract_units/typescript", |b| {
        let f = file("service.ts", "typescript", TYPESCRIPT_SOURCE);
        b.iter(|| {
            let (units, diagnostics) = extract::extract_units(black_box(&f), true);
            black_box((units, diagnostics));
        });
    });

    let large = PYTHON_SOURCE.repeat(100);
    group.bench_function("extract_units/python_large", |b| {
        let f = file("big.py", "python", &large);
        b.iter(|| {
            let (units, diagnostics) = extract::extract_units(black_box(&f), true);
            black_box((units, diagnostics));
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: symbol table + import resolution
// ---------------------------------------------------------------------------

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    let config = PipelineConfig::new("/unused");

    for &n in &[10, 100, 500] {
        group.bench_with_input(BenchmarkId::new("resolve_chain", n), &n, |b, &n| {
            let files = chain_repo(n);
            let mut units = Vec::new();
            for f in &files {
                let (file_units, _) = extract::extract_units(f, true);
                units.extend(file_units);
            }
            let mut diagnostics = Vec::new();
            let table = SymbolTable::build(&units, &mut diagnostics);
            b.iter(|| {
                let (edges, diags) = imports::resolve_imports(
                    black_box(&units),
                    &table,
                    &config.extension_candidates,
                );
                black_box((edges, diags));
            });
        });
    }

    group.bench_function("symbol_table_build_500", |b| {
        let files = chain_repo(500);
        let mut units = Vec::new();
        for f in &files {
            let (file_units, _) = extract::extract_units(f, true);
            units.extend(file_units);
        }
        b.iter(|| {
            let mut diagnostics = Vec::new();
            let table = SymbolTable::build(black_box(&units), &mut diagnostics);
            black_box((table, diagnostics));
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: graph build + topological order
// ---------------------------------------------------------------------------

fn bench_ordering(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordering");
    let config = PipelineConfig::new("/unused");

    for &n in &[100, 500] {
        group.bench_with_input(BenchmarkId::new("topological_chain", n), &n, |b, &n| {
            let files = chain_repo(n);
            let mut units = Vec::new();
            for f in &files {
                let (file_units, _) = extract::extract_units(f, true);
                units.extend(file_units);
            }
            let mut diagnostics = Vec::new();
            let table = SymbolTable::build(&units, &mut diagnostics);
            let (edges, _) =
                imports::resolve_imports(&units, &table, &config.extension_candidates);
            let graph = DependencyGraph::build(&units, &edges);
            b.iter(|| {
                let (order, cycles) = graph.topological_order(black_box(&units));
                black_box((order, cycles));
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: full in-memory pipeline
// ---------------------------------------------------------------------------

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.measurement_time(std::time::Duration::from_secs(10));

    for &n in &[10, 100, 500] {
        group.bench_with_input(BenchmarkId::new("run_on_files", n), &n, |b, &n| {
            let config = PipelineConfig::new("/unused");
            b.iter_with_setup(
                || chain_repo(n),
                |files| {
                    let report =
                        pipeline::run_on_files(files, Vec::new(), &config, Instant::now());
                    black_box(report);
                },
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_extraction,
    bench_resolution,
    bench_ordering,
    bench_pipeline,
);
criterion_main!(benches);
