/// Performance benchmarks for the per-query pipeline
///
/// Run with: cargo bench
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;

use ragbi::biclique::BicliqueComputer;
use ragbi::gene::QueryGeneList;
use ragbi::hit_parser::HitParser;
use ragbi::interval::{IntervalBuilder, ResolvedHits};
use ragbi::reference::ReferenceCatalog;
use ragbi::{BlockConfig, QueryContext};

const GENOMES: usize = 40;
const REFERENCE_GENES: u64 = 2000;

fn reference() -> ReferenceCatalog {
    let mut entries = Vec::new();
    for g in 0..GENOMES {
        for i in 0..REFERENCE_GENES {
            entries.push((format!("G{g}"), format!("G{g}_{i}"), i * 1000, i * 1000 + 900));
        }
    }
    ReferenceCatalog::from_entries(entries).unwrap()
}

fn gene_list(n: usize) -> QueryGeneList {
    let text: String = (0..n)
        .map(|i| format!("q{i}\t{}\t{}\tISL\n", i * 1000, i * 1000 + 900))
        .collect();
    QueryGeneList::read(text.as_bytes(), "ISL").unwrap()
}

/// Mostly colinear hits with a deterministic sprinkle of displaced targets
fn synthetic_hits(num_genes: usize) -> String {
    let mut lines = String::new();
    for g in 0..GENOMES {
        let offset = (g * 37) % 1500;
        for q in 0..num_genes {
            // Every genome loses a different stretch of the island
            if (q + g) % 11 == 0 {
                continue;
            }
            let target = if (q * 7 + g) % 13 == 0 { offset + q + 3 } else { offset + q };
            lines.push_str(&format!("q{q}\tG{g}_{target}\tG{g}\t1e-{}\t90.0\n", 10 + (q + g) % 50));
            // A paralog far away
            if q % 4 == 0 {
                let far = (offset + 700) % 2000;
                lines.push_str(&format!("q{q}\tG{g}_{far}\tG{g}\t1e-5\t60.0\n"));
            }
        }
    }
    lines
}

fn config() -> BlockConfig {
    BlockConfig {
        min_rank: 1.0,
        ..Default::default()
    }
}

/// Benchmark: hits -> ranked result for one island
fn bench_query_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_pipeline");
    let reference = reference();
    let config = config();

    for size in [20usize, 60, 150].iter() {
        let genes = gene_list(*size);
        let hits = synthetic_hits(*size);
        group.throughput(Throughput::Elements(hits.lines().count() as u64));
        group.sample_size(10);

        group.bench_with_input(BenchmarkId::from_parameter(size), &hits, |b, hits| {
            let ctx = QueryContext::new(&config, &reference);
            b.iter(|| {
                let result = ctx.run(&genes, Cursor::new(hits.as_bytes())).unwrap();
                black_box(result.num_of_cliques)
            });
        });
    }

    group.finish();
}

/// Benchmark: block enumeration and clique grouping on pre-parsed hits
fn bench_blocks_and_cliques(c: &mut Criterion) {
    let mut group = c.benchmark_group("blocks_and_cliques");
    let reference = reference();
    let config = config();

    for size in [60usize, 150].iter() {
        let genes = gene_list(*size);
        let parsed = HitParser::from_config(&config)
            .parse(Cursor::new(synthetic_hits(*size)), &genes)
            .unwrap();
        let resolved = ResolvedHits::resolve(&parsed.table, &reference);
        group.sample_size(10);

        group.bench_with_input(BenchmarkId::new("intervals", size), &resolved, |b, resolved| {
            b.iter(|| black_box(IntervalBuilder::new(&config).build(resolved).len()));
        });

        let blocks = IntervalBuilder::new(&config).build(&resolved);
        group.bench_with_input(BenchmarkId::new("bicliques", size), &blocks, |b, blocks| {
            b.iter(|| {
                let (cliques, _) = BicliqueComputer::new(&config, &reference).compute(blocks);
                black_box(cliques.len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_query_pipeline, bench_blocks_and_cliques);
criterion_main!(benches);
