//! Performance benchmarks for cyclic graph traversal
//!
//! These benchmarks measure:
//! - Building a long builder ring into an instance ring
//! - Validating the resulting instance ring
//! - The cost of cooperative yielding at different intervals
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use once_cell::sync::Lazy;
use reweave_core::{
    builder::{BuildEngine, Builder},
    config::EngineConfig,
    record::{Instance, Member, Record, Schema},
    validation::{Diagnostic, RuleSet, Validator},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum LinkMember {
    Weight,
    Next,
}

impl Member for LinkMember {
    const ALL: &'static [Self] = &[LinkMember::Weight, LinkMember::Next];

    fn name(&self) -> &'static str {
        match self {
            LinkMember::Weight => "weight",
            LinkMember::Next => "next",
        }
    }
}

#[derive(Default)]
struct Link {
    weight: i64,
    next: Option<Instance<Link>>,
}

static LINK_SCHEMA: Lazy<Schema<Link>> = Lazy::new(|| {
    Schema::<Link>::builder("Link")
        .scalar(
            LinkMember::Weight,
            |link, weight| {
                link.weight = weight;
                Ok(())
            },
            |link| Some(link.weight),
        )
        .nested(
            LinkMember::Next,
            |link, next| link.next = next,
            |link| link.next.clone(),
        )
        .finish()
});

impl Record for Link {
    type Member = LinkMember;
    type Value = i64;

    fn schema() -> &'static Schema<Self> {
        &LINK_SCHEMA
    }
}

/// A ring of `len` builders whose last node points back at the first.
fn ring(len: usize) -> Vec<Builder<Link>> {
    let nodes: Vec<Builder<Link>> = (0..len)
        .map(|i| Builder::new().with_value(LinkMember::Weight, i as i64))
        .collect();
    for (i, node) in nodes.iter().enumerate() {
        node.set_nested(LinkMember::Next, &nodes[(i + 1) % len]);
    }
    nodes
}

fn release_ring(builders: &[Builder<Link>], root: Option<Instance<Link>>) {
    for builder in builders {
        builder.clear(LinkMember::Next);
    }
    let mut cursor = root;
    while let Some(link) = cursor {
        cursor = link.borrow_mut().next.take();
    }
}

fn rules() -> RuleSet<Link> {
    RuleSet::<Link>::new().predicate(
        LinkMember::Weight,
        Diagnostic::message("weight must not be negative"),
        |weight| *weight >= 0,
    )
}

fn bench_build_ring(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let mut group = c.benchmark_group("build_ring");
    for len in [16usize, 256, 2048] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.to_async(&rt).iter(|| async move {
                let builders = ring(len);
                let instance = BuildEngine::default().build(&builders[0]).await.unwrap();
                release_ring(&builders, Some(instance));
            });
        });
    }
    group.finish();
}

fn bench_validate_ring(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let validator = Validator::new(rules());
    let validator = &validator;
    let mut group = c.benchmark_group("validate_ring");
    for len in [16usize, 256, 2048] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.to_async(&rt).iter(|| async move {
                let builders = ring(len);
                let instance = BuildEngine::default().build(&builders[0]).await.unwrap();
                let record = validator.validate(&instance).await.unwrap();
                assert!(record.is_valid());
                release_ring(&builders, Some(instance));
            });
        });
    }
    group.finish();
}

fn bench_yield_interval(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let mut group = c.benchmark_group("yield_interval");
    for interval in [None, Some(1usize), Some(64)] {
        let label = interval.map_or("never".to_string(), |i| i.to_string());
        let engine =
            BuildEngine::new(EngineConfig::default().with_yield_interval(interval));
        let engine = &engine;
        group.bench_function(label, |b| {
            b.to_async(&rt).iter(|| async move {
                let builders = ring(1024);
                let instance = engine.build(&builders[0]).await.unwrap();
                release_ring(&builders, Some(instance));
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_build_ring,
    bench_validate_ring,
    bench_yield_interval
);
criterion_main!(benches);
