//! Benchmarks for rendering component trees.
//!
//! Run with: cargo bench -p weft-core --bench render

use std::borrow::Cow;
use std::hint::black_box;
use std::sync::OnceLock;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use minijinja::Value;
use weft_core::component::{children, Component, Handler, Live, Schema};
use weft_core::router::EventRouter;
use weft_core::{Registry, RenderEngine};

#[derive(Default)]
struct Row {
    label: String,
    count: i64,
}

impl Component for Row {
    fn template(&self) -> Cow<'static, str> {
        Cow::Borrowed(
            r#"<tr><td>{{ Label }}</td><td>{{ Count }}</td><td><input @value="Label"><button @click="Bump">+</button></td></tr>"#,
        )
    }

    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Row>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new()
                .field("Label", |r: &Row| r.label.clone(), |r, v| r.label = v)
                .field("Count", |r: &Row| r.count, |r, v| r.count = v)
                .handler("Bump", Handler::Nullary(|r| r.count += 1))
        })
    }
}

struct Table {
    rows: Vec<Live<Row>>,
}

impl Component for Table {
    fn template(&self) -> Cow<'static, str> {
        Cow::Borrowed("<table>{% for row in Rows %}{{ render(row) }}{% endfor %}</table><p>{{ Total }}</p>")
    }

    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Table>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new()
                .prop("Rows", |t: &Table| children(&t.rows))
                .prop("Total", |t: &Table| Value::from(t.rows.iter().map(|r| r.read().count).sum::<i64>()))
        })
    }
}

fn table(rows: usize) -> Live<Table> {
    Live::new(Table {
        rows: (0..rows)
            .map(|i| {
                Live::new(Row {
                    label: format!("row {i}"),
                    count: i as i64,
                })
            })
            .collect(),
    })
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/table");
    for rows in [1usize, 10, 100] {
        let engine = RenderEngine::new(Registry::new());
        let root = table(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &root, |b, root| {
            b.iter(|| black_box(engine.render_live(root).map(|html| html.len())))
        });
    }
    group.finish();
}

fn bench_event_then_render(c: &mut Criterion) {
    let registry = Registry::new();
    let engine = RenderEngine::new(registry.clone());
    let router = EventRouter::new(registry);
    let root = table(10);
    let _ = engine.render_live(&root);
    let target = root.read().rows[3].id().map(|id| id.to_string()).unwrap_or_default();

    c.bench_function("render/bump_then_render", |b| {
        b.iter(|| {
            let _ = router.apply_parts(&target, "Bump", None, None);
            black_box(engine.render_live(&root).map(|html| html.len()))
        })
    });
}

criterion_group!(benches, bench_render, bench_event_then_render);
criterion_main!(benches);
