use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use cascara::{
    CssEngine, Document, NodeId, Origin, PropertyRegistry, StaticContext, StyleSheet,
};

const SHEET: &str = "
    svg { font-size: 10px; color: rgb(20, 20, 20); }
    g { stroke-width: 1px; }
    g.layer rect { fill: currentColor; stroke-width: 0.5em; }
    rect.major { stroke: rgb(200, 0, 0); opacity: 0.8; }
    #root > g { visibility: visible; }
";

fn build_document(groups: usize, per_group: usize) -> (Document, Vec<NodeId>) {
    let mut doc = Document::new();
    let svg = doc.create_element("svg");
    doc.set_attribute(svg, "id", "root");
    let mut nodes = vec![svg];
    for i in 0..groups {
        let g = doc.create_element("g");
        doc.set_attribute(g, "class", "layer");
        doc.append_child(svg, g);
        nodes.push(g);
        for j in 0..per_group {
            let rect = doc.create_element("rect");
            if (i + j) % 2 == 0 {
                doc.set_attribute(rect, "class", "major");
            }
            doc.append_child(g, rect);
            nodes.push(rect);
        }
    }
    (doc, nodes)
}

fn bench_full_document(c: &mut Criterion) {
    let (doc, nodes) = build_document(20, 50);
    let registry = PropertyRegistry::svg();
    let sheet = StyleSheet::parse(&registry, SHEET);

    c.bench_function("cascade_full_document", |b| {
        b.iter(|| {
            let mut engine = CssEngine::new(
                PropertyRegistry::svg(),
                Box::new(StaticContext::default()),
                "screen",
            );
            engine.add_stylesheet(Origin::Author, sheet.clone());
            for &node in &nodes {
                black_box(engine.style_map(&doc, node, None));
            }
        })
    });
}

fn bench_invalidation(c: &mut Criterion) {
    let (mut doc, nodes) = build_document(20, 50);
    let registry = PropertyRegistry::svg();
    let sheet = StyleSheet::parse(&registry, SHEET);
    let mut engine = CssEngine::new(registry, Box::new(StaticContext::default()), "screen");
    engine.add_stylesheet(Origin::Author, sheet);
    for &node in &nodes {
        engine.style_map(&doc, node, None);
    }
    let svg = nodes[0];
    let mut toggle = false;

    c.bench_function("invalidate_root_color", |b| {
        b.iter(|| {
            toggle = !toggle;
            let color = if toggle { "rgb(10, 10, 10)" } else { "rgb(30, 30, 30)" };
            doc.set_attribute(svg, "color", color);
            engine.attribute_changed(&doc, svg, "color");
        })
    });
}

fn bench_parse(c: &mut Criterion) {
    let registry = PropertyRegistry::svg();
    c.bench_function("parse_stylesheet", |b| {
        b.iter(|| black_box(StyleSheet::parse(&registry, black_box(SHEET))))
    });
}

criterion_group!(benches, bench_full_document, bench_invalidation, bench_parse);
criterion_main!(benches);
