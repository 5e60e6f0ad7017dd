use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use vellum::engine::variables_from_json;
use vellum::rendering::RenderingContext;
use vellum::{HelperResolver, TemplateEngine, TemplateParser, TemplateValue};

const PAGE: &str = concat!(
    "<h1>{title}</h1>",
    "<f:if condition=\"{loggedIn}\">Welcome back, {user.name}.</f:if>",
    "<ul><f:for each=\"{items}\" as=\"item\" iteration=\"it\">",
    "<li class=\"{it.isEven ? 'even' : 'odd'}\">{it.cycle}: {item.label}</li>",
    "</f:for></ul>",
    "<p>{description -> f:format.raw()}</p>",
);

fn page_variables() -> FxHashMap<String, TemplateValue> {
    variables_from_json(serde_json::json!({
        "title": "Dashboard",
        "loggedIn": true,
        "user": {"name": "Ada"},
        "description": "<em>ready</em>",
        "items": (0..20)
            .map(|i| serde_json::json!({"label": format!("entry {i}")}))
            .collect::<Vec<_>>(),
    }))
}

fn benchmark_parse(c: &mut Criterion) {
    c.bench_function("parse_page", |b| {
        b.iter(|| {
            let parser = TemplateParser::standard();
            black_box(parser.parse(black_box(PAGE)))
        })
    });
}

fn benchmark_interpreted_render(c: &mut Criterion) {
    let resolver = Arc::new(HelperResolver::standard());
    let parsed = TemplateParser::new(resolver.clone())
        .parse(PAGE)
        .expect("parse");
    let variables = page_variables();

    c.bench_function("render_interpreted", |b| {
        b.iter(|| {
            let mut ctx = RenderingContext::with_variables(resolver.clone(), variables.clone());
            ctx.swap_sections(parsed.sections().clone());
            black_box(parsed.render(&mut ctx))
        })
    });
}

fn benchmark_cached_engine_render(c: &mut Criterion) {
    let engine = TemplateEngine::new();
    let variables = page_variables();
    // Prime the cache so the loop measures the cached path
    engine
        .render_source(PAGE, variables.clone())
        .expect("render");

    c.bench_function("render_cached", |b| {
        b.iter(|| black_box(engine.render_source(black_box(PAGE), variables.clone())))
    });
}

fn benchmark_shorthand_expressions(c: &mut Criterion) {
    let engine = TemplateEngine::new();
    let sources = [
        ("accessor", "{user.name}"),
        ("math", "{a + b * 2}"),
        ("ternary", "{a > 1 ? 'big' : 'small'}"),
        ("coalescing", "{missing ?? user.name}"),
    ];
    let variables = variables_from_json(serde_json::json!({
        "user": {"name": "Ada"},
        "a": 3,
        "b": 4,
    }));

    let mut group = c.benchmark_group("shorthand");
    for (name, source) in sources {
        group.bench_function(name, |b| {
            b.iter(|| black_box(engine.render_source(black_box(source), variables.clone())))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_parse,
    benchmark_interpreted_render,
    benchmark_cached_engine_render,
    benchmark_shorthand_expressions,
);
criterion_main!(benches);
