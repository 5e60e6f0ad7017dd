//! Compilation round-trips and cache behaviour

use pretty_assertions::assert_eq;
use rstest::rstest;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use vellum::compiler::{
    BoundedCache, CompilerState, MemoryCache, TemplateCompiler, fingerprint,
};
use vellum::engine::variables_from_json;
use vellum::rendering::{ParsedTemplate, RenderingContext};
use vellum::{HelperResolver, TemplateEngine, TemplateParser};

fn compiler() -> TemplateCompiler {
    TemplateCompiler::new(
        Arc::new(HelperResolver::standard()),
        Arc::new(MemoryCache::new()),
    )
}

fn render_parsed(parsed: &ParsedTemplate, variables: serde_json::Value) -> String {
    let resolver = Arc::new(HelperResolver::standard());
    let mut ctx = RenderingContext::with_variables(resolver, variables_from_json(variables));
    ctx.swap_sections(parsed.sections().clone());
    parsed.render(&mut ctx).expect("render")
}

#[rstest]
#[case("Hello {name}.")]
#[case("{a + b} and {a+b}")]
#[case("<f:if condition=\"{a} > 1\" then=\"yes\" else=\"no\" />")]
#[case("<f:for each=\"{items}\" as=\"x\">{x};</f:for>")]
#[case("pre<f:comment>gone {nope}</f:comment>post")]
#[case("{flag ? name : 'anon'}")]
#[case("{missing ?? name}")]
fn compiled_output_matches_the_interpreted_output(#[case] source: &str) {
    let variables = serde_json::json!({
        "name": "Ada",
        "a": 2,
        "b": 3,
        "flag": true,
        "items": [1, 2, 3],
    });
    let resolver = Arc::new(HelperResolver::standard());
    let interpreted = TemplateParser::new(resolver).parse(source).expect("parse");
    assert!(!interpreted.is_compiled());

    let compiled = compiler().fetch(source).expect("compile");
    assert!(compiled.is_compiled());

    assert_eq!(
        render_parsed(&compiled, variables.clone()),
        render_parsed(&interpreted, variables),
    );
}

#[test]
fn static_templates_fold_to_a_single_text_node() {
    let compiled = compiler().fetch("a<f:comment>x</f:comment>b{4/2}").expect("compile");
    let root = compiled.root().expect("tree");
    assert_eq!(root.children.len(), 1);
    assert_eq!(render_parsed(&compiled, serde_json::json!({})), "ab2");
}

#[test]
fn compiled_programs_survive_serialization() {
    let compiler = compiler();
    let resolver = compiler.resolver().clone();
    let source = "Hello {name}, {a + b}.";
    let parsed = TemplateParser::new(resolver).parse(source).expect("parse");
    let program = compiler
        .compile(&fingerprint(source), &parsed)
        .expect("compile");

    let json = serde_json::to_string(&program).expect("serialize");
    let restored = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(program, restored);

    let variables = serde_json::json!({"name": "Ada", "a": 1, "b": 2});
    assert_eq!(
        render_parsed(&ParsedTemplate::from_program(restored), variables),
        "Hello Ada, 3.",
    );
}

#[test]
fn repeated_fetches_share_one_template() {
    let compiler = compiler();
    let first = compiler.fetch("{a} + {b}").expect("fetch");
    let second = compiler.fetch("{a} + {b}").expect("fetch");
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn flushing_the_cache_forces_a_fresh_compile() {
    let engine = TemplateEngine::new();
    let source = "cached {v}";
    let first = engine.compiler().fetch(source).expect("fetch");
    engine.flush_cache();
    assert!(!engine.compiler().cache().has(&fingerprint(source)));
    let second = engine.compiler().fetch(source).expect("fetch");
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn bounded_cache_evicts_but_recompiles_transparently() {
    let compiler = TemplateCompiler::new(
        Arc::new(HelperResolver::standard()),
        Arc::new(BoundedCache::new(
            std::num::NonZeroUsize::new(1).expect("nonzero"),
        )),
    );
    compiler.fetch("one {a}").expect("fetch");
    compiler.fetch("two {b}").expect("fetch");
    assert!(!compiler.cache().has(&fingerprint("one {a}")));

    // Evicted templates simply compile again on the next fetch
    let again = compiler.fetch("one {a}").expect("fetch");
    assert!(again.is_compiled());
}

#[test]
fn passthrough_is_tracked_as_a_failed_compile() {
    let compiler = compiler();
    let source = "{parsing off}left as-is {x}";
    let parsed = compiler.fetch(source).expect("fetch");
    assert!(parsed.is_passthrough());
    match compiler.state(&fingerprint(source)) {
        CompilerState::Failed(failure) => assert!(!failure.reason.is_empty()),
        other => panic!("expected a failed state, got {other:?}"),
    }
    assert_eq!(
        render_parsed(&parsed, serde_json::json!({})),
        "left as-is {x}"
    );
}

#[test]
fn unseen_templates_report_the_idle_state() {
    assert_eq!(compiler().state("tpl_0000000000000000"), CompilerState::Idle);
}

#[test]
fn variables_from_json_ignores_non_objects() {
    assert!(variables_from_json(serde_json::json!([1, 2])).is_empty());
    let variables: FxHashMap<_, _> = variables_from_json(serde_json::json!({"k": "v"}));
    assert_eq!(variables.len(), 1);
}
