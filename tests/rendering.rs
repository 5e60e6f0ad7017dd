//! End-to-end rendering scenarios

use pretty_assertions::assert_eq;
use rustc_hash::FxHashMap;
use vellum::engine::variables_from_json;
use vellum::{ParseError, TemplateEngine, TemplateError};

fn render(source: &str, variables: serde_json::Value) -> String {
    TemplateEngine::new()
        .render_source(source, variables_from_json(variables))
        .expect("template must render")
}

fn render_err(source: &str) -> TemplateError {
    TemplateEngine::new()
        .render_source(source, FxHashMap::default())
        .expect_err("template must fail")
}

#[test]
fn output_is_html_escaped_by_default() {
    let output = render(
        "Hello {name}.",
        serde_json::json!({"name": "<script>alert(1)</script>"}),
    );
    assert_eq!(output, "Hello &lt;script&gt;alert(1)&lt;/script&gt;.");
}

#[test]
fn escaping_directive_turns_escaping_off() {
    let output = render("{escaping off}{name}", serde_json::json!({"name": "<b>"}));
    assert_eq!(output, "<b>");
}

#[test]
fn raw_helper_bypasses_escaping() {
    let output = render(
        "<f:format.raw>{name}</f:format.raw>",
        serde_json::json!({"name": "<b>bold</b>"}),
    );
    assert_eq!(output, "<b>bold</b>");
}

#[test]
fn nested_raw_reenables_escaping_at_the_outermost_close() {
    let output = render(
        "<f:format.raw>{v}<f:format.raw>{v}</f:format.raw>{v}</f:format.raw>{v}",
        serde_json::json!({"v": "<b>"}),
    );
    assert_eq!(output, "<b><b><b>&lt;b&gt;");
}

#[test]
fn sibling_raw_helpers_do_not_leak_their_disable_state() {
    let output = render(
        "<f:format.raw>{v}</f:format.raw>{v}<f:format.raw>{v}</f:format.raw>",
        serde_json::json!({"v": "<b>"}),
    );
    assert_eq!(output, "<b>&lt;b&gt;<b>");
}

#[test]
fn htmlspecialchars_escapes_once() {
    let output = render(
        "<f:format.htmlspecialchars value=\"{v}\" />",
        serde_json::json!({"v": "a < b"}),
    );
    assert_eq!(output, "a &lt; b");
}

#[test]
fn missing_accessor_paths_render_empty() {
    assert_eq!(render("[{missing.deep.path}]", serde_json::json!({})), "[]");
}

#[test]
fn booleans_render_in_loose_string_form() {
    let output = render(
        "{yes}|{no}",
        serde_json::json!({"yes": true, "no": false}),
    );
    assert_eq!(output, "1|");
}

#[test]
fn shorthand_math_without_spaces() {
    let vars = serde_json::json!({"a": 1, "b": 1});
    assert_eq!(render("{a+b}", vars.clone()), "2");
    assert_eq!(render("{a%b}", vars.clone()), "0");
    assert_eq!(render("{1^4}", vars), "1");
}

#[test]
fn division_preserves_integers_where_possible() {
    assert_eq!(render("{4/2}|{5/2}", serde_json::json!({})), "2|2.5");
}

#[test]
fn ternary_expression_picks_a_branch() {
    let output = render(
        "{n > 2 ? 'big' : 'small'}",
        serde_json::json!({"n": 5}),
    );
    assert_eq!(output, "big");
}

#[test]
fn null_coalescing_takes_the_first_resolved_value() {
    let output = render(
        "{missing ?? name ?? 'fallback'}",
        serde_json::json!({"name": "X"}),
    );
    assert_eq!(output, "X");
}

#[test]
fn if_helper_renders_children_or_else_argument() {
    let vars = serde_json::json!({"n": 5});
    assert_eq!(
        render("<f:if condition=\"{n} > 2\">big</f:if>", vars.clone()),
        "big"
    );
    assert_eq!(
        render(
            "<f:if condition=\"{n} > 9\" then=\"big\" else=\"small\" />",
            vars
        ),
        "small"
    );
}

#[test]
fn for_helper_iterates_with_metadata() {
    let output = render(
        "<f:for each=\"{items}\" as=\"x\" iteration=\"it\">{it.cycle}:{x};</f:for>",
        serde_json::json!({"items": [10, 20]}),
    );
    assert_eq!(output, "1:10;2:20;");
}

#[test]
fn cycle_alternates_per_invocation() {
    let output = render(
        "<f:for each=\"{items}\" as=\"i\"><f:cycle values=\"{0: 'a', 1: 'b'}\" as=\"c\">{c}</f:cycle></f:for>",
        serde_json::json!({"items": [1, 2, 3, 4]}),
    );
    assert_eq!(output, "abab");
}

#[test]
fn alias_helper_binds_names_for_its_body() {
    let output = render(
        "<f:alias map=\"{short: {user.profile.name}}\">{short}</f:alias>",
        serde_json::json!({"user": {"profile": {"name": "Ada"}}}),
    );
    assert_eq!(output, "Ada");
}

#[test]
fn count_helper_counts_collections() {
    let output = render(
        "{f:count(subject: items)}",
        serde_json::json!({"items": ["a", "b", "c"]}),
    );
    assert_eq!(output, "3");
}

#[test]
fn pipe_chain_feeds_the_value_into_the_helper() {
    let output = render(
        "{html -> f:format.raw()}",
        serde_json::json!({"html": "<i>x</i>"}),
    );
    assert_eq!(output, "<i>x</i>");
}

#[test]
fn comments_swallow_broken_markup() {
    let output = render("a<f:comment>{totally <broken</f:comment>b", serde_json::json!({}));
    assert_eq!(output, "ab");
}

#[test]
fn resource_uris_resolve_in_plain_text() {
    let output = render(
        "src=\"Acme.Blog/Public/css/main.css\"",
        serde_json::json!({}),
    );
    assert_eq!(output, "src=\"/_resources/Acme/Blog/Public/css/main.css\"");
}

#[test]
fn escaped_braces_stay_literal() {
    assert_eq!(render(r"\{name}", serde_json::json!({"name": "x"})), "{name}");
}

#[test]
fn parsing_off_returns_the_stripped_source() {
    assert_eq!(
        render("{parsing off}a{x}<f:broken>", serde_json::json!({})),
        "a{x}<f:broken>"
    );
}

#[test]
fn ignored_namespaces_pass_through_verbatim() {
    let output = render(
        "{namespace x}<x:widget id=\"1\">{name}</x:widget>",
        serde_json::json!({"name": "n"}),
    );
    assert_eq!(output, "<x:widget id=\"1\">n</x:widget>");
}

#[test]
fn unknown_namespace_fails_to_parse() {
    let err = render_err("<zz:thing />");
    assert!(matches!(
        err,
        TemplateError::Parse(ParseError::UnknownNamespace { .. })
    ));
}

#[test]
fn unclosed_tag_fails_to_parse() {
    let err = render_err("text <f:format.raw> more");
    assert!(matches!(
        err,
        TemplateError::Parse(ParseError::UnclosedTag { .. })
    ));
}

#[test]
fn unresolvable_helper_fails_to_parse() {
    let err = render_err("<f:does.not.exist />");
    assert!(matches!(
        err,
        TemplateError::Parse(ParseError::UnresolvableHelper { .. })
    ));
}
