//! Static resource URI rewriting

use super::{InterceptionPoint, Interceptor};
use crate::ast::{RootNode, SyntaxNode, ViewHelperNode};
use crate::parser::state::ParsingState;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

// Package-relative resource URIs: an optional dotted package key followed by
// a `Public/` path, e.g. `Acme.Blog/Public/css/main.css`.
static RESOURCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:([A-Za-z][A-Za-z0-9]*(?:\.[A-Za-z][A-Za-z0-9]*)+)/)?Public/([A-Za-z0-9_\-./]+)")
        .expect("resource pattern is valid")
});

/// Rewrites package-relative resource URIs inside text nodes
///
/// Each match becomes a `f:uri.resource` helper invocation resolved at
/// render time; surrounding text is preserved verbatim, including between
/// multiple matches in the same text block.
#[derive(Debug, Default)]
pub struct ResourceInterceptor;

impl ResourceInterceptor {
    /// Create the interceptor
    pub fn new() -> Self {
        Self
    }

    fn uri_helper(package: Option<&str>, path: &str) -> SyntaxNode {
        let mut arguments = IndexMap::new();
        arguments.insert("path".to_string(), SyntaxNode::text(path));
        if let Some(package) = package {
            arguments.insert("package".to_string(), SyntaxNode::text(package));
        }
        SyntaxNode::ViewHelper(ViewHelperNode {
            namespace: "f".to_string(),
            name: "uri.resource".to_string(),
            arguments,
            children: Vec::new(),
        })
    }
}

impl Interceptor for ResourceInterceptor {
    fn intercepts(&self, point: InterceptionPoint) -> bool {
        point == InterceptionPoint::Text
    }

    fn process(
        &mut self,
        node: SyntaxNode,
        _point: InterceptionPoint,
        _state: &ParsingState,
    ) -> SyntaxNode {
        let SyntaxNode::Text(text) = node else {
            return node;
        };
        if !RESOURCE_PATTERN.is_match(&text) {
            return SyntaxNode::Text(text);
        }

        let mut pieces = Vec::new();
        let mut last_end = 0;
        for capture in RESOURCE_PATTERN.captures_iter(&text) {
            let whole = capture.get(0).expect("capture 0 always present");
            if whole.start() > last_end {
                pieces.push(SyntaxNode::text(&text[last_end..whole.start()]));
            }
            let package = capture.get(1).map(|m| m.as_str());
            let path = capture.get(2).map(|m| m.as_str()).unwrap_or_default();
            pieces.push(Self::uri_helper(package, path));
            last_end = whole.end();
        }
        if last_end < text.len() {
            pieces.push(SyntaxNode::text(&text[last_end..]));
        }
        if pieces.len() == 1 {
            pieces.pop().expect("one piece")
        } else {
            SyntaxNode::Root(RootNode::new(pieces))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(text: &str) -> SyntaxNode {
        let mut interceptor = ResourceInterceptor::new();
        interceptor.process(
            SyntaxNode::text(text),
            InterceptionPoint::Text,
            &ParsingState::new(),
        )
    }

    #[test]
    fn non_matching_text_is_untouched() {
        assert_eq!(rewrite("hello world"), SyntaxNode::text("hello world"));
    }

    #[test]
    fn single_uri_with_package() {
        let SyntaxNode::Root(root) = rewrite(r#"src="Acme.Blog/Public/css/main.css" x"#) else {
            panic!("expected split");
        };
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.children[0], SyntaxNode::text("src=\""));
        match &root.children[1] {
            SyntaxNode::ViewHelper(node) => {
                assert_eq!(node.name, "uri.resource");
                assert_eq!(node.arguments["path"], SyntaxNode::text("css/main.css"));
                assert_eq!(node.arguments["package"], SyntaxNode::text("Acme.Blog"));
            }
            other => panic!("expected helper, got {other:?}"),
        }
        assert_eq!(root.children[2], SyntaxNode::text("\" x"));
    }

    #[test]
    fn multiple_uris_split_around_plain_text() {
        let SyntaxNode::Root(root) =
            rewrite("a Public/x.js b Public/y.js c")
        else {
            panic!("expected split");
        };
        assert_eq!(root.children.len(), 5);
        assert!(matches!(&root.children[1], SyntaxNode::ViewHelper(n) if n.arguments["path"] == SyntaxNode::text("x.js")));
        assert_eq!(root.children[2], SyntaxNode::text(" b "));
        assert!(matches!(&root.children[3], SyntaxNode::ViewHelper(n) if n.arguments["path"] == SyntaxNode::text("y.js")));
    }
}
