//! Structural template parser

use super::error::{ParseError, ParseResult};
use super::interceptor::{
    EscapeInterceptor, InterceptionPoint, Interceptor, ResourceInterceptor,
};
use super::processor::{ProcessingContext, standard_processors};
use super::scanner::{self, Segment};
use super::state::ParsingState;
use crate::ast::{
    BooleanExpression, ExpressionNode, ExpressionOperand, RootNode, SyntaxNode, ViewHelperNode,
    split_expression_parts,
};
use crate::model::TemplateValue;
use crate::registry::{ArgumentType, HelperResolver, ViewHelper};
use crate::rendering::ParsedTemplate;
use indexmap::IndexMap;
use std::sync::Arc;

/// One open (not yet closed) helper tag
struct OpenFrame {
    node: ViewHelperNode,
    line: usize,
}

/// Parses template source into a [`ParsedTemplate`]
///
/// The parser is stateless and can be shared; all per-parse state lives in a
/// fresh [`ParsingState`] and fresh interceptor instances. Parsing is
/// all-or-nothing: any structural error aborts the whole parse.
pub struct TemplateParser {
    resolver: Arc<HelperResolver>,
}

impl TemplateParser {
    pub fn new(resolver: Arc<HelperResolver>) -> Self {
        Self { resolver }
    }

    /// Parser over the standard resolver with the builtin `f` namespace
    pub fn standard() -> Self {
        Self::new(Arc::new(HelperResolver::standard()))
    }

    pub fn resolver(&self) -> &Arc<HelperResolver> {
        &self.resolver
    }

    /// Parse a full template source
    pub fn parse(&self, source: &str) -> ParseResult<ParsedTemplate> {
        let mut ctx = ProcessingContext::new(&self.resolver);
        let mut processed = source.to_string();
        for processor in standard_processors() {
            log::trace!("running processor {}", processor.name());
            processed = processor.pre_process(processed, &mut ctx)?;
            if ctx.passthrough {
                return Ok(ParsedTemplate::passthrough(processed));
            }
        }

        let mut state = ParsingState::new();
        if let Some(escaping) = ctx.escaping {
            state.escaping_enabled = escaping;
        }
        let mut interceptors: Vec<Box<dyn Interceptor>> = vec![
            Box::new(ResourceInterceptor::new()),
            Box::new(EscapeInterceptor::new(self.resolver.clone())),
        ];
        let root = self.build_tree(&processed, &mut state, &mut interceptors)?;
        Ok(ParsedTemplate::interpreted(root, state))
    }

    fn build_tree(
        &self,
        source: &str,
        state: &mut ParsingState,
        interceptors: &mut [Box<dyn Interceptor>],
    ) -> ParseResult<RootNode> {
        let mut root: Vec<SyntaxNode> = Vec::new();
        let mut stack: Vec<OpenFrame> = Vec::new();

        for segment in scanner::scan(source) {
            match segment {
                Segment::Text(text) => {
                    let node = intercept(
                        interceptors,
                        SyntaxNode::Text(text),
                        InterceptionPoint::Text,
                        state,
                    );
                    append(&mut stack, &mut root, node);
                }
                Segment::TagOpen {
                    namespace,
                    name,
                    attributes,
                    self_closing,
                    raw,
                    line,
                } => {
                    if self.resolver.is_namespace_ignored(&namespace) {
                        append(&mut stack, &mut root, SyntaxNode::Text(raw));
                        continue;
                    }
                    if !self.resolver.is_namespace_valid(&namespace) {
                        return Err(ParseError::UnknownNamespace {
                            namespace,
                            fragment: raw,
                        });
                    }
                    let helper = self.resolver.resolve(&namespace, &name)?;
                    let qualified = format!("{namespace}:{name}");
                    let arguments =
                        self.parse_tag_arguments(&attributes, &qualified, helper.as_ref())?;
                    let node = ViewHelperNode {
                        namespace,
                        name,
                        arguments,
                        children: Vec::new(),
                    };
                    state.stack_depth = stack.len();
                    let node = intercept(
                        interceptors,
                        SyntaxNode::ViewHelper(node),
                        InterceptionPoint::OpeningHelper,
                        state,
                    );
                    match node {
                        SyntaxNode::ViewHelper(node) if !self_closing => {
                            stack.push(OpenFrame { node, line });
                        }
                        SyntaxNode::ViewHelper(node) => {
                            let closed = self.close_helper(node, state, interceptors)?;
                            append(&mut stack, &mut root, closed);
                        }
                        other => append(&mut stack, &mut root, other),
                    }
                }
                Segment::TagClose {
                    namespace,
                    name,
                    raw,
                    line,
                } => {
                    if self.resolver.is_namespace_ignored(&namespace) {
                        append(&mut stack, &mut root, SyntaxNode::Text(raw));
                        continue;
                    }
                    let found = format!("{namespace}:{name}");
                    let Some(frame) = stack.pop() else {
                        return Err(ParseError::UnexpectedClosingTag { found, line });
                    };
                    if frame.node.namespace != namespace || frame.node.name != name {
                        return Err(ParseError::MismatchedClosingTag {
                            expected: frame.node.qualified_name(),
                            found,
                            line,
                        });
                    }
                    state.stack_depth = stack.len();
                    let closed = self.close_helper(frame.node, state, interceptors)?;
                    append(&mut stack, &mut root, closed);
                }
                Segment::Shorthand { content, raw, line: _ } => {
                    match self.parse_shorthand(&content)? {
                        Some(SyntaxNode::ViewHelper(node)) => {
                            state.stack_depth = stack.len();
                            let node = intercept(
                                interceptors,
                                SyntaxNode::ViewHelper(node),
                                InterceptionPoint::OpeningHelper,
                                state,
                            );
                            let node = match node {
                                SyntaxNode::ViewHelper(node) => {
                                    self.close_helper(node, state, interceptors)?
                                }
                                other => other,
                            };
                            append(&mut stack, &mut root, node);
                        }
                        Some(node) => {
                            let node = intercept(
                                interceptors,
                                node,
                                InterceptionPoint::ObjectAccessor,
                                state,
                            );
                            append(&mut stack, &mut root, node);
                        }
                        None => append(&mut stack, &mut root, SyntaxNode::Text(raw)),
                    }
                }
            }
        }

        if let Some(frame) = stack.pop() {
            return Err(ParseError::UnclosedTag {
                tag: frame.node.qualified_name(),
                line: frame.line,
            });
        }
        Ok(RootNode::new(root))
    }

    /// Run the post-parse hook and closing interception for a completed
    /// helper node
    fn close_helper(
        &self,
        node: ViewHelperNode,
        state: &mut ParsingState,
        interceptors: &mut [Box<dyn Interceptor>],
    ) -> ParseResult<SyntaxNode> {
        let helper = self.resolver.resolve(&node.namespace, &node.name)?;
        helper.post_parse(&node, state);
        Ok(intercept(
            interceptors,
            SyntaxNode::ViewHelper(node),
            InterceptionPoint::ClosingHelper,
            state,
        ))
    }

    fn parse_tag_arguments(
        &self,
        raw: &str,
        tag: &str,
        helper: &dyn ViewHelper,
    ) -> ParseResult<IndexMap<String, SyntaxNode>> {
        let mut arguments = IndexMap::new();
        for attribute in scanner::parse_attributes(raw, tag)? {
            if arguments.contains_key(&attribute.name) {
                return Err(ParseError::DuplicateArgument {
                    argument: attribute.name,
                    tag: tag.to_string(),
                });
            }
            let nodes = self.parse_value_nodes(&attribute.value)?;
            arguments.insert(attribute.name, wrap_nodes(nodes));
        }
        self.convert_boolean_arguments(helper, &mut arguments);
        Ok(arguments)
    }

    /// Parse an attribute or quoted argument value as a mini-template of
    /// text and shorthand segments
    fn parse_value_nodes(&self, value: &str) -> ParseResult<Vec<SyntaxNode>> {
        let mut nodes = Vec::new();
        for segment in scanner::scan(value) {
            match segment {
                Segment::Text(text) => nodes.push(SyntaxNode::Text(text)),
                Segment::Shorthand { content, raw, .. } => match self.parse_shorthand(&content)? {
                    Some(node) => nodes.push(node),
                    None => nodes.push(SyntaxNode::Text(raw)),
                },
                Segment::TagOpen { raw, .. } | Segment::TagClose { raw, .. } => {
                    nodes.push(SyntaxNode::Text(raw));
                }
            }
        }
        Ok(nodes)
    }

    /// Arguments declared boolean are converted to boolean expression trees
    /// at parse time
    fn convert_boolean_arguments(
        &self,
        helper: &dyn ViewHelper,
        arguments: &mut IndexMap<String, SyntaxNode>,
    ) {
        for definition in helper.argument_definitions() {
            if definition.ty != ArgumentType::Boolean {
                continue;
            }
            if let Some(node) = arguments.get_mut(definition.name) {
                let parts = match &*node {
                    SyntaxNode::Root(root) => root.children.clone(),
                    other => vec![other.clone()],
                };
                *node = SyntaxNode::Boolean(BooleanExpression::from_nodes(&parts));
            }
        }
    }

    /// Parse the content of one `{...}` segment
    ///
    /// `None` means the content is no recognized construct and the raw text
    /// is kept literally.
    fn parse_shorthand(&self, content: &str) -> ParseResult<Option<SyntaxNode>> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        if let Some(node) = self.parse_inline_chain(trimmed)? {
            return Ok(Some(node));
        }

        let parts = split_expression_parts(trimmed);
        if parts.len() >= 3
            && let Some(expression) = ExpressionNode::try_match(&parts)
        {
            return Ok(Some(SyntaxNode::Expression(expression)));
        }

        if let Some(operand) = ExpressionOperand::parse(trimmed) {
            return Ok(Some(match operand {
                ExpressionOperand::Accessor(path) => SyntaxNode::ObjectAccessor(path),
                ExpressionOperand::Literal(TemplateValue::String(s)) => SyntaxNode::Text(s),
                ExpressionOperand::Literal(value) => SyntaxNode::Numeric(value),
            }));
        }

        if let Some(array) = self.parse_array_content(trimmed)? {
            return Ok(Some(SyntaxNode::Array(array)));
        }

        Ok(None)
    }

    /// Parse `ns:helper(args)` calls, including `value -> ns:helper()` pipe
    /// chains where each stage receives the previous stage as its child
    fn parse_inline_chain(&self, content: &str) -> ParseResult<Option<SyntaxNode>> {
        let stages = split_top_level(content, "->");
        if stages.len() == 1 {
            return match helper_call_parts(&stages[0]) {
                Some(parts) => self.parse_helper_call(parts, None),
                None => Ok(None),
            };
        }

        // Every stage after the first must be a helper call
        let mut tail_calls = Vec::with_capacity(stages.len() - 1);
        for stage in &stages[1..] {
            match helper_call_parts(stage) {
                Some(parts) => tail_calls.push(parts),
                None => return Ok(None),
            }
        }

        let first = &stages[0];
        let mut current = match helper_call_parts(first) {
            Some(parts) => match self.parse_helper_call(parts, None)? {
                Some(node) => node,
                None => return Ok(None),
            },
            None => match self.parse_shorthand(first)? {
                Some(node) => node,
                None => return Ok(None),
            },
        };
        for parts in tail_calls {
            current = match self.parse_helper_call(parts, Some(current))? {
                Some(node) => node,
                None => return Ok(None),
            };
        }
        Ok(Some(current))
    }

    fn parse_helper_call(
        &self,
        (alias, name, args): (String, String, String),
        piped_child: Option<SyntaxNode>,
    ) -> ParseResult<Option<SyntaxNode>> {
        if self.resolver.is_namespace_ignored(&alias) {
            return Ok(None);
        }
        if !self.resolver.is_namespace_valid(&alias) {
            return Err(ParseError::UnknownNamespace {
                namespace: alias,
                fragment: format!("{{{name}(...)}}"),
            });
        }
        let helper = self.resolver.resolve(&alias, &name)?;
        let qualified = format!("{alias}:{name}");

        let mut arguments = IndexMap::new();
        if !args.trim().is_empty() {
            for pair in split_top_level(&args, ",") {
                let Some((key, value)) = split_key_value(&pair) else {
                    return Err(ParseError::MalformedAttributes {
                        tag: qualified,
                        detail: format!("argument '{pair}' is not a name: value pair"),
                    });
                };
                if arguments.contains_key(&key) {
                    return Err(ParseError::DuplicateArgument {
                        argument: key,
                        tag: qualified,
                    });
                }
                let node = self.parse_argument_value(&value)?;
                arguments.insert(key, node);
            }
        }
        self.convert_boolean_arguments(helper.as_ref(), &mut arguments);

        Ok(Some(SyntaxNode::ViewHelper(ViewHelperNode {
            namespace: alias,
            name,
            arguments,
            children: piped_child.into_iter().collect(),
        })))
    }

    /// Parse one inline argument value
    fn parse_argument_value(&self, value: &str) -> ParseResult<SyntaxNode> {
        let trimmed = value.trim();
        if (trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2)
            || (trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2)
        {
            let inner = trimmed[1..trimmed.len() - 1]
                .replace("\\'", "'")
                .replace("\\\"", "\"");
            return Ok(wrap_nodes(self.parse_value_nodes(&inner)?));
        }
        if trimmed.starts_with('{') && trimmed.ends_with('}') && trimmed.len() >= 2 {
            let inner = &trimmed[1..trimmed.len() - 1];
            return Ok(self
                .parse_shorthand(inner)?
                .unwrap_or_else(|| SyntaxNode::Text(trimmed.to_string())));
        }
        if let Some(parts) = helper_call_parts(trimmed)
            && let Some(node) = self.parse_helper_call(parts, None)?
        {
            return Ok(node);
        }
        match self.parse_shorthand(trimmed)? {
            Some(node) => Ok(node),
            None => Ok(SyntaxNode::Text(trimmed.to_string())),
        }
    }

    /// Parse `key: value, ...` array content
    fn parse_array_content(
        &self,
        content: &str,
    ) -> ParseResult<Option<IndexMap<String, SyntaxNode>>> {
        let mut entries = IndexMap::new();
        for pair in split_top_level(content, ",") {
            let Some((key, value)) = split_key_value(&pair) else {
                return Ok(None);
            };
            let node = self.parse_argument_value(&value)?;
            entries.insert(key, node);
        }
        if entries.is_empty() {
            Ok(None)
        } else {
            Ok(Some(entries))
        }
    }
}

fn append(stack: &mut [OpenFrame], root: &mut Vec<SyntaxNode>, node: SyntaxNode) {
    match stack.last_mut() {
        Some(frame) => frame.node.children.push(node),
        None => root.push(node),
    }
}

fn intercept(
    interceptors: &mut [Box<dyn Interceptor>],
    mut node: SyntaxNode,
    point: InterceptionPoint,
    state: &ParsingState,
) -> SyntaxNode {
    for interceptor in interceptors.iter_mut() {
        if interceptor.intercepts(point) {
            node = interceptor.process(node, point, state);
        }
    }
    node
}

fn wrap_nodes(mut nodes: Vec<SyntaxNode>) -> SyntaxNode {
    match nodes.len() {
        0 => SyntaxNode::Text(String::new()),
        1 => nodes.pop().unwrap_or_else(|| SyntaxNode::Text(String::new())),
        _ => SyntaxNode::Root(RootNode::new(nodes)),
    }
}

/// Split `alias:name(args)` into its parts, if the string has that shape
fn helper_call_parts(call: &str) -> Option<(String, String, String)> {
    let call = call.trim();
    if !call.ends_with(')') {
        return None;
    }
    let open = call.find('(')?;
    let head = &call[..open];
    let (alias, name) = head.split_once(':')?;
    if alias.is_empty()
        || name.is_empty()
        || !alias
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':'))
    {
        return None;
    }
    let args = &call[open + 1..call.len() - 1];
    Some((alias.to_string(), name.to_string(), args.to_string()))
}

/// Split at a delimiter, ignoring occurrences inside quotes or any kind of
/// bracket
fn split_top_level(content: &str, delimiter: &str) -> Vec<String> {
    let bytes = content.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' => {
                quote = Some(b);
                i += 1;
            }
            b'(' | b'{' | b'[' => {
                depth += 1;
                i += 1;
            }
            b')' | b'}' | b']' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            _ if depth == 0 && content[i..].starts_with(delimiter) => {
                parts.push(content[start..i].trim().to_string());
                i += delimiter.len();
                start = i;
            }
            _ => i += 1,
        }
    }
    parts.push(content[start..].trim().to_string());
    parts
}

/// Split a `key: value` pair at the first top-level colon
fn split_key_value(pair: &str) -> Option<(String, String)> {
    let bytes = pair.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' => quote = Some(b),
            b'(' | b'{' | b'[' => depth += 1,
            b')' | b'}' | b']' => depth = depth.saturating_sub(1),
            b':' if depth == 0 => {
                let key = unquote(pair[..i].trim());
                let value = pair[i + 1..].trim().to_string();
                if key.is_empty() {
                    return None;
                }
                return Some((key, value));
            }
            _ => {}
        }
    }
    None
}

fn unquote(s: &str) -> String {
    if (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
        || (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}
