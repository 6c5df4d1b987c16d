//! Structured, immutable representation of a URL-like string.
//!
//! # Responsibilities
//! - Hold scheme, authority, path, query and fragment as ordered alternatives
//! - Provide read-only accessors for matching and rewriting
//! - Provide a builder used by the parser and the rewriter
//!
//! # Design Decisions
//! - No setters: a built `Template` is never mutated
//! - Query key order is not significant for equality; value order is
//! - Every component holds `Segment`s so alternation works everywhere

use std::borrow::Cow;
use std::fmt;

/// How many path segments (or query values) a wildcard or capture covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Span {
    /// Exactly one segment or value (`*`, `{name}`).
    One,
    /// Zero or more segments or values (`**`, `{name}**`).
    Many,
}

/// Name under which an anonymous path `**` records what it consumed.
pub const GLOB_BINDING: &str = "**";

/// A single value inside a template component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Literal text, already percent-decoded.
    Literal(String),
    /// Anonymous wildcard.
    Wildcard(Span),
    /// Named capture. In a pattern it binds; in a rewrite target it is a reference.
    Capture { name: String, span: Span },
    /// Embedded function reference, `{$name:arg}`.
    Function(FunctionRef),
}

impl Value {
    /// Returns true for `**` and `{name}**`.
    pub fn is_span(&self) -> bool {
        matches!(
            self,
            Value::Wildcard(Span::Many) | Value::Capture { span: Span::Many, .. }
        )
    }

    /// Name of the capture, if this value is one.
    pub fn capture_name(&self) -> Option<&str> {
        match self {
            Value::Capture { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Literal text, if this value is a literal.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Value::Literal(text) => Some(text),
            _ => None,
        }
    }
}

/// Function reference embedded in a rewrite target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRef {
    /// Registered function name.
    pub name: String,
    /// Argument pieces: literal text, captures and nested function references,
    /// concatenated after expansion.
    pub arg: Vec<Value>,
}

/// One path segment, query value, or single-valued component.
///
/// Holds at least one alternative; bracket alternation `(a|b)` yields more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    alternatives: Vec<Value>,
}

impl Segment {
    /// Build a segment from its alternatives. An empty list becomes an empty literal.
    pub fn new(alternatives: Vec<Value>) -> Self {
        if alternatives.is_empty() {
            return Self::literal("");
        }
        Self { alternatives }
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            alternatives: vec![Value::Literal(text.into())],
        }
    }

    pub fn alternatives(&self) -> &[Value] {
        &self.alternatives
    }

    /// The first declared alternative.
    pub fn primary(&self) -> &Value {
        &self.alternatives[0]
    }

    pub fn is_span(&self) -> bool {
        self.primary().is_span()
    }

    /// Concrete text of this segment when it is used as a match candidate.
    ///
    /// Literals yield their decoded text; anything else yields its template syntax.
    pub fn text(&self) -> Cow<'_, str> {
        match self.primary() {
            Value::Literal(text) => Cow::Borrowed(text),
            _ => Cow::Owned(super::format::format_segment(self, super::format::Component::Path)),
        }
    }
}

/// A query parameter with its ordered values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    pub name: String,
    pub values: Vec<Segment>,
}

/// Query component of a template.
#[derive(Debug, Clone, Default)]
pub struct Query {
    params: Vec<QueryParam>,
    rest: bool,
}

impl Query {
    pub fn params(&self) -> &[QueryParam] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&QueryParam> {
        self.params.iter().find(|p| p.name == name)
    }

    /// True when the query carries the `{**}` remainder token.
    pub fn has_rest(&self) -> bool {
        self.rest
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && !self.rest
    }

    fn push(&mut self, name: String, value: Segment) {
        match self.params.iter_mut().find(|p| p.name == name) {
            Some(param) => param.values.push(value),
            None => self.params.push(QueryParam {
                name,
                values: vec![value],
            }),
        }
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.rest == other.rest
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .all(|p| other.get(&p.name).is_some_and(|o| o.values == p.values))
    }
}

impl Eq for Query {}

/// Immutable structured URL template.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    scheme: Option<Segment>,
    host: Option<Segment>,
    port: Option<Segment>,
    rooted: bool,
    path: Vec<Segment>,
    query: Query,
    fragment: Option<Segment>,
}

impl Template {
    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::default()
    }

    pub fn scheme(&self) -> Option<&Segment> {
        self.scheme.as_ref()
    }

    pub fn host(&self) -> Option<&Segment> {
        self.host.as_ref()
    }

    pub fn port(&self) -> Option<&Segment> {
        self.port.as_ref()
    }

    pub fn has_authority(&self) -> bool {
        self.host.is_some() || self.port.is_some()
    }

    /// True when the path starts at `/`.
    pub fn is_rooted(&self) -> bool {
        self.rooted
    }

    pub fn path(&self) -> &[Segment] {
        &self.path
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn fragment(&self) -> Option<&Segment> {
        self.fragment.as_ref()
    }

    /// Literal value of the scheme's first alternative.
    pub fn primary_scheme(&self) -> Option<&str> {
        self.scheme.as_ref().and_then(|s| s.primary().as_literal())
    }

    /// Every alternative of every component, in template order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        let head = [&self.scheme, &self.host, &self.port]
            .into_iter()
            .flatten()
            .chain(self.path.iter())
            .chain(self.query.params.iter().flat_map(|p| p.values.iter()))
            .chain(self.fragment.iter());
        head.flat_map(|segment| segment.alternatives.iter())
    }

    /// True when the path holds an anonymous `**`, which binds [`GLOB_BINDING`].
    pub fn has_path_glob(&self) -> bool {
        self.path
            .iter()
            .any(|s| matches!(s.primary(), Value::Wildcard(Span::Many)))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::format::format(self))
    }
}

impl std::str::FromStr for Template {
    type Err = super::TemplateSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        super::parser::parse(s)
    }
}

/// Incremental constructor for [`Template`].
#[derive(Debug, Default)]
pub struct TemplateBuilder {
    template: Template,
}

impl TemplateBuilder {
    pub fn scheme(&mut self, scheme: Segment) -> &mut Self {
        self.template.scheme = Some(scheme);
        self
    }

    pub fn host(&mut self, host: Segment) -> &mut Self {
        self.template.host = Some(host);
        self
    }

    pub fn port(&mut self, port: Segment) -> &mut Self {
        self.template.port = Some(port);
        self
    }

    pub fn rooted(&mut self, rooted: bool) -> &mut Self {
        self.template.rooted = rooted;
        self
    }

    pub fn segment(&mut self, segment: Segment) -> &mut Self {
        self.template.path.push(segment);
        self
    }

    /// Append a value to a query parameter, creating the parameter if needed.
    pub fn query_value(&mut self, name: impl Into<String>, value: Segment) -> &mut Self {
        self.template.query.push(name.into(), value);
        self
    }

    pub fn query_rest(&mut self) -> &mut Self {
        self.template.query.rest = true;
        self
    }

    pub fn fragment(&mut self, fragment: Segment) -> &mut Self {
        self.template.fragment = Some(fragment);
        self
    }

    pub fn build(&mut self) -> Template {
        std::mem::take(&mut self.template)
    }
}
