//! Template rewriting.
//!
//! # Responsibilities
//! - Substitute capture references with their bound values
//! - Resolve function references through the registry, innermost first
//! - Splice URL-valued function results at the head of relative targets
//!
//! # Design Decisions
//! - Output is always a fresh template of literals
//! - A `**` capture expands to as many path segments (or query values) as it bound
//! - Function results placed in the path are split on `/`; capture values are not

use crate::functions::FunctionRegistry;
use crate::rewrite::context::{RewriteContext, UnboundCapturePolicy};
use crate::rewrite::error::RewriteError;
use crate::template::{self, FunctionRef, Segment, Span, Template, TemplateBuilder, Value, GLOB_BINDING};

/// Pseudo-name reported when a target's `{**}` query token has nothing bound.
pub const QUERY_REST_BINDING: &str = "?**";

/// Expands rewrite targets against a context.
#[derive(Debug, Clone, Copy)]
pub struct Rewriter<'a> {
    functions: &'a FunctionRegistry,
}

impl<'a> Rewriter<'a> {
    pub fn new(functions: &'a FunctionRegistry) -> Self {
        Self { functions }
    }

    /// Build the template described by `target` from the bindings in `ctx`.
    pub fn rewrite(&self, target: &Template, ctx: &mut RewriteContext) -> Result<Template, RewriteError> {
        let mut builder = Template::builder();

        if let Some(scheme) = self.single(target.scheme(), ctx)? {
            builder.scheme(Segment::literal(scheme));
        }
        if let Some(host) = self.single(target.host(), ctx)? {
            builder.host(Segment::literal(host));
        }
        if let Some(port) = self.single(target.port(), ctx)? {
            builder.port(Segment::literal(port));
        }

        let mut rooted = target.is_rooted();
        let mut remaining = target.path();
        if target.scheme().is_none() && !target.has_authority() {
            if let Some((first, rest)) = remaining.split_first() {
                if let Value::Function(function) = first.primary() {
                    let value = self.call(function, ctx)?;
                    remaining = rest;
                    match absolute(&value)? {
                        Some(base) => {
                            splice(&mut builder, &base);
                            rooted = true;
                        }
                        None => push_split(&mut builder, &value),
                    }
                }
            }
        }
        builder.rooted(rooted);

        for segment in remaining {
            match segment.primary() {
                Value::Function(function) => {
                    let value = self.call(function, ctx)?;
                    push_split(&mut builder, &value);
                }
                value => {
                    for text in self.expand(value, ctx)? {
                        if !text.is_empty() {
                            builder.segment(Segment::literal(text));
                        }
                    }
                }
            }
        }

        for param in target.query().params() {
            for value in &param.values {
                for text in self.expand(value.primary(), ctx)? {
                    builder.query_value(param.name.clone(), Segment::literal(text));
                }
            }
        }
        if target.query().has_rest() {
            match ctx.query_rest() {
                Some(rest) => {
                    for (name, values) in rest {
                        for value in values {
                            builder.query_value(name.clone(), Segment::literal(value.clone()));
                        }
                    }
                }
                None if ctx.policy() == UnboundCapturePolicy::Fail => {
                    return Err(RewriteError::UnboundCapture(QUERY_REST_BINDING.to_string()));
                }
                None => {}
            }
        }

        if let Some(fragment) = self.single(target.fragment(), ctx)? {
            builder.fragment(Segment::literal(fragment));
        }

        Ok(builder.build())
    }

    /// Expand argument pieces into one string.
    pub fn expand_text(&self, pieces: &[Value], ctx: &mut RewriteContext) -> Result<String, RewriteError> {
        let mut out = String::new();
        for piece in pieces {
            out.push_str(&self.expand(piece, ctx)?.join("/"));
        }
        Ok(out)
    }

    fn single(&self, segment: Option<&Segment>, ctx: &mut RewriteContext) -> Result<Option<String>, RewriteError> {
        let Some(segment) = segment else {
            return Ok(None);
        };
        let values = self.expand(segment.primary(), ctx)?;
        Ok((!values.is_empty()).then(|| values.join("/")))
    }

    fn expand(&self, value: &Value, ctx: &mut RewriteContext) -> Result<Vec<String>, RewriteError> {
        match value {
            Value::Literal(text) => Ok(vec![text.clone()]),
            Value::Wildcard(Span::One) => lookup("*", ctx),
            Value::Wildcard(Span::Many) => lookup(GLOB_BINDING, ctx),
            Value::Capture { name, .. } => lookup(name, ctx),
            Value::Function(function) => Ok(vec![self.call(function, ctx)?]),
        }
    }

    fn call(&self, function: &FunctionRef, ctx: &mut RewriteContext) -> Result<String, RewriteError> {
        let arg = self.expand_text(&function.arg, ctx)?;
        self.functions.resolve(&function.name, &arg, ctx)
    }
}

fn lookup(name: &str, ctx: &RewriteContext) -> Result<Vec<String>, RewriteError> {
    match (ctx.binding(name), ctx.policy()) {
        (Some(values), _) => Ok(values.to_vec()),
        (None, UnboundCapturePolicy::Fail) => Err(RewriteError::UnboundCapture(name.to_string())),
        (None, UnboundCapturePolicy::Empty) => Ok(Vec::new()),
    }
}

/// Parse a function result as an absolute URL, if it looks like one.
fn absolute(value: &str) -> Result<Option<Template>, RewriteError> {
    if !value.contains("://") {
        return Ok(None);
    }
    let parsed = template::parse_url(value)?;
    Ok((parsed.scheme().is_some() && parsed.has_authority()).then_some(parsed))
}

/// Copy scheme, authority and path of `base` into the output.
fn splice(builder: &mut TemplateBuilder, base: &Template) {
    if let Some(scheme) = base.scheme() {
        builder.scheme(scheme.clone());
    }
    if let Some(host) = base.host() {
        builder.host(host.clone());
    }
    if let Some(port) = base.port() {
        builder.port(port.clone());
    }
    for segment in base.path() {
        builder.segment(segment.clone());
    }
}

fn push_split(builder: &mut TemplateBuilder, value: &str) {
    for part in value.split('/').filter(|part| !part.is_empty()) {
        builder.segment(Segment::literal(part));
    }
}
