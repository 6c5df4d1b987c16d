//! Template matching.
//!
//! # Responsibilities
//! - Match scheme, host, port and fragment (absent pattern = wildcard)
//! - Match path segments with `*`, `**` and captures
//! - Match query parameters independently of their order
//! - Record captures into the context only when the whole match succeeds
//!
//! # Design Decisions
//! - Scheme, host and fragment are case-insensitive; path, port and query are not
//! - At most one `**` per sequence, so the span it consumes is fixed by the
//!   lengths of the literal prefix and suffix: no search, O(n) matching
//! - Alternatives are tried in declared order and the first match commits
//! - Extra candidate query parameters are ignored

use std::borrow::Cow;

use crate::rewrite::context::{QueryPairs, RewriteContext};
use crate::template::{Segment, Template, Value, GLOB_BINDING};
use crate::template::model::Query;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Case {
    Sensitive,
    Insensitive,
}

/// Bindings collected during one match attempt.
#[derive(Debug, Default)]
struct Scratch {
    bindings: Vec<(String, Vec<String>)>,
    query_rest: Option<QueryPairs>,
}

impl Scratch {
    fn bind(&mut self, name: &str, values: Vec<String>) {
        if !self.bindings.iter().any(|(bound, _)| bound == name) {
            self.bindings.push((name.to_string(), values));
        }
    }

    fn commit(self, ctx: &mut RewriteContext) {
        for (name, values) in self.bindings {
            ctx.bind(name, values);
        }
        if let Some(rest) = self.query_rest {
            ctx.bind_query_rest(rest);
        }
    }
}

/// Match `candidate` against `pattern`.
///
/// On success every capture in the pattern is bound in `ctx` (names that are
/// already bound keep their value). On failure `ctx` is left untouched.
pub fn matches(candidate: &Template, pattern: &Template, ctx: &mut RewriteContext) -> bool {
    let mut scratch = Scratch::default();
    let path: Vec<Cow<'_, str>> = candidate.path().iter().map(Segment::text).collect();

    let matched = match_component(candidate.scheme(), pattern.scheme(), Case::Insensitive, &mut scratch)
        && match_component(candidate.host(), pattern.host(), Case::Insensitive, &mut scratch)
        && match_component(candidate.port(), pattern.port(), Case::Sensitive, &mut scratch)
        && match_sequence(&path, pattern.path(), Some(GLOB_BINDING), &mut scratch)
        && match_query(candidate.query(), pattern.query(), &mut scratch)
        && match_component(candidate.fragment(), pattern.fragment(), Case::Insensitive, &mut scratch);

    if matched {
        scratch.commit(ctx);
    }
    matched
}

fn match_value(pattern: &Value, candidate: &str, case: Case, scratch: &mut Scratch) -> bool {
    match pattern {
        Value::Literal(literal) => match case {
            Case::Sensitive => literal == candidate,
            Case::Insensitive => literal.eq_ignore_ascii_case(candidate),
        },
        Value::Wildcard(_) => true,
        Value::Capture { name, .. } => {
            scratch.bind(name, vec![candidate.to_string()]);
            true
        }
        // Rule compilation rejects functions in patterns.
        Value::Function(_) => false,
    }
}

fn match_segment(pattern: &Segment, candidate: &str, case: Case, scratch: &mut Scratch) -> bool {
    pattern
        .alternatives()
        .iter()
        .any(|alternative| match_value(alternative, candidate, case, scratch))
}

/// Single-valued component. A wildcard or capture also matches an absent
/// candidate component; a capture then binds no values.
fn match_component(
    candidate: Option<&Segment>,
    pattern: Option<&Segment>,
    case: Case,
    scratch: &mut Scratch,
) -> bool {
    match (pattern, candidate) {
        (None, _) => true,
        (Some(pattern), Some(candidate)) => match_segment(pattern, &candidate.text(), case, scratch),
        (Some(pattern), None) => pattern.alternatives().iter().any(|alternative| match alternative {
            Value::Wildcard(_) => true,
            Value::Capture { name, .. } => {
                scratch.bind(name, Vec::new());
                true
            }
            _ => false,
        }),
    }
}

/// Match an ordered sequence (path segments or one parameter's values).
///
/// With a `**` at index `g`, the first `g` candidates must match the prefix
/// and the last `suffix.len()` candidates must match the suffix; the glob
/// takes everything in between. This is the greedy choice that still lets
/// the fixed suffix match, and it is the only one.
fn match_sequence(
    candidates: &[Cow<'_, str>],
    patterns: &[Segment],
    anonymous_glob: Option<&str>,
    scratch: &mut Scratch,
) -> bool {
    let Some(glob) = patterns.iter().position(Segment::is_span) else {
        return candidates.len() == patterns.len()
            && patterns
                .iter()
                .zip(candidates)
                .all(|(p, c)| match_segment(p, c, Case::Sensitive, scratch));
    };

    let suffix = &patterns[glob + 1..];
    if candidates.len() < glob + suffix.len() {
        return false;
    }
    let tail = candidates.len() - suffix.len();

    let fixed = patterns[..glob]
        .iter()
        .zip(&candidates[..glob])
        .chain(suffix.iter().zip(&candidates[tail..]))
        .all(|(p, c)| match_segment(p, c, Case::Sensitive, scratch));
    if !fixed {
        return false;
    }

    let span: Vec<String> = candidates[glob..tail].iter().map(|c| c.to_string()).collect();
    match patterns[glob].primary() {
        Value::Capture { name, .. } => scratch.bind(name, span),
        Value::Wildcard(_) => {
            if let Some(name) = anonymous_glob {
                scratch.bind(name, span);
            }
        }
        _ => {}
    }
    true
}

fn match_query(candidate: &Query, pattern: &Query, scratch: &mut Scratch) -> bool {
    for param in pattern.params() {
        match candidate.get(&param.name) {
            Some(found) => {
                let values: Vec<Cow<'_, str>> = found.values.iter().map(Segment::text).collect();
                if !match_sequence(&values, &param.values, None, scratch) {
                    return false;
                }
            }
            None => {
                // Only a lone `**` / `{x}**` makes a parameter optional.
                let [only] = param.values.as_slice() else {
                    return false;
                };
                if !only.is_span() {
                    return false;
                }
                if let Some(name) = only.primary().capture_name() {
                    scratch.bind(name, Vec::new());
                }
            }
        }
    }

    if pattern.has_rest() {
        let rest = candidate
            .params()
            .iter()
            .filter(|p| pattern.get(&p.name).is_none())
            .map(|p| {
                let values = p.values.iter().map(|v| v.text().into_owned()).collect();
                (p.name.clone(), values)
            })
            .collect();
        scratch.query_rest = Some(rest);
    }
    true
}
