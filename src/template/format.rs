//! Template formatting (inverse of parsing).
//!
//! Literals are percent-encoded only where a character would otherwise be read
//! as syntax in that position, so sub-delimiters such as `+`, `,`, `:` and `@`
//! keep their meaning. Query names and values use form encoding: a space is
//! written as `+` and a literal plus sign as `%2B`.
//!
//! Output is canonical: empty path segments are gone, a query parameter with a
//! single empty value is written as its bare name, and the query remainder is
//! always written as `{**}`.

use std::borrow::Cow;

use super::model::{Segment, Span, Template, Value};

/// Where a literal is written. Decides which characters must be escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Scheme,
    Host,
    Port,
    Path,
    QueryName,
    QueryValue,
    Fragment,
    /// Function argument text inside `{$name:...}`.
    Argument,
}

impl Component {
    /// Whether `c` may appear verbatim in a literal at this position.
    fn keeps(self, c: char) -> bool {
        if c.is_ascii_alphanumeric() {
            return true;
        }
        match c {
            '-' | '.' | '_' | '~' | '!' | '$' | '\'' | ',' | ';' | '@' => true,
            '+' => !matches!(self, Component::QueryName | Component::QueryValue | Component::Argument),
            ':' => !matches!(self, Component::Scheme | Component::Host | Component::Port),
            '&' | '=' => !matches!(self, Component::QueryName | Component::QueryValue),
            '/' | '(' | ')' | '*' => self == Component::Argument,
            _ => false,
        }
    }
}

/// Percent-encode the characters of `text` that are syntax at `component`.
pub fn encode(text: &str, component: Component) -> Cow<'_, str> {
    if text.chars().all(|c| component.keeps(c)) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    let mut buf = [0u8; 4];
    let form = matches!(component, Component::QueryName | Component::QueryValue);
    for c in text.chars() {
        if component.keeps(c) {
            out.push(c);
        } else if form && c == ' ' {
            out.push('+');
        } else {
            out.push_str(&urlencoding::encode(c.encode_utf8(&mut buf)));
        }
    }
    Cow::Owned(out)
}

/// Render a template back to its string form.
pub fn format(template: &Template) -> String {
    let mut out = String::new();

    if let Some(scheme) = template.scheme() {
        out.push_str(&format_segment(scheme, Component::Scheme));
        out.push_str("://");
    } else if template.has_authority() {
        out.push_str("//");
    }
    if let Some(host) = template.host() {
        out.push_str(&format_segment(host, Component::Host));
    }
    if let Some(port) = template.port() {
        out.push(':');
        out.push_str(&format_segment(port, Component::Port));
    }

    let path = template.path();
    if template.is_rooted() || template.has_authority() {
        for segment in path {
            out.push('/');
            out.push_str(&format_segment(segment, Component::Path));
        }
        if path.is_empty() && template.is_rooted() && !template.has_authority() {
            out.push('/');
        }
    } else {
        let joined: Vec<String> = path.iter().map(|s| format_segment(s, Component::Path)).collect();
        out.push_str(&joined.join("/"));
    }

    let query = template.query();
    if !query.is_empty() {
        let mut pairs: Vec<String> = Vec::new();
        for param in query.params() {
            let name = encode(&param.name, Component::QueryName);
            for value in &param.values {
                match value.primary() {
                    Value::Literal(text) if text.is_empty() && value.alternatives().len() == 1 => {
                        pairs.push(name.to_string())
                    }
                    _ => pairs.push(format!("{}={}", name, format_segment(value, Component::QueryValue))),
                }
            }
        }
        if query.has_rest() {
            pairs.push("{**}".to_string());
        }
        out.push('?');
        out.push_str(&pairs.join("&"));
    }

    if let Some(fragment) = template.fragment() {
        out.push('#');
        out.push_str(&format_segment(fragment, Component::Fragment));
    }

    out
}

/// Render one segment, bracketing alternatives.
pub fn format_segment(segment: &Segment, component: Component) -> String {
    let alternatives = segment.alternatives();
    if alternatives.len() == 1 {
        return format_value(&alternatives[0], component);
    }
    let inner: Vec<String> = alternatives.iter().map(|v| format_value(v, component)).collect();
    format!("({})", inner.join("|"))
}

/// Render one value.
pub fn format_value(value: &Value, component: Component) -> String {
    match value {
        Value::Literal(text) => encode(text, component).into_owned(),
        Value::Wildcard(Span::One) => "*".to_string(),
        Value::Wildcard(Span::Many) => "**".to_string(),
        Value::Capture { name, span } => match (name.as_str(), span) {
            ("*" | "**", _) | (_, Span::One) => format!("{{{}}}", name),
            (_, Span::Many) => format!("{{{}}}**", name),
        },
        Value::Function(function) => {
            if function.arg.is_empty() {
                format!("{{${}}}", function.name)
            } else {
                let arg: String = function
                    .arg
                    .iter()
                    .map(|v| format_value(v, Component::Argument))
                    .collect();
                format!("{{${}:{}}}", function.name, arg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{parse, parse_url};

    #[test]
    fn test_sub_delimiters_are_kept_verbatim() {
        let input = "/a+b/c,d/e:f/g@h?q=a+b&x=1,2&t=10:30&m=u@h";
        let parsed = parse_url(input).unwrap();
        assert_eq!(format(&parsed), input);
        assert_eq!(parse_url(&format(&parsed)).unwrap(), parsed);
    }

    #[test]
    fn test_syntax_characters_are_escaped_per_position() {
        let t = Template::builder()
            .rooted(true)
            .segment(Segment::literal("a/b(c)*"))
            .query_value("k&=", Segment::literal("v&w=x#"))
            .build();
        let out = format(&t);
        assert_eq!(out, "/a%2Fb%28c%29%2A?k%26%3D=v%26w%3Dx%23");
        assert_eq!(parse(&out).unwrap(), t);
    }

    #[test]
    fn test_query_plus_and_encoded_plus_stay_distinct() {
        let t = parse_url("/p+q?a=x+y&b=x%2By&c=x%20y").unwrap();
        assert_eq!(t.path()[0].text(), "p+q");
        assert_eq!(t.query().get("a").unwrap().values[0].text(), "x y");
        assert_eq!(t.query().get("b").unwrap().values[0].text(), "x+y");
        assert_eq!(format(&t), "/p+q?a=x+y&b=x%2By&c=x+y");
    }

    #[test]
    fn test_host_colon_is_escaped() {
        assert_eq!(encode("a:b", Component::Host), "a%3Ab");
        assert_eq!(encode("a:b", Component::Path), "a:b");
    }

    #[test]
    fn test_argument_keeps_slashes() {
        let t = parse("{$serviceurl:a/b}/x").unwrap();
        assert_eq!(format(&t), "{$serviceurl:a/b}/x");
    }

    #[test]
    fn test_non_ascii_is_encoded() {
        assert_eq!(encode("caf\u{e9} x", Component::Path), "caf%C3%A9%20x");
    }
}
