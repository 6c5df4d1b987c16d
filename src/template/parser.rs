//! Template parsing.
//!
//! # Grammar (informal)
//! ```text
//! template  = [scheme "://" | "//"] [host [":" port]] path ["?" query] ["#" fragment]
//! path      = *("/" segment)
//! query     = param *("&" param)
//! param     = name ["=" segment] | "**" | "{**}"
//! segment   = value | "(" value *("|" value) ")"
//! value     = literal | "*" | "**" | "{" name "}" ["*" | "**"] | "{$" fn [":" arg] "}"
//! ```
//!
//! In the query, `+` stands for a space (form encoding) and `%2B` for a plus
//! sign, so both survive formatting with their meaning intact.
//!
//! Separators inside `{...}` and `(...)` are not structural, so function
//! arguments may contain `:` and `/` and alternatives may contain `/`.
//!
//! Concrete URLs go through [`parse_url`] instead: the same component split,
//! but every character is literal text, so `(`, `{` and `**` in a request
//! path are data rather than syntax.

use super::error::TemplateSyntaxError;
use super::model::{FunctionRef, Segment, Span, Template, TemplateBuilder, Value};

/// Parse a template string.
pub fn parse(raw: &str) -> Result<Template, TemplateSyntaxError> {
    Parser { input: raw }.template()
}

/// Parse a concrete URL. No wildcards, captures, groups or functions are
/// recognised; only percent-encoding can make it fail.
pub fn parse_url(raw: &str) -> Result<Template, TemplateSyntaxError> {
    Parser { input: raw }.url()
}

/// Parse a free-standing function argument: literal text mixed with
/// captures and function references.
pub fn parse_argument(raw: &str) -> Result<Vec<Value>, TemplateSyntaxError> {
    let parser = Parser { input: raw };
    parser.check_balance()?;
    parser.pieces(raw, 0)
}

struct Parser<'a> {
    input: &'a str,
}

impl<'a> Parser<'a> {
    fn error(&self, offset: usize, reason: impl Into<String>) -> TemplateSyntaxError {
        TemplateSyntaxError::new(self.input, offset, reason)
    }

    fn template(&self) -> Result<Template, TemplateSyntaxError> {
        self.check_balance()?;
        let mut builder = Template::builder();

        let (rest, fragment) = match find_top(self.input, '#') {
            Some(i) => (&self.input[..i], Some((i + 1, &self.input[i + 1..]))),
            None => (self.input, None),
        };
        let (mut hier, query) = match find_top(rest, '?') {
            Some(i) => (&rest[..i], Some((i + 1, &rest[i + 1..]))),
            None => (rest, None),
        };

        let mut offset = 0;
        if let Some(end) = scheme_end(hier) {
            if end == 0 {
                return Err(self.error(0, "empty scheme"));
            }
            builder.scheme(self.segment(&hier[..end], 0, false)?);
            offset = end + 1;
            hier = &hier[end + 1..];
        }

        let has_authority = hier.starts_with("//");
        if has_authority {
            let start = offset + 2;
            let after = &hier[2..];
            let end = find_top(after, '/').unwrap_or(after.len());
            self.authority(&after[..end], start, &mut builder)?;
            offset = start + end;
            hier = &after[end..];
        }

        builder.rooted(has_authority || hier.starts_with('/'));
        let mut spans = 0;
        for (at, piece) in split_top(hier, offset, '/') {
            if piece.is_empty() {
                continue;
            }
            let segment = self.segment(piece, at, true)?;
            if segment.is_span() {
                spans += 1;
                if spans > 1 {
                    return Err(self.error(at, "only one `**` is allowed per path"));
                }
            }
            builder.segment(segment);
        }

        if let Some((start, query)) = query {
            self.query(query, start, &mut builder)?;
        }

        if let Some((start, fragment)) = fragment {
            if !fragment.is_empty() {
                builder.fragment(self.segment(fragment, start, false)?);
            }
        }

        Ok(builder.build())
    }

    fn url(&self) -> Result<Template, TemplateSyntaxError> {
        let mut builder = Template::builder();
        let input = self.input;

        let (rest, fragment) = match input.find('#') {
            Some(i) => (&input[..i], Some((i + 1, &input[i + 1..]))),
            None => (input, None),
        };
        let (mut hier, query) = match rest.find('?') {
            Some(i) => (&rest[..i], Some((i + 1, &rest[i + 1..]))),
            None => (rest, None),
        };

        let mut offset = 0;
        let colon = hier.find(':');
        let slash = hier.find('/').unwrap_or(hier.len());
        if let Some(end) = colon.filter(|&c| c < slash && hier[c..].starts_with("://")) {
            if end == 0 {
                return Err(self.error(0, "empty scheme"));
            }
            builder.scheme(Segment::literal(self.decode(&hier[..end], 0)?));
            offset = end + 1;
            hier = &hier[end + 1..];
        }

        let has_authority = hier.starts_with("//");
        if has_authority {
            let start = offset + 2;
            let after = &hier[2..];
            let end = after.find('/').unwrap_or(after.len());
            let authority = &after[..end];
            let (host, port) = match authority.rfind(':') {
                Some(i) => (&authority[..i], Some((start + i + 1, &authority[i + 1..]))),
                None => (authority, None),
            };
            if !host.is_empty() {
                builder.host(Segment::literal(self.decode(host, start)?));
            }
            if let Some((at, port)) = port.filter(|(_, port)| !port.is_empty()) {
                builder.port(Segment::literal(self.decode(port, at)?));
            }
            offset = start + end;
            hier = &after[end..];
        }

        builder.rooted(has_authority || hier.starts_with('/'));
        for (at, piece) in split_plain(hier, offset, '/') {
            if !piece.is_empty() {
                builder.segment(Segment::literal(self.decode(piece, at)?));
            }
        }

        if let Some((start, query)) = query {
            for (at, pair) in split_plain(query, start, '&') {
                if pair.is_empty() {
                    continue;
                }
                let pair = pair.replace('+', " ");
                let (name, value) = match pair.find('=') {
                    Some(i) => (&pair[..i], self.decode(&pair[i + 1..], at + i + 1)?),
                    None => (pair.as_str(), String::new()),
                };
                builder.query_value(self.decode(name, at)?, Segment::literal(value));
            }
        }

        if let Some((start, fragment)) = fragment.filter(|(_, f)| !f.is_empty()) {
            builder.fragment(Segment::literal(self.decode(fragment, start)?));
        }

        Ok(builder.build())
    }

    fn authority(
        &self,
        text: &str,
        base: usize,
        builder: &mut TemplateBuilder,
    ) -> Result<(), TemplateSyntaxError> {
        let (host, port) = match top_level(text, ':').last() {
            Some(&i) => (&text[..i], Some((base + i + 1, &text[i + 1..]))),
            None => (text, None),
        };
        if !host.is_empty() {
            builder.host(self.segment(host, base, false)?);
        }
        if let Some((at, port)) = port {
            if !port.is_empty() {
                builder.port(self.segment(port, at, false)?);
            }
        }
        Ok(())
    }

    fn query(
        &self,
        text: &str,
        base: usize,
        builder: &mut TemplateBuilder,
    ) -> Result<(), TemplateSyntaxError> {
        let mut spans: Vec<String> = Vec::new();
        for (at, pair) in split_top(text, base, '&') {
            if pair.is_empty() {
                continue;
            }
            if pair == "**" || pair == "{**}" {
                builder.query_rest();
                continue;
            }
            let (name, value) = match find_top(pair, '=') {
                Some(i) => (&pair[..i], Some((at + i + 1, &pair[i + 1..]))),
                None => (pair, None),
            };
            if name.is_empty() {
                return Err(self.error(at, "empty query parameter name"));
            }
            if let Some(i) = name.find(['{', '}', '(', ')']) {
                return Err(self.error(at + i, "query parameter names must be literal"));
            }
            let name = self.decode(&name.replace('+', " "), at)?;
            let value = match value {
                Some((vat, value)) => {
                    let segment = self.segment(&value.replace('+', " "), vat, true)?;
                    if segment.is_span() {
                        if spans.contains(&name) {
                            return Err(self.error(vat, "only one `**` is allowed per query parameter"));
                        }
                        spans.push(name.clone());
                    }
                    segment
                }
                None => Segment::literal(""),
            };
            builder.query_value(name, value);
        }
        Ok(())
    }

    fn segment(&self, text: &str, base: usize, allow_span: bool) -> Result<Segment, TemplateSyntaxError> {
        let alternatives = if is_group(text) {
            let inner = &text[1..text.len() - 1];
            let mut alternatives: Vec<Value> = Vec::new();
            for (at, alternative) in split_top(inner, base + 1, '|') {
                if alternative.is_empty() {
                    return Err(self.error(at, "empty alternative"));
                }
                let value = self.value(alternative, at)?;
                if value.is_span() {
                    return Err(self.error(at, "`**` cannot be an alternative"));
                }
                if let Some(name) = value.capture_name() {
                    if alternatives.iter().any(|a| a.capture_name() == Some(name)) {
                        return Err(self.error(at, format!("capture `{}` is bound twice in one group", name)));
                    }
                }
                alternatives.push(value);
            }
            alternatives
        } else {
            vec![self.value(text, base)?]
        };

        if !allow_span && alternatives[0].is_span() {
            return Err(self.error(base, "`**` is only allowed in the path or query"));
        }
        Ok(Segment::new(alternatives))
    }

    fn value(&self, text: &str, base: usize) -> Result<Value, TemplateSyntaxError> {
        match text {
            "*" => return Ok(Value::Wildcard(Span::One)),
            "**" => return Ok(Value::Wildcard(Span::Many)),
            _ => {}
        }

        if text.starts_with('{') {
            let close = self.matching_brace(text, base)?;
            let inner = &text[1..close];
            let suffix = &text[close + 1..];
            if let Some(call) = inner.strip_prefix('$') {
                if !suffix.is_empty() {
                    return Err(self.error(base + close + 1, "function reference must occupy a whole value"));
                }
                return self.function(call, base + 2).map(Value::Function);
            }
            let span = match suffix {
                "" | "*" => Span::One,
                "**" => Span::Many,
                _ => return Err(self.error(base + close + 1, "unexpected text after capture")),
            };
            return match inner {
                "*" | "**" if !suffix.is_empty() => {
                    Err(self.error(base + close + 1, "unexpected text after capture"))
                }
                "*" => Ok(Value::Capture { name: "*".into(), span: Span::One }),
                "**" => Ok(Value::Capture { name: "**".into(), span: Span::Many }),
                name => {
                    self.check_name(name, base + 1, "capture")?;
                    Ok(Value::Capture { name: name.to_string(), span })
                }
            };
        }

        if let Some(i) = text.find("**") {
            return Err(self.error(base + i, "`**` must occupy a whole segment"));
        }
        if let Some(i) = text.find(['{', '}']) {
            return Err(self.error(base + i, "capture must occupy a whole value"));
        }
        if let Some(i) = text.find(['(', ')']) {
            return Err(self.error(base + i, "alternation group must occupy a whole value"));
        }
        Ok(Value::Literal(self.decode(text, base)?))
    }

    fn function(&self, call: &str, base: usize) -> Result<FunctionRef, TemplateSyntaxError> {
        let (name, arg) = match find_top(call, ':') {
            Some(i) => (&call[..i], Some((base + i + 1, &call[i + 1..]))),
            None => (call, None),
        };
        self.check_name(name, base, "function")?;
        let arg = match arg {
            Some((at, arg)) => self.pieces(arg, at)?,
            None => Vec::new(),
        };
        Ok(FunctionRef {
            name: name.to_string(),
            arg,
        })
    }

    /// Split argument text into literal pieces and `{...}` references.
    fn pieces(&self, text: &str, base: usize) -> Result<Vec<Value>, TemplateSyntaxError> {
        let mut pieces = Vec::new();
        let mut rest = text;
        let mut at = base;
        while !rest.is_empty() {
            match rest.find('{') {
                Some(0) => {
                    let close = self.matching_brace(rest, at)?;
                    pieces.push(self.value(&rest[..=close], at)?);
                    rest = &rest[close + 1..];
                    at += close + 1;
                }
                Some(i) => {
                    pieces.push(Value::Literal(self.decode(&rest[..i], at)?));
                    rest = &rest[i..];
                    at += i;
                }
                None => {
                    pieces.push(Value::Literal(self.decode(rest, at)?));
                    break;
                }
            }
        }
        Ok(pieces)
    }

    fn check_name(&self, name: &str, at: usize, what: &str) -> Result<(), TemplateSyntaxError> {
        if name.is_empty() {
            return Err(self.error(at, format!("empty {} name", what)));
        }
        if let Some(i) = name.find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))) {
            return Err(self.error(at + i, format!("invalid character in {} name", what)));
        }
        Ok(())
    }

    fn matching_brace(&self, text: &str, base: usize) -> Result<usize, TemplateSyntaxError> {
        let mut depth = 0usize;
        for (i, c) in text.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(i);
                    }
                }
                _ => {}
            }
        }
        Err(self.error(base, "unbalanced `{`"))
    }

    /// Validate `%XX` escapes, then decode.
    fn decode(&self, text: &str, base: usize) -> Result<String, TemplateSyntaxError> {
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' {
                let valid = bytes
                    .get(i + 1..i + 3)
                    .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
                if !valid {
                    return Err(self.error(base + i, "malformed percent-encoding"));
                }
                i += 3;
            } else {
                i += 1;
            }
        }
        urlencoding::decode(text)
            .map(|decoded| decoded.into_owned())
            .map_err(|_| self.error(base, "percent-encoding is not valid UTF-8"))
    }

    fn check_balance(&self) -> Result<(), TemplateSyntaxError> {
        let mut braces: Vec<usize> = Vec::new();
        let mut group: Option<usize> = None;
        for (i, c) in self.input.char_indices() {
            match c {
                '{' => braces.push(i),
                '}' => {
                    if braces.pop().is_none() {
                        return Err(self.error(i, "unbalanced `}`"));
                    }
                }
                '(' if braces.is_empty() => {
                    if group.is_some() {
                        return Err(self.error(i, "nested alternation"));
                    }
                    group = Some(i);
                }
                ')' if braces.is_empty() => {
                    if group.take().is_none() {
                        return Err(self.error(i, "unbalanced `)`"));
                    }
                }
                _ => {}
            }
        }
        if let Some(i) = braces.pop() {
            return Err(self.error(i, "unbalanced `{`"));
        }
        if let Some(i) = group {
            return Err(self.error(i, "unbalanced `(`"));
        }
        Ok(())
    }
}

/// Position of the `:` that starts `://`, when it precedes any `/`.
fn scheme_end(text: &str) -> Option<usize> {
    let colon = find_top(text, ':')?;
    let slash = find_top(text, '/').unwrap_or(text.len());
    (colon < slash && text[colon..].starts_with("://")).then_some(colon)
}

/// True when the whole text is one `( ... )` group.
fn is_group(text: &str) -> bool {
    if !(text.starts_with('(') && text.ends_with(')')) || text.len() < 2 {
        return false;
    }
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ')' if depth == 0 => return i == text.len() - 1,
            _ => {}
        }
    }
    false
}

/// Byte offsets of `needle` outside braces and groups.
fn top_level(text: &str, needle: char) -> Vec<usize> {
    let mut braces = 0usize;
    let mut groups = 0usize;
    let mut hits = Vec::new();
    for (i, c) in text.char_indices() {
        match c {
            '{' => braces += 1,
            '}' => braces = braces.saturating_sub(1),
            '(' if braces == 0 => groups += 1,
            ')' if braces == 0 => groups = groups.saturating_sub(1),
            c if c == needle && braces == 0 && groups == 0 => hits.push(i),
            _ => {}
        }
    }
    hits
}

fn find_top(text: &str, needle: char) -> Option<usize> {
    top_level(text, needle).first().copied()
}

/// Split on every `sep`, pairing each piece with its absolute offset.
fn split_plain(text: &str, base: usize, sep: char) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (i, _) in text.match_indices(sep) {
        pieces.push((base + start, &text[start..i]));
        start = i + sep.len_utf8();
    }
    pieces.push((base + start, &text[start..]));
    pieces
}

/// Split on top-level `sep`, pairing each piece with its absolute offset.
fn split_top(text: &str, base: usize, sep: char) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for i in top_level(text, sep) {
        pieces.push((base + start, &text[start..i]));
        start = i + sep.len_utf8();
    }
    pieces.push((base + start, &text[start..]));
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::format;
    use rstest::rstest;

    #[test]
    fn test_parse_absolute_url() {
        let t = parse("http://node1:50070/webhdfs/v1?op=LISTSTATUS#top").unwrap();
        assert_eq!(t.primary_scheme(), Some("http"));
        assert_eq!(t.host().unwrap().text(), "node1");
        assert_eq!(t.port().unwrap().text(), "50070");
        let path: Vec<_> = t.path().iter().map(|s| s.text().into_owned()).collect();
        assert_eq!(path, vec!["webhdfs", "v1"]);
        assert_eq!(t.query().get("op").unwrap().values[0].text(), "LISTSTATUS");
        assert_eq!(t.fragment().unwrap().text(), "top");
    }

    #[test]
    fn test_parse_wildcards_and_captures() {
        let t = parse("*://{host}:*/webhdfs/{version}/{path}**?user.name={user}").unwrap();
        assert_eq!(t.scheme().unwrap().primary(), &Value::Wildcard(Span::One));
        assert_eq!(
            t.host().unwrap().primary(),
            &Value::Capture { name: "host".into(), span: Span::One }
        );
        assert_eq!(
            t.path()[2].primary(),
            &Value::Capture { name: "path".into(), span: Span::Many }
        );
        assert_eq!(
            t.query().get("user.name").unwrap().values[0].primary(),
            &Value::Capture { name: "user".into(), span: Span::One }
        );
    }

    #[test]
    fn test_parse_alternation() {
        let t = parse("/(webhdfs|hdfs)/v1").unwrap();
        let alternatives = t.path()[0].alternatives();
        assert_eq!(alternatives.len(), 2);
        assert_eq!(alternatives[1], Value::Literal("hdfs".into()));
    }

    #[test]
    fn test_parse_function_reference_with_nested_argument() {
        let t = parse("{$servicescheme:{$var:service}}://{host}/x").unwrap();
        match t.scheme().unwrap().primary() {
            Value::Function(f) => {
                assert_eq!(f.name, "servicescheme");
                match &f.arg[..] {
                    [Value::Function(inner)] => {
                        assert_eq!(inner.name, "var");
                        assert_eq!(inner.arg, vec![Value::Literal("service".into())]);
                    }
                    other => panic!("unexpected argument {:?}", other),
                }
            }
            other => panic!("unexpected scheme {:?}", other),
        }
    }

    #[test]
    fn test_function_reference_in_relative_path() {
        let t = parse("{$serviceurl:WEBHDFS}/{**}").unwrap();
        assert!(t.scheme().is_none());
        assert!(!t.is_rooted());
        assert!(matches!(t.path()[0].primary(), Value::Function(_)));
    }

    #[test]
    fn test_percent_decoding_applies_to_literals_only() {
        let t = parse("/a%20b/{x}").unwrap();
        assert_eq!(t.path()[0].primary(), &Value::Literal("a b".into()));
        assert_eq!(format::format(&t), "/a%20b/{x}");
    }

    #[test]
    fn test_query_rest_and_bare_params() {
        let t = parse("/x?flag&{**}").unwrap();
        assert!(t.query().has_rest());
        assert_eq!(t.query().get("flag").unwrap().values[0].text(), "");
    }

    #[test]
    fn test_empty_segments_are_normalized() {
        let t = parse("/a//b/").unwrap();
        assert_eq!(t.path().len(), 2);
        assert_eq!(format::format(&t), "/a/b");
    }

    #[test]
    fn test_escaped_parentheses_are_literal() {
        let t = parse("/wiki/Foo_%28bar%29").unwrap();
        assert_eq!(t.path()[1].primary(), &Value::Literal("Foo_(bar)".into()));
    }

    #[rstest]
    #[case("/a(b", "a(b")]
    #[case("/a)b", "a)b")]
    #[case("/x**y", "x**y")]
    #[case("/a{b", "a{b")]
    #[case("/wiki/Foo_(bar)", "Foo_(bar)")]
    #[case("/*", "*")]
    fn test_parse_url_treats_syntax_as_text(#[case] input: &str, #[case] last: &str) {
        let t = parse_url(input).unwrap();
        assert_eq!(t.path().last().unwrap().primary(), &Value::Literal(last.into()));
        assert_eq!(parse_url(&format::format(&t)).unwrap(), t);
    }

    #[test]
    fn test_parse_url_components() {
        let t = parse_url("http://node1:50070/webhdfs/v1/(x)?op=OPEN&q={y}&flag#a?b").unwrap();
        assert_eq!(t.primary_scheme(), Some("http"));
        assert_eq!(t.host().unwrap().text(), "node1");
        assert_eq!(t.port().unwrap().text(), "50070");
        assert_eq!(t.path()[2].primary(), &Value::Literal("(x)".into()));
        assert_eq!(t.query().get("q").unwrap().values[0].text(), "{y}");
        assert_eq!(t.query().get("flag").unwrap().values[0].text(), "");
        assert_eq!(t.fragment().unwrap().text(), "a?b");
        assert!(!t.query().has_rest());
    }

    #[test]
    fn test_parse_url_rejects_bad_percent_encoding() {
        let err = parse_url("/a%zz").unwrap_err();
        assert_eq!(err.offset, 2);
    }

    #[rstest]
    #[case("/a/(b|c", "unbalanced `(`")]
    #[case("/a/{b", "unbalanced `{`")]
    #[case("/a/b}", "unbalanced `}`")]
    #[case("/a/{}", "empty capture name")]
    #[case("/a/({x}|{x})", "bound twice")]
    #[case("/a%2", "malformed percent-encoding")]
    #[case("/a%zz", "malformed percent-encoding")]
    #[case("/**/x/**", "only one `**`")]
    #[case("/a**b", "must occupy a whole segment")]
    #[case("/a{b}", "capture must occupy a whole value")]
    #[case("/(b|c)x", "group must occupy a whole value")]
    #[case("/x(b|c)", "group must occupy a whole value")]
    #[case("/wiki/Foo_(bar)", "group must occupy a whole value")]
    #[case("**://host", "only allowed in the path or query")]
    #[case("/(a|**)", "cannot be an alternative")]
    #[case("/((a|b)|c)", "nested alternation")]
    #[case("/{$}", "empty function name")]
    fn test_syntax_errors(#[case] input: &str, #[case] reason: &str) {
        let err = parse(input).unwrap_err();
        assert!(
            err.reason.contains(reason),
            "{} -> {} (expected `{}`)",
            input,
            err.reason,
            reason
        );
        assert_eq!(err.input, input);
    }

    #[test]
    fn test_unbalanced_bracket_offset() {
        let err = parse("/a/(b|c").unwrap_err();
        assert_eq!(err.offset, 3);
    }

    #[rstest]
    #[case("http://node1:50070/webhdfs/v1")]
    #[case("*://*:*/webhdfs/{version}/{path}**?{**}")]
    #[case("/gateway/cluster/webhdfs/v1/{**}")]
    #[case("{$serviceurl:WEBHDFS}/{**}?op={op}")]
    #[case("/(a|b|{c})/x?k=1&k=2&flag#frag")]
    #[case("//host/a%2Fb")]
    #[case("relative/path")]
    #[case("/")]
    #[case("https://h/p?q=%2A%7B")]
    fn test_round_trip(#[case] input: &str) {
        let parsed = parse(input).unwrap();
        let formatted = format::format(&parsed);
        assert_eq!(parse(&formatted).unwrap(), parsed, "{} -> {}", input, formatted);
    }

    #[test]
    fn test_canonical_input_formats_identically() {
        for input in [
            "http://node1:50070/webhdfs/v1",
            "/gateway/cluster/webhdfs/v1/{**}",
            "{$servicescheme:WEBHDFS}://{host}:{port}/x?{**}",
        ] {
            assert_eq!(format::format(&parse(input).unwrap()), input);
        }
    }

    #[test]
    fn test_parse_argument_mixes_text_and_references() {
        let pieces = parse_argument("svc-{name}-{$var:x}").unwrap();
        assert_eq!(pieces.len(), 4);
        assert_eq!(pieces[0], Value::Literal("svc-".into()));
        assert_eq!(pieces[1], Value::Capture { name: "name".into(), span: Span::One });
        assert!(matches!(pieces[3], Value::Function(_)));
    }
}
