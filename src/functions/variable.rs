//! Configured variables exposed through `{$var:name}`.

use std::collections::HashMap;

use thiserror::Error;

use super::registry::{FunctionCall, RewriteFunction};
use crate::rewrite::error::RewriteError;
use crate::template::{parse_argument, TemplateSyntaxError, Value};

/// A variable's value is not a valid function argument.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("variable `{name}`: {source}")]
pub struct VariableError {
    pub name: String,
    pub source: TemplateSyntaxError,
}

/// Named values that may themselves reference functions or other variables.
///
/// Values are parsed once at construction and expanded on every resolution
/// through the calling context, so nested references are memoized and cycles
/// between variables surface as `RewriteError::Cycle`.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    values: HashMap<String, Vec<Value>>,
}

impl Variables {
    pub fn parse<I, K, V>(raw: I) -> Result<Self, VariableError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut values = HashMap::new();
        for (name, value) in raw {
            let name = name.into();
            let pieces = parse_argument(value.as_ref()).map_err(|source| VariableError {
                name: name.clone(),
                source,
            })?;
            values.insert(name, pieces);
        }
        Ok(Self { values })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl RewriteFunction for Variables {
    fn resolve(&self, arg: &str, call: &mut FunctionCall<'_>) -> Result<String, RewriteError> {
        let pieces = self
            .values
            .get(arg.trim())
            .ok_or_else(|| call.unavailable(arg, "undefined variable"))?;
        call.expand(pieces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{FunctionRegistry, HostMap};
    use crate::rewrite::context::{Direction, RewriteContext};

    fn registry(vars: &[(&str, &str)]) -> FunctionRegistry {
        FunctionRegistry::builder()
            .register("var", Variables::parse(vars.iter().copied()).unwrap())
            .unwrap()
            .register("hostmap", HostMap::new([("node1", "gw.example.com")]))
            .unwrap()
            .build()
    }

    #[test]
    fn test_nested_references() {
        let functions = registry(&[
            ("host", "{$hostmap:node1}"),
            ("base", "https://{$var:host}:8443/gateway"),
        ]);
        let mut ctx = RewriteContext::new(Direction::Response);
        assert_eq!(
            functions.resolve("var", "base", &mut ctx).unwrap(),
            "https://gw.example.com:8443/gateway"
        );
        assert_eq!(ctx.cached_functions(), 3);
    }

    #[test]
    fn test_variable_cycle() {
        let functions = registry(&[("a", "x{$var:b}"), ("b", "y{$var:a}")]);
        let mut ctx = RewriteContext::new(Direction::Request);
        let err = functions.resolve("var", "a", &mut ctx).unwrap_err();
        assert_eq!(
            err,
            RewriteError::Cycle {
                function: "var".into(),
                arg: "a".into()
            }
        );
    }

    #[test]
    fn test_undefined_variable() {
        let functions = registry(&[]);
        let mut ctx = RewriteContext::new(Direction::Request);
        let err = functions.resolve("var", "missing", &mut ctx).unwrap_err();
        assert_eq!(err.kind(), "function_resolution");
    }

    #[test]
    fn test_invalid_variable_value() {
        let err = Variables::parse([("bad", "{$unclosed")]).unwrap_err();
        assert_eq!(err.name, "bad");
    }
}
