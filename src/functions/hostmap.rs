//! Internal ↔ external host name translation.

use std::collections::HashMap;

use super::registry::{FunctionCall, RewriteFunction};
use crate::rewrite::context::Direction;
use crate::rewrite::error::RewriteError;

/// Maps internal host names to the names clients see.
///
/// Requests translate external → internal, responses internal → external.
/// Hosts without a mapping pass through unchanged. Lookups ignore ASCII case.
#[derive(Debug, Clone, Default)]
pub struct HostMap {
    inbound: HashMap<String, String>,
    outbound: HashMap<String, String>,
}

impl HostMap {
    /// Build from `internal → external` pairs.
    pub fn new<I, K, V>(internal_to_external: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = Self::default();
        for (internal, external) in internal_to_external {
            let internal = internal.into();
            let external = external.into();
            map.inbound
                .insert(external.to_ascii_lowercase(), internal.clone());
            map.outbound.insert(internal.to_ascii_lowercase(), external);
        }
        map
    }

    pub fn translate<'a>(&'a self, host: &'a str, direction: Direction) -> &'a str {
        let table = match direction {
            Direction::Request => &self.inbound,
            Direction::Response => &self.outbound,
        };
        table
            .get(&host.to_ascii_lowercase())
            .map(String::as_str)
            .unwrap_or(host)
    }

    pub fn len(&self) -> usize {
        self.outbound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outbound.is_empty()
    }
}

impl RewriteFunction for HostMap {
    fn resolve(&self, arg: &str, call: &mut FunctionCall<'_>) -> Result<String, RewriteError> {
        Ok(self.translate(arg, call.direction()).to_string())
    }
}
