//! Service lookup functions (`servicescheme`, `servicehost`, ...).
//!
//! Registry values are parsed with the template parser in URL mode. Only an
//! absolute URL (scheme and authority) counts as a service URL.

use std::fmt;
use std::sync::Arc;

use super::registry::{FunctionCall, RewriteFunction};
use crate::rewrite::error::RewriteError;
use crate::services::ServiceRegistry;
use crate::template::{self, Component, Template};

/// Which part of a service's canonical URL a function returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceComponent {
    Scheme,
    Host,
    Port,
    Path,
    /// `host:port`
    Addr,
    Url,
}

impl ServiceComponent {
    pub const ALL: [ServiceComponent; 6] = [
        ServiceComponent::Scheme,
        ServiceComponent::Host,
        ServiceComponent::Port,
        ServiceComponent::Path,
        ServiceComponent::Addr,
        ServiceComponent::Url,
    ];

    /// Registered function name.
    pub fn function_name(&self) -> &'static str {
        match self {
            ServiceComponent::Scheme => "servicescheme",
            ServiceComponent::Host => "servicehost",
            ServiceComponent::Port => "serviceport",
            ServiceComponent::Path => "servicepath",
            ServiceComponent::Addr => "serviceaddr",
            ServiceComponent::Url => "serviceurl",
        }
    }

    fn extract(&self, url: &Template) -> Option<String> {
        let host = url.host().map(|host| host.text().into_owned());
        let port = url
            .port()
            .map(|port| port.text().into_owned())
            .or_else(|| url.primary_scheme().and_then(default_port).map(str::to_string));
        match self {
            ServiceComponent::Scheme => url.primary_scheme().map(str::to_string),
            ServiceComponent::Host => host,
            ServiceComponent::Port => port,
            ServiceComponent::Path => {
                let segments: Vec<String> = url
                    .path()
                    .iter()
                    .map(|segment| template::encode(&segment.text(), Component::Path).into_owned())
                    .collect();
                Some(format!("/{}", segments.join("/")))
            }
            ServiceComponent::Addr => Some(format!("{}:{}", host?, port?)),
            ServiceComponent::Url => Some(template::format(url)),
        }
    }
}

fn default_port(scheme: &str) -> Option<&'static str> {
    match scheme.to_ascii_lowercase().as_str() {
        "http" | "ws" => Some("80"),
        "https" | "wss" => Some("443"),
        "ftp" => Some("21"),
        _ => None,
    }
}

impl fmt::Display for ServiceComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

/// Returns one component of a service's canonical URL.
///
/// Permissive by default: when the registry has no mapping, the mapping is not
/// a valid URL, or the lookup times out, the argument is returned unchanged.
/// In strict mode the same conditions fail with `FunctionResolution`.
#[derive(Debug, Clone)]
pub struct ServiceFunction {
    component: ServiceComponent,
    services: Arc<dyn ServiceRegistry>,
    strict: bool,
}

impl ServiceFunction {
    pub fn new(component: ServiceComponent, services: Arc<dyn ServiceRegistry>) -> Self {
        Self {
            component,
            services,
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn component(&self) -> ServiceComponent {
        self.component
    }

    fn lookup(&self, service: &str, call: &FunctionCall<'_>) -> Result<String, String> {
        call.deadline().check().map_err(|e| e.to_string())?;
        let url = self
            .services
            .lookup(service, call.deadline())
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("no mapping for service `{service}`"))?;
        let parsed = template::parse_url(url.trim()).map_err(|e| format!("service URL `{url}` is invalid: {e}"))?;
        if parsed.primary_scheme().is_none() || !parsed.has_authority() {
            return Err(format!("service URL `{url}` is not absolute"));
        }
        self.component
            .extract(&parsed)
            .ok_or_else(|| format!("service URL `{url}` has no {}", self.component))
    }
}

impl RewriteFunction for ServiceFunction {
    fn resolve(&self, arg: &str, call: &mut FunctionCall<'_>) -> Result<String, RewriteError> {
        match self.lookup(arg.trim(), call) {
            Ok(value) => Ok(value),
            Err(reason) if self.strict => Err(call.unavailable(arg, reason)),
            Err(reason) => {
                tracing::debug!(
                    function = %self.component,
                    arg = %arg,
                    reason = %reason,
                    "Service lookup failed, returning argument unchanged"
                );
                Ok(arg.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{Deadline, FunctionRegistry};
    use crate::rewrite::context::{Direction, RewriteContext};
    use crate::services::StaticServiceRegistry;
    use std::time::Instant;

    fn registry(strict: bool) -> FunctionRegistry {
        let services: Arc<dyn ServiceRegistry> = Arc::new(StaticServiceRegistry::new([
            ("WEBHDFS", "http://node1:50070/webhdfs/v1"),
            ("SECURE", "https://secure.internal/api/"),
            ("BROKEN", "not a url"),
            ("BARE", "node1:50070/webhdfs"),
            ("BADESCAPE", "http://node1/%zz"),
            ("CUSTOM", "gopher://hole.internal/x"),
        ]));
        let mut builder = FunctionRegistry::builder();
        for component in ServiceComponent::ALL {
            builder = builder
                .register(
                    component.function_name(),
                    ServiceFunction::new(component, services.clone()).strict(strict),
                )
                .unwrap();
        }
        builder.build()
    }

    fn resolve(registry: &FunctionRegistry, name: &str, arg: &str) -> Result<String, RewriteError> {
        let mut ctx = RewriteContext::new(Direction::Request);
        registry.resolve(name, arg, &mut ctx)
    }

    #[test]
    fn test_components_of_webhdfs() {
        let functions = registry(false);
        assert_eq!(resolve(&functions, "servicescheme", "WEBHDFS").unwrap(), "http");
        assert_eq!(resolve(&functions, "servicehost", "WEBHDFS").unwrap(), "node1");
        assert_eq!(resolve(&functions, "serviceport", "WEBHDFS").unwrap(), "50070");
        assert_eq!(resolve(&functions, "servicepath", "WEBHDFS").unwrap(), "/webhdfs/v1");
        assert_eq!(resolve(&functions, "serviceaddr", "WEBHDFS").unwrap(), "node1:50070");
        assert_eq!(
            resolve(&functions, "serviceurl", "WEBHDFS").unwrap(),
            "http://node1:50070/webhdfs/v1"
        );
    }

    #[test]
    fn test_default_port_is_filled_in() {
        let functions = registry(false);
        assert_eq!(resolve(&functions, "serviceport", "SECURE").unwrap(), "443");
        assert_eq!(resolve(&functions, "serviceurl", "secure").unwrap(), "https://secure.internal/api");
    }

    #[test]
    fn test_permissive_fallback_returns_argument() {
        let functions = registry(false);
        assert_eq!(resolve(&functions, "servicescheme", "OOZIE").unwrap(), "OOZIE");
        assert_eq!(resolve(&functions, "servicehost", "BROKEN").unwrap(), "BROKEN");
    }

    #[test]
    fn test_scheme_less_value_falls_back() {
        let functions = registry(false);
        for name in ["servicescheme", "servicehost", "serviceport", "servicepath", "serviceurl"] {
            assert_eq!(resolve(&functions, name, "BARE").unwrap(), "BARE", "{name}");
        }
        assert_eq!(resolve(&functions, "servicescheme", "BADESCAPE").unwrap(), "BADESCAPE");
    }

    #[test]
    fn test_missing_component_falls_back() {
        let functions = registry(false);
        assert_eq!(resolve(&functions, "servicescheme", "CUSTOM").unwrap(), "gopher");
        assert_eq!(resolve(&functions, "serviceport", "CUSTOM").unwrap(), "CUSTOM");
        assert_eq!(resolve(&functions, "serviceaddr", "CUSTOM").unwrap(), "CUSTOM");
    }

    #[test]
    fn test_strict_mode_fails() {
        let functions = registry(true);
        let err = resolve(&functions, "serviceurl", "OOZIE").unwrap_err();
        assert!(matches!(err, RewriteError::FunctionResolution { ref function, .. } if function == "serviceurl"));
        let err = resolve(&functions, "servicescheme", "BARE").unwrap_err();
        assert!(err.to_string().contains("not absolute"));
    }

    #[test]
    fn test_expired_deadline() {
        let functions = registry(true);
        let mut ctx = RewriteContext::new(Direction::Request).with_deadline(Deadline::at(Instant::now()));
        let err = functions.resolve("servicescheme", "WEBHDFS", &mut ctx).unwrap_err();
        assert!(err.to_string().contains("deadline exceeded"));

        let permissive = registry(false);
        let mut ctx = RewriteContext::new(Direction::Request).with_deadline(Deadline::at(Instant::now()));
        assert_eq!(permissive.resolve("servicescheme", "WEBHDFS", &mut ctx).unwrap(), "WEBHDFS");
    }
}
