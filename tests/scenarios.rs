//! End-to-end rewrite scenarios.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use rewrite_gateway::functions::Deadline;
use rewrite_gateway::rewrite::{Direction, RuleError};
use rewrite_gateway::template::{format, parse, parse_url};
use rewrite_gateway::Gateway;

mod common;

#[test]
fn test_webhdfs_glob_rewrite() {
    let engine = common::engine(
        r#"
        [[rules]]
        name = "webhdfs/inbound"
        directions = ["request"]
        pattern = "/webhdfs/v1/**"
        rewrite = "/gateway/cluster/webhdfs/v1/{**}"
        "#,
        common::webhdfs(),
    );
    assert_eq!(
        engine.rewrite_url("/webhdfs/v1/foo/bar", Direction::Request).unwrap(),
        "/gateway/cluster/webhdfs/v1/foo/bar"
    );
}

#[test]
fn test_service_scheme_function() {
    let services = common::webhdfs();
    let engine = common::engine(
        r#"
        [[rules]]
        name = "scheme"
        directions = ["request"]
        pattern = "/scheme"
        rewrite = "/{$servicescheme:WEBHDFS}"
        "#,
        services.clone(),
    );
    assert_eq!(engine.rewrite_url("/scheme", Direction::Request).unwrap(), "/http");
    assert_eq!(services.lookups(), vec!["WEBHDFS"]);
}

#[test]
fn test_direction_filter() {
    let engine = common::engine(
        r#"
        [[rules]]
        name = "outbound-only"
        directions = ["RESPONSE"]
        pattern = "/webhdfs/v1/**"
        rewrite = "/rewritten/{**}"
        "#,
        common::webhdfs(),
    );
    let input = "/webhdfs/v1/foo";
    assert_eq!(engine.rewrite_url(input, Direction::Request).unwrap(), input);
    assert_eq!(
        engine.rewrite_url(input, Direction::Response).unwrap(),
        "/rewritten/foo"
    );
}

#[test]
fn test_malformed_pattern_names_rule() {
    let config = common::config(
        r#"
        [[rules]]
        name = "broken"
        directions = ["request"]
        pattern = "/a/(b|c"
        rewrite = "/x"
        "#,
    );
    let err = Gateway::from_config(&config).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("rule `broken`"), "{message}");
    assert!(message.contains("invalid template `/a/(b|c`"), "{message}");
    assert!(matches!(
        err,
        rewrite_gateway::config::ConfigError::Rule(RuleError::Syntax { .. })
    ));
}

#[test]
fn test_all_short_circuits() {
    let services = common::webhdfs();
    let engine = common::engine(
        r#"
        [[rules]]
        name = "guarded"
        directions = ["request"]
        pattern = "/a/**"
        flow = { all = [ { match = "/a/never" }, { rewrite = "/{$serviceurl:WEBHDFS}" } ] }
        "#,
        services.clone(),
    );
    assert_eq!(engine.rewrite_url("/a/b", Direction::Request).unwrap(), "/a/b");
    assert!(services.lookups().is_empty());
}

#[test]
fn test_any_commits_first_success() {
    let services = common::CountingRegistry::new(&[
        ("ONE", "http://one:1"),
        ("TWO", "http://two:2"),
    ]);
    let engine = common::engine(
        r#"
        [[rules]]
        name = "either"
        directions = ["request"]
        pattern = "/x/**"
        flow = { any = [ { rewrite = "{$serviceurl:ONE}/{**}" }, { rewrite = "{$serviceurl:TWO}/{**}" } ] }
        "#,
        services.clone(),
    );
    assert_eq!(
        engine.rewrite_url("/x/y", Direction::Request).unwrap(),
        "http://one:1/y"
    );
    assert_eq!(services.lookups(), vec!["ONE"]);
}

#[test]
fn test_function_memoization() {
    let services = common::webhdfs();
    let engine = common::engine(
        r#"
        [[rules]]
        name = "twice"
        directions = ["request"]
        pattern = "/twice"
        rewrite = "{$servicescheme:WEBHDFS}://gateway/{$servicescheme:WEBHDFS}?s={$servicescheme:WEBHDFS}"
        "#,
        services.clone(),
    );
    assert_eq!(
        engine.rewrite_url("/twice", Direction::Request).unwrap(),
        "http://gateway/http?s=http"
    );
    assert_eq!(services.lookups().len(), 1);

    // A second evaluation has its own context.
    engine.rewrite_url("/twice", Direction::Request).unwrap();
    assert_eq!(services.lookups().len(), 2);
}

#[test]
fn test_rewriting_is_idempotent_for_non_matching_output() {
    let engine = common::engine(
        r#"
        [[rules]]
        name = "webhdfs/inbound"
        directions = ["request"]
        pattern = "/webhdfs/v1/**"
        rewrite = "/gateway/cluster/webhdfs/v1/{**}"
        "#,
        common::webhdfs(),
    );
    let once = engine.rewrite_url("/webhdfs/v1/a/b", Direction::Request).unwrap();
    let twice = engine.rewrite_url(&once, Direction::Request).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_self_matching_rule_applies_once_per_call() {
    let engine = common::engine(
        r#"
        [[rules]]
        name = "grow"
        directions = ["request"]
        pattern = "/a/**"
        rewrite = "/a/x/{**}"
        "#,
        common::webhdfs(),
    );
    let once = engine.rewrite_url("/a/b", Direction::Request).unwrap();
    assert_eq!(once, "/a/x/b");
    assert_eq!(engine.rewrite_url(&once, Direction::Request).unwrap(), "/a/x/x/b");
}

#[test]
fn test_failing_rule_falls_through_to_next() {
    let config = common::config(
        r#"
        [rewrite]
        strict_functions = ["serviceurl"]

        [services]
        WEBHDFS = "http://node1:50070/webhdfs/v1"

        [[rules]]
        name = "strict"
        directions = ["request"]
        pattern = "/svc/{service}/**"
        rewrite = "{$serviceurl:{service}}/{**}"

        [[rules]]
        name = "fallback"
        directions = ["request"]
        pattern = "/svc/**"
        rewrite = "/unavailable/{**}"
        "#,
    );
    let gateway = Gateway::from_config(&config).unwrap();
    assert_eq!(
        gateway.rewrite_url("/svc/webhdfs/a", Direction::Request).unwrap(),
        "http://node1:50070/webhdfs/v1/a"
    );
    assert_eq!(
        gateway.rewrite_url("/svc/oozie/a", Direction::Request).unwrap(),
        "/unavailable/oozie/a"
    );
}

#[test]
fn test_query_and_captures_end_to_end() {
    let engine = common::engine(
        r#"
        [[rules]]
        name = "webhdfs/outbound"
        directions = ["response"]
        pattern = "*://*:*/webhdfs/v1/{path}**?op={op}&{**}"
        rewrite = "https://gateway.example.com:8443/gateway/cluster/webhdfs/v1/{path}?op={op}&{**}"
        "#,
        common::webhdfs(),
    );
    let out = engine
        .rewrite_url(
            "http://node1:50075/webhdfs/v1/tmp/f.txt?op=OPEN&offset=0",
            Direction::Response,
        )
        .unwrap();
    assert_eq!(
        out,
        "https://gateway.example.com:8443/gateway/cluster/webhdfs/v1/tmp/f.txt?op=OPEN&offset=0"
    );
}

#[test]
fn test_rewrite_template_variant() {
    let engine = common::engine(
        r#"
        [[rules]]
        name = "r"
        directions = ["request"]
        pattern = "/webhdfs/v1/**"
        rewrite = "/gateway/cluster/webhdfs/v1/{**}"
        "#,
        common::webhdfs(),
    );
    let input = parse("/webhdfs/v1/x").unwrap();
    let out = engine.rewrite_template(&input, Direction::Request);
    assert_eq!(format(&out), "/gateway/cluster/webhdfs/v1/x");
    assert_eq!(format(&input), "/webhdfs/v1/x");
}

const SERVICE_RULES: &str = r#"
    [rewrite]
    strict_functions = ["serviceurl"]

    [[rules]]
    name = "strict"
    directions = ["request"]
    pattern = "/svc/{service}/**"
    rewrite = "{$serviceurl:{service}}/{**}"

    [[rules]]
    name = "permissive"
    directions = ["request"]
    pattern = "/svc/**"
    rewrite = "/scheme/{$servicescheme:WEBHDFS}/{**}"
"#;

#[test]
fn test_cancelled_request_skips_service_lookups() {
    let services = common::webhdfs();
    let engine = common::engine(SERVICE_RULES, services.clone());
    let token = CancellationToken::new();
    let deadline = Deadline::after(Duration::from_secs(60)).with_cancellation(token.clone());
    token.cancel();

    let input = parse_url("/svc/webhdfs/a").unwrap();
    let outcome = engine.evaluate_within(Direction::Request, &input, &deadline);

    assert_eq!(outcome.rule.as_deref(), Some("permissive"));
    assert_eq!(format(&outcome.template), "/scheme/WEBHDFS/webhdfs/a");
    assert!(services.lookups().is_empty());
}

#[test]
fn test_expired_deadline_skips_service_lookups() {
    let services = common::webhdfs();
    let engine = common::engine(SERVICE_RULES, services.clone());
    let input = parse_url("/svc/webhdfs/a").unwrap();

    let outcome = engine.evaluate_within(Direction::Request, &input, &Deadline::at(Instant::now()));
    assert_eq!(outcome.rule.as_deref(), Some("permissive"));
    assert!(services.lookups().is_empty());

    let outcome = engine.evaluate_within(Direction::Request, &input, &Deadline::none());
    assert_eq!(outcome.rule.as_deref(), Some("strict"));
    assert_eq!(format(&outcome.template), "http://node1:50070/webhdfs/v1/a");
    assert_eq!(services.lookups(), vec!["webhdfs"]);
}

#[test]
fn test_query_sub_delimiters_survive_rewrite() {
    let engine = common::engine(
        r#"
        [[rules]]
        name = "webhdfs/inbound"
        directions = ["request"]
        pattern = "/webhdfs/v1/**?{**}"
        rewrite = "/gw/webhdfs/v1/{**}?{**}"
        "#,
        common::webhdfs(),
    );
    assert_eq!(
        engine
            .rewrite_url("/webhdfs/v1/a:b/c@d?q=a+b&x=1,2&t=10:30&e=%2B", Direction::Request)
            .unwrap(),
        "/gw/webhdfs/v1/a:b/c@d?q=a+b&x=1,2&t=10:30&e=%2B"
    );
}

#[test]
fn test_paths_with_template_syntax_are_rewritten() {
    let engine = common::engine(
        r#"
        [[rules]]
        name = "webhdfs/inbound"
        directions = ["request"]
        pattern = "/webhdfs/v1/**"
        rewrite = "/gw/webhdfs/v1/{**}"
        "#,
        common::webhdfs(),
    );
    assert_eq!(
        engine.rewrite_url("/webhdfs/v1/a(b", Direction::Request).unwrap(),
        "/gw/webhdfs/v1/a%28b"
    );
    assert_eq!(
        engine.rewrite_url("/webhdfs/v1/x**y/{z", Direction::Request).unwrap(),
        "/gw/webhdfs/v1/x%2A%2Ay/%7Bz"
    );
}
