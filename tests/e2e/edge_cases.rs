use super::*;

#[test]
fn analyze_rejects_invalid_target_without_contacting_backend() {
    let backend = StubBackend::start();
    let ctx = TestContext::new();

    let result = ctx.run_engage(&["analyze", "bad target!", "--base-url", &backend.base_url()]);

    assert_failure(&result);
    assert_error_contains(&result, "invalid target");
    assert!(backend.requests().is_empty());
}

#[test]
fn unreachable_backend_reports_incomplete_operation() {
    let ctx = TestContext::new();

    // nothing listens on the discard port
    let result = ctx.run_engage(&["analyze", "example.com", "--base-url", "http://127.0.0.1:9"]);

    assert_failure(&result);
    assert_error_contains(&result, "operation did not complete");
    assert_error_contains(&result, "could not reach the engagement service");
}

#[test]
fn backend_failure_during_execute_still_refreshes_history() {
    let backend = StubBackend::start();
    let ctx = TestContext::new();

    let result = ctx.run_engage(&[
        "execute",
        CRASHING_PLAYBOOK,
        "--target",
        "example.com",
        "--base-url",
        &backend.base_url(),
    ]);

    assert_failure(&result);
    assert_error_contains(&result, "operation did not complete");
    assert_error_contains(&result, "status 500");
    assert_eq!(
        backend.requests().last().map(String::as_str),
        Some("engagements:5")
    );
}

#[test]
fn execute_unknown_playbook_is_not_sent() {
    let backend = StubBackend::start();
    let ctx = TestContext::new();

    let result = ctx.run_engage(&[
        "execute",
        "jenkins_rce",
        "--target",
        "example.com",
        "--base-url",
        &backend.base_url(),
    ]);

    assert_failure(&result);
    assert_error_contains(&result, "jenkins_rce");
    assert_eq!(backend.requests(), vec!["analyze:example.com:normal"]);
}

#[test]
fn execute_without_matching_engagement_fails() {
    let backend = StubBackend::start();
    let ctx = TestContext::new();

    let result = ctx.run_engage(&["execute", "jenkins_rce", "--base-url", &backend.base_url()]);

    assert_failure(&result);
    assert_error_contains(&result, "no recent engagement recommends playbook 'jenkins_rce'");
    assert_eq!(backend.requests(), vec!["engagements:5"]);
}

#[test]
fn execute_rejects_target_with_engagement() {
    let ctx = TestContext::new();

    let result = ctx.run_engage(&[
        "execute",
        "ssh_bruteforce",
        "--target",
        "example.com",
        "--engagement",
        "eng_1",
    ]);

    assert_failure(&result);
    assert_error_contains(&result, "cannot be used with");
}

#[test]
fn history_rejects_zero_limit() {
    let backend = StubBackend::start();
    let ctx = TestContext::new();

    let result = ctx.run_engage(&["history", "--limit", "0", "--base-url", &backend.base_url()]);

    assert_failure(&result);
    assert_error_contains(&result, "history limit must be at least 1");
    assert!(backend.requests().is_empty());
}

#[test]
fn config_with_zero_history_limit_is_rejected_before_any_request() {
    let backend = StubBackend::start();
    let ctx = TestContext::new();

    ctx.write_file(
        "engage.toml",
        &format!(
            "[service]\nbase_url = \"{}\"\n\n[history]\nlimit = 0\n",
            backend.base_url()
        ),
    );

    let result = ctx.run_engage(&["execute", "http_recon", "--target", "example.com"]);

    assert_failure(&result);
    assert_error_contains(&result, "history limit must be at least 1");
    assert!(backend.requests().is_empty());
}

#[test]
fn malformed_base_url_is_rejected() {
    let ctx = TestContext::new();

    let result = ctx.run_engage(&["history", "--base-url", "not a url"]);

    assert_failure(&result);
}

#[test]
fn explicit_config_must_exist() {
    let ctx = TestContext::new();

    let result = ctx.run_engage(&["history", "--config", "missing.toml"]);

    assert_failure(&result);
    assert_error_contains(&result, "missing.toml");
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let ctx = TestContext::new();
    ctx.write_file("engage.toml", "[history]\nlimit = 9\n");

    let result = ctx.run_engage(&["init", "--yes"]);

    assert_failure(&result);
    assert_error_contains(&result, "already exists");
    assert_eq!(ctx.load_engage_config().history.limit, 9);

    let result = ctx.run_engage(&["init", "--yes", "--force"]);

    assert_success(&result);
    assert_eq!(ctx.load_engage_config().history.limit, 5);
}
