use super::*;

#[test]
fn analyze_lists_recommendations_in_backend_order() {
    let backend = StubBackend::start();
    let ctx = TestContext::new();

    let result = ctx.run_engage(&[
        "analyze",
        "example.com",
        "--depth",
        "thorough",
        "--json",
        "--base-url",
        &backend.base_url(),
    ]);

    assert_success(&result);

    let ids: Vec<_> = result
        .json()
        .as_array()
        .expect("recommendations array")
        .iter()
        .map(|pb| pb["playbook_id"].as_str().unwrap().to_string())
        .collect();

    assert_eq!(ids, vec!["ssh_bruteforce", "http_recon", CRASHING_PLAYBOOK]);
    assert_eq!(backend.requests(), vec!["analyze:example.com:thorough"]);
}

#[test]
fn analyze_renders_playbook_cards() {
    let backend = StubBackend::start();
    let ctx = TestContext::new();

    let result = ctx.run_engage(&["analyze", "example.com", "--base-url", &backend.base_url()]);

    assert_success(&result);
    assert_output_contains(&result, "SSH Bruteforce");
    assert_output_contains(&result, "HTTP Server Recon");
    assert_output_contains(&result, "63%");
}

#[test]
fn analyze_with_no_matches_shows_empty_state() {
    let backend = StubBackend::start();
    let ctx = TestContext::new();

    let result = ctx.run_engage(&["analyze", QUIET_TARGET, "--base-url", &backend.base_url()]);

    assert_success(&result);
    assert_output_contains(&result, "No playbooks matched the target");
}

#[test]
fn analyze_saves_attack_graphs() {
    let backend = StubBackend::start();
    let ctx = TestContext::new();

    let result = ctx.run_engage(&[
        "analyze",
        "example.com",
        "--save-graphs",
        "graphs",
        "--json",
        "--base-url",
        &backend.base_url(),
    ]);

    assert_success(&result);
    ctx.assert_file_exists("graphs/ssh_bruteforce.png");
    assert!(!ctx.file_path("graphs/http_recon.png").exists());
    assert_error_contains(&result, "saved 1 visualization(s)");
}

#[test]
fn execute_after_analysis_sends_captured_commands() {
    let backend = StubBackend::start();
    let ctx = TestContext::new();

    let result = ctx.run_engage(&[
        "execute",
        "http_recon",
        "--target",
        "example.com",
        "--json",
        "--base-url",
        &backend.base_url(),
    ]);

    assert_success(&result);

    let outcome = result.json();
    assert_eq!(outcome["playbook_id"], "http_recon");
    assert_eq!(outcome["success"], true);
    assert!(outcome["output"].as_str().unwrap().contains("22/tcp open ssh"));
    assert_eq!(
        outcome["learned_patterns"]["ssh_pattern"],
        "SSH brute force attempted"
    );

    // the trailing history refresh completes before the process exits
    assert_eq!(
        backend.requests(),
        vec![
            "analyze:example.com:normal",
            "execute:http_recon:nmap -sV -p 80 example.com;curl -I example.com:80",
            "engagements:5",
        ]
    );
}

#[test]
fn execute_replays_most_recent_matching_engagement() {
    let backend = StubBackend::start();
    let ctx = TestContext::new();

    let result = ctx.run_engage(&["execute", "ssh_bruteforce", "--base-url", &backend.base_url()]);

    assert_success(&result);
    assert_output_contains(&result, "ssh_bruteforce");
    assert_output_contains(&result, "all commands succeeded");

    assert_eq!(
        backend.requests(),
        vec![
            "engagements:5",
            "execute:ssh_bruteforce:hydra -l root ssh://example.com",
            "engagements:5",
        ]
    );
}

#[test]
fn execute_replays_named_engagement() {
    let backend = StubBackend::start();
    let ctx = TestContext::new();

    let result = ctx.run_engage(&[
        "execute",
        "ssh_bruteforce",
        "--engagement",
        "eng_20240501_101500",
        "--json",
        "--base-url",
        &backend.base_url(),
    ]);

    assert_success(&result);
    assert!(
        backend
            .requests()
            .contains(&"execute:ssh_bruteforce:hydra -l admin ssh://old.example".to_string())
    );
}

#[test]
fn history_is_bounded_by_limit() {
    let backend = StubBackend::start();
    let ctx = TestContext::new();

    let result = ctx.run_engage(&[
        "history",
        "--limit",
        "2",
        "--json",
        "--base-url",
        &backend.base_url(),
    ]);

    assert_success(&result);

    let history = result.json();
    let history = history.as_array().expect("history array");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["id"], "eng_20240503_090000");
    assert_eq!(history[1]["tech_stack"]["services"][0]["port"], "22");
    assert_eq!(backend.requests(), vec!["engagements:2"]);
}

#[test]
fn history_renders_service_preview() {
    let backend = StubBackend::start();
    let ctx = TestContext::new();

    let result = ctx.run_engage(&["history", "--base-url", &backend.base_url()]);

    assert_success(&result);
    assert_output_contains(&result, "example.com");
    assert_output_contains(&result, "ssh (22) - OpenSSH");
    assert_output_contains(&result, "+2 more");
    assert!(!result.stdout.contains("redis"));
}

#[test]
fn config_file_is_discovered_in_working_directory() {
    let backend = StubBackend::start();
    let ctx = TestContext::new();

    ctx.write_file(
        "engage.toml",
        &format!(
            "[service]\nbase_url = \"{}\"\n\n[history]\nlimit = 1\n",
            backend.base_url()
        ),
    );

    let result = ctx.run_engage(&["history", "--json"]);

    assert_success(&result);
    assert_eq!(result.json().as_array().unwrap().len(), 1);
    assert_eq!(backend.requests(), vec!["engagements:1"]);
}
