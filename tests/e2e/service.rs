use super::*;

use engage::{
    config::ServiceConfig,
    model::{ScanDepth, ScanRequest},
    service::{EngagementService, HttpService, ServiceError},
};

fn http_service(base_url: &str) -> HttpService {
    HttpService::setup(&ServiceConfig {
        base_url: base_url.to_string(),
        ..Default::default()
    })
    .expect("Failed to set up http service")
}

fn scan(target: &str) -> ScanRequest {
    ScanRequest {
        target: target.to_string(),
        depth: ScanDepth::Quick,
    }
}

#[tokio::test]
async fn analyze_decodes_recommendations() {
    let backend = StubBackend::start();
    let service = http_service(&backend.base_url());

    let recommendations = service.analyze(&scan("example.com")).await.unwrap();

    assert_eq!(recommendations.len(), 3);
    assert_eq!(recommendations[1].description, "");
    assert_eq!(recommendations[1].commands[1], "curl -I example.com:80");
    assert!(recommendations[0].visualization_png().unwrap().is_some());
    assert_eq!(backend.requests(), vec!["analyze:example.com:quick"]);
}

#[tokio::test]
async fn execute_posts_commands_in_order() {
    let backend = StubBackend::start();
    let service = http_service(&backend.base_url());

    let commands = vec!["nmap -sV example.com".to_string(), "whois example.com".to_string()];
    let response = service.execute("pb-1", &commands).await.unwrap();

    assert_eq!(response.success, Some(true));
    assert!(response.output.contains("$ whois example.com"));
    assert_eq!(
        backend.requests(),
        vec!["execute:pb-1:nmap -sV example.com;whois example.com"]
    );
}

#[tokio::test]
async fn engagements_sends_limit() {
    let backend = StubBackend::start();
    let service = http_service(&backend.base_url());

    let records = service.engagements(2).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[1].tech_stack.services.len(), 5);
    assert_eq!(backend.requests(), vec!["engagements:2"]);
}

#[tokio::test]
async fn error_status_maps_to_rejected_with_detail() {
    let backend = StubBackend::start();
    let service = http_service(&backend.base_url());

    let err = service
        .execute(CRASHING_PLAYBOOK, &["false".to_string()])
        .await
        .unwrap_err();

    match err {
        ServiceError::Rejected { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body.as_deref(), Some("runner crashed"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unexpected_body_maps_to_malformed_response() {
    let backend = StubBackend::start();
    let service = http_service(&backend.base_url());

    let err = service.analyze(&scan(GARBLED_TARGET)).await.unwrap_err();

    assert!(matches!(err, ServiceError::MalformedResponse(_)), "{err:?}");
}

#[tokio::test]
async fn unknown_route_maps_to_rejected() {
    let backend = StubBackend::start();
    let service = http_service(&format!("{}/v2", backend.base_url()));

    let err = service.engagements(1).await.unwrap_err();

    assert!(matches!(err, ServiceError::Rejected { status: 404, .. }), "{err:?}");
}

#[tokio::test]
async fn refused_connection_maps_to_transport_failure() {
    let service = http_service("http://127.0.0.1:9");

    let err = service.engagements(1).await.unwrap_err();

    assert!(matches!(err, ServiceError::TransportFailure(_)), "{err:?}");
}
