//! The boundary between the console and the analysis backend.

use miette::Diagnostic;
use thiserror::Error;

use crate::model::{EngagementRecord, ExecutionResponse, PlaybookRecommendation, ScanRequest};

mod http;

pub use http::HttpService;

#[derive(Debug, Error, Diagnostic)]
pub enum ServiceError {
    #[error("could not reach the engagement service")]
    #[diagnostic(
        code(engage::service::transport),
        help("check that the backend is running and that `service.base_url` points at it")
    )]
    TransportFailure(#[source] reqwest::Error),

    #[error("engagement service answered with status {status}")]
    #[diagnostic(code(engage::service::rejected))]
    Rejected {
        status: u16,
        #[help]
        body: Option<String>,
    },

    #[error("engagement service returned a malformed response")]
    #[diagnostic(
        code(engage::service::malformed),
        help("the response body is not valid JSON or lacks a required field")
    )]
    MalformedResponse(#[source] serde_json::Error),
}

/// Calls exposed by the engagement backend.
///
/// Each call is a single request/response exchange; there is no retry and no
/// cancellation at this level.
#[async_trait::async_trait]
pub trait EngagementService: Send + Sync {
    async fn analyze(
        &self,
        request: &ScanRequest,
    ) -> Result<Vec<PlaybookRecommendation>, ServiceError>;

    async fn execute(
        &self,
        playbook_id: &str,
        commands: &[String],
    ) -> Result<ExecutionResponse, ServiceError>;

    async fn engagements(&self, limit: usize) -> Result<Vec<EngagementRecord>, ServiceError>;
}
