use std::{collections::HashMap, time::Duration};

use reqwest::{
    Client, RequestBuilder, Url,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::{EngagementService, ServiceError};
use crate::{
    config::ServiceConfig,
    model::{EngagementRecord, ExecutionResponse, PlaybookRecommendation, ScanRequest},
};

// best effort parsing of headers, anything invalid is ignored
fn parse_headers(headers: &HashMap<String, String>) -> HeaderMap {
    let mut parsed_headers = HeaderMap::new();

    for (key, value) in headers {
        let Ok(name) = HeaderName::try_from(key.as_str()) else {
            warn!(header = %key, "skipping invalid header name");
            continue;
        };

        let Ok(value) = HeaderValue::try_from(value.as_str()) else {
            warn!(header = %key, "skipping invalid header value");
            continue;
        };

        parsed_headers.insert(name, value);
    }

    parsed_headers
}

// FastAPI-style backends put the human readable reason under `detail`
fn rejection_detail(body: String) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }

    let detail = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| value.get("detail").and_then(Value::as_str).map(str::to_string));

    Some(detail.unwrap_or(body))
}

/// Engagement service reached over JSON/HTTP.
#[derive(Clone, Debug)]
pub struct HttpService {
    client: Client,
    base_url: Url,
    headers: HeaderMap,
}

impl HttpService {
    pub fn setup(config: &ServiceConfig) -> miette::Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            miette::miette!(
                help = "use an absolute address such as http://localhost:8000",
                "invalid service base url '{}': {}",
                config.base_url,
                e
            )
        })?;

        if base_url.cannot_be_a_base() {
            miette::bail!("service base url '{}' can't carry a path", config.base_url);
        }

        let mut builder = Client::builder();

        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }

        let client = builder
            .build()
            .map_err(|e| miette::miette!("failed to build http client: {}", e))?;

        Ok(Self {
            client,
            base_url,
            headers: parse_headers(&config.headers),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();

        // cannot-be-a-base urls are rejected in `setup`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }

        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ServiceError> {
        let response = request
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(ServiceError::TransportFailure)?;

        let status = response.status();

        let body = response
            .text()
            .await
            .map_err(ServiceError::TransportFailure)?;

        debug!(status = status.as_u16(), bytes = body.len(), "service responded");

        if !status.is_success() {
            return Err(ServiceError::Rejected {
                status: status.as_u16(),
                body: rejection_detail(body),
            });
        }

        serde_json::from_str(&body).map_err(ServiceError::MalformedResponse)
    }
}

#[async_trait::async_trait]
impl EngagementService for HttpService {
    async fn analyze(
        &self,
        request: &ScanRequest,
    ) -> Result<Vec<PlaybookRecommendation>, ServiceError> {
        let url = self.endpoint(&["analyze"]);
        debug!(%url, target = %request.target, depth = %request.depth, "requesting analysis");

        self.send(self.client.post(url).json(request)).await
    }

    async fn execute(
        &self,
        playbook_id: &str,
        commands: &[String],
    ) -> Result<ExecutionResponse, ServiceError> {
        let url = self.endpoint(&["execute", playbook_id]);
        debug!(%url, commands = commands.len(), "requesting execution");

        self.send(self.client.post(url).json(commands)).await
    }

    async fn engagements(&self, limit: usize) -> Result<Vec<EngagementRecord>, ServiceError> {
        let mut url = self.endpoint(&["engagements"]);
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        debug!(%url, "requesting engagement history");

        self.send(self.client.get(url)).await
    }
}
