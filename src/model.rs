//! Engagement data model and its JSON wire shapes.

use std::{collections::BTreeMap, fmt::Display};

use base64::Engine as _;
use chrono::{DateTime, Local, NaiveDateTime};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScanDepth {
    Quick,
    #[default]
    Normal,
    Thorough,
}

impl ScanDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanDepth::Quick => "quick",
            ScanDepth::Normal => "normal",
            ScanDepth::Thorough => "thorough",
        }
    }
}

impl Display for ScanDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body of the analysis request.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ScanRequest {
    pub target: String,
    #[serde(rename = "scan_depth")]
    pub depth: ScanDepth,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlaybookRecommendation {
    #[serde(rename = "playbook_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub confidence: f64,
    pub commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization: Option<String>,
}

impl PlaybookRecommendation {
    /// Confidence as a rounded percentage, as displayed next to the meter.
    pub fn confidence_percent(&self) -> i64 {
        (self.confidence * 100.0).round() as i64
    }

    /// Decodes the attack graph visualization, which travels as base64 PNG.
    pub fn visualization_png(&self) -> Result<Option<Vec<u8>>, base64::DecodeError> {
        self.visualization
            .as_deref()
            .map(|encoded| base64::engine::general_purpose::STANDARD.decode(encoded.trim()))
            .transpose()
    }
}

/// Raw response of the execution endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct ExecutionResponse {
    pub output: String,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub learned_patterns: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ExecutionOutcome {
    pub playbook_id: String,
    pub output: String,
    pub success: Option<bool>,
    pub learned_patterns: BTreeMap<String, String>,
}

impl ExecutionOutcome {
    pub fn from_response(playbook_id: impl Into<String>, response: ExecutionResponse) -> Self {
        Self {
            playbook_id: playbook_id.into(),
            output: response.output,
            success: response.success,
            learned_patterns: response.learned_patterns.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DiscoveredService {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "port_as_text")]
    pub port: String,
    #[serde(default)]
    pub product: String,
}

// ports come back from nmap as strings, but hand-written fixtures use numbers
fn port_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u64),
        Text(String),
        Missing(()),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Number(n) => n.to_string(),
        Port::Text(s) => s,
        Port::Missing(()) => String::new(),
    })
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TechStack {
    #[serde(default)]
    pub services: Vec<DiscoveredService>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EngagementRecord {
    pub id: String,
    pub target: String,
    pub timestamp: String,
    #[serde(default)]
    pub tech_stack: TechStack,
    pub results: Vec<PlaybookRecommendation>,
}

impl EngagementRecord {
    /// First `count` services plus the number of services left out.
    pub fn service_preview(&self, count: usize) -> (&[DiscoveredService], usize) {
        let services = &self.tech_stack.services;
        let shown = services.len().min(count);

        (&services[..shown], services.len() - shown)
    }

    /// Parses the engagement timestamp. The backend may omit the offset, in
    /// which case the value is taken as local time.
    pub fn recorded_at(&self) -> Option<DateTime<Local>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(dt.with_timezone(&Local));
        }

        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .and_then(|naive| naive.and_local_timezone(Local).earliest())
    }

    pub fn playbook(&self, playbook_id: &str) -> Option<&PlaybookRecommendation> {
        self.results.iter().find(|pb| pb.id == playbook_id)
    }
}
