//! Markdown views of the console state, printed through termimad.

use askama::Template;
use termimad::MadSkin;

use crate::{
    model::{EngagementRecord, ExecutionOutcome},
    orchestrator::ViewState,
};

const SERVICE_PREVIEW: usize = 3;
const METER_WIDTH: usize = 20;

// ============================================================================
// View Model
// ============================================================================

#[derive(Debug, Clone)]
pub struct PlaybookCard {
    pub position: usize,
    pub id: String,
    pub name: String,
    pub description: String,
    pub confidence: i64,
    pub meter: String,
    pub selected: bool,
    pub has_graph: bool,
    pub commands: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct OutcomeView {
    pub playbook_id: String,
    pub status: String,
    pub output: String,
    pub learned: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct EngagementCard {
    pub position: usize,
    pub id: String,
    pub target: String,
    pub when: String,
    pub services: Vec<String>,
    pub more: usize,
    pub playbooks: usize,
}

// ============================================================================
// Askama Templates
// ============================================================================

#[derive(Template)]
#[template(path = "recommendations.md")]
struct RecommendationsTemplate<'a> {
    cards: &'a [PlaybookCard],
}

#[derive(Template)]
#[template(path = "outcome.md")]
struct OutcomeTemplate<'a> {
    view: &'a OutcomeView,
}

#[derive(Template)]
#[template(path = "history.md")]
struct HistoryTemplate<'a> {
    cards: &'a [EngagementCard],
}

fn rendered(result: Result<String, askama::Error>) -> miette::Result<String> {
    result.map_err(|e| miette::miette!("template rendering failed: {}", e))
}

// ============================================================================
// View Building (Materialization)
// ============================================================================

fn confidence_meter(percent: i64) -> String {
    let filled = (percent.clamp(0, 100) as usize * METER_WIDTH).div_ceil(100);
    format!("{}{}", "█".repeat(filled), "░".repeat(METER_WIDTH - filled))
}

pub fn build_playbook_cards(view: &ViewState) -> Vec<PlaybookCard> {
    view.recommendations
        .iter()
        .enumerate()
        .map(|(i, pb)| PlaybookCard {
            position: i + 1,
            id: pb.id.clone(),
            name: pb.name.clone(),
            description: pb.description.clone(),
            confidence: pb.confidence_percent(),
            meter: confidence_meter(pb.confidence_percent()),
            selected: view.is_selected(&pb.id),
            has_graph: pb.visualization.is_some(),
            commands: pb.commands.clone(),
        })
        .collect()
}

pub fn build_outcome_view(outcome: &ExecutionOutcome) -> OutcomeView {
    let status = match outcome.success {
        Some(true) => "all commands succeeded",
        Some(false) => "some commands failed",
        None => "completed",
    };

    OutcomeView {
        playbook_id: outcome.playbook_id.clone(),
        status: status.to_string(),
        output: outcome.output.trim_end().to_string(),
        learned: outcome
            .learned_patterns
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

pub fn build_engagement_cards(history: &[EngagementRecord]) -> Vec<EngagementCard> {
    history
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let (shown, more) = record.service_preview(SERVICE_PREVIEW);

            EngagementCard {
                position: i + 1,
                id: record.id.clone(),
                target: record.target.clone(),
                when: record
                    .recorded_at()
                    .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| record.timestamp.clone()),
                services: shown
                    .iter()
                    .map(|s| format!("{} ({}) - {}", s.name, s.port, s.product))
                    .collect(),
                more,
                playbooks: record.results.len(),
            }
        })
        .collect()
}

// ============================================================================
// Rendering
// ============================================================================

pub fn recommendations_markdown(view: &ViewState) -> miette::Result<String> {
    let cards = build_playbook_cards(view);
    rendered(RecommendationsTemplate { cards: &cards }.render())
}

pub fn outcome_markdown(outcome: &ExecutionOutcome) -> miette::Result<String> {
    let view = build_outcome_view(outcome);
    rendered(OutcomeTemplate { view: &view }.render())
}

pub fn history_markdown(history: &[EngagementRecord]) -> miette::Result<String> {
    let cards = build_engagement_cards(history);
    rendered(HistoryTemplate { cards: &cards }.render())
}

pub fn print_markdown(markdown: &str) {
    let skin = MadSkin::default();
    skin.print_text(markdown);
}
