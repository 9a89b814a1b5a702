use std::sync::Arc;

use tokio::sync::watch;

use super::WorkflowError;
use crate::model::{EngagementRecord, ExecutionOutcome, PlaybookRecommendation};

/// Region of the console the view should bring into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Recommendations,
}

/// Snapshot of everything the console displays.
///
/// `selected` and `outcome` only ever change together: when one is set the
/// other carries the same playbook id, and replacing `recommendations` clears
/// both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub busy: bool,
    pub recommendations: Vec<PlaybookRecommendation>,
    pub selected: Option<String>,
    pub outcome: Option<ExecutionOutcome>,
    pub history: Vec<EngagementRecord>,
    pub focus: Option<Focus>,
    generation: u64,
}

impl ViewState {
    pub fn playbook(&self, playbook_id: &str) -> Option<&PlaybookRecommendation> {
        self.recommendations.iter().find(|pb| pb.id == playbook_id)
    }

    pub fn is_selected(&self, playbook_id: &str) -> bool {
        self.selected.as_deref() == Some(playbook_id)
    }

    /// Bumped every time the recommendation set is replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(super) fn replace_recommendations(&mut self, recommendations: Vec<PlaybookRecommendation>) {
        self.recommendations = recommendations;
        self.selected = None;
        self.outcome = None;
        self.generation += 1;
    }

    pub(super) fn record_outcome(&mut self, outcome: ExecutionOutcome) {
        self.selected = Some(outcome.playbook_id.clone());
        self.outcome = Some(outcome);
    }
}

pub(super) type SharedView = Arc<watch::Sender<ViewState>>;

/// Holds the busy flag for the lifetime of one workflow call. The flag is
/// cleared on drop, so early returns, errors and dropped futures all release it.
pub(super) struct BusyGuard {
    state: SharedView,
}

impl BusyGuard {
    pub(super) fn acquire(state: &SharedView) -> Result<Self, WorkflowError> {
        let acquired = state.send_if_modified(|view| {
            if view.busy {
                return false;
            }

            view.busy = true;
            true
        });

        if !acquired {
            return Err(WorkflowError::Busy);
        }

        Ok(Self {
            state: state.clone(),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.state.send_modify(|view| view.busy = false);
    }
}
