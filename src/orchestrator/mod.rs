//! Engagement orchestration.
//!
//! The [`Orchestrator`] owns the [`ViewState`] and is the only thing that
//! mutates it. Analyze and Execute hold the busy flag for their whole call and
//! reject re-entry; history refreshes never take it, and their results always
//! replace the window wholesale, so when two refreshes race the last response
//! to arrive wins.

use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::{
    model::{EngagementRecord, ExecutionOutcome, ScanDepth, ScanRequest},
    service::{EngagementService, ServiceError},
};

mod state;


pub use state::{Focus, ViewState};

use state::{BusyGuard, SharedView};

#[derive(Debug, Error, Diagnostic)]
pub enum WorkflowError {
    #[error("another operation is still in progress")]
    #[diagnostic(
        code(engage::busy),
        help("wait for the running operation to finish before starting another one")
    )]
    Busy,

    #[error("invalid target '{0}'")]
    #[diagnostic(
        code(engage::invalid_target),
        help("use a domain name or IP address made of letters, digits, '.', '-' and '_'")
    )]
    InvalidTarget(String),

    #[error("playbook '{0}' is not part of the current recommendations")]
    #[diagnostic(code(engage::unknown_playbook))]
    UnknownPlaybook(String),

    #[error("history limit must be at least 1")]
    #[diagnostic(code(engage::invalid_limit))]
    InvalidLimit,

    #[error("operation did not complete")]
    #[diagnostic(code(engage::service))]
    Service(
        #[from]
        #[diagnostic_source]
        ServiceError,
    ),
}

fn validate_target(target: &str) -> Result<String, WorkflowError> {
    let target = target.trim();

    let valid = !target.is_empty()
        && target
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'));

    if !valid {
        return Err(WorkflowError::InvalidTarget(target.to_string()));
    }

    Ok(target.to_string())
}

pub struct Orchestrator<S> {
    service: Arc<S>,
    state: SharedView,
    background: TaskTracker,
    history_limit: usize,
}

impl<S> Clone for Orchestrator<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            state: self.state.clone(),
            background: self.background.clone(),
            history_limit: self.history_limit,
        }
    }
}

impl<S> Orchestrator<S>
where
    S: EngagementService + 'static,
{
    pub fn new(service: S, history_limit: usize) -> Self {
        Self {
            service: Arc::new(service),
            state: Arc::new(watch::Sender::new(ViewState::default())),
            background: TaskTracker::new(),
            history_limit,
        }
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// Submits `target` for analysis and, on success, replaces the
    /// recommendation set with the service's list in the order received.
    pub async fn analyze(&self, target: &str, depth: ScanDepth) -> Result<(), WorkflowError> {
        let target = validate_target(target)?;
        let _busy = BusyGuard::acquire(&self.state)?;

        let request = ScanRequest { target, depth };
        debug!(target = %request.target, %depth, "analysis started");

        match self.service.analyze(&request).await {
            Ok(recommendations) => {
                info!(
                    target = %request.target,
                    playbooks = recommendations.len(),
                    "analysis completed"
                );
                self.state
                    .send_modify(|view| view.replace_recommendations(recommendations));
                Ok(())
            }
            Err(err) => {
                error!(target = %request.target, error = %err, "analysis failed");
                Err(err.into())
            }
        }
    }

    /// Runs `commands` for `playbook_id`, which must belong to the current
    /// recommendation set. The commands are the ones captured when the
    /// playbook was picked, not re-read from the view.
    ///
    /// Whatever the result, a history refresh is spawned in the background;
    /// its failure never changes what this call returns.
    pub async fn execute(
        &self,
        playbook_id: &str,
        commands: Vec<String>,
    ) -> Result<ExecutionOutcome, WorkflowError> {
        let generation = self
            .generation_containing(playbook_id)
            .ok_or_else(|| WorkflowError::UnknownPlaybook(playbook_id.to_string()))?;

        let _busy = BusyGuard::acquire(&self.state)?;

        debug!(playbook_id, commands = commands.len(), "execution started");

        let result = match self.service.execute(playbook_id, &commands).await {
            Ok(response) => {
                let outcome = ExecutionOutcome::from_response(playbook_id, response);

                let applied = self.state.send_if_modified(|view| {
                    // the set was replayed from history while we were waiting
                    if view.generation() != generation {
                        return false;
                    }

                    view.record_outcome(outcome.clone());
                    true
                });

                if applied {
                    info!(playbook_id, "execution completed");
                } else {
                    warn!(
                        playbook_id,
                        "recommendations changed during execution, outcome not displayed"
                    );
                }

                Ok(outcome)
            }
            Err(err) => {
                error!(playbook_id, error = %err, "execution failed");
                Err(err.into())
            }
        };

        self.spawn_history_refresh();

        result
    }

    /// Replaces the history window with the `limit` most recent engagements.
    /// Does not take the busy flag.
    pub async fn refresh_history(&self, limit: usize) -> Result<(), WorkflowError> {
        if limit == 0 {
            return Err(WorkflowError::InvalidLimit);
        }

        match self.service.engagements(limit).await {
            Ok(mut records) => {
                records.truncate(limit);
                debug!(engagements = records.len(), "history refreshed");
                self.state.send_modify(|view| view.history = records);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "history refresh failed");
                Err(err.into())
            }
        }
    }

    /// Shows the recommendations stored with a past engagement. Purely local:
    /// no request is issued and the busy flag is not consulted.
    pub fn replay_selection(&self, record: &EngagementRecord) {
        info!(engagement = %record.id, target = %record.target, "replaying engagement");

        self.state.send_modify(|view| {
            view.replace_recommendations(record.results.clone());
            view.focus = Some(Focus::Recommendations);
        });
    }

    /// Called by the view once it has scrolled to the focused region.
    pub fn acknowledge_focus(&self) {
        self.state.send_if_modified(|view| view.focus.take().is_some());
    }

    /// Waits for every background history refresh spawned so far.
    ///
    /// Meant for a single caller at a time.
    pub async fn settle(&self) {
        self.background.close();
        self.background.wait().await;
        self.background.reopen();
    }

    fn generation_containing(&self, playbook_id: &str) -> Option<u64> {
        let view = self.state.borrow();
        view.playbook(playbook_id).is_some().then(|| view.generation())
    }

    fn spawn_history_refresh(&self) {
        let this = self.clone();

        self.background.spawn(async move {
            if this.refresh_history(this.history_limit).await.is_err() {
                debug!("background history refresh dropped");
            }
        });
    }
}
