use std::fmt::Display;

use clap::{Args as ClapArgs, ValueEnum as _};
use inquire::{Confirm, InquireError, Select, Text};
use miette::IntoDiagnostic as _;
use tracing::warn;

use super::Session;
use crate::{model::ScanDepth, orchestrator::ViewState, render};

#[derive(ClapArgs)]
pub struct Args {
    /// Scan depth preselected when analyzing a target
    #[arg(long, short, value_enum, default_value_t = ScanDepth::Normal)]
    pub depth: ScanDepth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Analyze,
    Execute,
    Refresh,
    Replay,
    Quit,
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Action::Analyze => "Analyze a target",
            Action::Execute => "Execute a recommended playbook",
            Action::Refresh => "Refresh engagement history",
            Action::Replay => "Replay a past engagement",
            Action::Quit => "Quit",
        };

        write!(f, "{label}")
    }
}

fn available_actions(view: &ViewState) -> Vec<Action> {
    let mut actions = vec![Action::Analyze];

    if !view.recommendations.is_empty() {
        actions.push(Action::Execute);
    }

    actions.push(Action::Refresh);

    if !view.history.is_empty() {
        actions.push(Action::Replay);
    }

    actions.push(Action::Quit);
    actions
}

/// Runs a blocking inquire prompt. Cancelling or interrupting it yields `None`.
fn ask<T>(prompt: impl FnOnce() -> Result<T, InquireError>) -> miette::Result<Option<T>> {
    match tokio::task::block_in_place(prompt) {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e).into_diagnostic(),
    }
}

async fn analyze(session: &Session, default_depth: ScanDepth) -> miette::Result<()> {
    let Some(target) = ask(|| Text::new("Target (domain or IP):").prompt())? else {
        return Ok(());
    };

    let depths = ScanDepth::value_variants();
    let cursor = depths.iter().position(|d| *d == default_depth).unwrap_or(0);

    let Some(depth) = ask(|| {
        Select::new("Scan depth:", depths.to_vec())
            .with_starting_cursor(cursor)
            .prompt()
    })?
    else {
        return Ok(());
    };

    let orchestrator = &session.orchestrator;
    orchestrator.analyze(&target, depth).await?;

    render::print_markdown(&render::recommendations_markdown(&orchestrator.snapshot())?);

    Ok(())
}

async fn execute(session: &Session) -> miette::Result<()> {
    let orchestrator = &session.orchestrator;
    let view = orchestrator.snapshot();

    let labels: Vec<String> = view
        .recommendations
        .iter()
        .map(|pb| format!("{} ({}%)", pb.name, pb.confidence_percent()))
        .collect();

    let Some(picked) = ask(|| Select::new("Playbook:", labels).raw_prompt())? else {
        return Ok(());
    };

    let Some(playbook) = view.recommendations.get(picked.index) else {
        return Ok(());
    };

    for command in &playbook.commands {
        println!("  $ {command}");
    }

    let question = format!("Run {} command(s) from {}?", playbook.commands.len(), playbook.name);
    let confirmed = ask(|| Confirm::new(&question).with_default(true).prompt())?;

    if confirmed != Some(true) {
        return Ok(());
    }

    let outcome = orchestrator
        .execute(&playbook.id, playbook.commands.clone())
        .await?;

    render::print_markdown(&render::outcome_markdown(&outcome)?);

    Ok(())
}

async fn refresh(session: &Session) -> miette::Result<()> {
    let orchestrator = &session.orchestrator;
    orchestrator.refresh_history(orchestrator.history_limit()).await?;

    render::print_markdown(&render::history_markdown(&orchestrator.snapshot().history)?);

    Ok(())
}

fn replay(session: &Session) -> miette::Result<()> {
    let orchestrator = &session.orchestrator;
    let view = orchestrator.snapshot();

    let labels: Vec<String> = render::build_engagement_cards(&view.history)
        .into_iter()
        .map(|card| format!("{} at {} [{}]", card.target, card.when, card.id))
        .collect();

    let Some(picked) = ask(|| Select::new("Engagement:", labels).raw_prompt())? else {
        return Ok(());
    };

    if let Some(record) = view.history.get(picked.index) {
        orchestrator.replay_selection(record);
    }

    Ok(())
}

async fn drive(args: &Args, session: &Session) -> miette::Result<()> {
    let orchestrator = &session.orchestrator;

    loop {
        let view = orchestrator.snapshot();

        if view.focus.is_some() {
            render::print_markdown(&render::recommendations_markdown(&view)?);
            orchestrator.acknowledge_focus();
        }

        let actions = available_actions(&view);

        let Some(action) = ask(|| Select::new("What next?", actions).prompt())? else {
            return Ok(());
        };

        let step = match action {
            Action::Analyze => analyze(session, args.depth).await,
            Action::Execute => execute(session).await,
            Action::Refresh => refresh(session).await,
            Action::Replay => replay(session),
            Action::Quit => return Ok(()),
        };

        // a failed step leaves the console usable
        if let Err(report) = step {
            eprintln!("{report:?}");
        }
    }
}

pub async fn run(args: Args, session: &Session) -> miette::Result<()> {
    let orchestrator = &session.orchestrator;

    if let Err(err) = orchestrator.refresh_history(orchestrator.history_limit()).await {
        warn!(error = %err, "initial history fetch failed");
    }

    let result = drive(&args, session).await;

    orchestrator.settle().await;

    result
}
