use clap::Args as ClapArgs;
use tracing::debug;

use super::Session;
use crate::{
    model::{EngagementRecord, ScanDepth},
    orchestrator::WorkflowError,
    render,
};

#[derive(ClapArgs)]
pub struct Args {
    /// Id of the playbook to execute
    pub playbook_id: String,

    /// Analyze this target first and pick the playbook from its recommendations
    #[arg(long, conflicts_with = "engagement")]
    pub target: Option<String>,

    /// Scan depth used together with --target
    #[arg(long, short, value_enum, default_value_t = ScanDepth::Normal)]
    pub depth: ScanDepth,

    /// Replay this past engagement and pick the playbook from its results
    #[arg(long)]
    pub engagement: Option<String>,
}

fn pick_engagement<'a>(
    history: &'a [EngagementRecord],
    engagement: Option<&str>,
    playbook_id: &str,
) -> miette::Result<&'a EngagementRecord> {
    let found = match engagement {
        Some(id) => history.iter().find(|record| record.id == id),
        None => history
            .iter()
            .find(|record| record.playbook(playbook_id).is_some()),
    };

    match (found, engagement) {
        (Some(record), _) => Ok(record),
        (None, Some(id)) => Err(miette::miette!(
            help = "run `engage history` to list the engagements in the window",
            "engagement '{}' is not in the recent history",
            id
        )),
        (None, None) => Err(miette::miette!(
            help = "pass --target to analyze a target first",
            "no recent engagement recommends playbook '{}'",
            playbook_id
        )),
    }
}

pub async fn run(args: Args, session: &Session) -> miette::Result<()> {
    let orchestrator = &session.orchestrator;

    match &args.target {
        Some(target) => orchestrator.analyze(target, args.depth).await?,
        None => {
            orchestrator
                .refresh_history(orchestrator.history_limit())
                .await?;

            let view = orchestrator.snapshot();
            let record =
                pick_engagement(&view.history, args.engagement.as_deref(), &args.playbook_id)?;

            debug!(engagement = %record.id, "recommendations taken from history");
            orchestrator.replay_selection(record);
            orchestrator.acknowledge_focus();
        }
    }

    let commands = orchestrator
        .snapshot()
        .playbook(&args.playbook_id)
        .map(|pb| pb.commands.clone())
        .ok_or_else(|| WorkflowError::UnknownPlaybook(args.playbook_id.clone()))?;

    let result = orchestrator.execute(&args.playbook_id, commands).await;

    // let the trailing history refresh land before the process exits
    orchestrator.settle().await;

    let outcome = result?;

    session.present(&outcome, || render::outcome_markdown(&outcome))
}
