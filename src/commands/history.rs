use clap::Args as ClapArgs;

use super::Session;
use crate::render;

#[derive(ClapArgs)]
pub struct Args {
    /// Number of engagements to show (defaults to the configured history limit)
    #[arg(long, short)]
    pub limit: Option<usize>,
}

pub async fn run(args: Args, session: &Session) -> miette::Result<()> {
    let orchestrator = &session.orchestrator;
    let limit = args.limit.unwrap_or_else(|| orchestrator.history_limit());

    orchestrator.refresh_history(limit).await?;

    let view = orchestrator.snapshot();

    session.present(&view.history, || render::history_markdown(&view.history))
}
