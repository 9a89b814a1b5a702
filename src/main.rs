use clap::Parser;
use miette::Result;
use tracing::Level;

use engage::{
    cli::{Cli, Commands},
    commands::{self, Session},
};

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    let global = &cli.global;

    match cli.command {
        Commands::Init(args) => commands::init::run(args, global.config.as_deref()),
        Commands::Analyze(args) => commands::analyze::run(args, &Session::setup(global)?).await,
        Commands::Execute(args) => commands::execute::run(args, &Session::setup(global)?).await,
        Commands::History(args) => commands::history::run(args, &Session::setup(global)?).await,
        Commands::Console(args) => commands::console::run(args, &Session::setup(global)?).await,
    }
}
