use std::path::{Path, PathBuf};

use clap::Args as ClapArgs;
use inquire::{CustomType, Text};
use miette::IntoDiagnostic;

use crate::config::{
    CONFIG_FILE_NAME, DEFAULT_HISTORY_LIMIT, HistoryConfig, RootConfig, ServiceConfig,
};

#[derive(ClapArgs)]
pub struct Args {
    /// Use default values for all prompts
    #[arg(short, long)]
    pub yes: bool,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

fn prompt_config(defaults: RootConfig) -> miette::Result<RootConfig> {
    let base_url = Text::new("Engagement service address:")
        .with_default(&defaults.service.base_url)
        .prompt()
        .into_diagnostic()?;

    let limit = CustomType::<usize>::new("Engagements kept in the history window:")
        .with_default(DEFAULT_HISTORY_LIMIT)
        .with_error_message("Please type a positive number")
        .prompt()
        .into_diagnostic()?;

    Ok(RootConfig {
        service: ServiceConfig {
            base_url,
            ..defaults.service
        },
        history: HistoryConfig {
            limit: limit.max(1),
        },
    })
}

pub fn run(args: Args, explicit: Option<&Path>) -> miette::Result<()> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));

    if path.exists() && !args.force {
        miette::bail!(
            help = "pass --force to overwrite it",
            "{} already exists",
            path.display()
        );
    }

    let config = if args.yes {
        RootConfig::default()
    } else {
        prompt_config(RootConfig::default())?
    };

    config.save(&path)?;

    println!("wrote {}", path.display());

    Ok(())
}
