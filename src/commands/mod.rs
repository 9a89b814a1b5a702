use miette::IntoDiagnostic as _;
use serde::Serialize;

use crate::{
    cli::GlobalArgs,
    config::RootConfig,
    orchestrator::Orchestrator,
    render,
    service::HttpService,
};

pub mod analyze;
pub mod console;
pub mod execute;
pub mod history;
pub mod init;

/// Everything a command needs to talk to the engagement service.
pub struct Session {
    pub orchestrator: Orchestrator<HttpService>,
    pub json: bool,
}

impl Session {
    pub fn setup(global: &GlobalArgs) -> miette::Result<Self> {
        let mut config = RootConfig::discover(global.config.as_deref())?;

        if let Some(base_url) = &global.base_url {
            config.service.base_url = base_url.clone();
        }

        let service = HttpService::setup(&config.service)?;
        tracing::debug!(base_url = %service.base_url(), "engagement service configured");

        Ok(Self {
            orchestrator: Orchestrator::new(service, config.history.limit),
            json: global.json,
        })
    }

    /// Prints `value` as JSON when `--json` was given, or the markdown
    /// produced by `markdown` otherwise.
    pub fn present<T, F>(&self, value: &T, markdown: F) -> miette::Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce() -> miette::Result<String>,
    {
        if self.json {
            let json = serde_json::to_string_pretty(value).into_diagnostic()?;
            println!("{json}");
            return Ok(());
        }

        render::print_markdown(&markdown()?);
        Ok(())
    }
}
