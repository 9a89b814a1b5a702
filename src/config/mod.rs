use miette::{Context as _, IntoDiagnostic as _};
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod model;

pub use model::*;

pub const CONFIG_FILE_NAME: &str = "engage.toml";

impl RootConfig {
    pub fn load(path: &Path) -> miette::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .with_context(|| format!("reading config file {}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .into_diagnostic()
            .with_context(|| format!("parsing config file {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("checking config file {}", path.display()))?;

        Ok(config)
    }

    fn validate(&self) -> miette::Result<()> {
        if self.history.limit == 0 {
            miette::bail!(
                help = "set `limit` under [history] to 1 or more, or remove it",
                "history limit must be at least 1"
            );
        }

        Ok(())
    }

    pub fn save(&self, path: &Path) -> miette::Result<()> {
        let contents = toml::to_string_pretty(self).into_diagnostic()?;
        std::fs::write(path, contents)
            .into_diagnostic()
            .with_context(|| format!("saving config file {}", path.display()))?;
        Ok(())
    }

    /// Loads the first config found in the current directory or the user
    /// config directory, or the defaults when neither exists.
    pub fn discover(explicit: Option<&Path>) -> miette::Result<Self> {
        if let Some(path) = explicit {
            if !path.is_file() {
                miette::bail!("config file {} not found", path.display());
            }

            return Self::load(path);
        }

        for candidate in candidate_paths()? {
            if candidate.is_file() {
                debug!(path = %candidate.display(), "loading config");
                return Self::load(&candidate);
            }
        }

        debug!("no config file found, using defaults");
        Ok(Self::default())
    }
}

fn candidate_paths() -> miette::Result<Vec<PathBuf>> {
    let mut paths = vec![
        std::env::current_dir()
            .into_diagnostic()?
            .join(CONFIG_FILE_NAME),
    ];

    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("engage").join("config.toml"));
    }

    Ok(paths)
}
