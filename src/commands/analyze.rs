use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use clap::Args as ClapArgs;
use miette::{Context as _, IntoDiagnostic as _};
use tracing::{debug, warn};

use super::Session;
use crate::{
    model::{PlaybookRecommendation, ScanDepth},
    render,
};

#[derive(ClapArgs)]
pub struct Args {
    /// Domain or IP address to analyze
    pub target: String,

    /// How thoroughly the backend scans the target
    #[arg(long, short, value_enum, default_value_t = ScanDepth::Normal)]
    pub depth: ScanDepth,

    /// Directory where attack graph visualizations are written as PNG files
    #[arg(long)]
    pub save_graphs: Option<PathBuf>,
}

/// File name for a playbook's graph, unique among the names already in `taken`.
fn graph_file_name(playbook_id: &str, taken: &mut HashSet<String>) -> String {
    let stem: String = playbook_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut name = format!("{stem}.png");
    let mut suffix = 2;

    while !taken.insert(name.clone()) {
        name = format!("{stem}-{suffix}.png");
        suffix += 1;
    }

    name
}

/// Writes each decodable visualization to `dir`, returning how many were saved.
pub fn save_graphs(
    dir: &Path,
    recommendations: &[PlaybookRecommendation],
) -> miette::Result<usize> {
    std::fs::create_dir_all(dir)
        .into_diagnostic()
        .with_context(|| format!("creating {}", dir.display()))?;

    let mut saved = 0;
    let mut taken = HashSet::new();

    for pb in recommendations {
        let png = match pb.visualization_png() {
            Ok(Some(png)) => png,
            Ok(None) => continue,
            Err(e) => {
                warn!(playbook_id = %pb.id, error = %e, "skipping undecodable visualization");
                continue;
            }
        };

        let file_name = graph_file_name(&pb.id, &mut taken);
        if file_name != format!("{}.png", pb.id) {
            warn!(playbook_id = %pb.id, %file_name, "graph saved under a different file name");
        }

        let path = dir.join(file_name);
        std::fs::write(&path, png)
            .into_diagnostic()
            .with_context(|| format!("writing {}", path.display()))?;

        debug!(path = %path.display(), "visualization saved");
        saved += 1;
    }

    Ok(saved)
}

pub async fn run(args: Args, session: &Session) -> miette::Result<()> {
    let orchestrator = &session.orchestrator;

    orchestrator.analyze(&args.target, args.depth).await?;

    let view = orchestrator.snapshot();

    if let Some(dir) = &args.save_graphs {
        let saved = save_graphs(dir, &view.recommendations)?;
        eprintln!("saved {} visualization(s) to {}", saved, dir.display());
    }

    session.present(&view.recommendations, || render::recommendations_markdown(&view))
}
