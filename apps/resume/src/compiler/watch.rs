use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::compiler::build::Builder;

pub const WATCHED_EXTENSIONS: &[&str] = &["tex", "sty", "bib"];
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Newest modification time among files under `dir` with one of `exts`.
pub fn latest_mtime(dir: &Path, exts: &[&str]) -> Option<SystemTime> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| exts.contains(&e))
        })
        .filter_map(|entry| entry.metadata().ok()?.modified().ok())
        .max()
}

/// Builds once, then rebuilds whenever a watched source changes, until
/// Ctrl-C. Only a successful build advances the build watermark; a failed
/// build is retried on the next change.
pub async fn watch(builder: &Builder, clean: bool) -> anyhow::Result<()> {
    let dir = builder.resume_dir().to_path_buf();
    info!("Watching {} for changes (Ctrl-C to stop)", dir.display());

    let mut built = None;
    let mut attempted = latest_mtime(&dir, WATCHED_EXTENSIONS);
    if run_once(builder, clean).await {
        built = attempted;
    }
    let mut interval = tokio::time::interval(POLL_INTERVAL);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watch");
                return Ok(());
            }
            _ = interval.tick() => {
                let latest = latest_mtime(&dir, WATCHED_EXTENSIONS);
                if !needs_rebuild(latest, built, attempted) {
                    continue;
                }
                info!("Change detected, rebuilding");
                attempted = latest;
                if run_once(builder, false).await {
                    built = latest;
                }
            }
        }
    }
}

/// A source newer than the last successful build that has not already
/// failed at this exact state.
fn needs_rebuild(
    latest: Option<SystemTime>,
    built: Option<SystemTime>,
    attempted: Option<SystemTime>,
) -> bool {
    latest.is_some() && latest > built && latest > attempted
}

async fn run_once(builder: &Builder, clean: bool) -> bool {
    match builder.build(clean).await {
        Ok(report) if report.success => true,
        Ok(report) => {
            warn!("Build failed:\n{}", report.output.diagnostics());
            false
        }
        Err(e) => {
            error!("Build error: {e}");
            false
        }
    }
}
