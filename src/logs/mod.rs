//! Step logs for failed builds
//!
//! Provides:
//! - The `LogFetcher` seam consulted by the card builder
//! - A Drone API client implementing it

mod drone;

pub use drone::{BuildInfo, BuildLog, BuildStage, BuildStep, DroneLogFetcher};

use async_trait::async_trait;

use crate::card::Fact;
use crate::error::LogFetchError;
use crate::pipeline::PipelineContext;

/// Retrieves per-step logs of a failed build as card facts
#[async_trait]
pub trait LogFetcher: Send + Sync {
    async fn fetch_logs(
        &self,
        pipeline: &PipelineContext,
        auth_token: &str,
    ) -> Result<Vec<Fact>, LogFetchError>;
}

/// Render log entries as `Command #<pos>: <proc>\nResult: <out>`, one per line
pub fn render_log_entries(entries: &[BuildLog]) -> String {
    entries
        .iter()
        .map(|entry| format!("Command #{}: {}\nResult: {}", entry.pos, entry.proc, entry.out))
        .collect::<Vec<_>>()
        .join("\n")
}
