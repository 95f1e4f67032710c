//! Drone REST API client for build logs

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{render_log_entries, LogFetcher};
use crate::card::Fact;
use crate::error::LogFetchError;
use crate::pipeline::PipelineContext;

const SUCCESS: &str = "success";

/// Build detail as returned by `GET /api/repos/{owner}/{name}/builds/{number}`
#[derive(Debug, Clone, Deserialize)]
pub struct BuildInfo {
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub stages: Vec<BuildStage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildStage {
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "exitCode", alias = "ExitCode")]
    pub exit_code: i32,
    #[serde(default)]
    pub steps: Vec<BuildStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildStep {
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "exitCode", alias = "ExitCode")]
    pub exit_code: i32,
}

/// One captured command of a step log
#[derive(Debug, Clone, Deserialize)]
pub struct BuildLog {
    #[serde(default)]
    pub proc: String,
    #[serde(default)]
    pub pos: i64,
    #[serde(default)]
    pub out: String,
}

/// Fetches failed step logs from the Drone server that ran the build
pub struct DroneLogFetcher {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl DroneLogFetcher {
    /// Share `client` with the rest of the run so requests reuse its pool
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: None,
        }
    }

    /// Talk to `base_url` instead of `https://{system.host}`
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    fn build_url(&self, pipeline: &PipelineContext) -> String {
        let base = match self.base_url {
            Some(ref base) => base.clone(),
            None => format!("https://{}", pipeline.system.host),
        };
        format!(
            "{}/api/repos/{}/{}/builds/{}",
            base, pipeline.repo.owner, pipeline.repo.name, pipeline.build.number
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        auth_token: &str,
    ) -> Result<T, LogFetchError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(auth_token)
            .send()
            .await
            .map_err(|source| LogFetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(LogFetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| LogFetchError::Request {
                url: url.to_string(),
                source,
            })?;

        serde_json::from_slice(&body).map_err(|source| LogFetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl LogFetcher for DroneLogFetcher {
    async fn fetch_logs(
        &self,
        pipeline: &PipelineContext,
        auth_token: &str,
    ) -> Result<Vec<Fact>, LogFetchError> {
        let mut logs = Vec::new();

        if pipeline.build.failed_steps.is_empty() {
            return Ok(logs);
        }

        let build_url = self.build_url(pipeline);
        let info: BuildInfo = self.get_json(&build_url, auth_token).await.map_err(|e| {
            tracing::error!(url = %build_url, error = ?e, "Failed to get build info");
            e
        })?;

        // The server may already have moved past the failure we were told about
        if info.status == SUCCESS {
            return Ok(logs);
        }

        for stage in info.stages.iter().filter(|s| s.status != SUCCESS) {
            for step in stage.steps.iter().filter(|s| s.exit_code != 0) {
                let log_url = format!("{}/logs/{}/{}", build_url, stage.number, stage.number);

                let entries: Vec<BuildLog> =
                    self.get_json(&log_url, auth_token).await.map_err(|e| {
                        tracing::error!(
                            repo = %pipeline.repo.slug,
                            build = pipeline.build.number,
                            stage = %stage.name,
                            step = %step.name,
                            error = ?e,
                            "Failed to get log"
                        );
                        e
                    })?;

                logs.push(Fact::new(
                    format!("Log for {}/{}", stage.name, step.name),
                    render_log_entries(&entries),
                ));
            }
        }

        Ok(logs)
    }
}
