use crate::error::{NotifyError, Result};

/// Environment variable carrying a commit link override
pub const COMMIT_LINK_ENV: &str = "DRONE_COMMIT_LINK";

/// Suffix of the per-branch webhook variable, e.g. `main_teams_webhook`
const BRANCH_WEBHOOK_SUFFIX: &str = "_teams_webhook";

/// Looks up a named value from the environment.
///
/// The CLI passes the process environment; tests pass a map.
pub trait EnvLookup {
    fn lookup(&self, key: &str) -> Option<String>;
}

impl<F> EnvLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// Lookup backed by `std::env::var`
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Plugin settings, fixed before the card is built
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub webhook: String,
    /// Overrides the pipeline status when non-empty
    pub status: String,
    /// Raw `name:value` strings
    pub custom_facts: Vec<String>,
    pub logs: LogSettings,
    /// Commit link used when the pipeline carries none
    pub commit_link_override: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LogSettings {
    pub on_error: bool,
    pub auth_token: String,
    /// CI API base URL, `https://{system.host}` when unset
    pub server: Option<String>,
}

impl LogSettings {
    /// Logs are only fetched when asked for and a token is available
    pub fn enabled(&self) -> bool {
        self.on_error && !self.auth_token.is_empty()
    }
}

impl Settings {
    /// Resolve the webhook endpoint and the commit-link override.
    ///
    /// An empty webhook falls back to `{branch}_teams_webhook`.
    pub fn validate(&mut self, branch: &str, env: &dyn EnvLookup) -> Result<()> {
        if self.webhook.is_empty() {
            let key = format!("{}{}", branch, BRANCH_WEBHOOK_SUFFIX);
            match env.lookup(&key).filter(|v| !v.is_empty()) {
                Some(webhook) => {
                    tracing::debug!(variable = %key, "Using branch webhook");
                    self.webhook = webhook;
                }
                None => {
                    return Err(NotifyError::Configuration(
                        "no webhook endpoint provided".to_string(),
                    ))
                }
            }
        }

        tracing::debug!(host = %webhook_host(&self.webhook), "Webhook endpoint resolved");

        if self.commit_link_override.is_none() {
            self.commit_link_override = env.lookup(COMMIT_LINK_ENV).filter(|v| !v.is_empty());
        }

        Ok(())
    }

    /// The override if set, otherwise the pipeline's own status
    pub fn effective_status<'a>(&'a self, pipeline_status: &'a str) -> &'a str {
        if self.status.is_empty() {
            pipeline_status
        } else {
            &self.status
        }
    }
}

/// Host part of a webhook URL; the full URL embeds the connector secret
pub fn webhook_host(webhook: &str) -> String {
    reqwest::Url::parse(webhook)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "<invalid url>".to_string())
}
