//! Read-only snapshot of the CI build being reported on

use chrono::{DateTime, Utc};

/// Kind of event that triggered the build
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Event {
    #[default]
    Push,
    PullRequest,
    Tag,
    Other(String),
}

impl Event {
    pub fn as_str(&self) -> &str {
        match self {
            Event::Push => "push",
            Event::PullRequest => "pull_request",
            Event::Tag => "tag",
            Event::Other(s) => s,
        }
    }

    /// Whether the build points at a concrete commit diff
    pub fn has_commit_diff(&self) -> bool {
        matches!(self, Event::Push | Event::PullRequest)
    }
}

impl From<&str> for Event {
    fn from(s: &str) -> Self {
        match s {
            "push" => Event::Push,
            "pull_request" => Event::PullRequest,
            "tag" => Event::Tag,
            other => Event::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineContext {
    pub build: Build,
    pub commit: Commit,
    pub repo: Repo,
    pub system: System,
}

#[derive(Debug, Clone)]
pub struct Build {
    pub number: u64,
    pub status: String,
    pub event: Event,
    pub branch: String,
    pub tag: String,
    pub deploy_to: String,
    pub created: DateTime<Utc>,
    pub failed_steps: Vec<String>,
}

impl Default for Build {
    fn default() -> Self {
        Self {
            number: 0,
            status: String::new(),
            event: Event::default(),
            branch: String::new(),
            tag: String::new(),
            deploy_to: String::new(),
            created: Utc::now(),
            failed_steps: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Commit {
    pub author: Author,
    pub message: String,
    pub link: String,
    pub git_ref: String,
}

#[derive(Debug, Clone, Default)]
pub struct Author {
    pub name: String,
    pub email: String,
    pub username: String,
}

#[derive(Debug, Clone, Default)]
pub struct Repo {
    /// `owner/name`
    pub slug: String,
    pub link: String,
    pub owner: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct System {
    pub proto: String,
    pub host: String,
}
