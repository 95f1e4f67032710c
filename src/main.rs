use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::builder::BoolishValueParser;
use clap::{Args, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use teams_notify::config::{LogSettings, ProcessEnv, Settings};
use teams_notify::pipeline::{Author, Build, Commit, Event, PipelineContext, Repo, System};
use teams_notify::Plugin;

#[derive(Parser)]
#[command(name = "teams-notify")]
#[command(about = "Post CI build notifications to a Microsoft Teams webhook")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    plugin: PluginArgs,

    #[command(flatten)]
    build: BuildArgs,

    #[command(flatten)]
    commit: CommitArgs,

    #[command(flatten)]
    repo: RepoArgs,

    /// Log filter when RUST_LOG is not set
    #[arg(long, env = "PLUGIN_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Args)]
struct PluginArgs {
    /// MS teams connector webhook endpoint
    #[arg(long, env = "PLUGIN_WEBHOOK", default_value = "")]
    webhook: String,

    /// Overwrite the status value
    #[arg(long, env = "PLUGIN_STATUS", default_value = "")]
    status: String,

    /// Add custom facts to the card, as name:value
    #[arg(long = "facts", env = "PLUGIN_FACTS", value_delimiter = ',')]
    facts: Vec<String>,

    /// Display logs on error
    #[arg(long, env = "PLUGIN_LOGS_ON_ERROR", value_parser = BoolishValueParser::new())]
    logs_on_error: bool,

    /// Auth token to read the logs
    #[arg(long, env = "PLUGIN_LOGS_AUTH_TOKEN", default_value = "", hide_env_values = true)]
    logs_auth_token: String,

    /// CI server API base URL (default: https://DRONE_SYSTEM_HOST)
    #[arg(long, env = "PLUGIN_LOGS_SERVER")]
    logs_server: Option<String>,
}

#[derive(Args)]
struct BuildArgs {
    #[arg(long, env = "DRONE_BUILD_NUMBER", default_value_t = 0)]
    build_number: u64,

    #[arg(long, env = "DRONE_BUILD_STATUS", default_value = "")]
    build_status: String,

    #[arg(long, env = "DRONE_BUILD_EVENT", default_value = "")]
    build_event: String,

    #[arg(long, env = "DRONE_BRANCH", default_value = "")]
    branch: String,

    #[arg(long, env = "DRONE_TAG", default_value = "")]
    tag: String,

    #[arg(long, env = "DRONE_DEPLOY_TO", default_value = "")]
    deploy_to: String,

    /// Unix timestamp of build creation
    #[arg(long, env = "DRONE_BUILD_CREATED")]
    build_created: Option<i64>,

    #[arg(long, env = "DRONE_FAILED_STEPS", value_delimiter = ',')]
    failed_steps: Vec<String>,

    #[arg(long, env = "DRONE_SYSTEM_PROTO", default_value = "https")]
    system_proto: String,

    #[arg(long, env = "DRONE_SYSTEM_HOST", default_value = "")]
    system_host: String,
}

#[derive(Args)]
struct CommitArgs {
    #[arg(long, env = "DRONE_COMMIT_AUTHOR_NAME", default_value = "")]
    commit_author_name: String,

    #[arg(long, env = "DRONE_COMMIT_AUTHOR_EMAIL", default_value = "")]
    commit_author_email: String,

    #[arg(long, env = "DRONE_COMMIT_AUTHOR", default_value = "")]
    commit_author: String,

    #[arg(long, env = "DRONE_COMMIT_MESSAGE", default_value = "")]
    commit_message: String,

    #[arg(long, env = "DRONE_COMMIT_LINK", default_value = "")]
    commit_link: String,

    #[arg(long, env = "DRONE_COMMIT_REF", default_value = "")]
    commit_ref: String,
}

#[derive(Args)]
struct RepoArgs {
    /// Repository slug, owner/name
    #[arg(long, env = "DRONE_REPO", default_value = "")]
    repo: String,

    #[arg(long, env = "DRONE_REPO_LINK", default_value = "")]
    repo_link: String,

    #[arg(long, env = "DRONE_REPO_OWNER", default_value = "")]
    repo_owner: String,

    #[arg(long, env = "DRONE_REPO_NAME", default_value = "")]
    repo_name: String,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            webhook: self.plugin.webhook.clone(),
            status: self.plugin.status.clone(),
            custom_facts: self.plugin.facts.clone(),
            logs: LogSettings {
                on_error: self.plugin.logs_on_error,
                auth_token: self.plugin.logs_auth_token.clone(),
                server: self.plugin.logs_server.clone(),
            },
            commit_link_override: None,
        }
    }

    fn pipeline(&self) -> PipelineContext {
        let created = self
            .build
            .build_created
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);

        PipelineContext {
            build: Build {
                number: self.build.build_number,
                status: self.build.build_status.clone(),
                event: Event::from(self.build.build_event.as_str()),
                branch: self.build.branch.clone(),
                tag: self.build.tag.clone(),
                deploy_to: self.build.deploy_to.clone(),
                created,
                failed_steps: self
                    .build
                    .failed_steps
                    .iter()
                    .filter(|s| !s.is_empty())
                    .cloned()
                    .collect(),
            },
            commit: Commit {
                author: Author {
                    name: self.commit.commit_author_name.clone(),
                    email: self.commit.commit_author_email.clone(),
                    username: self.commit.commit_author.clone(),
                },
                message: self.commit.commit_message.clone(),
                link: self.commit.commit_link.clone(),
                git_ref: self.commit.commit_ref.clone(),
            },
            repo: Repo {
                slug: self.repo.repo.clone(),
                link: self.repo.repo_link.clone(),
                owner: self.repo.repo_owner.clone(),
                name: self.repo.repo_name.clone(),
            },
            system: System {
                proto: self.build.system_proto.clone(),
                host: self.build.system_host.clone(),
            },
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mut plugin = Plugin::new(cli.settings(), cli.pipeline());
    plugin.validate(&ProcessEnv)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(plugin.execute())?;

    Ok(())
}
