use chrono::{DateTime, Duration, Utc};

use super::{Action, Fact, MessageCard, Section, ThemeColor, CARD_CONTEXT, CARD_TYPE};
use crate::config::Settings;
use crate::logs::LogFetcher;
use crate::pipeline::{Event, PipelineContext};

pub const DEFAULT_ACTIVITY_IMAGE: &str =
    "https://github.com/uchugroup/drone-teams/raw/master/drone.png";

const FAILURE: &str = "failure";

/// Assembles the notification card for one build.
///
/// Assembly never fails: enrichments that can go wrong (custom facts, step
/// logs) are left out instead.
pub struct CardBuilder<'a> {
    pipeline: &'a PipelineContext,
    settings: &'a Settings,
    now: DateTime<Utc>,
}

impl<'a> CardBuilder<'a> {
    pub fn new(pipeline: &'a PipelineContext, settings: &'a Settings) -> Self {
        Self {
            pipeline,
            settings,
            now: Utc::now(),
        }
    }

    /// Measure build time against `now` instead of the wall clock
    #[cfg(test)]
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    fn status(&self) -> &str {
        self.settings.effective_status(&self.pipeline.build.status)
    }

    pub async fn build(&self, fetcher: &dyn LogFetcher) -> MessageCard {
        let status = self.status();
        let mut facts = self.base_facts();
        let mut actions = self.base_actions();

        if status == FAILURE {
            facts.push(Fact::new(
                "Failed Build Steps",
                self.pipeline.build.failed_steps.join(" "),
            ));

            facts.extend(self.fetch_logs(fetcher).await);

            actions.push(Action::open_uri("Open build pipeline", self.pipeline_link()));
        }

        let card = MessageCard {
            card_type: CARD_TYPE.to_string(),
            context: CARD_CONTEXT.to_string(),
            theme_color: ThemeColor::for_status(status).hex().to_string(),
            summary: self.pipeline.repo.slug.clone(),
            sections: vec![Section {
                activity_image: DEFAULT_ACTIVITY_IMAGE.to_string(),
                activity_title: self.activity_title(),
                activity_subtitle: status.to_uppercase(),
                activity_text: self.activity_text(),
                facts,
                markdown: false,
            }],
            potential_action: actions,
        };

        tracing::info!(
            repo = %card.summary,
            status = %status,
            facts = card.facts().len(),
            actions = card.potential_action.len(),
            "Generated card"
        );

        card
    }

    /// Build number, author, commit message, then user-supplied facts
    fn base_facts(&self) -> Vec<Fact> {
        let build = &self.pipeline.build;
        let commit = &self.pipeline.commit;

        let mut facts = vec![
            Fact::new("Build Number", build.number.to_string()),
            Fact::new(
                "Git Author",
                format!(
                    "{} \"{}\" ({})",
                    commit.author.name, commit.author.email, commit.author.username
                ),
            ),
        ];

        if !commit.message.is_empty() {
            facts.push(Fact::new("Commit Message", commit.message.clone()));
        }

        for raw in &self.settings.custom_facts {
            match parse_custom_fact(raw) {
                Some(fact) => facts.push(fact),
                None => tracing::debug!(fact = %raw, "Skipping malformed custom fact"),
            }
        }

        facts
    }

    fn base_actions(&self) -> Vec<Action> {
        let repo_link = &self.pipeline.repo.link;
        let mut actions = vec![Action::open_uri("Open repository", repo_link.clone())];

        let event = &self.pipeline.build.event;
        if event.has_commit_diff() {
            if let Some(link) = self.commit_link() {
                actions.push(Action::open_uri("Open commit diff", link));
            }
        } else if *event == Event::Tag {
            actions.push(Action::open_uri("Open tag list", format!("{}/tags", repo_link)));
        }

        actions
    }

    fn commit_link(&self) -> Option<String> {
        let link = &self.pipeline.commit.link;
        if !link.is_empty() {
            return Some(link.clone());
        }
        self.settings
            .commit_link_override
            .as_ref()
            .filter(|l| !l.is_empty())
            .cloned()
    }

    async fn fetch_logs(&self, fetcher: &dyn LogFetcher) -> Vec<Fact> {
        let logs = &self.settings.logs;
        if !logs.enabled() {
            return Vec::new();
        }

        match fetcher.fetch_logs(self.pipeline, &logs.auth_token).await {
            Ok(facts) => facts,
            Err(e) => {
                tracing::warn!(error = ?e, "Leaving step logs out of the card");
                Vec::new()
            }
        }
    }

    fn pipeline_link(&self) -> String {
        format!(
            "{}://{}/{}/{}",
            self.pipeline.system.proto,
            self.pipeline.system.host,
            self.pipeline.repo.slug,
            self.pipeline.build.number
        )
    }

    fn activity_title(&self) -> String {
        let build = &self.pipeline.build;
        format!("{} ({}{})", self.pipeline.repo.slug, build.branch, build.tag)
    }

    fn activity_text(&self) -> String {
        let build = &self.pipeline.build;
        format!(
            "{} {} {} (build time {})",
            build.event,
            build.deploy_to,
            self.pipeline.commit.git_ref,
            format_elapsed(self.now - build.created)
        )
    }
}

/// Parse a `name:value` custom fact.
///
/// Splits on the first colon only, so values may themselves contain colons
/// (URLs, timestamps). Strings without a colon yield nothing.
pub fn parse_custom_fact(raw: &str) -> Option<Fact> {
    raw.split_once(':').map(|(name, value)| Fact::new(name, value))
}

/// Render a duration rounded to whole seconds, e.g. `1h2m3s`, `4m0s`, `12s`
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.num_milliseconds();
    let negative = millis < 0;
    let total = (millis.unsigned_abs() + 500) / 1000;

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let body = if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    };

    if negative && total > 0 {
        format!("-{}", body)
    } else {
        body
    }
}
