use crate::card::CardBuilder;
use crate::config::{EnvLookup, Settings};
use crate::error::Result;
use crate::logs::{DroneLogFetcher, LogFetcher};
use crate::notifications::send_teams_card;
use crate::pipeline::PipelineContext;

/// One notification run: validate, build the card, deliver it
pub struct Plugin {
    settings: Settings,
    pipeline: PipelineContext,
    client: reqwest::Client,
    fetcher: Box<dyn LogFetcher>,
}

impl Plugin {
    pub fn new(settings: Settings, pipeline: PipelineContext) -> Self {
        let client = reqwest::Client::new();
        let mut drone = DroneLogFetcher::new(client.clone());
        if let Some(ref server) = settings.logs.server {
            drone = drone.with_base_url(server.clone());
        }
        let fetcher = Box::new(drone);
        Self {
            settings,
            pipeline,
            client,
            fetcher,
        }
    }

    pub fn with_log_fetcher(mut self, fetcher: Box<dyn LogFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn validate(&mut self, env: &dyn EnvLookup) -> Result<()> {
        self.settings.validate(&self.pipeline.build.branch, env)
    }

    pub async fn execute(&self) -> Result<()> {
        let card = CardBuilder::new(&self.pipeline, &self.settings)
            .build(self.fetcher.as_ref())
            .await;

        send_teams_card(&self.client, &self.settings.webhook, &card).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Fact;
    use crate::config::LogSettings;
    use crate::error::{LogFetchError, NotifyError};
    use crate::pipeline::{Build, Event, Repo};
    use crate::test_support::{refused_url, spawn_server};
    use async_trait::async_trait;
    use axum::extract::State;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    struct UnreachableCi;

    #[async_trait]
    impl LogFetcher for UnreachableCi {
        async fn fetch_logs(
            &self,
            _pipeline: &PipelineContext,
            _auth_token: &str,
        ) -> std::result::Result<Vec<Fact>, LogFetchError> {
            let source = serde_json::from_str::<Vec<u8>>("<html>").unwrap_err();
            Err(LogFetchError::Decode {
                url: "https://drone.example.com/api".to_string(),
                source,
            })
        }
    }

    type Cards = Arc<Mutex<Vec<Value>>>;

    async fn webhook() -> (String, Cards) {
        let cards = Cards::default();
        let router = Router::new()
            .route(
                "/hook",
                post(|State(cards): State<Cards>, Json(card): Json<Value>| async move {
                    cards.lock().unwrap().push(card);
                    "1"
                }),
            )
            .with_state(cards.clone());
        (format!("{}/hook", spawn_server(router).await), cards)
    }

    fn pipeline(status: &str) -> PipelineContext {
        PipelineContext {
            build: Build {
                number: 42,
                status: status.to_string(),
                event: Event::Push,
                branch: "main".to_string(),
                failed_steps: vec!["build".to_string(), "test".to_string()],
                ..Default::default()
            },
            repo: Repo {
                slug: "acme/widgets".to_string(),
                link: "https://git.example.com/acme/widgets".to_string(),
                owner: "acme".to_string(),
                name: "widgets".to_string(),
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_success_card_delivered() {
        let (url, cards) = webhook().await;
        let settings = Settings {
            webhook: url,
            custom_facts: vec!["env:prod".to_string()],
            ..Default::default()
        };

        Plugin::new(settings, pipeline("success")).execute().await.unwrap();

        let cards = cards.lock().unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0]["themeColor"], "96FF33");
        let facts = cards[0]["sections"][0]["facts"].as_array().unwrap();
        assert_eq!(facts[0]["value"], "42");
        assert_eq!(facts.last().unwrap()["name"], "env");
    }

    #[tokio::test]
    async fn test_log_fetch_failure_still_delivers() {
        let (url, cards) = webhook().await;
        let settings = Settings {
            webhook: url,
            logs: LogSettings {
                on_error: true,
                auth_token: "secret".to_string(),
                server: None,
            },
            ..Default::default()
        };

        Plugin::new(settings, pipeline("failure"))
            .with_log_fetcher(Box::new(UnreachableCi))
            .execute()
            .await
            .unwrap();

        let cards = cards.lock().unwrap();
        assert_eq!(cards[0]["themeColor"], "FF5733");
        let facts = cards[0]["sections"][0]["facts"].as_array().unwrap();
        assert_eq!(facts.last().unwrap()["name"], "Failed Build Steps");
        assert_eq!(facts.last().unwrap()["value"], "build test");
    }

    #[tokio::test]
    async fn test_failure_card_carries_logs_from_configured_server() {
        let (url, cards) = webhook().await;
        let ci = Router::new()
            .route(
                "/api/repos/acme/widgets/builds/42",
                get(|| async {
                    Json(json!({
                        "number": 42,
                        "status": "failure",
                        "stages": [{
                            "number": 1,
                            "name": "default",
                            "status": "failure",
                            "steps": [{ "number": 2, "name": "test", "exit_code": 1 }]
                        }]
                    }))
                }),
            )
            .route(
                "/api/repos/acme/widgets/builds/42/logs/1/1",
                get(|| async { Json(json!([{ "proc": "make test", "pos": 0, "out": "boom" }])) }),
            );
        let settings = Settings {
            webhook: url,
            logs: LogSettings {
                on_error: true,
                auth_token: "secret".to_string(),
                server: Some(spawn_server(ci).await),
            },
            ..Default::default()
        };

        Plugin::new(settings, pipeline("failure")).execute().await.unwrap();

        let cards = cards.lock().unwrap();
        let facts = cards[0]["sections"][0]["facts"].as_array().unwrap();
        let log = facts.last().unwrap();
        assert_eq!(log["name"], "Log for default/test");
        assert_eq!(log["value"], "Command #0: make test\nResult: boom");
    }

    #[tokio::test]
    async fn test_refused_webhook_fails_run() {
        let settings = Settings {
            webhook: refused_url().await,
            ..Default::default()
        };

        let err = Plugin::new(settings, pipeline("success"))
            .execute()
            .await
            .unwrap_err();

        assert!(matches!(err, NotifyError::Delivery(_)));
    }

    #[test]
    fn test_validate_uses_pipeline_branch() {
        let env: HashMap<&str, &str> = HashMap::from([("main_teams_webhook", "https://main-hook")]);
        let lookup = |key: &str| env.get(key).map(|v| v.to_string());

        let mut plugin = Plugin::new(Settings::default(), pipeline("success"));
        plugin.validate(&lookup).unwrap();

        assert_eq!(plugin.settings.webhook, "https://main-hook");
    }
}
