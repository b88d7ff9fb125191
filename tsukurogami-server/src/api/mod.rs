//! API Module
//!
//! HTTP API layer of the bridge.
//! Each submodule handles one endpoint.

pub mod error;
pub mod integration;
pub mod logs;
pub mod pull_request;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::service::{IntegrationRelay, LogBuffer, Reconciler};

/// Shared handler state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<Reconciler>,
    pub relay: Arc<IntegrationRelay>,
    pub logs: LogBuffer,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Source-control webhook
        .route("/pullRequestUpdated", get(pull_request::pull_request_updated))
        // Status-poke callback from CI builds
        .route("/integrationUpdated", get(integration::integration_updated))
        // Operational visibility
        .route("/logs", get(logs::get_logs))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use tsukurogami_core::domain::status::BuildState;
    use tsukurogami_core::instance::InstanceSettings;
    use tsukurogami_core::tagging::{BRANCH_TAG, REPO_TAG, REPO_TEMPLATE_TAG};

    use crate::service::testing::{
        FakeNotifier, FakeRegistry, RegistryCall, instance_bot, template_bot,
    };

    struct TestApp {
        router: Router,
        registry: Arc<FakeRegistry>,
        notifier: Arc<FakeNotifier>,
        logs: LogBuffer,
    }

    fn app_with(registry: FakeRegistry, notifier: FakeNotifier) -> TestApp {
        let registry = Arc::new(registry);
        let notifier = Arc::new(notifier);
        let logs = LogBuffer::new(100);

        let state = AppState {
            reconciler: Arc::new(Reconciler::new(
                registry.clone(),
                InstanceSettings::new("http://10.0.0.5:4444"),
            )),
            relay: Arc::new(IntegrationRelay::new(
                notifier.clone(),
                "https://ci.local:20343",
            )),
            logs: logs.clone(),
        };

        TestApp {
            router: create_router(state),
            registry,
            notifier,
            logs,
        }
    }

    fn app(bots: Vec<tsukurogami_core::domain::bot::Bot>) -> TestApp {
        app_with(FakeRegistry::new(bots), FakeNotifier::default())
    }

    async fn get(router: &Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_opened_creates_then_integrates() {
        let app = app(vec![template_bot("t1", "widgets", "widgets")]);

        let (status, _) = get(
            &app.router,
            "/pullRequestUpdated?repo=widgets&branch=feature-x&status=opened",
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let calls = app.registry.calls();
        assert_eq!(calls.len(), 2);
        match &calls[0] {
            RegistryCall::Duplicate { template_id, bot } => {
                assert_eq!(template_id, "t1");
                assert_eq!(bot.name, "widgets.feature-x");
                assert_eq!(bot.env_var(REPO_TAG), Some("widgets"));
                assert_eq!(bot.env_var(BRANCH_TAG), Some("feature-x"));
                assert_eq!(bot.env_var(REPO_TEMPLATE_TAG), None);
            }
            other => panic!("unexpected call {:?}", other),
        }
        assert_eq!(calls[1], RegistryCall::Integrate("t1-copy".to_string()));
    }

    #[tokio::test]
    async fn test_reopened_with_stale_instance_fans_out() {
        let app = app(vec![
            template_bot("t1", "widgets", "widgets"),
            instance_bot("i1", "widgets.feature-x", "widgets", "feature-x"),
        ]);

        let (status, _) = get(
            &app.router,
            "/pullRequestUpdated?repo=widgets&branch=feature-x&status=REOPENED",
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let calls = app.registry.calls();
        assert_eq!(calls.len(), 3);
        assert!(
            matches!(&calls[0], RegistryCall::Duplicate { template_id, .. } if template_id == "t1")
        );
        assert_eq!(calls[1], RegistryCall::Integrate("i1".to_string()));
        assert_eq!(calls[2], RegistryCall::Integrate("t1-copy".to_string()));
    }

    #[tokio::test]
    async fn test_opened_duplicate_rejected_is_500() {
        let app = app_with(
            FakeRegistry::new(vec![template_bot("t1", "widgets", "widgets")]).fail_on("t1", 409),
            FakeNotifier::default(),
        );

        let (status, body) = get(
            &app.router,
            "/pullRequestUpdated?repo=widgets&branch=feature-x&status=opened",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("status 409"), "{body}");
        assert_eq!(app.registry.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_closed_without_instance_is_500() {
        let app = app(vec![template_bot("t1", "widgets", "widgets")]);

        let (status, body) = get(
            &app.router,
            "/pullRequestUpdated?repo=widgets&branch=feature-x&status=closed",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("no bots found"), "{body}");
        assert!(app.registry.calls().is_empty());
    }

    #[tokio::test]
    async fn test_declined_deletes_instance() {
        let app = app(vec![instance_bot(
            "i1",
            "widgets.feature-x",
            "widgets",
            "feature-x",
        )]);

        let (status, _) = get(
            &app.router,
            "/pullRequestUpdated?repo=widgets&branch=feature-x&status=declined",
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            app.registry.calls(),
            vec![RegistryCall::Delete("i1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_rescoped_only_integrates() {
        let app = app(vec![
            template_bot("t1", "widgets", "widgets"),
            instance_bot("i1", "widgets.feature-x", "widgets", "feature-x"),
        ]);

        let (status, _) = get(
            &app.router,
            "/pullRequestUpdated?repo=widgets&branch=feature-x&status=rescoped_from",
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            app.registry.calls(),
            vec![RegistryCall::Integrate("i1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_unknown_status_is_accepted_without_action() {
        let app = app(vec![template_bot("t1", "widgets", "widgets")]);

        let (status, _) = get(
            &app.router,
            "/pullRequestUpdated?repo=widgets&branch=feature-x&status=merged",
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(app.registry.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_pull_request_parameters_are_listed() {
        let app = app(vec![]);

        let (status, body) = get(&app.router, "/pullRequestUpdated?branch=feature-x").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "missing parameter(s): repo, status");
    }

    #[tokio::test]
    async fn test_opened_without_template_is_500() {
        let app = app(vec![instance_bot("i9", "gadgets.x", "gadgets", "x")]);

        let (status, body) = get(
            &app.router,
            "/pullRequestUpdated?repo=widgets&branch=feature-x&status=opened",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("no templates for repo"), "{body}");
    }

    #[tokio::test]
    async fn test_integration_updated_relays_status() {
        let app = app(vec![]);

        let (status, _) = get(
            &app.router,
            "/integrationUpdated?commit=abc123&status=succeeded&bot=widgets.feature-x&integration=7",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let posted = app.notifier.posted();
        assert_eq!(posted.len(), 1);
        let (commit, build) = &posted[0];
        assert_eq!(commit, "abc123");
        assert_eq!(build.state, BuildState::Successful);
        assert_eq!(build.key, "widgets.feature-x");
        assert_eq!(build.name.as_deref(), Some("widgets.feature-x:7"));
        assert_eq!(build.url, "https://ci.local:20343");
        assert_eq!(build.description, None);
    }

    #[tokio::test]
    async fn test_integration_updated_repeated_key_uses_first_value() {
        let app = app(vec![]);

        let (status, _) = get(
            &app.router,
            "/integrationUpdated?commit=abc123&status=build-errors&status=succeeded&bot=b&integration=1",
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let posted = app.notifier.posted();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].1.state, BuildState::Failed);
    }

    #[tokio::test]
    async fn test_integration_updated_missing_status_is_500() {
        let app = app(vec![]);

        let (status, body) = get(
            &app.router,
            "/integrationUpdated?commit=abc123&bot=widgets.feature-x&integration=7",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("\"status\""), "{body}");
        assert!(app.notifier.posted().is_empty());
    }

    #[tokio::test]
    async fn test_integration_updated_relay_failure_is_500() {
        let app = app_with(FakeRegistry::default(), FakeNotifier::failing(503));

        let (status, body) = get(
            &app.router,
            "/integrationUpdated?commit=abc123&status=build-errors&bot=b&integration=1",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("abc123"), "{body}");
    }

    #[tokio::test]
    async fn test_logs_returns_buffered_lines() {
        let app = app(vec![]);
        app.logs.push("INFO first");
        app.logs.push("WARN second");

        let (status, body) = get(&app.router, "/logs").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "INFO first\nWARN second\n");
    }
}
