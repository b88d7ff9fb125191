//! In-memory registry and notifier for service and API tests

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tsukurogami_client::{BotRegistry, ClientError, StatusNotifier};
use tsukurogami_core::domain::bot::{Bot, Configuration};
use tsukurogami_core::dto::status::BuildStatus;
use tsukurogami_core::tagging::{BRANCH_TAG, REPO_TAG, REPO_TEMPLATE_TAG};

use crate::service::log_buffer::LogBuffer;

const END_OF_CAPTURE: &str = "end of captured logs";

/// Runs `fut` with its events formatted into a fresh [`LogBuffer`]
///
/// The subscriber is thread-local, so this needs the current-thread runtime
/// `#[tokio::test]` provides. Returns the output and the rendered lines.
pub async fn capture_logs<F: Future>(fut: F) -> (F::Output, String) {
    let logs = LogBuffer::new(1000);
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(logs.spawn_writer())
        .finish();

    let output = {
        let _guard = tracing::subscriber::set_default(subscriber);
        let output = fut.await;
        tracing::info!("{}", END_OF_CAPTURE);
        output
    };

    // The drain task appends in order, so the marker arrives last
    for _ in 0..100 {
        if logs.render().contains(END_OF_CAPTURE) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    (output, logs.render())
}

pub fn template_bot(id: &str, name: &str, repo: &str) -> Bot {
    tagged_bot(id, name, &[(REPO_TEMPLATE_TAG, repo)])
}

pub fn instance_bot(id: &str, name: &str, repo: &str, branch: &str) -> Bot {
    tagged_bot(id, name, &[(REPO_TAG, repo), (BRANCH_TAG, branch)])
}

fn tagged_bot(id: &str, name: &str, tags: &[(&str, &str)]) -> Bot {
    let mut configuration = Configuration::default();
    for (key, value) in tags {
        configuration
            .build_environment_variables
            .insert(key.to_string(), Value::String(value.to_string()));
    }
    Bot {
        id: Some(id.to_string()),
        name: name.to_string(),
        configuration,
    }
}

/// Write recorded by [`FakeRegistry`]
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryCall {
    Duplicate { template_id: String, bot: Bot },
    Delete(String),
    Integrate(String),
}

/// Registry that keeps bots in memory and records every write
///
/// Successful duplicates are added to the listing with the id
/// `{template_id}-copy`, so a create followed by an integrate sees the new bot.
#[derive(Default)]
pub struct FakeRegistry {
    bots: Mutex<Vec<Bot>>,
    list_fails: bool,
    failing_id: Option<(String, u16)>,
    calls: Mutex<Vec<RegistryCall>>,
}

impl FakeRegistry {
    pub fn new(bots: Vec<Bot>) -> Self {
        Self {
            bots: Mutex::new(bots),
            ..Self::default()
        }
    }

    /// Registry whose listing is rejected, as for a server with no bots
    pub fn failing_list() -> Self {
        Self {
            list_fails: true,
            ..Self::default()
        }
    }

    /// Writes against `id` answer with `status`
    pub fn fail_on(mut self, id: &str, status: u16) -> Self {
        self.failing_id = Some((id.to_string(), status));
        self
    }

    pub fn calls(&self) -> Vec<RegistryCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, id: &str, call: RegistryCall) -> tsukurogami_client::Result<()> {
        self.calls.lock().unwrap().push(call);
        match &self.failing_id {
            Some((failing, status)) if failing == id => {
                Err(ClientError::remote("fake", *status, "rejected"))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl BotRegistry for FakeRegistry {
    async fn list_bots(&self) -> tsukurogami_client::Result<Vec<Bot>> {
        if self.list_fails {
            return Err(ClientError::Protocol("no bots".to_string()));
        }
        Ok(self.bots.lock().unwrap().clone())
    }

    async fn duplicate_bot(&self, template_id: &str, bot: &Bot) -> tsukurogami_client::Result<()> {
        self.record(
            template_id,
            RegistryCall::Duplicate {
                template_id: template_id.to_string(),
                bot: bot.clone(),
            },
        )?;

        let mut created = bot.clone();
        created.id = Some(format!("{}-copy", template_id));
        self.bots.lock().unwrap().push(created);
        Ok(())
    }

    async fn delete_bot(&self, id: &str) -> tsukurogami_client::Result<()> {
        self.record(id, RegistryCall::Delete(id.to_string()))
    }

    async fn trigger_integration(&self, id: &str) -> tsukurogami_client::Result<()> {
        self.record(id, RegistryCall::Integrate(id.to_string()))
    }
}

/// Notifier that records posted statuses
#[derive(Default)]
pub struct FakeNotifier {
    failing_status: Option<u16>,
    posted: Mutex<Vec<(String, BuildStatus)>>,
}

impl FakeNotifier {
    pub fn failing(status: u16) -> Self {
        Self {
            failing_status: Some(status),
            ..Self::default()
        }
    }

    pub fn posted(&self) -> Vec<(String, BuildStatus)> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusNotifier for FakeNotifier {
    async fn post_build_status(
        &self,
        commit: &str,
        status: &BuildStatus,
    ) -> tsukurogami_client::Result<()> {
        if let Some(code) = self.failing_status {
            return Err(ClientError::remote("fake", code, "rejected"));
        }
        self.posted
            .lock()
            .unwrap()
            .push((commit.to_string(), status.clone()));
        Ok(())
    }
}
