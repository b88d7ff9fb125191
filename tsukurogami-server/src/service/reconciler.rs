//! Bot Reconciler
//!
//! Creates, deletes and integrates the instance bots of a pull-request
//! branch. Nothing is cached: every operation lists the registry afresh and
//! matches bots by their tags.

use std::sync::Arc;

use thiserror::Error;
use tsukurogami_client::{BotRegistry, ClientError};
use tsukurogami_core::domain::bot::Bot;
use tsukurogami_core::instance::InstanceSettings;
use tsukurogami_core::tagging;

/// Registry operation a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Delete,
    Integrate,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create bot"),
            Operation::Delete => write!(f, "delete bot"),
            Operation::Integrate => write!(f, "integrate bot"),
        }
    }
}

/// Reconciler error type
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{operation} {repo} {branch}: listing bots: {source}")]
    Lookup {
        operation: Operation,
        repo: String,
        branch: String,
        source: ClientError,
    },

    #[error("create bot {repo} {branch}: no templates for repo")]
    NoTemplate { repo: String, branch: String },

    #[error("{operation} {repo} {branch}: no bots found")]
    NoInstance {
        operation: Operation,
        repo: String,
        branch: String,
    },

    #[error("create bot {repo} {branch}: from template {template}: {source}")]
    Create {
        repo: String,
        branch: String,
        template: String,
        source: ClientError,
    },

    #[error("delete bot {repo} {branch}: {bot}: {source}")]
    Delete {
        repo: String,
        branch: String,
        bot: String,
        source: ClientError,
    },

    #[error("integrate bot {repo} {branch}: {bot}: {source}")]
    Integrate {
        repo: String,
        branch: String,
        bot: String,
        source: ClientError,
    },
}

pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Keeps the CI server's bots in line with pull-request events
pub struct Reconciler {
    registry: Arc<dyn BotRegistry>,
    settings: InstanceSettings,
}

impl Reconciler {
    pub fn new(registry: Arc<dyn BotRegistry>, settings: InstanceSettings) -> Self {
        Self { registry, settings }
    }

    async fn list(&self, operation: Operation, repo: &str, branch: &str) -> Result<Vec<Bot>> {
        self.registry
            .list_bots()
            .await
            .map_err(|source| ReconcileError::Lookup {
                operation,
                repo: repo.to_string(),
                branch: branch.to_string(),
                source,
            })
    }

    /// Lists the instance bots for `repo`/`branch`, failing if there are none
    async fn instances(&self, operation: Operation, repo: &str, branch: &str) -> Result<Vec<Bot>> {
        let bots = self.list(operation, repo, branch).await?;
        let instances: Vec<Bot> = tagging::find_instances(&bots, repo, branch)
            .into_iter()
            .cloned()
            .collect();

        if instances.is_empty() {
            return Err(ReconcileError::NoInstance {
                operation,
                repo: repo.to_string(),
                branch: branch.to_string(),
            });
        }

        if instances.len() > 1 {
            tracing::warn!(
                "{} {} {}: {} bots tagged for this branch ({}), acting on all of them",
                operation,
                repo,
                branch,
                instances.len(),
                bot_names(&instances)
            );
        }

        Ok(instances)
    }

    /// Creates one instance bot per template of `repo`
    ///
    /// Each template is duplicated independently; the first failure is
    /// returned and bots already created stay in place.
    ///
    /// # Returns
    /// The number of bots created
    pub async fn create_bots(&self, repo: &str, branch: &str) -> Result<usize> {
        let bots = self.list(Operation::Create, repo, branch).await?;
        let templates = tagging::find_templates(&bots, repo);

        if templates.is_empty() {
            return Err(ReconcileError::NoTemplate {
                repo: repo.to_string(),
                branch: branch.to_string(),
            });
        }

        if templates.len() > 1 {
            tracing::warn!(
                "create bot {} {}: {} templates for repo ({}), creating one bot per template",
                repo,
                branch,
                templates.len(),
                templates
                    .iter()
                    .map(|t| t.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        for template in &templates {
            let create_error = |source| ReconcileError::Create {
                repo: repo.to_string(),
                branch: branch.to_string(),
                template: template.name.clone(),
                source,
            };

            let instance = self.settings.derive_instance(template, repo, branch);
            let result = match template.id.as_deref() {
                Some(template_id) => self.registry.duplicate_bot(template_id, &instance).await,
                None => Err(missing_id(template)),
            };
            result.map_err(create_error)?;

            tracing::info!("Created bot {} from template {}", instance.name, template.name);
        }

        Ok(templates.len())
    }

    /// Deletes every instance bot of `repo`/`branch`
    ///
    /// Stops at the first failed deletion.
    pub async fn delete_bots(&self, repo: &str, branch: &str) -> Result<usize> {
        let instances = self.instances(Operation::Delete, repo, branch).await?;

        for bot in &instances {
            let result = match bot.id.as_deref() {
                Some(id) => self.registry.delete_bot(id).await,
                None => Err(missing_id(bot)),
            };
            result.map_err(|source| ReconcileError::Delete {
                repo: repo.to_string(),
                branch: branch.to_string(),
                bot: bot.name.clone(),
                source,
            })?;

            tracing::info!("Deleted bot {}", bot.name);
        }

        Ok(instances.len())
    }

    /// Starts an integration run on every instance bot of `repo`/`branch`
    ///
    /// Runs reuse the bot's workspace rather than cloning from scratch.
    pub async fn integrate_bots(&self, repo: &str, branch: &str) -> Result<usize> {
        let instances = self.instances(Operation::Integrate, repo, branch).await?;

        for bot in &instances {
            let result = match bot.id.as_deref() {
                Some(id) => self.registry.trigger_integration(id).await,
                None => Err(missing_id(bot)),
            };
            result.map_err(|source| ReconcileError::Integrate {
                repo: repo.to_string(),
                branch: branch.to_string(),
                bot: bot.name.clone(),
                source,
            })?;

            tracing::info!("Triggered integration of bot {}", bot.name);
        }

        Ok(instances.len())
    }
}

fn missing_id(bot: &Bot) -> ClientError {
    ClientError::Protocol(format!("bot {} has no id", bot.name))
}

fn bot_names(bots: &[Bot]) -> String {
    bots.iter()
        .map(|b| b.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
