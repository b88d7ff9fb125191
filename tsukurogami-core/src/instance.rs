//! Instance bot derivation
//!
//! Builds the configuration of a pull-request bot from its repository's
//! template. The derived bot checks out the PR branch, merges trunk into it
//! and reports its progress back through two status-poke scripts that call
//! this service's `/integrationUpdated` endpoint.

use crate::domain::bot::{Bot, SCHEDULE_MANUAL};
use crate::domain::trigger::{Trigger, TriggerConditions, TriggerPhase};
use crate::tagging;

/// Default instance name: template name, a dot, then the branch
pub const DEFAULT_NAME_PATTERN: &str = "{template}.{branch}";

/// Status token the pre-build poke reports
pub const IN_PROGRESS_TOKEN: &str = "inprogress";

/// CI server variable holding the finished integration's result
pub const INTEGRATION_RESULT_VAR: &str = "${XCS_INTEGRATION_RESULT}";

const SWITCH_BRANCH_NAME: &str = "Switch Branch";
const UPDATE_STATUS_NAME: &str = "Update Status";

/// Settings baked into every derived bot
///
/// The scripts run on the CI server with no access to this process, so
/// everything they need is rendered into their text at creation time.
#[derive(Debug, Clone)]
pub struct InstanceSettings {
    /// Base URL the poke scripts call, e.g. `http://10.0.0.5:4444`
    pub callback_url: String,

    /// Branch merged into the PR branch before building
    pub trunk_branch: String,

    /// Instance name pattern with `{template}` and `{branch}` placeholders
    pub name_pattern: String,
}

impl InstanceSettings {
    pub fn new(callback_url: impl Into<String>) -> Self {
        Self {
            callback_url: callback_url.into().trim_end_matches('/').to_string(),
            trunk_branch: "master".to_string(),
            name_pattern: DEFAULT_NAME_PATTERN.to_string(),
        }
    }

    pub fn with_trunk_branch(mut self, trunk_branch: impl Into<String>) -> Self {
        self.trunk_branch = trunk_branch.into();
        self
    }

    pub fn with_name_pattern(mut self, name_pattern: impl Into<String>) -> Self {
        self.name_pattern = name_pattern.into();
        self
    }

    /// Name of the instance bot for `template` on `branch`
    pub fn instance_name(&self, template: &str, branch: &str) -> String {
        self.name_pattern
            .replace("{template}", template)
            .replace("{branch}", branch)
    }

    /// Script that checks out `branch` and merges trunk into it
    ///
    /// Both branch names are single-quoted; they come from webhook input.
    pub fn switch_branch_script(&self, branch: &str) -> String {
        format!(
            "#!/bin/sh\n\
             set -x\n\
             cd \"${{XCS_PRIMARY_REPO_DIR}}\"\n\
             git fetch\n\
             git checkout {branch}\n\
             git pull\n\
             git merge --no-ff --no-commit {trunk}\n",
            branch = shell_quote(branch),
            trunk = shell_quote(&self.trunk_branch),
        )
    }

    /// Script that reports `status` for the current commit back to this service
    ///
    /// curl builds and encodes the query, so bot names with spaces or `&`
    /// arrive intact. `status` may be a CI variable reference.
    pub fn status_poke_script(&self, status: &str) -> String {
        format!(
            "#!/bin/sh\n\
             set -x\n\
             cd \"${{XCS_PRIMARY_REPO_DIR}}\"\n\
             curl -g -G \"{callback}/integrationUpdated\" \\\n\
             \x20 --data-urlencode \"commit=$(git rev-parse HEAD | tr -d '\\n')\" \\\n\
             \x20 --data-urlencode \"bot=${{XCS_BOT_NAME}}\" \\\n\
             \x20 --data-urlencode \"integration=${{XCS_INTEGRATION_NUMBER}}\" \\\n\
             \x20 --data-urlencode \"status={status}\"\n",
            callback = self.callback_url,
            status = status,
        )
    }

    /// The three hooks every instance runs ahead of the template's own triggers
    pub fn instance_triggers(&self, branch: &str) -> [Trigger; 3] {
        [
            Trigger::script(
                TriggerPhase::PreBuild,
                SWITCH_BRANCH_NAME,
                self.switch_branch_script(branch),
            ),
            Trigger::script(
                TriggerPhase::PreBuild,
                UPDATE_STATUS_NAME,
                self.status_poke_script(IN_PROGRESS_TOKEN),
            ),
            Trigger::script(
                TriggerPhase::PostBuild,
                UPDATE_STATUS_NAME,
                self.status_poke_script(INTEGRATION_RESULT_VAR),
            )
            .with_conditions(TriggerConditions::always()),
        ]
    }

    /// Derives the instance bot for `repo`/`branch` from `template`
    ///
    /// The template is left untouched. The result has no id, so the registry
    /// stores it as a new bot, and a manual schedule so it only builds when
    /// an integration is requested.
    pub fn derive_instance(&self, template: &Bot, repo: &str, branch: &str) -> Bot {
        let mut instance = template.clone();

        let mut triggers = Vec::with_capacity(template.configuration.triggers.len() + 3);
        triggers.extend(self.instance_triggers(branch));
        triggers.extend(template.configuration.triggers.iter().cloned());
        instance.configuration.triggers = triggers;

        tagging::tag_as_instance(&mut instance, repo, branch);
        instance.name = self.instance_name(&template.name, branch);
        instance.id = None;
        instance.configuration.schedule_type = SCHEDULE_MANUAL;

        instance
    }
}

/// Wraps `value` in single quotes for a POSIX shell
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}
