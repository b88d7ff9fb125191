//! Bot tagging and matching
//!
//! A bot's role is recorded in reserved build environment variables rather
//! than derived from its name. Template bots carry [`REPO_TEMPLATE_TAG`];
//! instance bots carry [`REPO_TAG`] and [`BRANCH_TAG`]. All comparisons are
//! case-insensitive.

use serde_json::Value;

use crate::domain::bot::Bot;

/// Marks a bot as the template for the named repository
pub const REPO_TEMPLATE_TAG: &str = "TSUKUROGAMI_REPO_TEMPLATE";

/// Repository an instance bot was created for
pub const REPO_TAG: &str = "TSUKUROGAMI_REPO";

/// Pull-request branch an instance bot tracks
pub const BRANCH_TAG: &str = "TSUKUROGAMI_BRANCH";

fn tag_matches(bot: &Bot, key: &str, expected: &str) -> bool {
    bot.env_var(key)
        .is_some_and(|value| value.to_lowercase() == expected.to_lowercase())
}

/// Whether `bot` is a template for `repo`
pub fn is_template_for(bot: &Bot, repo: &str) -> bool {
    tag_matches(bot, REPO_TEMPLATE_TAG, repo)
}

/// Whether `bot` is the instance for `repo` and `branch`
pub fn is_instance_for(bot: &Bot, repo: &str, branch: &str) -> bool {
    tag_matches(bot, REPO_TAG, repo) && tag_matches(bot, BRANCH_TAG, branch)
}

/// Template bots for `repo`, in registry order
pub fn find_templates<'a>(bots: &'a [Bot], repo: &str) -> Vec<&'a Bot> {
    bots.iter().filter(|bot| is_template_for(bot, repo)).collect()
}

/// Instance bots for `repo` and `branch`, in registry order
pub fn find_instances<'a>(bots: &'a [Bot], repo: &str, branch: &str) -> Vec<&'a Bot> {
    bots.iter()
        .filter(|bot| is_instance_for(bot, repo, branch))
        .collect()
}

/// Turns a template's tags into instance tags for `repo` and `branch`
pub fn tag_as_instance(bot: &mut Bot, repo: &str, branch: &str) {
    let vars = &mut bot.configuration.build_environment_variables;
    vars.insert(REPO_TAG.to_string(), Value::String(repo.to_string()));
    vars.insert(BRANCH_TAG.to_string(), Value::String(branch.to_string()));
    vars.shift_remove(REPO_TEMPLATE_TAG);
}
