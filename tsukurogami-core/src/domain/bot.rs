//! Bot domain model
//!
//! Mirrors the CI server's bot document. Only the fields this service manages
//! are typed; everything else in a bot's configuration is carried through
//! untouched so a duplicated bot keeps whatever the server put there.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::trigger::Trigger;

/// Schedule type that makes a bot integrate only when explicitly triggered
pub const SCHEDULE_MANUAL: i64 = 3;

/// A bot as stored by the CI server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bot {
    /// Server-assigned identifier, absent until the bot has been created
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name
    pub name: String,

    /// Build configuration
    pub configuration: Configuration,
}

impl Bot {
    /// Returns a build environment variable if it holds a string
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.configuration
            .build_environment_variables
            .get(key)
            .and_then(Value::as_str)
    }
}

/// Bot configuration document
///
/// `extra` holds every key the server sends that is not one of the managed
/// fields. It is flattened back into the document on serialization, in the
/// order it was read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Pre and post build hooks, in execution order
    #[serde(default)]
    pub triggers: Vec<Trigger>,

    /// Build environment variables; also used to tag bots
    #[serde(rename = "buildEnvironmentVariables", default)]
    pub build_environment_variables: Map<String, Value>,

    /// Server schedule type (periodic, on commit, manual, ...)
    #[serde(rename = "scheduleType", default)]
    pub schedule_type: i64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
