//! Trigger domain model
//!
//! A trigger is a hook the CI server runs before or after a build.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// When a trigger runs relative to the build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum TriggerPhase {
    PreBuild,
    PostBuild,
    Other(u8),
}

impl From<u8> for TriggerPhase {
    fn from(value: u8) -> Self {
        match value {
            1 => TriggerPhase::PreBuild,
            2 => TriggerPhase::PostBuild,
            other => TriggerPhase::Other(other),
        }
    }
}

impl From<TriggerPhase> for u8 {
    fn from(phase: TriggerPhase) -> Self {
        match phase {
            TriggerPhase::PreBuild => 1,
            TriggerPhase::PostBuild => 2,
            TriggerPhase::Other(other) => other,
        }
    }
}

/// What a trigger does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum TriggerKind {
    Script,
    Email,
    Other(u8),
}

impl From<u8> for TriggerKind {
    fn from(value: u8) -> Self {
        match value {
            1 => TriggerKind::Script,
            2 => TriggerKind::Email,
            other => TriggerKind::Other(other),
        }
    }
}

impl From<TriggerKind> for u8 {
    fn from(kind: TriggerKind) -> Self {
        match kind {
            TriggerKind::Script => 1,
            TriggerKind::Email => 2,
            TriggerKind::Other(other) => other,
        }
    }
}

/// A pre or post build hook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub phase: TriggerPhase,

    #[serde(rename = "type")]
    pub kind: TriggerKind,

    pub name: String,

    /// Shell script, interpolated by the CI server before it runs
    #[serde(rename = "scriptBody", default, skip_serializing_if = "Option::is_none")]
    pub script_body: Option<String>,

    /// Outcomes a post-build trigger fires on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<TriggerConditions>,

    #[serde(
        rename = "emailConfiguration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub email_configuration: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Trigger {
    /// Creates a script trigger with no conditions
    pub fn script(phase: TriggerPhase, name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            phase,
            kind: TriggerKind::Script,
            name: name.into(),
            script_body: Some(body.into()),
            conditions: None,
            email_configuration: None,
            extra: Map::new(),
        }
    }

    pub fn with_conditions(mut self, conditions: TriggerConditions) -> Self {
        self.conditions = Some(conditions);
        self
    }
}

/// Build outcomes a post-build trigger reacts to
///
/// Absent flags read as false. Flags this type does not name, such as
/// `onAllIssuesResolved`, are carried in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerConditions {
    #[serde(default)]
    pub on_analyzer_warnings: bool,
    #[serde(default)]
    pub on_build_errors: bool,
    #[serde(default)]
    pub on_failing_tests: bool,
    #[serde(default)]
    pub on_success: bool,
    #[serde(default)]
    pub on_warnings: bool,
    #[serde(default)]
    pub status: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TriggerConditions {
    /// Fires on every outcome the server reports
    pub fn always() -> Self {
        Self {
            on_analyzer_warnings: true,
            on_build_errors: true,
            on_failing_tests: true,
            on_success: true,
            on_warnings: true,
            status: 0,
            extra: Map::new(),
        }
    }
}
