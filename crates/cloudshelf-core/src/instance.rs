//! Compute instance and network types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Lifecycle state of a compute instance.
///
/// Covers every state the provider reports. `starting` and `terminating`
/// are accepted as aliases when parsing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    #[strum(to_string = "pending", serialize = "starting")]
    Pending,
    Running,
    Stopping,
    Stopped,
    #[strum(to_string = "shutting-down", serialize = "terminating")]
    ShuttingDown,
    Terminated,
}

impl InstanceState {
    /// Whether the instance is gone or going away.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated | Self::ShuttingDown)
    }
}

/// A state-changing action on an instance.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InstanceAction {
    Start,
    Stop,
    Terminate,
}

/// A remotely managed compute instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    /// Display name (from the `Name` tag).
    pub name: String,
    pub state: InstanceState,
    pub instance_type: String,
    pub platform: String,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    pub launched: Option<DateTime<Utc>>,
    pub vpc_id: Option<String>,
    pub subnet_id: Option<String>,
}

impl Instance {
    /// Create an instance record with only the fields the guards need.
    pub fn new(id: impl Into<String>, name: impl Into<String>, state: InstanceState) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state,
            instance_type: String::new(),
            platform: "Linux".to_string(),
            public_ip: None,
            private_ip: None,
            launched: None,
            vpc_id: None,
            subnet_id: None,
        }
    }
}

/// A virtual private network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vpc {
    pub id: String,
    pub name: String,
    pub state: String,
    pub cidr_block: String,
    pub is_default: bool,
    pub tenancy: String,
}

impl Vpc {
    /// Check whether the VPC matches a search term.
    ///
    /// Name and id match case-insensitively; the CIDR block matches
    /// literally. An empty term matches everything.
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.id.to_lowercase().contains(&needle)
            || self.cidr_block.contains(term)
    }
}
