//! The five specialized tutoring agents.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Assessment,
    Curriculum,
    Teaching,
    Practice,
    Progress,
}

impl AgentKind {
    /// Every kind, in registry build order.
    pub const ALL: [AgentKind; 5] = [
        AgentKind::Assessment,
        AgentKind::Curriculum,
        AgentKind::Teaching,
        AgentKind::Practice,
        AgentKind::Progress,
    ];

    /// Registry key and the role recorded in history.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Assessment => "assessment",
            AgentKind::Curriculum => "curriculum",
            AgentKind::Teaching => "teaching",
            AgentKind::Practice => "practice",
            AgentKind::Progress => "progress",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown agent kind: {0}")]
pub struct UnknownAgentKind(pub String);

impl FromStr for AgentKind {
    type Err = UnknownAgentKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownAgentKind(s.to_string()))
    }
}
