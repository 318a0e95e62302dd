use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Execution mode active for the whole process. Set once from
/// configuration; gates tool availability and audit-log encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Isolated,
    Extended,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Isolated => "isolated",
            ExecutionMode::Extended => "extended",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("unknown execution mode: {0}")]
pub struct UnknownMode(String);

impl FromStr for ExecutionMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "isolated" => Ok(ExecutionMode::Isolated),
            "extended" => Ok(ExecutionMode::Extended),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}
