use super::ids::{LineId, OperationId};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Advisory warnings surfaced to the caller without halting the edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Warning {
    /// The line's operation has no operation type selected yet.
    MissingOperationType {
        line: LineId,
        operation: OperationId,
    },
}

impl Warning {
    pub fn title(&self) -> &'static str {
        "Warning!"
    }

    pub fn message(&self) -> &'static str {
        match self {
            Warning::MissingOperationType { .. } => "You must first select a operation type.",
        }
    }
}
