use super::cfop::CfopDestination;
use super::ids::{LineId, OperationId, RecordKind};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FiscalError {
    #[error("expected a single operation line, got {count}")]
    MultipleRecords { count: usize },
    #[error("{0}")]
    Precondition(String),
    #[error("cannot resolve {kind}: {detail}")]
    UnresolvedReference { kind: RecordKind, detail: String },
    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: u32 },
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: RecordKind, id: u32 },
    #[error("{owner} references unknown {kind} {id}")]
    InvalidReference {
        owner: String,
        kind: RecordKind,
        id: u32,
    },
    #[error("fiscal operation line already exists with this name: '{name}' in operation {operation}")]
    DuplicateLine { name: String, operation: OperationId },
    #[error("operation line {line}: {field} must point to a line with the opposite operation type")]
    InverseTypeMismatch { line: LineId, field: &'static str },
    #[error("operation line {line}: CFOP {code} does not fit the {slot} slot: {reason}")]
    CfopSlotMismatch {
        line: LineId,
        code: String,
        slot: CfopDestination,
        reason: String,
    },
    #[error("operation line {line}: invalid ICMS origin '{origin}'")]
    InvalidIcmsOrigin { line: LineId, origin: String },
}

impl FiscalError {
    pub(crate) fn not_found(kind: RecordKind, id: impl Into<u32>) -> Self {
        FiscalError::NotFound {
            kind,
            id: id.into(),
        }
    }
}
