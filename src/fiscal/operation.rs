use super::cfop::{CfopDestination, FiscalInOut};
use super::error::FiscalError;
use super::ids::{CfopId, CommentId, LineId, OperationId};
use super::parties::TaxFramework;
use super::schema::FieldInfo;
use super::tax::TaxDefinition;
use super::warnings::Warning;
use brfiscal_derive::FieldSchema;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of commercial operation, matched against CFOP movement types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OperationFiscalType {
    Purchase,
    PurchaseRefund,
    ReturnIn,
    Sale,
    SaleRefund,
    ReturnOut,
    Other,
}

impl OperationFiscalType {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationFiscalType::Purchase => "purchase",
            OperationFiscalType::PurchaseRefund => "purchase_refund",
            OperationFiscalType::ReturnIn => "return_in",
            OperationFiscalType::Sale => "sale",
            OperationFiscalType::SaleRefund => "sale_refund",
            OperationFiscalType::ReturnOut => "return_out",
            OperationFiscalType::Other => "other",
        }
    }
}

impl fmt::Display for OperationFiscalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of an operation line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LineState {
    #[default]
    Draft,
    Review,
    Approved,
}

impl fmt::Display for LineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LineState::Draft => "draft",
            LineState::Review => "review",
            LineState::Approved => "approved",
        })
    }
}

/// ICMS contributor indicator of the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum IndIeDest {
    /// ICMS contributor
    #[default]
    #[serde(rename = "1")]
    Contributor,
    /// Contributor exempt from registration
    #[serde(rename = "2")]
    Exempt,
    /// Not an ICMS contributor
    #[serde(rename = "9")]
    NonContributor,
}

/// Parent record grouping operation lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, FieldSchema)]
pub struct Operation {
    pub id: OperationId,
    /// Operation name
    pub name: String,
    /// Direction of the operation, copied onto each line
    #[serde(default)]
    #[field(label = "Operation Type")]
    pub operation_type: Option<FiscalInOut>,
    /// Kind of operation, copied onto each line
    #[serde(default)]
    #[field(label = "Fiscal Type")]
    pub fiscal_type: Option<OperationFiscalType>,
}

fn default_true() -> bool {
    true
}

fn default_icms_origin() -> String {
    "0".to_string()
}

/// Configuration of one fiscal operation line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, FieldSchema)]
pub struct OperationLine {
    pub id: LineId,
    /// Operation the line belongs to; deleting it deletes the line
    #[field(label = "Operation")]
    pub operation_id: OperationId,
    /// Line name, unique within its operation
    #[field(label = "Name")]
    pub name: String,
    /// CFOP used when company and partner are in the same state
    #[serde(default)]
    #[field(label = "CFOP Internal")]
    pub cfop_internal_id: Option<CfopId>,
    /// CFOP used when company and partner are in different states
    #[serde(default)]
    #[field(label = "CFOP External")]
    pub cfop_external_id: Option<CfopId>,
    /// CFOP used when company and partner are in different countries
    #[serde(default)]
    #[field(label = "CFOP Export")]
    pub cfop_export_id: Option<CfopId>,
    /// Copied from the operation
    #[serde(default)]
    #[field(label = "Operation Type", readonly)]
    pub operation_type: Option<FiscalInOut>,
    /// Copied from the operation
    #[serde(default)]
    #[field(label = "Fiscal Type", readonly)]
    pub fiscal_type: Option<OperationFiscalType>,
    /// Line of the opposite operation type used for the inverse document
    #[serde(default)]
    #[field(label = "Operation Line Inverse")]
    pub line_inverse_id: Option<LineId>,
    /// Line of the opposite operation type used for refunds
    #[serde(default)]
    #[field(label = "Operation Line Refund")]
    pub line_refund_id: Option<LineId>,
    #[serde(default)]
    #[field(label = "Partner Tax Framework")]
    pub partner_tax_framework: Option<TaxFramework>,
    /// ICMS contributor indicator
    #[serde(default)]
    #[field(label = "Contribuinte do ICMS")]
    pub ind_ie_dest: IndIeDest,
    /// Product fiscal type code
    #[serde(default)]
    #[field(label = "Product Fiscal Type")]
    pub product_type: Option<String>,
    #[serde(default)]
    #[field(label = "Company Tax Framework")]
    pub company_tax_framework: Option<TaxFramework>,
    #[serde(default = "default_true")]
    #[field(label = "Add to Document Amount?")]
    pub add_to_amount: bool,
    /// ICMS origin of the goods, "0" to "8"
    #[serde(default = "default_icms_origin")]
    #[field(label = "Origin")]
    pub icms_origin: String,
    /// Taxes configured directly on the line
    #[serde(default)]
    #[field(label = "Tax Definition")]
    pub tax_definitions: Vec<TaxDefinition>,
    #[serde(default)]
    #[field(label = "Comment")]
    pub comment_ids: Vec<CommentId>,
    #[serde(default)]
    #[field(label = "State", readonly)]
    pub state: LineState,
}

impl OperationLine {
    pub fn new(id: LineId, operation_id: OperationId, name: impl Into<String>) -> Self {
        OperationLine {
            id,
            operation_id,
            name: name.into(),
            cfop_internal_id: None,
            cfop_external_id: None,
            cfop_export_id: None,
            operation_type: None,
            fiscal_type: None,
            line_inverse_id: None,
            line_refund_id: None,
            partner_tax_framework: None,
            ind_ie_dest: IndIeDest::default(),
            product_type: None,
            company_tax_framework: None,
            add_to_amount: true,
            icms_origin: default_icms_origin(),
            tax_definitions: Vec::new(),
            comment_ids: Vec::new(),
            state: LineState::default(),
        }
    }

    pub fn cfop_id(&self, slot: CfopDestination) -> Option<CfopId> {
        match slot {
            CfopDestination::Internal => self.cfop_internal_id,
            CfopDestination::External => self.cfop_external_id,
            CfopDestination::Export => self.cfop_export_id,
        }
    }

    /// Configured CFOP slots, in slot order
    pub fn cfop_ids(&self) -> impl Iterator<Item = (CfopDestination, CfopId)> + '_ {
        [
            CfopDestination::Internal,
            CfopDestination::External,
            CfopDestination::Export,
        ]
        .into_iter()
        .filter_map(|slot| self.cfop_id(slot).map(|id| (slot, id)))
    }

    /// Copies the derived fields from the parent operation
    pub fn sync_from(&mut self, operation: &Operation) {
        self.operation_type = operation.operation_type;
        self.fiscal_type = operation.fiscal_type;
    }

    /// Duplicate as a new draft. Inverse and refund links are not carried over.
    pub fn duplicate(&self, id: LineId, name: impl Into<String>) -> Self {
        OperationLine {
            id,
            name: name.into(),
            line_inverse_id: None,
            line_refund_id: None,
            state: LineState::Draft,
            ..self.clone()
        }
    }
}

/// Advisory check run when a line's operation changes.
pub fn on_change_operation(line: &OperationLine, operation: &Operation) -> Option<Warning> {
    if operation.operation_type.is_none() {
        return Some(Warning::MissingOperationType {
            line: line.id,
            operation: operation.id,
        });
    }
    None
}

/// Audit record of a line state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StateTransition {
    pub line_id: LineId,
    pub from: LineState,
    pub to: LineState,
    #[schemars(with = "String")]
    pub at: DateTime<Utc>,
}

impl LineState {
    /// Explicit review action, allowed from any state.
    pub fn review(self) -> LineState {
        LineState::Review
    }

    pub fn approve(self) -> Result<LineState, FiscalError> {
        match self {
            LineState::Review => Ok(LineState::Approved),
            other => Err(FiscalError::Precondition(format!(
                "cannot approve a line in state {other}, it must be under review"
            ))),
        }
    }

    pub fn is_deletable(self) -> bool {
        self != LineState::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operation(operation_type: Option<FiscalInOut>) -> Operation {
        Operation {
            id: OperationId(1),
            name: "Venda".to_string(),
            operation_type,
            fiscal_type: Some(OperationFiscalType::Sale),
        }
    }

    #[test]
    fn missing_operation_type_warns() {
        let line = OperationLine::new(LineId(1), OperationId(1), "Revenda");
        let warning = on_change_operation(&line, &operation(None)).unwrap();
        assert_eq!(warning.title(), "Warning!");
        assert_eq!(warning.message(), "You must first select a operation type.");

        assert!(on_change_operation(&line, &operation(Some(FiscalInOut::Out))).is_none());
    }

    #[test]
    fn duplicate_resets_state_and_links() {
        let mut line = OperationLine::new(LineId(1), OperationId(1), "Revenda");
        line.state = LineState::Approved;
        line.line_inverse_id = Some(LineId(7));
        line.line_refund_id = Some(LineId(8));
        line.cfop_internal_id = Some(CfopId(3));

        let copy = line.duplicate(LineId(2), "Revenda (copy)");
        assert_eq!(copy.state, LineState::Draft);
        assert_eq!(copy.line_inverse_id, None);
        assert_eq!(copy.line_refund_id, None);
        assert_eq!(copy.cfop_internal_id, Some(CfopId(3)));
    }

    #[test]
    fn approve_requires_review() {
        assert_eq!(LineState::Review.approve(), Ok(LineState::Approved));
        assert!(LineState::Draft.approve().is_err());
        assert_eq!(LineState::Approved.review(), LineState::Review);
    }

    #[test]
    fn defaults_from_minimal_json() {
        let line: OperationLine =
            serde_json::from_str(r#"{"id": 1, "operation_id": 1, "name": "Revenda"}"#).unwrap();
        assert!(line.add_to_amount);
        assert_eq!(line.icms_origin, "0");
        assert_eq!(line.ind_ie_dest, IndIeDest::Contributor);
        assert_eq!(line.state, LineState::Draft);
    }

    #[test]
    fn field_schema_marks_derived_fields_readonly() {
        let fields = OperationLine::field_schema();
        let state = fields.iter().find(|f| f.name == "state").unwrap();
        assert!(state.readonly);
        assert!(!state.required);

        let name = fields.iter().find(|f| f.name == "name").unwrap();
        assert!(name.required);
        assert_eq!(name.label, "Name");

        let cfop = fields.iter().find(|f| f.name == "cfop_export_id").unwrap();
        assert_eq!(cfop.label, "CFOP Export");
        assert!(!cfop.required);
    }
}
