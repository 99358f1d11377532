//! CFOP references and selection of the slot that governs a transaction.
//!
//! An operation line configures up to three CFOPs: one for transactions inside the
//! company's state, one for interstate transactions and one for exports. Which slot
//! applies is decided by comparing the locality of the company and the partner.

use super::ids::CfopId;
use super::parties::Located;
use super::tax::TaxDefinition;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a fiscal movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FiscalInOut {
    In,
    Out,
    All,
}

impl FiscalInOut {
    /// Whether `other` is the opposite direction, as required for inverse and refund lines
    pub fn is_opposite(self, other: FiscalInOut) -> bool {
        self != other
    }
}

impl fmt::Display for FiscalInOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FiscalInOut::In => "in",
            FiscalInOut::Out => "out",
            FiscalInOut::All => "all",
        })
    }
}

/// Destination of a CFOP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CfopDestination {
    /// Same state (code 1)
    #[serde(alias = "1")]
    Internal,
    /// Another state (code 2)
    #[serde(alias = "2")]
    External,
    /// Another country (code 3)
    #[serde(alias = "3")]
    Export,
}

impl CfopDestination {
    pub fn code(self) -> u8 {
        match self {
            CfopDestination::Internal => 1,
            CfopDestination::External => 2,
            CfopDestination::Export => 3,
        }
    }
}

impl fmt::Display for CfopDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CfopDestination::Internal => "internal",
            CfopDestination::External => "external",
            CfopDestination::Export => "export",
        })
    }
}

/// Fiscal operation nature code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Cfop {
    pub id: CfopId,
    /// Four digit code, e.g. "5102"
    pub code: String,
    pub name: String,
    pub type_in_out: FiscalInOut,
    /// Movement type, matched against the fiscal type of the operation as a prefix
    pub type_move: String,
    pub destination: CfopDestination,
    #[serde(default)]
    pub tax_definitions: Vec<TaxDefinition>,
}

impl Cfop {
    /// Checks the field domain an operation line puts on each of its CFOP slots.
    pub fn fits_slot(
        &self,
        slot: CfopDestination,
        operation_type: Option<FiscalInOut>,
        fiscal_type: Option<&str>,
    ) -> Result<(), String> {
        if self.destination != slot {
            return Err(format!("destination is {}", self.destination));
        }
        if let Some(operation_type) = operation_type {
            if self.type_in_out != operation_type {
                return Err(format!(
                    "type is '{}', operation is '{}'",
                    self.type_in_out, operation_type
                ));
            }
        }
        if let Some(fiscal_type) = fiscal_type {
            let type_move = self.type_move.to_lowercase();
            if !type_move.starts_with(&fiscal_type.to_lowercase()) {
                return Err(format!(
                    "movement '{}' does not match fiscal type '{}'",
                    self.type_move, fiscal_type
                ));
            }
        }
        Ok(())
    }
}

/// One locality rule: when `applies` holds, the slot for `destination` is selected.
#[derive(Clone, Copy)]
pub struct CfopRule {
    pub destination: CfopDestination,
    pub applies: fn(company: &dyn Located, partner: &dyn Located) -> bool,
}

impl fmt::Debug for CfopRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CfopRule")
            .field("destination", &self.destination)
            .finish()
    }
}

/// Slot selection rules, evaluated in order. The last rule that applies wins, so a
/// country mismatch always selects the export slot even when states also differ.
pub const CFOP_RULES: [CfopRule; 3] = [
    CfopRule {
        destination: CfopDestination::Internal,
        applies: |company, partner| partner.state() == company.state(),
    },
    CfopRule {
        destination: CfopDestination::External,
        applies: |company, partner| partner.state() != company.state(),
    },
    CfopRule {
        destination: CfopDestination::Export,
        applies: |company, partner| partner.country() != company.country(),
    },
];

/// Destination slot selected for a company/partner pair.
///
/// Unset states compare equal, so two parties without a state fall back to internal.
pub fn select_destination(company: &dyn Located, partner: &dyn Located) -> Option<CfopDestination> {
    CFOP_RULES
        .iter()
        .filter(|rule| (rule.applies)(company, partner))
        .last()
        .map(|rule| rule.destination)
}

/// The three CFOP references configured on a line
#[derive(Debug, Clone, Copy, Default)]
pub struct CfopSlots<'a> {
    pub internal: Option<&'a Cfop>,
    pub external: Option<&'a Cfop>,
    pub export: Option<&'a Cfop>,
}

impl<'a> CfopSlots<'a> {
    pub fn get(&self, destination: CfopDestination) -> Option<&'a Cfop> {
        match destination {
            CfopDestination::Internal => self.internal,
            CfopDestination::External => self.external,
            CfopDestination::Export => self.export,
        }
    }
}

/// Picks the CFOP that governs a transaction.
///
/// Returns `None` when the selected slot is not configured, even if another slot is.
pub fn select_cfop<'a>(
    company: &dyn Located,
    partner: &dyn Located,
    slots: CfopSlots<'a>,
) -> Option<&'a Cfop> {
    let destination = select_destination(company, partner)?;
    let cfop = slots.get(destination);
    log::debug!(
        "CFOP slot {} selected -> {}",
        destination,
        cfop.map_or("none", |c| c.code.as_str())
    );
    cfop
}
