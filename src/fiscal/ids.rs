use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! record_id {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
                JsonSchema,
            )]
            #[serde(transparent)]
            pub struct $name(pub u32);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<$name> for u32 {
                fn from(id: $name) -> u32 {
                    id.0
                }
            }
        )*
    };
}

record_id! {
    /// Identifier of a tax (one tax domain plus its computation rule)
    TaxId,
    CfopId,
    NcmId,
    CompanyId,
    PartnerId,
    ProductId,
    FiscalProfileId,
    IcmsRegulationId,
    OperationId,
    /// Identifier of an operation line
    LineId,
    CommentId,
}

/// Kind of record, used in error messages and reference checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Tax,
    Cfop,
    Ncm,
    Company,
    Partner,
    Product,
    FiscalProfile,
    IcmsRegulation,
    Operation,
    OperationLine,
    Comment,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Tax => "tax",
            RecordKind::Cfop => "CFOP",
            RecordKind::Ncm => "NCM",
            RecordKind::Company => "company",
            RecordKind::Partner => "partner",
            RecordKind::Product => "product",
            RecordKind::FiscalProfile => "fiscal profile",
            RecordKind::IcmsRegulation => "ICMS regulation",
            RecordKind::Operation => "operation",
            RecordKind::OperationLine => "operation line",
            RecordKind::Comment => "comment",
        };
        f.write_str(name)
    }
}
