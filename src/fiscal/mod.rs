pub mod catalog;
pub mod cfop;
pub mod domain_map;
pub mod error;
pub mod icms;
pub mod ids;
pub mod input;
pub mod operation;
pub mod parties;
pub mod resolve;
pub mod schema;
pub mod sources;
pub mod tax;
pub mod warnings;

// Flat public surface for domain types and functions.
pub use catalog::{Catalog, Comment};
pub use cfop::{
    select_cfop, select_destination, Cfop, CfopDestination, CfopRule, CfopSlots, FiscalInOut,
    CFOP_RULES,
};
pub use domain_map::{Override, TaxDomainMap, TaxEntry};
pub use error::FiscalError;
pub use icms::{IcmsQuery, IcmsRegulation, IcmsRegulationTable, IcmsRule};
pub use ids::*;
pub use input::{read_catalog_json, write_catalog_json, FiscalInput};
pub use operation::{
    on_change_operation, IndIeDest, LineState, Operation, OperationFiscalType, OperationLine,
    StateTransition,
};
pub use parties::{
    Company, FiscalProfile, Located, Locality, Ncm, Partner, Product, TaxFramework,
};
pub use resolve::{ensure_one, resolve, resolve_with, ResolutionRequest, ResolutionResult};
pub use schema::FieldInfo;
pub use sources::{TaxSource, TAX_SOURCES};
pub use tax::{Tax, TaxBaseType, TaxDefinition, TaxDomain};
pub use warnings::Warning;
