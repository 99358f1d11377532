use super::catalog::{Catalog, Comment};
use super::cfop::Cfop;
use super::error::FiscalError;
use super::icms::IcmsRegulationTable;
use super::operation::{Operation, OperationLine, StateTransition};
use super::parties::{Company, FiscalProfile, Ncm, Partner, Product};
use super::tax::Tax;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Input root for the catalog JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FiscalInput {
    #[serde(default)]
    pub taxes: Vec<Tax>,
    #[serde(default)]
    pub cfops: Vec<Cfop>,
    #[serde(default)]
    pub ncms: Vec<Ncm>,
    #[serde(default)]
    pub icms_regulations: Vec<IcmsRegulationTable>,
    #[serde(default)]
    pub fiscal_profiles: Vec<FiscalProfile>,
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub partners: Vec<Partner>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub operation_lines: Vec<OperationLine>,
    /// State changes recorded so far
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audit: Vec<StateTransition>,
}

/// Read and validate a catalog from JSON
pub fn read_catalog_json<R: Read>(reader: R) -> anyhow::Result<Catalog> {
    let input: FiscalInput = serde_json::from_reader(reader)?;
    let catalog = Catalog::from_input(input)?;
    Ok(catalog)
}

pub fn write_catalog_json<W: Write>(catalog: &Catalog, writer: W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(writer, &catalog.to_input())?;
    Ok(())
}

impl TryFrom<FiscalInput> for Catalog {
    type Error = FiscalError;

    fn try_from(input: FiscalInput) -> Result<Self, Self::Error> {
        Catalog::from_input(input)
    }
}
