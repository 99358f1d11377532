//! Lines command - list configured operation lines with filtering

use crate::cmd::read_catalog;
use brfiscal::fiscal::{Catalog, CfopDestination, LineState, OperationLine};
use clap::{Args, ValueEnum};
use std::{io, path::PathBuf};
use tabled::{
    settings::{Style, Width},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct LinesCommand {
    /// Catalog JSON file. Reads from stdin if not specified.
    #[arg(default_value = "-")]
    file: PathBuf,

    /// Filter by operation name or id
    #[arg(short, long)]
    operation: Option<String>,

    /// Filter by state
    #[arg(short, long, value_enum)]
    state: Option<StateFilter>,

    /// Output as CSV instead of formatted table
    #[arg(long)]
    csv: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StateFilter {
    Draft,
    Review,
    Approved,
}

impl From<StateFilter> for LineState {
    fn from(filter: StateFilter) -> Self {
        match filter {
            StateFilter::Draft => LineState::Draft,
            StateFilter::Review => LineState::Review,
            StateFilter::Approved => LineState::Approved,
        }
    }
}

/// Row for the lines table output
#[derive(Debug, Clone, Tabled, serde::Serialize)]
pub struct LineRow {
    #[tabled(rename = "#")]
    id: u32,
    #[tabled(rename = "Operation")]
    operation: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    operation_type: String,
    #[tabled(rename = "Fiscal Type")]
    fiscal_type: String,
    #[tabled(rename = "CFOP Int.")]
    cfop_internal: String,
    #[tabled(rename = "CFOP Ext.")]
    cfop_external: String,
    #[tabled(rename = "CFOP Exp.")]
    cfop_export: String,
    #[tabled(rename = "Taxes")]
    taxes: String,
    #[tabled(rename = "State")]
    state: String,
}

impl LinesCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let catalog = read_catalog(&self.file)?;

        let operation = match &self.operation {
            Some(key) => Some(
                catalog
                    .find_operation(key)
                    .ok_or_else(|| anyhow::anyhow!("Unknown operation: {key}"))?
                    .id,
            ),
            None => None,
        };
        let state = self.state.map(LineState::from);

        let rows: Vec<LineRow> = catalog
            .lines()
            .filter(|l| operation.is_none_or(|o| l.operation_id == o))
            .filter(|l| state.is_none_or(|s| l.state == s))
            .map(|l| build_row(&catalog, l))
            .collect();

        if self.csv {
            self.write_csv(&rows)
        } else {
            self.print_table(&rows);
            Ok(())
        }
    }

    fn print_table(&self, rows: &[LineRow]) {
        if rows.is_empty() {
            println!("No operation lines found matching filters");
            return;
        }

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Width::wrap(160))
            .to_string();
        println!("{}", table);
    }

    fn write_csv(&self, rows: &[LineRow]) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_writer(io::stdout());
        for row in rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn build_row(catalog: &Catalog, line: &OperationLine) -> LineRow {
    let cfop_code = |slot: CfopDestination| {
        line.cfop_id(slot)
            .and_then(|id| catalog.cfop(id))
            .map_or_else(String::new, |c| c.code.clone())
    };
    let taxes = line
        .tax_definitions
        .iter()
        .filter_map(|d| catalog.tax(d.tax_id))
        .map(|t| t.name.clone())
        .collect::<Vec<_>>()
        .join(", ");

    LineRow {
        id: line.id.0,
        operation: catalog
            .operation(line.operation_id)
            .map_or_else(|| line.operation_id.to_string(), |o| o.name.clone()),
        name: line.name.clone(),
        operation_type: line
            .operation_type
            .map_or_else(String::new, |t| t.to_string()),
        fiscal_type: line.fiscal_type.map_or_else(String::new, |t| t.to_string()),
        cfop_internal: cfop_code(CfopDestination::Internal),
        cfop_external: cfop_code(CfopDestination::External),
        cfop_export: cfop_code(CfopDestination::Export),
        taxes,
        state: line.state.to_string(),
    }
}
