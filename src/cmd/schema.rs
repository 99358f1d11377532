//! Schema command - print the expected catalog format

use brfiscal::fiscal::{FieldInfo, FiscalInput, Operation, OperationLine};
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the catalog input
    JsonSchema,
    /// Field table of operation lines
    LineFields,
    /// Field table of operations
    OperationFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::LineFields => {
                print_fields("Operation Line Fields", OperationLine::field_schema());
                Ok(())
            }
            SchemaFormat::OperationFields => {
                print_fields("Operation Fields", Operation::field_schema());
                Ok(())
            }
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = schema_for!(FiscalInput);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }
}

fn print_fields(title: &str, fields: &[FieldInfo]) {
    println!("{}", title);
    println!("{}", "=".repeat(title.len()));
    println!();
    for field in fields {
        let req = if field.required { "required" } else { "optional" };
        let ro = if field.readonly { ", readonly" } else { "" };
        println!(
            "{:24} {:26} ({}{})  {}",
            field.name, field.label, req, ro, field.description
        );
    }
}
