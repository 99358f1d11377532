//! Resolve command - CFOP and taxes for one operation line and transaction

use crate::cmd::{read_catalog, select_lines};
use brfiscal::fiscal::{self, Catalog, ResolutionRequest, ResolutionResult};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Catalog JSON file. Reads from stdin if not specified.
    #[arg(default_value = "-")]
    file: PathBuf,

    /// Operation name or id
    #[arg(short, long)]
    operation: String,

    /// Operation line name
    #[arg(short, long = "line", required = true)]
    lines: Vec<String>,

    /// Company name or id
    #[arg(short, long)]
    company: String,

    /// Partner name or id
    #[arg(short, long)]
    partner: String,

    /// Product name or id
    #[arg(long)]
    product: Option<String>,

    /// NCM code or id, overrides the product's NCM
    #[arg(long)]
    ncm: Option<String>,

    /// NBS service code
    #[arg(long)]
    nbs: Option<String>,

    /// CEST code, passed to the ICMS regulation
    #[arg(long)]
    cest: Option<String>,

    /// Unit price
    #[arg(long)]
    price: Option<Decimal>,

    /// Quantity
    #[arg(long)]
    quantity: Option<Decimal>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// JSON output structure
#[derive(Debug, Serialize)]
struct ResolutionOutput<'a> {
    operation: &'a str,
    line: &'a str,
    company: &'a str,
    partner: &'a str,
    #[serde(flatten)]
    result: &'a ResolutionResult,
    fingerprint: String,
}

#[derive(Debug, Clone, Tabled)]
struct TaxRow {
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Tax")]
    tax: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Source")]
    source: String,
}

impl ResolveCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let catalog = read_catalog(&self.file)?;
        let lines = select_lines(&catalog, &self.operation, &self.lines)?;
        let request = self.request(&catalog)?;

        let result = fiscal::resolve(&catalog, &lines, &request)?;
        let fingerprint = result.fingerprint()?;

        if self.json {
            let output = ResolutionOutput {
                operation: &self.operation,
                line: &lines[0].name,
                company: &request.company.name,
                partner: &request.partner.name,
                result: &result,
                fingerprint,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            self.print_text(&lines[0].name, &request, &result, &fingerprint);
        }
        Ok(())
    }

    fn request<'a>(&'a self, catalog: &'a Catalog) -> anyhow::Result<ResolutionRequest<'a>> {
        let company = catalog
            .find_company(&self.company)
            .ok_or_else(|| anyhow::anyhow!("Unknown company: {}", self.company))?;
        let partner = catalog
            .find_partner(&self.partner)
            .ok_or_else(|| anyhow::anyhow!("Unknown partner: {}", self.partner))?;

        let mut request = ResolutionRequest::new(company, partner);
        if let Some(key) = &self.product {
            let product = catalog
                .find_product(key)
                .ok_or_else(|| anyhow::anyhow!("Unknown product: {key}"))?;
            request = request.product(product);
        }
        if let Some(key) = &self.ncm {
            let ncm = catalog
                .find_ncm(key)
                .ok_or_else(|| anyhow::anyhow!("Unknown NCM: {key}"))?;
            request = request.ncm(ncm);
        }
        if let Some(cest) = &self.cest {
            request = request.cest(cest);
        }
        request.nbs = self.nbs.as_deref();
        request.fiscal_price = self.price;
        request.fiscal_quantity = self.quantity;
        Ok(request)
    }

    fn print_text(
        &self,
        line: &str,
        request: &ResolutionRequest<'_>,
        result: &ResolutionResult,
        fingerprint: &str,
    ) {
        println!();
        println!("FISCAL RESOLUTION");
        println!();
        println!("  Line:     {} / {}", self.operation, line);
        println!(
            "  Parties:  {} ({}) -> {} ({})",
            request.company.name,
            locality(request.company.state.as_deref(), request.company.country.as_deref()),
            request.partner.name,
            locality(request.partner.state.as_deref(), request.partner.country.as_deref()),
        );
        match &result.cfop {
            Some(cfop) => println!("  CFOP:     {} {} ({})", cfop.code, cfop.name, cfop.destination),
            None => println!("  CFOP:     none configured"),
        }
        println!();

        if result.taxes.is_empty() {
            println!("No taxes apply");
        } else {
            let rows: Vec<TaxRow> = result
                .taxes
                .iter()
                .map(|(domain, entry)| TaxRow {
                    domain: domain.to_string(),
                    tax: entry.tax.name.clone(),
                    rate: format!("{:.2}", entry.tax.rate),
                    source: entry.source.to_string(),
                })
                .collect();
            let table = Table::new(rows)
                .with(Style::rounded())
                .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
                .to_string();
            println!("{}", table);
        }

        if !result.taxes.overrides().is_empty() {
            println!();
            println!("Overrides:");
            for o in result.taxes.overrides() {
                println!(
                    "  {}: tax {} ({}) replaced by tax {} ({})",
                    o.domain, o.replaced, o.replaced_source, o.by, o.source
                );
            }
        }

        println!();
        println!("Fingerprint: {}", fingerprint);
    }
}

fn locality(state: Option<&str>, country: Option<&str>) -> String {
    format!("{}/{}", state.unwrap_or("-"), country.unwrap_or("-"))
}
