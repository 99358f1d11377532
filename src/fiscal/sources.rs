//! The six rule sources layered into a resolution, and what each one contributes.

use super::catalog::Catalog;
use super::cfop::{Cfop, CfopDestination};
use super::icms::{IcmsQuery, IcmsRegulation};
use super::ids::TaxId;
use super::operation::OperationLine;
use super::parties::{Company, Ncm, Partner, Product};
use super::tax::{Tax, TaxDefinition, TaxDomain};
use serde::Serialize;
use std::fmt;

/// Where a tax in the result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxSource {
    /// Company defaults
    Company,
    /// IPI and II bound to the product's NCM
    Ncm,
    /// Company ICMS regulation
    IcmsRegulation,
    /// Taxes configured on the operation line
    OperationLine,
    /// Taxes attached to the selected CFOP
    Cfop,
    /// Partner fiscal profile
    FiscalProfile,
}

/// Application order. A later source overrides an earlier one on the same tax domain.
pub const TAX_SOURCES: [TaxSource; 6] = [
    TaxSource::Company,
    TaxSource::Ncm,
    TaxSource::IcmsRegulation,
    TaxSource::OperationLine,
    TaxSource::Cfop,
    TaxSource::FiscalProfile,
];

impl fmt::Display for TaxSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaxSource::Company => "company",
            TaxSource::Ncm => "NCM",
            TaxSource::IcmsRegulation => "ICMS regulation",
            TaxSource::OperationLine => "operation line",
            TaxSource::Cfop => "CFOP",
            TaxSource::FiscalProfile => "fiscal profile",
        })
    }
}

/// Everything the sources may read during one resolution
pub struct SourceContext<'a> {
    pub catalog: &'a Catalog,
    pub line: &'a OperationLine,
    pub company: &'a Company,
    pub partner: &'a Partner,
    pub product: Option<&'a Product>,
    /// Resolved NCM; always set when the company uses the normal tax framework
    pub ncm: Option<&'a Ncm>,
    pub cest: Option<&'a str>,
    pub cfop: Option<&'a Cfop>,
    pub regulation: Option<&'a dyn IcmsRegulation>,
}

impl TaxSource {
    /// Only company defaults apply outside the normal tax framework
    pub fn applies_to(self, company: &Company) -> bool {
        self == TaxSource::Company || company.tax_framework.is_normal()
    }

    /// Taxes this source contributes, keyed by domain, in application order
    pub fn provide<'a>(self, ctx: &SourceContext<'a>) -> Vec<(TaxDomain, &'a Tax)> {
        let ids = match self {
            TaxSource::Company => definitions(&ctx.company.tax_definitions),
            TaxSource::Ncm => ncm_taxes(ctx),
            TaxSource::IcmsRegulation => icms_taxes(ctx),
            TaxSource::OperationLine => definitions(&ctx.line.tax_definitions),
            TaxSource::Cfop => ctx
                .cfop
                .map(|cfop| definitions(&cfop.tax_definitions))
                .unwrap_or_default(),
            TaxSource::FiscalProfile => ctx
                .partner
                .fiscal_profile_id
                .and_then(|id| ctx.catalog.fiscal_profile(id))
                .map(|profile| definitions(&profile.tax_definitions))
                .unwrap_or_default(),
        };

        ids.into_iter()
            .filter_map(|id| match ctx.catalog.tax(id) {
                Some(tax) => Some((tax.domain, tax)),
                None => {
                    log::warn!("{} references unknown tax {}, skipped", self, id);
                    None
                }
            })
            .collect()
    }
}

fn definitions(defs: &[TaxDefinition]) -> Vec<TaxId> {
    defs.iter().map(|d| d.tax_id).collect()
}

fn ncm_taxes(ctx: &SourceContext<'_>) -> Vec<TaxId> {
    let Some(ncm) = ctx.ncm else {
        return Vec::new();
    };
    let mut ids: Vec<TaxId> = ncm.tax_ipi_id.into_iter().collect();
    let export = ctx
        .cfop
        .is_some_and(|cfop| cfop.destination == CfopDestination::Export);
    if export {
        ids.extend(ncm.tax_ii_id);
    }
    ids
}

fn icms_taxes(ctx: &SourceContext<'_>) -> Vec<TaxId> {
    match (ctx.regulation, ctx.ncm) {
        (Some(regulation), Some(ncm)) => regulation.map_tax_icms(&IcmsQuery {
            company: ctx.company,
            partner: ctx.partner,
            product: ctx.product,
            ncm,
            cest: ctx.cest,
        }),
        _ => Vec::new(),
    }
}
