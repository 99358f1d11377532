//! Tax rule resolution for an operation line.
//!
//! Given a company, a partner and optionally a product, the engine selects the CFOP that
//! governs the transaction and layers the taxes of each
//! [`TaxSource`](super::sources::TaxSource) into a
//! [`TaxDomainMap`], in [`TAX_SOURCES`] order. Companies outside the normal tax framework
//! only get their own defaults.

use super::catalog::Catalog;
use super::cfop::{select_cfop, Cfop, CfopSlots};
use super::domain_map::TaxDomainMap;
use super::error::FiscalError;
use super::icms::IcmsRegulation;
use super::ids::RecordKind;
use super::operation::OperationLine;
use super::parties::{Company, Ncm, Partner, Product};
use super::sources::{SourceContext, TAX_SOURCES};
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Transaction facts supplied by the caller
#[derive(Debug, Clone, Copy)]
pub struct ResolutionRequest<'a> {
    pub company: &'a Company,
    pub partner: &'a Partner,
    pub product: Option<&'a Product>,
    /// Unit price; accepted for callers that compute amounts downstream
    pub fiscal_price: Option<Decimal>,
    pub fiscal_quantity: Option<Decimal>,
    /// Overrides the product's NCM
    pub ncm: Option<&'a Ncm>,
    pub nbs: Option<&'a str>,
    pub cest: Option<&'a str>,
}

impl<'a> ResolutionRequest<'a> {
    pub fn new(company: &'a Company, partner: &'a Partner) -> Self {
        ResolutionRequest {
            company,
            partner,
            product: None,
            fiscal_price: None,
            fiscal_quantity: None,
            ncm: None,
            nbs: None,
            cest: None,
        }
    }

    pub fn product(mut self, product: &'a Product) -> Self {
        self.product = Some(product);
        self
    }

    pub fn ncm(mut self, ncm: &'a Ncm) -> Self {
        self.ncm = Some(ncm);
        self
    }

    pub fn cest(mut self, cest: &'a str) -> Self {
        self.cest = Some(cest);
        self
    }
}

/// Outcome of a resolution. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    pub taxes: TaxDomainMap,
    pub cfop: Option<Cfop>,
    /// Always zero: amounts are computed elsewhere
    pub taxes_value: Decimal,
}

impl ResolutionResult {
    /// SHA-256 of the result's JSON form, for comparing resolutions
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

/// The single line of a selection, or `MultipleRecords`
pub fn ensure_one<'a>(lines: &[&'a OperationLine]) -> Result<&'a OperationLine, FiscalError> {
    match lines {
        [line] => Ok(*line),
        _ => Err(FiscalError::MultipleRecords { count: lines.len() }),
    }
}

/// Resolve CFOP and taxes for a selection of lines, using the company's regulation from
/// the catalog.
pub fn resolve(
    catalog: &Catalog,
    lines: &[&OperationLine],
    request: &ResolutionRequest<'_>,
) -> Result<ResolutionResult, FiscalError> {
    let regulation = request
        .company
        .icms_regulation_id
        .and_then(|id| catalog.icms_regulation(id))
        .map(|table| table as &dyn IcmsRegulation);
    resolve_with(catalog, lines, request, regulation)
}

/// Like [`resolve`] with an explicit ICMS regulation.
pub fn resolve_with(
    catalog: &Catalog,
    lines: &[&OperationLine],
    request: &ResolutionRequest<'_>,
    regulation: Option<&dyn IcmsRegulation>,
) -> Result<ResolutionResult, FiscalError> {
    let line = ensure_one(lines)?;
    let company = request.company;

    let slots = CfopSlots {
        internal: line.cfop_internal_id.and_then(|id| catalog.cfop(id)),
        external: line.cfop_external_id.and_then(|id| catalog.cfop(id)),
        export: line.cfop_export_id.and_then(|id| catalog.cfop(id)),
    };
    let cfop = select_cfop(company, request.partner, slots);

    // only the normal framework layers NCM taxes
    let ncm = if company.tax_framework.is_normal() {
        let ncm = match request.ncm {
            Some(ncm) => Some(ncm),
            None => product_ncm(catalog, request.product)?,
        };
        if ncm.is_none() {
            return Err(FiscalError::UnresolvedReference {
                kind: RecordKind::Ncm,
                detail: format!(
                    "operation line '{}' needs an NCM under {}, pass one or a product",
                    line.name, company.tax_framework
                ),
            });
        }
        ncm
    } else {
        request.ncm
    };

    let ctx = SourceContext {
        catalog,
        line,
        company,
        partner: request.partner,
        product: request.product,
        ncm,
        cest: request.cest,
        cfop,
        regulation,
    };

    let mut taxes = TaxDomainMap::new();
    for source in TAX_SOURCES.iter().filter(|s| s.applies_to(company)) {
        let provided = source.provide(&ctx);
        log::debug!("{} contributes {} tax(es)", source, provided.len());
        for (_, tax) in provided {
            taxes.insert(tax, *source);
        }
    }

    log::info!(
        "Resolved line '{}' for {} -> {}: CFOP {}, {} tax domain(s)",
        line.name,
        company.name,
        request.partner.name,
        cfop.map_or("none", |c| c.code.as_str()),
        taxes.len()
    );

    Ok(ResolutionResult {
        taxes,
        cfop: cfop.cloned(),
        taxes_value: Decimal::ZERO,
    })
}

fn product_ncm<'a>(
    catalog: &'a Catalog,
    product: Option<&Product>,
) -> Result<Option<&'a Ncm>, FiscalError> {
    let Some(ncm_id) = product.and_then(|p| p.ncm_id) else {
        return Ok(None);
    };
    catalog
        .ncm(ncm_id)
        .map(Some)
        .ok_or_else(|| FiscalError::UnresolvedReference {
            kind: RecordKind::Ncm,
            detail: format!("product NCM {ncm_id} is not in the catalog"),
        })
}
