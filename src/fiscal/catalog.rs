//! In-memory store for fiscal configuration.
//!
//! Holds every record resolution reads, checks references on insert, enforces the unique
//! `(name, operation_id)` pair of operation lines and applies the line lifecycle. Deleting
//! an operation deletes its lines; deleting a line clears inverse/refund links to it.

use super::cfop::Cfop;
use super::error::FiscalError;
use super::icms::IcmsRegulationTable;
use super::ids::{
    CfopId, CommentId, CompanyId, FiscalProfileId, IcmsRegulationId, LineId, NcmId,
    OperationId, PartnerId, ProductId, RecordKind, TaxId,
};
use super::input::FiscalInput;
use super::operation::{self, LineState, Operation, OperationLine, StateTransition};
use super::parties::{Company, FiscalProfile, Ncm, Partner, Product};
use super::tax::{Tax, TaxDefinition};
use super::warnings::Warning;
use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-text comment attached to operation lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Comment {
    pub id: CommentId,
    pub name: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    taxes: BTreeMap<TaxId, Tax>,
    cfops: BTreeMap<CfopId, Cfop>,
    ncms: BTreeMap<NcmId, Ncm>,
    icms_regulations: BTreeMap<IcmsRegulationId, IcmsRegulationTable>,
    fiscal_profiles: BTreeMap<FiscalProfileId, FiscalProfile>,
    companies: BTreeMap<CompanyId, Company>,
    partners: BTreeMap<PartnerId, Partner>,
    products: BTreeMap<ProductId, Product>,
    comments: BTreeMap<CommentId, Comment>,
    operations: BTreeMap<OperationId, Operation>,
    lines: BTreeMap<LineId, OperationLine>,
    audit: Vec<StateTransition>,
}

fn insert_new<K, V>(
    map: &mut BTreeMap<K, V>,
    kind: RecordKind,
    id: K,
    value: V,
) -> Result<(), FiscalError>
where
    K: Ord + Copy + Into<u32>,
{
    if map.contains_key(&id) {
        return Err(FiscalError::DuplicateId {
            kind,
            id: id.into(),
        });
    }
    map.insert(id, value);
    Ok(())
}

fn check_ref<K, V>(
    map: &BTreeMap<K, V>,
    owner: impl FnOnce() -> String,
    kind: RecordKind,
    id: K,
) -> Result<(), FiscalError>
where
    K: Ord + Copy + Into<u32>,
{
    if map.contains_key(&id) {
        Ok(())
    } else {
        Err(FiscalError::InvalidReference {
            owner: owner(),
            kind,
            id: id.into(),
        })
    }
}

fn matches_key(key: &str, id: u32, name: &str) -> bool {
    key.parse::<u32>().is_ok_and(|k| k == id) || name.eq_ignore_ascii_case(key)
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, inserting records so that every reference points backwards.
    pub fn from_input(input: FiscalInput) -> Result<Self, FiscalError> {
        let mut catalog = Catalog::new();
        for tax in input.taxes {
            catalog.insert_tax(tax)?;
        }
        for cfop in input.cfops {
            catalog.insert_cfop(cfop)?;
        }
        for ncm in input.ncms {
            catalog.insert_ncm(ncm)?;
        }
        for regulation in input.icms_regulations {
            catalog.insert_icms_regulation(regulation)?;
        }
        for profile in input.fiscal_profiles {
            catalog.insert_fiscal_profile(profile)?;
        }
        for company in input.companies {
            catalog.insert_company(company)?;
        }
        for partner in input.partners {
            catalog.insert_partner(partner)?;
        }
        for product in input.products {
            catalog.insert_product(product)?;
        }
        for comment in input.comments {
            insert_new(&mut catalog.comments, RecordKind::Comment, comment.id, comment)?;
        }
        for operation in input.operations {
            catalog.insert_operation(operation)?;
        }
        // lines may link to lines further down the list
        let ids: Vec<LineId> = input.operation_lines.iter().map(|l| l.id).collect();
        for line in input.operation_lines {
            catalog.insert_line_unlinked(line)?;
        }
        for id in ids {
            catalog.check_links(id)?;
        }
        catalog.audit = input.audit;

        log::info!(
            "Loaded catalog: {} taxes, {} CFOPs, {} operations, {} lines",
            catalog.taxes.len(),
            catalog.cfops.len(),
            catalog.operations.len(),
            catalog.lines.len()
        );
        Ok(catalog)
    }

    pub fn to_input(&self) -> FiscalInput {
        FiscalInput {
            taxes: self.taxes.values().cloned().collect(),
            cfops: self.cfops.values().cloned().collect(),
            ncms: self.ncms.values().cloned().collect(),
            icms_regulations: self.icms_regulations.values().cloned().collect(),
            fiscal_profiles: self.fiscal_profiles.values().cloned().collect(),
            companies: self.companies.values().cloned().collect(),
            partners: self.partners.values().cloned().collect(),
            products: self.products.values().cloned().collect(),
            comments: self.comments.values().cloned().collect(),
            operations: self.operations.values().cloned().collect(),
            operation_lines: self.lines.values().cloned().collect(),
            audit: self.audit.clone(),
        }
    }

    fn check_taxes(&self, owner: &str, defs: &[TaxDefinition]) -> Result<(), FiscalError> {
        defs.iter().try_for_each(|d| {
            check_ref(&self.taxes, || owner.to_string(), RecordKind::Tax, d.tax_id)
        })
    }

    pub fn insert_tax(&mut self, tax: Tax) -> Result<(), FiscalError> {
        insert_new(&mut self.taxes, RecordKind::Tax, tax.id, tax)
    }

    pub fn insert_cfop(&mut self, cfop: Cfop) -> Result<(), FiscalError> {
        self.check_taxes(&format!("CFOP {}", cfop.code), &cfop.tax_definitions)?;
        insert_new(&mut self.cfops, RecordKind::Cfop, cfop.id, cfop)
    }

    pub fn insert_ncm(&mut self, ncm: Ncm) -> Result<(), FiscalError> {
        for tax_id in ncm.tax_ipi_id.iter().chain(ncm.tax_ii_id.iter()) {
            check_ref(&self.taxes, || format!("NCM {}", ncm.code), RecordKind::Tax, *tax_id)?;
        }
        insert_new(&mut self.ncms, RecordKind::Ncm, ncm.id, ncm)
    }

    pub fn insert_icms_regulation(
        &mut self,
        regulation: IcmsRegulationTable,
    ) -> Result<(), FiscalError> {
        for tax_id in regulation.rules.iter().flat_map(|r| r.tax_ids.iter()) {
            check_ref(
                &self.taxes,
                || format!("ICMS regulation '{}'", regulation.name),
                RecordKind::Tax,
                *tax_id,
            )?;
        }
        insert_new(
            &mut self.icms_regulations,
            RecordKind::IcmsRegulation,
            regulation.id,
            regulation,
        )
    }

    pub fn insert_fiscal_profile(&mut self, profile: FiscalProfile) -> Result<(), FiscalError> {
        self.check_taxes(
            &format!("fiscal profile '{}'", profile.name),
            &profile.tax_definitions,
        )?;
        insert_new(
            &mut self.fiscal_profiles,
            RecordKind::FiscalProfile,
            profile.id,
            profile,
        )
    }

    pub fn insert_company(&mut self, company: Company) -> Result<(), FiscalError> {
        let owner = format!("company '{}'", company.name);
        self.check_taxes(&owner, &company.tax_definitions)?;
        if let Some(id) = company.icms_regulation_id {
            check_ref(&self.icms_regulations, || owner.clone(), RecordKind::IcmsRegulation, id)?;
        }
        insert_new(&mut self.companies, RecordKind::Company, company.id, company)
    }

    pub fn insert_partner(&mut self, partner: Partner) -> Result<(), FiscalError> {
        if let Some(id) = partner.fiscal_profile_id {
            check_ref(
                &self.fiscal_profiles,
                || format!("partner '{}'", partner.name),
                RecordKind::FiscalProfile,
                id,
            )?;
        }
        insert_new(&mut self.partners, RecordKind::Partner, partner.id, partner)
    }

    pub fn insert_product(&mut self, product: Product) -> Result<(), FiscalError> {
        if let Some(id) = product.ncm_id {
            check_ref(
                &self.ncms,
                || format!("product '{}'", product.name),
                RecordKind::Ncm,
                id,
            )?;
        }
        insert_new(&mut self.products, RecordKind::Product, product.id, product)
    }

    pub fn insert_operation(&mut self, operation: Operation) -> Result<(), FiscalError> {
        insert_new(
            &mut self.operations,
            RecordKind::Operation,
            operation.id,
            operation,
        )
    }

    /// Replace an operation and refresh the fields its lines copy from it.
    ///
    /// The refreshed lines, and every line linking to one of them, must still fit their
    /// CFOP slots and inverse/refund links; otherwise nothing changes.
    pub fn update_operation(&mut self, operation: Operation) -> Result<(), FiscalError> {
        let id = operation.id;
        let Some(previous) = self.operations.get(&id).cloned() else {
            return Err(FiscalError::not_found(RecordKind::Operation, id));
        };
        self.operations.insert(id, operation);
        self.sync_lines(id);

        if let Err(err) = self.check_operation_lines(id) {
            self.operations.insert(id, previous);
            self.sync_lines(id);
            return Err(err);
        }
        Ok(())
    }

    fn sync_lines(&mut self, id: OperationId) {
        if let Some(operation) = self.operations.get(&id) {
            for line in self.lines.values_mut().filter(|l| l.operation_id == id) {
                line.sync_from(operation);
            }
        }
    }

    fn check_operation_lines(&self, id: OperationId) -> Result<(), FiscalError> {
        let affected: Vec<LineId> = self.lines_of(id).map(|l| l.id).collect();
        for line in self.lines_of(id) {
            self.check_cfop_slots(line)?;
        }
        let linking = self.lines.values().filter(|l| {
            [l.line_inverse_id, l.line_refund_id]
                .iter()
                .flatten()
                .any(|target| affected.contains(target))
        });
        for line_id in affected.iter().copied().chain(linking.map(|l| l.id)) {
            self.check_links(line_id)?;
        }
        Ok(())
    }

    /// Insert a new line after checking its references, CFOP slots, name uniqueness and
    /// inverse/refund links.
    pub fn insert_line(&mut self, line: OperationLine) -> Result<LineId, FiscalError> {
        let id = line.id;
        self.insert_line_unlinked(line)?;
        if let Err(err) = self.check_links(id) {
            self.lines.remove(&id);
            return Err(err);
        }
        Ok(id)
    }

    fn insert_line_unlinked(&mut self, mut line: OperationLine) -> Result<(), FiscalError> {
        let operation = self
            .operations
            .get(&line.operation_id)
            .ok_or_else(|| FiscalError::InvalidReference {
                owner: format!("operation line '{}'", line.name),
                kind: RecordKind::Operation,
                id: line.operation_id.into(),
            })?;
        line.sync_from(operation);

        let duplicate = self
            .lines
            .values()
            .any(|l| l.operation_id == line.operation_id && l.name == line.name);
        if duplicate {
            return Err(FiscalError::DuplicateLine {
                name: line.name,
                operation: line.operation_id,
            });
        }

        self.check_cfop_slots(&line)?;

        let owner = format!("operation line '{}'", line.name);
        self.check_taxes(&owner, &line.tax_definitions)?;
        for comment_id in &line.comment_ids {
            check_ref(&self.comments, || owner.clone(), RecordKind::Comment, *comment_id)?;
        }

        let valid_origin = line.icms_origin.len() == 1
            && line.icms_origin.chars().all(|c| ('0'..='8').contains(&c));
        if !valid_origin {
            return Err(FiscalError::InvalidIcmsOrigin {
                line: line.id,
                origin: line.icms_origin,
            });
        }

        insert_new(&mut self.lines, RecordKind::OperationLine, line.id, line)
    }

    fn check_cfop_slots(&self, line: &OperationLine) -> Result<(), FiscalError> {
        for (slot, cfop_id) in line.cfop_ids() {
            let cfop = self
                .cfops
                .get(&cfop_id)
                .ok_or_else(|| FiscalError::InvalidReference {
                    owner: format!("operation line '{}'", line.name),
                    kind: RecordKind::Cfop,
                    id: cfop_id.into(),
                })?;
            cfop.fits_slot(
                slot,
                line.operation_type,
                line.fiscal_type.map(|t| t.as_str()),
            )
            .map_err(|reason| FiscalError::CfopSlotMismatch {
                line: line.id,
                code: cfop.code.clone(),
                slot,
                reason,
            })?;
        }
        Ok(())
    }

    /// Inverse and refund lines must both be typed and run in opposite directions
    fn check_links(&self, id: LineId) -> Result<(), FiscalError> {
        let line = self
            .lines
            .get(&id)
            .ok_or_else(|| FiscalError::not_found(RecordKind::OperationLine, id))?;

        let links = [
            ("line_inverse_id", line.line_inverse_id),
            ("line_refund_id", line.line_refund_id),
        ];
        for (field, target) in links {
            let Some(target) = target else {
                continue;
            };
            let other = self
                .lines
                .get(&target)
                .ok_or_else(|| FiscalError::InvalidReference {
                    owner: format!("operation line '{}'", line.name),
                    kind: RecordKind::OperationLine,
                    id: target.into(),
                })?;
            let opposite = match (line.operation_type, other.operation_type) {
                (Some(own), Some(linked)) => own.is_opposite(linked),
                _ => false,
            };
            if !opposite {
                return Err(FiscalError::InverseTypeMismatch { line: id, field });
            }
        }
        Ok(())
    }

    pub fn next_line_id(&self) -> Result<LineId, FiscalError> {
        match self.lines.keys().next_back() {
            None => Ok(LineId(1)),
            Some(last) => last.0.checked_add(1).map(LineId).ok_or_else(|| {
                FiscalError::Precondition(format!("no line id left after {last}"))
            }),
        }
    }

    /// Duplicate a line as a new draft under a new name
    pub fn copy_line(&mut self, id: LineId, name: &str) -> Result<LineId, FiscalError> {
        let line = self
            .line(id)
            .ok_or_else(|| FiscalError::not_found(RecordKind::OperationLine, id))?;
        let copy = line.duplicate(self.next_line_id()?, name);
        self.insert_line(copy)
    }

    fn require_lines(&self, ids: &[LineId]) -> Result<(), FiscalError> {
        match ids.iter().find(|id| !self.lines.contains_key(id)) {
            Some(missing) => Err(FiscalError::not_found(RecordKind::OperationLine, *missing)),
            None => Ok(()),
        }
    }

    fn transition(&mut self, id: LineId, to: LineState) -> Option<StateTransition> {
        let line = self.lines.get_mut(&id)?;
        let event = StateTransition {
            line_id: id,
            from: line.state,
            to,
            at: Utc::now(),
        };
        log::info!("Operation line '{}': {} -> {}", line.name, line.state, to);
        line.state = to;
        self.audit.push(event.clone());
        Some(event)
    }

    /// Send lines to review
    pub fn review(&mut self, ids: &[LineId]) -> Result<Vec<StateTransition>, FiscalError> {
        self.require_lines(ids)?;
        let mut events = Vec::with_capacity(ids.len());
        for id in ids {
            let to = self.lines[id].state.review();
            events.extend(self.transition(*id, to));
        }
        Ok(events)
    }

    /// Approve lines under review. Either every line is approved or none is.
    pub fn approve(&mut self, ids: &[LineId]) -> Result<Vec<StateTransition>, FiscalError> {
        self.require_lines(ids)?;
        let targets = ids
            .iter()
            .map(|id| self.lines[id].state.approve().map(|to| (*id, to)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(targets
            .into_iter()
            .filter_map(|(id, to)| self.transition(id, to))
            .collect())
    }

    /// Delete lines. Fails without deleting anything if one of them is approved.
    pub fn delete_lines(&mut self, ids: &[LineId]) -> Result<Vec<OperationLine>, FiscalError> {
        self.require_lines(ids)?;
        let approved: Vec<&str> = ids
            .iter()
            .map(|id| &self.lines[id])
            .filter(|line| !line.state.is_deletable())
            .map(|line| line.name.as_str())
            .collect();
        if !approved.is_empty() {
            return Err(FiscalError::Precondition(format!(
                "cannot delete approved line: {}",
                approved.join(", ")
            )));
        }
        Ok(self.remove_lines(ids))
    }

    /// Delete an operation and all of its lines, whatever their state
    pub fn delete_operation(&mut self, id: OperationId) -> Result<Vec<OperationLine>, FiscalError> {
        let operation = self
            .operations
            .remove(&id)
            .ok_or_else(|| FiscalError::not_found(RecordKind::Operation, id))?;
        let ids: Vec<LineId> = self.lines_of(id).map(|l| l.id).collect();
        log::info!(
            "Deleting operation '{}' with {} line(s)",
            operation.name,
            ids.len()
        );
        Ok(self.remove_lines(&ids))
    }

    fn remove_lines(&mut self, ids: &[LineId]) -> Vec<OperationLine> {
        let removed: Vec<OperationLine> =
            ids.iter().filter_map(|id| self.lines.remove(id)).collect();
        for line in self.lines.values_mut() {
            if line.line_inverse_id.is_some_and(|l| ids.contains(&l)) {
                line.line_inverse_id = None;
            }
            if line.line_refund_id.is_some_and(|l| ids.contains(&l)) {
                line.line_refund_id = None;
            }
        }
        removed
    }

    /// Advisory check for the line's current operation
    pub fn on_change_operation(&self, id: LineId) -> Result<Option<Warning>, FiscalError> {
        let line = self
            .line(id)
            .ok_or_else(|| FiscalError::not_found(RecordKind::OperationLine, id))?;
        let operation = self
            .operation(line.operation_id)
            .ok_or_else(|| FiscalError::not_found(RecordKind::Operation, line.operation_id))?;
        Ok(operation::on_change_operation(line, operation))
    }

    pub fn tax(&self, id: TaxId) -> Option<&Tax> {
        self.taxes.get(&id)
    }

    pub fn cfop(&self, id: CfopId) -> Option<&Cfop> {
        self.cfops.get(&id)
    }

    pub fn ncm(&self, id: NcmId) -> Option<&Ncm> {
        self.ncms.get(&id)
    }

    pub fn icms_regulation(&self, id: IcmsRegulationId) -> Option<&IcmsRegulationTable> {
        self.icms_regulations.get(&id)
    }

    pub fn fiscal_profile(&self, id: FiscalProfileId) -> Option<&FiscalProfile> {
        self.fiscal_profiles.get(&id)
    }

    pub fn company(&self, id: CompanyId) -> Option<&Company> {
        self.companies.get(&id)
    }

    pub fn partner(&self, id: PartnerId) -> Option<&Partner> {
        self.partners.get(&id)
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    pub fn operation(&self, id: OperationId) -> Option<&Operation> {
        self.operations.get(&id)
    }

    pub fn line(&self, id: LineId) -> Option<&OperationLine> {
        self.lines.get(&id)
    }

    pub fn lines(&self) -> impl Iterator<Item = &OperationLine> {
        self.lines.values()
    }

    pub fn lines_of(&self, operation: OperationId) -> impl Iterator<Item = &OperationLine> {
        self.lines
            .values()
            .filter(move |l| l.operation_id == operation)
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.values()
    }

    pub fn audit(&self) -> &[StateTransition] {
        &self.audit
    }

    /// Lookup by numeric id or case-insensitive name
    pub fn find_operation(&self, key: &str) -> Option<&Operation> {
        self.operations
            .values()
            .find(|o| matches_key(key, o.id.0, &o.name))
    }

    pub fn find_company(&self, key: &str) -> Option<&Company> {
        self.companies
            .values()
            .find(|c| matches_key(key, c.id.0, &c.name))
    }

    pub fn find_partner(&self, key: &str) -> Option<&Partner> {
        self.partners
            .values()
            .find(|p| matches_key(key, p.id.0, &p.name))
    }

    pub fn find_product(&self, key: &str) -> Option<&Product> {
        self.products
            .values()
            .find(|p| matches_key(key, p.id.0, &p.name))
    }

    /// Lookup by NCM code (separators ignored) or numeric id
    pub fn find_ncm(&self, key: &str) -> Option<&Ncm> {
        let digits: String = key.chars().filter(char::is_ascii_digit).collect();
        self.ncms
            .values()
            .find(|n| n.digits() == digits)
            .or_else(|| {
                key.parse::<u32>()
                    .ok()
                    .and_then(|id| self.ncms.get(&NcmId(id)))
            })
    }

    /// Lines of an operation whose names match, in id order. Every name must match.
    pub fn select_lines(
        &self,
        operation: OperationId,
        names: &[String],
    ) -> Result<Vec<&OperationLine>, FiscalError> {
        let mut selected = Vec::new();
        for name in names {
            let found: Vec<&OperationLine> = self
                .lines_of(operation)
                .filter(|l| l.name.eq_ignore_ascii_case(name))
                .collect();
            if found.is_empty() {
                return Err(FiscalError::UnresolvedReference {
                    kind: RecordKind::OperationLine,
                    detail: format!("no line named '{name}' in operation {operation}"),
                });
            }
            selected.extend(found);
        }
        selected.sort_by_key(|l| l.id);
        selected.dedup_by_key(|l| l.id);
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiscal::cfop::{CfopDestination, FiscalInOut};
    use crate::fiscal::operation::OperationFiscalType;
    use crate::fiscal::tax::{TaxBaseType, TaxDomain};
    use rust_decimal_macros::dec;

    fn catalog() -> Catalog {
        let mut c = Catalog::new();
        c.insert_tax(Tax {
            id: TaxId(1),
            name: "ICMS 18%".to_string(),
            domain: TaxDomain::Icms,
            base_type: TaxBaseType::Percent,
            rate: dec!(18),
        })
        .unwrap();
        c.insert_cfop(Cfop {
            id: CfopId(5102),
            code: "5102".to_string(),
            name: "Venda de mercadoria".to_string(),
            type_in_out: FiscalInOut::Out,
            type_move: "sale".to_string(),
            destination: CfopDestination::Internal,
            tax_definitions: vec![TaxId(1).into()],
        })
        .unwrap();
        c.insert_operation(Operation {
            id: OperationId(1),
            name: "Venda".to_string(),
            operation_type: Some(FiscalInOut::Out),
            fiscal_type: Some(OperationFiscalType::Sale),
        })
        .unwrap();
        c.insert_operation(Operation {
            id: OperationId(2),
            name: "Devolução de Venda".to_string(),
            operation_type: Some(FiscalInOut::In),
            fiscal_type: Some(OperationFiscalType::SaleRefund),
        })
        .unwrap();
        c
    }

    fn line(id: u32, operation: u32, name: &str) -> OperationLine {
        OperationLine::new(LineId(id), OperationId(operation), name)
    }

    #[test]
    fn insert_copies_operation_fields() {
        let mut c = catalog();
        let id = c.insert_line(line(1, 1, "Revenda")).unwrap();
        let stored = c.line(id).unwrap();
        assert_eq!(stored.operation_type, Some(FiscalInOut::Out));
        assert_eq!(stored.fiscal_type, Some(OperationFiscalType::Sale));
    }

    #[test]
    fn name_unique_within_operation() {
        let mut c = catalog();
        c.insert_line(line(1, 1, "Revenda")).unwrap();

        let err = c.insert_line(line(2, 1, "Revenda")).unwrap_err();
        assert!(matches!(err, FiscalError::DuplicateLine { .. }));

        // same name under another operation is fine
        assert!(c.insert_line(line(3, 2, "Revenda")).is_ok());
    }

    #[test]
    fn unknown_references_rejected() {
        let mut c = catalog();
        let err = c.insert_line(line(1, 9, "Revenda")).unwrap_err();
        assert!(matches!(
            err,
            FiscalError::InvalidReference {
                kind: RecordKind::Operation,
                ..
            }
        ));

        let mut l = line(1, 1, "Revenda");
        l.tax_definitions.push(TaxId(99).into());
        assert!(matches!(
            c.insert_line(l).unwrap_err(),
            FiscalError::InvalidReference {
                kind: RecordKind::Tax,
                id: 99,
                ..
            }
        ));
    }

    #[test]
    fn cfop_must_fit_its_slot() {
        let mut c = catalog();
        let mut l = line(1, 1, "Revenda");
        l.cfop_external_id = Some(CfopId(5102));
        assert!(matches!(
            c.insert_line(l).unwrap_err(),
            FiscalError::CfopSlotMismatch {
                slot: CfopDestination::External,
                ..
            }
        ));

        let mut l = line(1, 2, "Retorno");
        l.cfop_internal_id = Some(CfopId(5102));
        // CFOP is outbound, operation 2 is inbound
        assert!(c.insert_line(l).is_err());
    }

    #[test]
    fn inverse_line_must_have_opposite_type() {
        let mut c = catalog();
        c.insert_line(line(1, 1, "Revenda")).unwrap();
        c.insert_line(line(2, 1, "Industrializacao")).unwrap();

        let mut same = line(3, 1, "Consumo");
        same.line_inverse_id = Some(LineId(1));
        assert!(matches!(
            c.insert_line(same).unwrap_err(),
            FiscalError::InverseTypeMismatch {
                field: "line_inverse_id",
                ..
            }
        ));
        assert!(c.line(LineId(3)).is_none());

        let mut refund = line(4, 2, "Devolucao");
        refund.line_refund_id = Some(LineId(1));
        assert!(c.insert_line(refund).is_ok());
    }

    #[test]
    fn review_records_transitions() {
        let mut c = catalog();
        c.insert_line(line(1, 1, "Revenda")).unwrap();
        c.insert_line(line(2, 1, "Consumo")).unwrap();

        let events = c.review(&[LineId(1), LineId(2)]).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.from == LineState::Draft));
        assert_eq!(c.line(LineId(1)).unwrap().state, LineState::Review);
        assert_eq!(c.audit().len(), 2);
    }

    #[test]
    fn review_of_missing_line_changes_nothing() {
        let mut c = catalog();
        c.insert_line(line(1, 1, "Revenda")).unwrap();
        assert!(c.review(&[LineId(1), LineId(42)]).is_err());
        assert_eq!(c.line(LineId(1)).unwrap().state, LineState::Draft);
        assert!(c.audit().is_empty());
    }

    #[test]
    fn approve_is_all_or_nothing() {
        let mut c = catalog();
        c.insert_line(line(1, 1, "Revenda")).unwrap();
        c.insert_line(line(2, 1, "Consumo")).unwrap();
        c.review(&[LineId(1)]).unwrap();

        assert!(c.approve(&[LineId(1), LineId(2)]).is_err());
        assert_eq!(c.line(LineId(1)).unwrap().state, LineState::Review);

        c.approve(&[LineId(1)]).unwrap();
        assert_eq!(c.line(LineId(1)).unwrap().state, LineState::Approved);
    }

    #[test]
    fn approved_lines_cannot_be_deleted() {
        let mut c = catalog();
        c.insert_line(line(1, 1, "Revenda")).unwrap();
        c.insert_line(line(2, 1, "Consumo")).unwrap();
        c.review(&[LineId(1)]).unwrap();
        c.approve(&[LineId(1)]).unwrap();

        let err = c.delete_lines(&[LineId(1), LineId(2)]).unwrap_err();
        match err {
            FiscalError::Precondition(msg) => {
                assert!(msg.contains("cannot delete approved line"));
                assert!(msg.contains("Revenda"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(c.lines().count(), 2);
    }

    #[test]
    fn draft_and_review_lines_can_be_deleted() {
        let mut c = catalog();
        c.insert_line(line(1, 1, "Revenda")).unwrap();
        c.insert_line(line(2, 1, "Consumo")).unwrap();
        c.review(&[LineId(2)]).unwrap();

        let removed = c.delete_lines(&[LineId(1), LineId(2)]).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(c.lines().count(), 0);
    }

    #[test]
    fn deleting_a_line_clears_links_to_it() {
        let mut c = catalog();
        c.insert_line(line(1, 2, "Devolucao")).unwrap();
        let mut sale = line(2, 1, "Revenda");
        sale.line_refund_id = Some(LineId(1));
        c.insert_line(sale).unwrap();

        c.delete_lines(&[LineId(1)]).unwrap();
        assert_eq!(c.line(LineId(2)).unwrap().line_refund_id, None);
    }

    #[test]
    fn deleting_operation_cascades() {
        let mut c = catalog();
        c.insert_line(line(1, 1, "Revenda")).unwrap();
        c.insert_line(line(2, 1, "Consumo")).unwrap();
        c.insert_line(line(3, 2, "Devolucao")).unwrap();
        c.review(&[LineId(1)]).unwrap();
        c.approve(&[LineId(1)]).unwrap();

        let removed = c.delete_operation(OperationId(1)).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(c.operation(OperationId(1)).is_none());
        assert_eq!(c.lines().map(|l| l.id).collect::<Vec<_>>(), vec![LineId(3)]);
    }

    #[test]
    fn updating_operation_refreshes_lines() {
        let mut c = catalog();
        c.insert_line(line(1, 1, "Revenda")).unwrap();
        c.update_operation(Operation {
            id: OperationId(1),
            name: "Venda".to_string(),
            operation_type: None,
            fiscal_type: Some(OperationFiscalType::Sale),
        })
        .unwrap();

        assert_eq!(c.line(LineId(1)).unwrap().operation_type, None);
        let warning = c.on_change_operation(LineId(1)).unwrap();
        assert!(matches!(warning, Some(Warning::MissingOperationType { .. })));
    }

    #[test]
    fn update_operation_rejects_broken_refund_link() {
        let mut c = catalog();
        c.insert_line(line(1, 2, "Devolucao")).unwrap();
        let mut sale = line(2, 1, "Revenda");
        sale.line_refund_id = Some(LineId(1));
        c.insert_line(sale).unwrap();

        let err = c
            .update_operation(Operation {
                id: OperationId(2),
                name: "Devolução de Venda".to_string(),
                operation_type: Some(FiscalInOut::Out),
                fiscal_type: Some(OperationFiscalType::SaleRefund),
            })
            .unwrap_err();
        assert_eq!(
            err,
            FiscalError::InverseTypeMismatch {
                line: LineId(2),
                field: "line_refund_id"
            }
        );

        // nothing changed
        let operation = c.operation(OperationId(2)).unwrap();
        assert_eq!(operation.operation_type, Some(FiscalInOut::In));
        assert_eq!(
            c.line(LineId(1)).unwrap().operation_type,
            Some(FiscalInOut::In)
        );
    }

    #[test]
    fn update_operation_rejects_cfop_slot_mismatch() {
        let mut c = catalog();
        let mut l = line(1, 1, "Revenda");
        l.cfop_internal_id = Some(CfopId(5102));
        c.insert_line(l).unwrap();

        let err = c
            .update_operation(Operation {
                id: OperationId(1),
                name: "Compra".to_string(),
                operation_type: Some(FiscalInOut::In),
                fiscal_type: Some(OperationFiscalType::Sale),
            })
            .unwrap_err();
        assert!(matches!(
            err,
            FiscalError::CfopSlotMismatch {
                slot: CfopDestination::Internal,
                ..
            }
        ));
        assert_eq!(c.operation(OperationId(1)).unwrap().name, "Venda");
        assert_eq!(
            c.line(LineId(1)).unwrap().operation_type,
            Some(FiscalInOut::Out)
        );
    }

    #[test]
    fn untyped_lines_cannot_be_linked() {
        let mut c = catalog();
        c.insert_operation(Operation {
            id: OperationId(3),
            name: "Remessa".to_string(),
            operation_type: None,
            fiscal_type: None,
        })
        .unwrap();
        c.insert_line(line(1, 1, "Revenda")).unwrap();

        let mut untyped = line(2, 3, "Remessa para conserto");
        untyped.line_inverse_id = Some(LineId(1));
        assert!(matches!(
            c.insert_line(untyped).unwrap_err(),
            FiscalError::InverseTypeMismatch {
                field: "line_inverse_id",
                ..
            }
        ));

        c.insert_line(line(2, 3, "Remessa para conserto")).unwrap();
        let mut typed = line(3, 1, "Retorno de conserto");
        typed.line_refund_id = Some(LineId(2));
        assert!(matches!(
            c.insert_line(typed).unwrap_err(),
            FiscalError::InverseTypeMismatch {
                field: "line_refund_id",
                ..
            }
        ));
    }

    #[test]
    fn copy_line_fails_when_ids_run_out() {
        let mut c = catalog();
        c.insert_line(line(u32::MAX, 1, "Revenda")).unwrap();

        let err = c.copy_line(LineId(u32::MAX), "Revenda 2").unwrap_err();
        assert!(matches!(err, FiscalError::Precondition(_)));
        assert_eq!(c.lines().count(), 1);
    }

    #[test]
    fn copy_line_gets_new_id_and_draft_state() {
        let mut c = catalog();
        c.insert_line(line(1, 1, "Revenda")).unwrap();
        c.review(&[LineId(1)]).unwrap();

        let copy = c.copy_line(LineId(1), "Revenda 2").unwrap();
        assert_eq!(copy, LineId(2));
        assert_eq!(c.line(copy).unwrap().state, LineState::Draft);
        assert!(c.copy_line(LineId(1), "Revenda 2").is_err());
    }

    #[test]
    fn select_lines_by_name() {
        let mut c = catalog();
        c.insert_line(line(1, 1, "Revenda")).unwrap();
        c.insert_line(line(2, 1, "Consumo")).unwrap();

        let selected = c
            .select_lines(OperationId(1), &["consumo".to_string()])
            .unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, LineId(2));

        assert!(c
            .select_lines(OperationId(1), &["Ativo".to_string()])
            .is_err());
    }

    #[test]
    fn round_trips_through_input() {
        let mut c = catalog();
        c.insert_line(line(1, 1, "Revenda")).unwrap();
        c.review(&[LineId(1)]).unwrap();

        let reloaded = Catalog::from_input(c.to_input()).unwrap();
        assert_eq!(reloaded.line(LineId(1)), c.line(LineId(1)));
        assert_eq!(reloaded.audit().len(), 1);
    }

    #[test]
    fn invalid_icms_origin_rejected() {
        let mut c = catalog();
        let mut l = line(1, 1, "Revenda");
        l.icms_origin = "9".to_string();
        assert!(matches!(
            c.insert_line(l).unwrap_err(),
            FiscalError::InvalidIcmsOrigin { .. }
        ));
    }
}
