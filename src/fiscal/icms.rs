use super::ids::{IcmsRegulationId, TaxId};
use super::parties::{Company, Located, Ncm, Partner, Product};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Inputs handed to an ICMS regulation when mapping taxes
#[derive(Debug, Clone, Copy)]
pub struct IcmsQuery<'a> {
    pub company: &'a Company,
    pub partner: &'a Partner,
    pub product: Option<&'a Product>,
    pub ncm: &'a Ncm,
    pub cest: Option<&'a str>,
}

/// Source of ICMS taxes for a company
pub trait IcmsRegulation {
    /// Taxes the regulation applies to a transaction, in application order
    fn map_tax_icms(&self, query: &IcmsQuery<'_>) -> Vec<TaxId>;
}

/// One row of an ICMS regulation table.
///
/// Unset criteria match anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IcmsRule {
    /// State the goods leave from (the company's state)
    #[serde(default)]
    pub state_from: Option<String>,
    /// State the goods go to (the partner's state)
    #[serde(default)]
    pub state_to: Option<String>,
    /// NCM code prefix, separators ignored
    #[serde(default)]
    pub ncm_prefix: Option<String>,
    #[serde(default)]
    pub cest: Option<String>,
    pub tax_ids: Vec<TaxId>,
}

impl IcmsRule {
    fn matches(&self, query: &IcmsQuery<'_>) -> bool {
        let same = |wanted: &Option<String>, actual: Option<&str>| {
            wanted
                .as_deref()
                .is_none_or(|w| actual.is_some_and(|a| a.eq_ignore_ascii_case(w)))
        };

        same(&self.state_from, query.company.state())
            && same(&self.state_to, query.partner.state())
            && same(&self.cest, query.cest)
            && self.ncm_prefix.as_deref().is_none_or(|prefix| {
                let prefix: String = prefix.chars().filter(char::is_ascii_digit).collect();
                query.ncm.digits().starts_with(&prefix)
            })
    }
}

/// Table-driven ICMS regulation: every matching rule contributes its taxes, in table order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IcmsRegulationTable {
    pub id: IcmsRegulationId,
    pub name: String,
    #[serde(default)]
    pub rules: Vec<IcmsRule>,
}

impl IcmsRegulation for IcmsRegulationTable {
    fn map_tax_icms(&self, query: &IcmsQuery<'_>) -> Vec<TaxId> {
        let taxes: Vec<TaxId> = self
            .rules
            .iter()
            .filter(|rule| rule.matches(query))
            .flat_map(|rule| rule.tax_ids.iter().copied())
            .collect();
        log::debug!(
            "ICMS regulation '{}' mapped {} tax(es) for {:?} -> {:?}",
            self.name,
            taxes.len(),
            query.company.state(),
            query.partner.state()
        );
        taxes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiscal::ids::{CompanyId, NcmId, PartnerId};
    use crate::fiscal::parties::TaxFramework;

    fn company(state: &str) -> Company {
        Company {
            id: CompanyId(1),
            name: "Company".to_string(),
            state: Some(state.to_string()),
            country: Some("BR".to_string()),
            tax_framework: TaxFramework::Normal,
            tax_definitions: vec![],
            icms_regulation_id: None,
        }
    }

    fn partner(state: &str) -> Partner {
        Partner {
            id: PartnerId(1),
            name: "Partner".to_string(),
            state: Some(state.to_string()),
            country: Some("BR".to_string()),
            fiscal_profile_id: None,
        }
    }

    fn ncm(code: &str) -> Ncm {
        Ncm {
            id: NcmId(1),
            code: code.to_string(),
            name: String::new(),
            tax_ipi_id: None,
            tax_ii_id: None,
        }
    }

    fn rule(from: Option<&str>, to: Option<&str>, prefix: Option<&str>, tax: u32) -> IcmsRule {
        IcmsRule {
            state_from: from.map(str::to_string),
            state_to: to.map(str::to_string),
            ncm_prefix: prefix.map(str::to_string),
            cest: None,
            tax_ids: vec![TaxId(tax)],
        }
    }

    #[test]
    fn matching_rules_contribute_in_order() {
        let table = IcmsRegulationTable {
            id: IcmsRegulationId(1),
            name: "ICMS SP".to_string(),
            rules: vec![
                rule(Some("SP"), Some("SP"), None, 10),
                rule(Some("SP"), Some("RJ"), None, 11),
                rule(Some("SP"), None, Some("8471"), 12),
            ],
        };
        let (c, p, n) = (company("SP"), partner("SP"), ncm("8471.30.12"));
        let query = IcmsQuery {
            company: &c,
            partner: &p,
            product: None,
            ncm: &n,
            cest: None,
        };

        assert_eq!(table.map_tax_icms(&query), vec![TaxId(10), TaxId(12)]);
    }

    #[test]
    fn cest_rule_requires_cest() {
        let mut cest_rule = rule(None, None, None, 20);
        cest_rule.cest = Some("01.003.00".to_string());
        let table = IcmsRegulationTable {
            id: IcmsRegulationId(1),
            name: "ICMS ST".to_string(),
            rules: vec![cest_rule],
        };
        let (c, p, n) = (company("SP"), partner("MG"), ncm("4011.10.00"));
        let mut query = IcmsQuery {
            company: &c,
            partner: &p,
            product: None,
            ncm: &n,
            cest: None,
        };
        assert!(table.map_tax_icms(&query).is_empty());

        query.cest = Some("01.003.00");
        assert_eq!(table.map_tax_icms(&query), vec![TaxId(20)]);
    }
}
