use super::ids::TaxId;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tax domain, the key used to de-duplicate competing tax definitions
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum TaxDomain {
    Icms,
    IcmsSt,
    IcmsFcp,
    Ipi,
    Ii,
    Pis,
    PisSt,
    Cofins,
    CofinsSt,
    Issqn,
    Csll,
    Irpj,
    Inss,
}

impl TaxDomain {
    pub fn label(self) -> &'static str {
        match self {
            TaxDomain::Icms => "ICMS",
            TaxDomain::IcmsSt => "ICMS ST",
            TaxDomain::IcmsFcp => "ICMS FCP",
            TaxDomain::Ipi => "IPI",
            TaxDomain::Ii => "II",
            TaxDomain::Pis => "PIS",
            TaxDomain::PisSt => "PIS ST",
            TaxDomain::Cofins => "COFINS",
            TaxDomain::CofinsSt => "COFINS ST",
            TaxDomain::Issqn => "ISSQN",
            TaxDomain::Csll => "CSLL",
            TaxDomain::Irpj => "IRPJ",
            TaxDomain::Inss => "INSS",
        }
    }
}

impl fmt::Display for TaxDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the tax base is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaxBaseType {
    #[default]
    Percent,
    Quantity,
    Fixed,
}

/// A tax: one domain plus the computation rule attached to it.
///
/// Rates are carried for downstream computation only; resolution never reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Tax {
    pub id: TaxId,
    pub name: String,
    pub domain: TaxDomain,
    #[serde(default)]
    pub base_type: TaxBaseType,
    #[serde(default)]
    #[schemars(with = "f64")]
    pub rate: Decimal,
}

/// A configured reference to a tax, owned by the record that configures it
/// (company, operation line, CFOP or fiscal profile)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaxDefinition {
    pub tax_id: TaxId,
    /// Situation code (CST) to report with the tax
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cst: Option<String>,
}

impl TaxDefinition {
    pub fn new(tax_id: TaxId) -> Self {
        TaxDefinition { tax_id, cst: None }
    }
}

impl From<TaxId> for TaxDefinition {
    fn from(tax_id: TaxId) -> Self {
        TaxDefinition::new(tax_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_keys_match_lowercase_codes() {
        let json = serde_json::to_string(&[TaxDomain::IcmsSt, TaxDomain::Ii]).unwrap();
        assert_eq!(json, r#"["icmsst","ii"]"#);

        let parsed: TaxDomain = serde_json::from_str(r#""cofinsst""#).unwrap();
        assert_eq!(parsed, TaxDomain::CofinsSt);
    }

    #[test]
    fn tax_rule_defaults_to_percent() {
        let tax: Tax =
            serde_json::from_str(r#"{"id": 1, "name": "IPI 5%", "domain": "ipi"}"#).unwrap();
        assert_eq!(tax.base_type, TaxBaseType::Percent);
        assert!(tax.rate.is_zero());
    }
}
