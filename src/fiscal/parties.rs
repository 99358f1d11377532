//! Records supplied by the caller: companies, partners, products and their fiscal
//! classification. Resolution reads these but never changes them.

use super::ids::{
    CompanyId, FiscalProfileId, IcmsRegulationId, NcmId, PartnerId, ProductId, TaxId,
};
use super::tax::TaxDefinition;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Anything with a state and a country, compared when selecting the CFOP slot
pub trait Located {
    fn state(&self) -> Option<&str>;
    fn country(&self) -> Option<&str>;
}

/// A bare state/country pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locality {
    pub state: Option<String>,
    pub country: Option<String>,
}

impl Locality {
    pub fn new(state: Option<&str>, country: Option<&str>) -> Self {
        Locality {
            state: state.map(str::to_string),
            country: country.map(str::to_string),
        }
    }
}

impl Located for Locality {
    fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }
}

/// Company tax regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaxFramework {
    /// Simples Nacional (code 1)
    #[serde(alias = "1")]
    SimplesNacional,
    /// Simples Nacional above the gross revenue sub-limit (code 2)
    #[serde(alias = "2")]
    SimplesNacionalExcess,
    /// Regime Normal (code 3)
    #[default]
    #[serde(alias = "3")]
    Normal,
}

impl TaxFramework {
    pub fn is_normal(self) -> bool {
        self == TaxFramework::Normal
    }
}

impl fmt::Display for TaxFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaxFramework::SimplesNacional => "Simples Nacional",
            TaxFramework::SimplesNacionalExcess => "Simples Nacional (excess)",
            TaxFramework::Normal => "Regime Normal",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    /// State code, e.g. "SP"
    #[serde(default)]
    pub state: Option<String>,
    /// Country code, e.g. "BR"
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub tax_framework: TaxFramework,
    /// Taxes applied to every operation of the company
    #[serde(default)]
    pub tax_definitions: Vec<TaxDefinition>,
    #[serde(default)]
    pub icms_regulation_id: Option<IcmsRegulationId>,
}

impl Located for Company {
    fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Partner {
    pub id: PartnerId,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub fiscal_profile_id: Option<FiscalProfileId>,
}

impl Located for Partner {
    fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }
}

/// Partner-level configuration contributing default taxes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FiscalProfile {
    pub id: FiscalProfileId,
    pub name: String,
    #[serde(default)]
    pub tax_definitions: Vec<TaxDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub ncm_id: Option<NcmId>,
}

/// Mercosur Common Nomenclature entry and the regime taxes bound to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Ncm {
    pub id: NcmId,
    /// Classification code, with or without dots (e.g. "8471.30.12")
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tax_ipi_id: Option<TaxId>,
    #[serde(default)]
    pub tax_ii_id: Option<TaxId>,
}

impl Ncm {
    /// Code with separators removed
    pub fn digits(&self) -> String {
        self.code.chars().filter(char::is_ascii_digit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_framework_accepts_codes() {
        let framework: TaxFramework = serde_json::from_str(r#""3""#).unwrap();
        assert!(framework.is_normal());

        let framework: TaxFramework = serde_json::from_str(r#""simples_nacional""#).unwrap();
        assert!(!framework.is_normal());
    }

    #[test]
    fn ncm_digits_strip_separators() {
        let ncm = Ncm {
            id: NcmId(1),
            code: "8471.30.12".to_string(),
            name: String::new(),
            tax_ipi_id: None,
            tax_ii_id: None,
        };
        assert_eq!(ncm.digits(), "84713012");
    }
}
