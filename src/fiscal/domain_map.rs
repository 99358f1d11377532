use super::ids::TaxId;
use super::sources::TaxSource;
use super::tax::{Tax, TaxDomain};
use serde::Serialize;
use std::collections::BTreeMap;

/// The tax selected for a domain and the source that put it there
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxEntry {
    pub tax: Tax,
    pub source: TaxSource,
}

/// A replaced entry, kept so the final map can be explained
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Override {
    pub domain: TaxDomain,
    pub replaced: TaxId,
    pub replaced_source: TaxSource,
    pub by: TaxId,
    pub source: TaxSource,
}

/// One tax per domain, last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaxDomainMap {
    entries: BTreeMap<TaxDomain, TaxEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    overrides: Vec<Override>,
}

impl TaxDomainMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `tax` under its domain, returning the entry it replaced
    pub fn insert(&mut self, tax: &Tax, source: TaxSource) -> Option<TaxEntry> {
        let entry = TaxEntry {
            tax: tax.clone(),
            source,
        };
        let previous = self.entries.insert(tax.domain, entry);
        if let Some(prev) = &previous {
            log::debug!(
                "{} {} from {} replaced by {} from {}",
                tax.domain,
                prev.tax.name,
                prev.source,
                tax.name,
                source
            );
            self.overrides.push(Override {
                domain: tax.domain,
                replaced: prev.tax.id,
                replaced_source: prev.source,
                by: tax.id,
                source,
            });
        }
        previous
    }

    pub fn get(&self, domain: TaxDomain) -> Option<&Tax> {
        self.entries.get(&domain).map(|e| &e.tax)
    }

    pub fn entry(&self, domain: TaxDomain) -> Option<&TaxEntry> {
        self.entries.get(&domain)
    }

    pub fn source_of(&self, domain: TaxDomain) -> Option<TaxSource> {
        self.entries.get(&domain).map(|e| e.source)
    }

    pub fn contains(&self, domain: TaxDomain) -> bool {
        self.entries.contains_key(&domain)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in domain order
    pub fn iter(&self) -> impl Iterator<Item = (TaxDomain, &TaxEntry)> {
        self.entries.iter().map(|(d, e)| (*d, e))
    }

    pub fn domains(&self) -> impl Iterator<Item = TaxDomain> + '_ {
        self.entries.keys().copied()
    }

    pub fn overrides(&self) -> &[Override] {
        &self.overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiscal::tax::TaxBaseType;
    use rust_decimal_macros::dec;

    fn tax(id: u32, domain: TaxDomain) -> Tax {
        Tax {
            id: TaxId(id),
            name: format!("tax {id}"),
            domain,
            base_type: TaxBaseType::Percent,
            rate: dec!(10),
        }
    }

    #[test]
    fn last_write_wins_per_domain() {
        let mut map = TaxDomainMap::new();
        assert!(map.insert(&tax(1, TaxDomain::Icms), TaxSource::Company).is_none());
        map.insert(&tax(2, TaxDomain::Ipi), TaxSource::Ncm);

        let replaced = map.insert(&tax(3, TaxDomain::Icms), TaxSource::Cfop).unwrap();
        assert_eq!(replaced.tax.id, TaxId(1));
        assert_eq!(replaced.source, TaxSource::Company);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(TaxDomain::Icms).map(|t| t.id), Some(TaxId(3)));
        assert_eq!(map.source_of(TaxDomain::Icms), Some(TaxSource::Cfop));
        assert_eq!(map.overrides().len(), 1);
        assert_eq!(map.overrides()[0].by, TaxId(3));
    }

    #[test]
    fn serializes_with_domain_keys() {
        let mut map = TaxDomainMap::new();
        map.insert(&tax(7, TaxDomain::Cofins), TaxSource::FiscalProfile);

        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["entries"]["cofins"]["tax"]["id"], 7);
        assert_eq!(json["entries"]["cofins"]["source"], "fiscal_profile");
        assert!(json.get("overrides").is_none());
    }
}
