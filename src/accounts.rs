use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

/// One canonical business account plus the raw invoice spellings that
/// should fold into it. Also the shape of an `--account-groups` JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountGroup {
    pub canonical: String,
    pub aliases: Vec<String>,
}

#[derive(Debug, Error)]
pub enum AccountTableError {
    #[error("alias \"{alias}\" is mapped to both \"{existing}\" and \"{incoming}\"")]
    DuplicateAlias {
        alias: String,
        existing: String,
        incoming: String,
    },
}

/// Production alias data observed in the invoice export. Franchise and
/// location spellings fold into the chain they belong to.
const BUILTIN_GROUPS: &[(&str, &[&str])] = &[
    ("kroger", &["mariano's"]),
    (
        "piggly wiggly",
        &[
            "piggly wiggly - franchise",
            "pigs coporate",
            "pigs dave s",
            "pigs fox brothers",
            "pigs jake b",
            "pigs malicki",
            "pigs migel",
            "pigs mike day",
            "pigs red",
            "pigs ryan o",
            "pigs stinebrinks",
            "pigs stoneridge",
            "pigs tietz",
        ],
    ),
    (
        "ascension rx",
        &["ascension rx - per k", "ascension rx - man hr"],
    ),
    (
        "fuel on",
        &["relaince fuel, llc", "reliance fuel, llc", "schierl"],
    ),
    (
        "single c-stores",
        &["*single c-stores $-check", "*single c-stores $ cash"],
    ),
];

#[derive(Debug, Clone)]
pub struct AccountTable {
    keys: HashMap<String, String>,
    groups: Vec<AccountGroup>,
}

impl AccountTable {
    /// Builds the lookup table, rejecting any alias that appears under two
    /// canonical groups. A canonical key always maps to itself; listing it
    /// again in its own alias set is harmless.
    pub fn from_entries(entries: Vec<AccountGroup>) -> Result<Self, AccountTableError> {
        let mut keys: HashMap<String, String> = HashMap::new();
        let mut groups = Vec::with_capacity(entries.len());

        for entry in entries {
            let canonical = entry.canonical.trim().to_lowercase();
            Self::insert(&mut keys, canonical.clone(), &canonical)?;
            let mut aliases = Vec::with_capacity(entry.aliases.len());
            for alias in &entry.aliases {
                let alias = alias.trim().to_lowercase();
                Self::insert(&mut keys, alias.clone(), &canonical)?;
                aliases.push(alias);
            }
            groups.push(AccountGroup { canonical, aliases });
        }

        Ok(Self { keys, groups })
    }

    /// The alias data shipped with the tool. Disjointness of the built-in
    /// set is asserted by a unit test, so construction cannot fail.
    pub fn builtin() -> Self {
        let mut keys = HashMap::new();
        let mut groups = Vec::with_capacity(BUILTIN_GROUPS.len());
        for (canonical, aliases) in BUILTIN_GROUPS {
            keys.insert((*canonical).to_string(), (*canonical).to_string());
            for alias in *aliases {
                keys.insert((*alias).to_string(), (*canonical).to_string());
            }
            groups.push(AccountGroup {
                canonical: (*canonical).to_string(),
                aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
            });
        }
        Self { keys, groups }
    }

    fn insert(
        keys: &mut HashMap<String, String>,
        alias: String,
        canonical: &str,
    ) -> Result<(), AccountTableError> {
        match keys.get(&alias) {
            Some(existing) if existing != canonical => Err(AccountTableError::DuplicateAlias {
                alias,
                existing: existing.clone(),
                incoming: canonical.to_string(),
            }),
            _ => {
                keys.insert(alias, canonical.to_string());
                Ok(())
            }
        }
    }

    /// Resolves a raw account name to its canonical group key. Names absent
    /// from the table are their own singleton group.
    pub fn normalize(&self, raw: &str) -> String {
        let key = raw.trim().to_lowercase();
        match self.keys.get(&key) {
            Some(canonical) => canonical.clone(),
            None => key,
        }
    }

    pub fn groups(&self) -> &[AccountGroup] {
        &self.groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, &[&str])]) -> Vec<AccountGroup> {
        pairs
            .iter()
            .map(|(canonical, aliases)| AccountGroup {
                canonical: (*canonical).to_string(),
                aliases: aliases.iter().map(|alias| (*alias).to_string()).collect(),
            })
            .collect()
    }

    #[test]
    fn builtin_groups_are_disjoint() {
        assert!(AccountTable::from_entries(entries(BUILTIN_GROUPS)).is_ok());
    }

    #[test]
    fn folds_aliases_to_one_key() {
        let table = AccountTable::builtin();
        assert_eq!(table.normalize("mariano's"), "kroger");
        assert_eq!(table.normalize("pigs red"), table.normalize("pigs tietz"));
        assert_eq!(table.normalize("schierl"), "fuel on");
    }

    #[test]
    fn ignores_case_and_whitespace() {
        let table = AccountTable::builtin();
        assert_eq!(table.normalize(" KroGer "), table.normalize("kroger"));
        assert_eq!(table.normalize("PIGS RED"), "piggly wiggly");
    }

    #[test]
    fn normalize_is_idempotent() {
        let table = AccountTable::builtin();
        for raw in ["mariano's", "Pigs Malicki", "acme grocery", "KROGER"] {
            let once = table.normalize(raw);
            assert_eq!(table.normalize(&once), once);
        }
    }

    #[test]
    fn unknown_names_are_singleton_groups() {
        let table = AccountTable::builtin();
        assert_eq!(table.normalize(" Acme Grocery "), "acme grocery");
    }

    #[test]
    fn rejects_alias_in_two_groups() {
        let result = AccountTable::from_entries(entries(&[
            ("kroger", &["mariano's"]),
            ("metro market", &["mariano's"]),
        ]));
        match result {
            Err(AccountTableError::DuplicateAlias {
                alias,
                existing,
                incoming,
            }) => {
                assert_eq!(alias, "mariano's");
                assert_eq!(existing, "kroger");
                assert_eq!(incoming, "metro market");
            }
            Ok(_) => panic!("duplicate alias must be rejected"),
        }
    }

    #[test]
    fn canonical_listed_in_own_aliases_is_fine() {
        let table = AccountTable::from_entries(entries(&[("kroger", &["kroger", "mariano's"])]))
            .expect("self-alias is not a conflict");
        assert_eq!(table.normalize("kroger"), "kroger");
    }
}
