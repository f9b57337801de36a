//! Relation inference configuration.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How link tables (many-to-many join tables) are recognized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkTablePolicy {
    /// Exactly two foreign keys and no columns besides the primary key and
    /// the two foreign key columns.
    #[default]
    Structural,
    /// Exactly two foreign keys; payload columns are allowed.
    AllowPayload,
    /// Only the named tables, which must have exactly two foreign keys.
    Explicit(BTreeSet<String>),
    /// No table is a link table.
    Disabled,
}

impl LinkTablePolicy {
    /// Whether a table with the given shape is treated as a link table.
    pub fn is_link_table(&self, table: &str, foreign_keys: usize, columns: usize) -> bool {
        if foreign_keys != 2 {
            return false;
        }
        match self {
            LinkTablePolicy::Structural => columns == 3,
            LinkTablePolicy::AllowPayload => true,
            LinkTablePolicy::Explicit(tables) => tables.contains(table),
            LinkTablePolicy::Disabled => false,
        }
    }
}

/// Configuration for relation inference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Canonical (longest) attribute name -> user-chosen name.
    pub rename_attributes: BTreeMap<String, String>,
    /// Link table recognition.
    pub link_tables: LinkTablePolicy,
    /// Extra singular -> plural rules for table names.
    pub plural_rules: BTreeMap<String, String>,
    /// Extra plural -> singular rules for table names.
    pub singular_rules: BTreeMap<String, String>,
}

impl InferenceConfig {
    /// Create new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename the relation whose canonical name is `canonical` (builder pattern).
    #[must_use]
    pub fn rename(mut self, canonical: impl Into<String>, name: impl Into<String>) -> Self {
        self.rename_attributes.insert(canonical.into(), name.into());
        self
    }

    /// Set the link table policy (builder pattern).
    #[must_use]
    pub fn link_tables(mut self, policy: LinkTablePolicy) -> Self {
        self.link_tables = policy;
        self
    }

    /// Add a custom singular/plural pair used for table names (builder pattern).
    #[must_use]
    pub fn inflection(mut self, singular: impl Into<String>, plural: impl Into<String>) -> Self {
        let singular = singular.into();
        let plural = plural.into();
        self.plural_rules.insert(singular.clone(), plural.clone());
        self.singular_rules.insert(plural, singular);
        self
    }

    fn rules(map: &BTreeMap<String, String>) -> Option<&BTreeMap<String, String>> {
        (!map.is_empty()).then_some(map)
    }

    pub(crate) fn singular_rules(&self) -> Option<&BTreeMap<String, String>> {
        Self::rules(&self.singular_rules)
    }

    pub(crate) fn plural_rules(&self) -> Option<&BTreeMap<String, String>> {
        Self::rules(&self.plural_rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_table_policies() {
        assert!(LinkTablePolicy::Structural.is_link_table("clients_cars", 2, 3));
        assert!(!LinkTablePolicy::Structural.is_link_table("bom_link", 2, 4));
        assert!(LinkTablePolicy::AllowPayload.is_link_table("bom_link", 2, 4));
        assert!(!LinkTablePolicy::AllowPayload.is_link_table("invoice", 3, 5));

        let explicit = LinkTablePolicy::Explicit(BTreeSet::from(["bom_link".to_string()]));
        assert!(explicit.is_link_table("bom_link", 2, 4));
        assert!(!explicit.is_link_table("clients_cars", 2, 3));
        assert!(!LinkTablePolicy::Disabled.is_link_table("clients_cars", 2, 3));
    }

    #[test]
    fn test_builder_and_serde() {
        let config = InferenceConfig::new()
            .rename("parts__part_number__bom_link__child", "parents_links")
            .link_tables(LinkTablePolicy::Disabled)
            .inflection("person", "people");
        assert_eq!(config.plural_rules().unwrap()["person"], "people");
        assert_eq!(config.singular_rules().unwrap()["people"], "person");

        let json = serde_json::to_string(&config).unwrap();
        let back: InferenceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let partial: InferenceConfig =
            serde_json::from_str(r#"{"rename_attributes": {"a": "b"}}"#).unwrap();
        assert_eq!(partial.link_tables, LinkTablePolicy::Structural);
        assert_eq!(partial.rename_attributes["a"], "b");
        assert!(InferenceConfig::default().plural_rules().is_none());
    }
}
