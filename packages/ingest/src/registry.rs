//! Compile-time registry of dataset family definitions.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! Adding a new family requires a TOML file in `families/`, an entry here,
//! and a [`DatasetFamily`] variant.

use access_map_area_models::DatasetFamily;
use access_map_ingest_models::FamilyDefinition;

/// Number of registered families. Enforced by a test.
#[cfg(test)]
const EXPECTED_FAMILY_COUNT: usize = 2;

/// Embedded TOML family definitions.
const FAMILY_TOMLS: &[(&str, &str)] = &[
    ("census", include_str!("../families/census.toml")),
    ("community", include_str!("../families/community.toml")),
];

/// Returns all registered family definitions.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development error
/// and are caught by the tests below.
#[must_use]
pub fn all_families() -> Vec<FamilyDefinition> {
    FAMILY_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse family definition '{name}': {e}"))
        })
        .collect()
}

/// Returns the definition for `family`, if one is registered.
#[must_use]
pub fn family_definition(family: DatasetFamily) -> Option<FamilyDefinition> {
    all_families().into_iter().find(|def| def.family == family)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_families() {
        let families = all_families();
        assert_eq!(
            families.len(),
            EXPECTED_FAMILY_COUNT,
            "Expected {EXPECTED_FAMILY_COUNT} families, found {}. \
             Update EXPECTED_FAMILY_COUNT after adding/removing families.",
            families.len()
        );
    }

    #[test]
    fn every_family_variant_is_registered_once() {
        let mut seen = BTreeSet::new();
        for def in &all_families() {
            assert!(seen.insert(def.family), "Duplicate family: {}", def.family);
        }
        for family in DatasetFamily::ALL {
            assert!(seen.contains(family), "Family {family} has no definition");
        }
    }

    #[test]
    fn key_fields_match_metrics_files() {
        let census = family_definition(DatasetFamily::Census).unwrap();
        let community = family_definition(DatasetFamily::Community).unwrap();
        assert_eq!(census.key_field, "TRACT");
        assert_eq!(community.key_field, "COMMUNITY_AREA");
        assert_eq!(census.index_field, "ACCESS_INDEX");
        assert_eq!(community.index_field, "ACCESS_INDEX");
    }
}
