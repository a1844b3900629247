use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Reserved mapping key whose list is used when no category claims a track.
pub const FALLBACK_KEY: &str = "_default";

const FALLBACK_CATEGORY: &str = "Technology";

/// Mapping from output category name to the set of schedule tracks it
/// accepts, in declaration order.
///
/// Declaration order matters: `classify` returns categories in the order
/// they appear in the configuration, and only the first one ends up in the
/// output feed. A plain `BTreeMap` would silently re-sort the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMapping {
    entries: Vec<(String, Vec<String>)>,
}

impl CategoryMapping {
    pub fn from_entries(entries: Vec<(String, Vec<String>)>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map a schedule track to output categories, never empty.
    ///
    /// Scans every category except the fallback key and collects those
    /// whose track list contains `track`; falls back to the `_default`
    /// list, or the literal "Technology" when none is configured.
    pub fn classify(&self, track: &str) -> Vec<String> {
        let mut categories = Vec::new();
        for (category, tracks) in &self.entries {
            if category == FALLBACK_KEY {
                continue;
            }
            if tracks.iter().any(|t| t == track) {
                categories.push(category.clone());
            }
        }

        if categories.is_empty() {
            categories = self.fallback();
        }
        categories
    }

    fn fallback(&self) -> Vec<String> {
        let configured = self
            .entries
            .iter()
            .find(|(key, _)| key == FALLBACK_KEY)
            .map(|(_, list)| list.clone())
            .unwrap_or_default();

        if configured.is_empty() {
            vec![FALLBACK_CATEGORY.to_owned()]
        } else {
            configured
        }
    }
}

impl Serialize for CategoryMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (category, tracks) in &self.entries {
            map.serialize_entry(category, tracks)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CategoryMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = CategoryMapping;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of category name to track list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, Vec<String>>()? {
                    entries.push(entry);
                }
                Ok(CategoryMapping { entries })
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> CategoryMapping {
        CategoryMapping::from_entries(vec![
            (
                "Society & Politics".to_owned(),
                vec!["Security".to_owned(), "Ethics".to_owned()],
            ),
            (FALLBACK_KEY.to_owned(), vec!["Technology".to_owned()]),
        ])
    }

    #[test]
    fn classify_finds_category_for_known_track() {
        assert_eq!(mapping().classify("Security"), vec!["Society & Politics"]);
    }

    #[test]
    fn classify_falls_back_for_unknown_track() {
        assert_eq!(mapping().classify("Unknown Track"), vec!["Technology"]);
    }

    #[test]
    fn classify_falls_back_for_empty_track() {
        assert_eq!(mapping().classify(""), vec!["Technology"]);
    }

    #[test]
    fn classify_without_fallback_entry_returns_technology() {
        let mapping = CategoryMapping::from_entries(vec![(
            "Science".to_owned(),
            vec!["Physics".to_owned()],
        )]);
        assert_eq!(mapping.classify("History"), vec!["Technology"]);
    }

    #[test]
    fn classify_preserves_declaration_order() {
        let mapping = CategoryMapping::from_entries(vec![
            ("Zoology".to_owned(), vec!["Animals".to_owned()]),
            ("Arts".to_owned(), vec!["Animals".to_owned()]),
        ]);
        assert_eq!(mapping.classify("Animals"), vec!["Zoology", "Arts"]);
    }

    #[test]
    fn yaml_round_trip_keeps_declaration_order() -> anyhow::Result<()> {
        let yaml = "Zoology:\n- Animals\nArts:\n- Animals\n_default:\n- Technology\n";
        let mapping: CategoryMapping = serde_yaml::from_str(yaml)?;
        assert_eq!(mapping.classify("Animals"), vec!["Zoology", "Arts"]);
        assert_eq!(serde_yaml::to_string(&mapping)?, yaml);
        Ok(())
    }
}
