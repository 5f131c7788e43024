//! Semantic field → CRM field resolution.
//!
//! Strategies run in order and the first hit wins:
//! 1. explicit field key (namespace stripped) equals the semantic key
//! 2. normalized display names are equal
//! 3. raw display names are equal ignoring case
//!
//! There is no partial or substring matching. A field sharing one word with
//! ours ("Marketing Goal" vs "Content Goals") is a different field.

use std::collections::HashMap;

use leadbridge_shared::ExternalFieldDefinition;
use tracing::{debug, warn};

use crate::normalize::normalize;
use crate::specs::SemanticFieldSpec;

/// Which rule produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    FieldKey,
    NormalizedName,
    CaseInsensitiveName,
}

/// A matched CRM field and how it was found.
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    pub field: &'a ExternalFieldDefinition,
    pub strategy: MatchStrategy,
}

/// Lookup tables over one fetched catalog.
///
/// When several catalog entries share a key or name, the first one wins.
pub struct CatalogIndex<'a> {
    fields: &'a [ExternalFieldDefinition],
    by_key: HashMap<&'a str, usize>,
    by_normalized: HashMap<String, usize>,
    by_lowercase: HashMap<String, usize>,
}

impl<'a> CatalogIndex<'a> {
    pub fn new(fields: &'a [ExternalFieldDefinition]) -> Self {
        let mut by_key = HashMap::new();
        let mut by_normalized = HashMap::new();
        let mut by_lowercase = HashMap::new();

        for (i, field) in fields.iter().enumerate() {
            if let Some(key) = field.bare_key() {
                by_key.entry(key).or_insert(i);
            }
            let normalized = normalize(&field.display_name);
            if !normalized.is_empty() {
                by_normalized.entry(normalized).or_insert(i);
            }
            by_lowercase
                .entry(field.display_name.to_lowercase())
                .or_insert(i);
        }

        Self {
            fields,
            by_key,
            by_normalized,
            by_lowercase,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Resolve a semantic field. `None` is an expected outcome and is logged
    /// as a warning for operators.
    pub fn resolve(&self, spec: &SemanticFieldSpec) -> Option<Resolution<'a>> {
        if let Some(&i) = self.by_key.get(spec.semantic_key) {
            return Some(self.hit(i, MatchStrategy::FieldKey, spec.semantic_key));
        }

        if let Some(resolution) = self.resolve_name(spec.preferred_external_name) {
            debug!(
                semantic_key = spec.semantic_key,
                field_id = %resolution.field.id,
                strategy = ?resolution.strategy,
                "resolved by name"
            );
            return Some(resolution);
        }

        warn!(
            semantic_key = spec.semantic_key,
            preferred_name = spec.preferred_external_name,
            normalized_name = %normalize(spec.preferred_external_name),
            "no matching CRM field"
        );
        None
    }

    /// Name-only resolution (strategies 2 and 3).
    pub fn resolve_name(&self, name: &str) -> Option<Resolution<'a>> {
        let normalized = normalize(name);
        if !normalized.is_empty() {
            if let Some(&i) = self.by_normalized.get(&normalized) {
                return Some(Resolution {
                    field: &self.fields[i],
                    strategy: MatchStrategy::NormalizedName,
                });
            }
        }

        self.by_lowercase
            .get(&name.to_lowercase())
            .map(|&i| Resolution {
                field: &self.fields[i],
                strategy: MatchStrategy::CaseInsensitiveName,
            })
    }

    /// Try each candidate name in order, skipping fields rejected by `skip`.
    pub fn resolve_first_name<S: AsRef<str>>(
        &self,
        names: &[S],
        skip: impl Fn(&ExternalFieldDefinition) -> bool,
    ) -> Option<Resolution<'a>> {
        names
            .iter()
            .filter_map(|name| self.resolve_name(name.as_ref()))
            .find(|resolution| !skip(resolution.field))
    }

    fn hit(&self, i: usize, strategy: MatchStrategy, semantic_key: &str) -> Resolution<'a> {
        let field = &self.fields[i];
        debug!(semantic_key, field_id = %field.id, ?strategy, "resolved");
        Resolution { field, strategy }
    }
}

/// Resolve one semantic field against a catalog.
///
/// Builds a throwaway index; use [`CatalogIndex`] when resolving many fields.
pub fn resolve<'a>(
    spec: &SemanticFieldSpec,
    catalog: &'a [ExternalFieldDefinition],
) -> Option<Resolution<'a>> {
    CatalogIndex::new(catalog).resolve(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specs;
    use leadbridge_shared::FieldDataType;

    fn field(id: &str, name: &str, key: Option<&str>) -> ExternalFieldDefinition {
        ExternalFieldDefinition {
            id: id.into(),
            display_name: name.into(),
            key: key.map(String::from),
            data_type: FieldDataType::Text,
        }
    }

    fn spec(key: &str) -> &'static SemanticFieldSpec {
        specs::find(key).expect("known spec")
    }

    #[test]
    fn key_match_wins_regardless_of_display_name() {
        let catalog = vec![
            field("a", "Business Type", None),
            field("b", "Totally Different Label", Some("contact.business_type")),
        ];
        let resolution = resolve(spec("business_type"), &catalog).expect("resolved");
        assert_eq!(resolution.field.id, "b");
        assert_eq!(resolution.strategy, MatchStrategy::FieldKey);
    }

    #[test]
    fn key_match_without_namespace() {
        let catalog = vec![field("a", "x", Some("lead_score"))];
        let resolution = resolve(spec("lead_score"), &catalog).expect("resolved");
        assert_eq!(resolution.strategy, MatchStrategy::FieldKey);
    }

    #[test]
    fn key_match_for_every_spec() {
        for s in specs::semantic_fields() {
            let catalog = vec![
                field("decoy", s.preferred_external_name, None),
                field("keyed", "zzz unrelated", Some(&format!("contact.{}", s.semantic_key))),
            ];
            let resolution = resolve(s, &catalog).expect("resolved");
            assert_eq!(resolution.field.id, "keyed", "spec {}", s.semantic_key);
            assert_eq!(resolution.strategy, MatchStrategy::FieldKey);
        }
    }

    #[test]
    fn normalized_name_match() {
        let catalog = vec![field("a", "  business TYPE: ", Some("contact.biz_kind"))];
        let resolution = resolve(spec("business_type"), &catalog).expect("resolved");
        assert_eq!(resolution.field.id, "a");
        assert_eq!(resolution.strategy, MatchStrategy::NormalizedName);
    }

    #[test]
    fn em_dash_name_matches_hyphen_name() {
        let catalog = vec![field("a", "Monthly Budget \u{2014} USD", None)];
        let resolution = resolve(spec("monthly_budget"), &catalog).expect("resolved");
        assert_eq!(resolution.strategy, MatchStrategy::NormalizedName);
    }

    #[test]
    fn case_insensitive_match_for_names_normalization_erases() {
        let catalog = vec![field("a", "预算", None)];
        let index = CatalogIndex::new(&catalog);
        let resolution = index.resolve_name("预算").expect("resolved");
        assert_eq!(resolution.strategy, MatchStrategy::CaseInsensitiveName);
    }

    #[test]
    fn substring_matches_are_rejected() {
        let catalog = vec![
            field("a", "Marketing Goal", Some("contact.marketing_goal")),
            field("b", "Content Goals (legacy)", None),
            field("c", "Business", None),
        ];
        assert!(resolve(spec("content_goals"), &catalog).is_none());
        assert!(resolve(spec("business_type"), &catalog).is_none());
    }

    #[test]
    fn empty_catalog_resolves_nothing() {
        let index = CatalogIndex::new(&[]);
        assert!(index.is_empty());
        assert!(index.resolve(spec("lead_score")).is_none());
    }

    #[test]
    fn first_duplicate_wins() {
        let catalog = vec![field("first", "Industry", None), field("second", "industry", None)];
        let resolution = resolve(spec("industry"), &catalog).expect("resolved");
        assert_eq!(resolution.field.id, "first");
    }

    #[test]
    fn first_name_resolution_respects_order_and_skip() {
        let catalog = vec![
            field("desc", "Description", None),
            field("notes", "Notes", None),
        ];
        let index = CatalogIndex::new(&catalog);
        let names = ["Notes", "Description", "Additional Info"];

        let hit = index.resolve_first_name(&names, |_| false).expect("resolved");
        assert_eq!(hit.field.id, "notes");

        let hit = index
            .resolve_first_name(&names, |f| f.id == "notes")
            .expect("resolved");
        assert_eq!(hit.field.id, "desc");

        assert!(index.resolve_first_name(&names, |_| true).is_none());
    }
}
