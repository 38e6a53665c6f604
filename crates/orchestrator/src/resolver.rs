//! Display-name resolution for result records.

use std::collections::HashMap;
use std::sync::Arc;

use blendopt_core::modules::ModuleAdapter;
use blendopt_core::resolution::{collect_identifiers, rewrite_identifiers};
use blendopt_db::models::reference::ReferenceRecord;
use serde_json::Value;

use crate::store::ReferenceLookup;

/// Rewrites reference ids in result records to display names.
///
/// A batch costs at most two lookups: one by numeric id and one by name
/// token. Name tokens prefer an exact case-insensitive match over a
/// substring match.
pub struct IdentifierResolver {
    references: Arc<dyn ReferenceLookup>,
}

impl IdentifierResolver {
    pub fn new(references: Arc<dyn ReferenceLookup>) -> Self {
        Self { references }
    }

    /// Resolve `records` in place and return how many tokens got a name.
    pub async fn resolve(
        &self,
        adapter: &ModuleAdapter,
        records: &mut [Value],
    ) -> Result<usize, sqlx::Error> {
        let ids = collect_identifiers(records, adapter.resolvable_fields);
        if ids.is_empty() {
            return Ok(0);
        }

        let mut names: HashMap<String, String> = HashMap::new();

        if !ids.numeric.is_empty() {
            let found = self
                .references
                .find_by_ids(adapter.reference_kind, &ids.numeric)
                .await?;
            names.extend(found.into_iter().map(|r| (r.id.to_string(), r.name)));
        }

        if !ids.names.is_empty() {
            let candidates = self
                .references
                .find_by_name_tokens(adapter.reference_kind, &ids.names)
                .await?;
            let matcher = NameMatcher::new(&candidates);
            for token in ids.names {
                if let Some(name) = matcher.best_match(&token) {
                    names.insert(token, name.to_string());
                }
            }
        }

        rewrite_identifiers(records, adapter.resolvable_fields, &names);
        Ok(names.len())
    }
}

/// Token to record-name matching over one lookup result.
struct NameMatcher<'a> {
    exact: HashMap<String, &'a str>,
    lowered: Vec<(String, &'a str)>,
}

impl<'a> NameMatcher<'a> {
    fn new(candidates: &'a [ReferenceRecord]) -> Self {
        let mut exact = HashMap::with_capacity(candidates.len());
        let mut lowered = Vec::with_capacity(candidates.len());
        for record in candidates {
            let key = record.name.to_lowercase();
            exact.entry(key.clone()).or_insert(record.name.as_str());
            lowered.push((key, record.name.as_str()));
        }
        Self { exact, lowered }
    }

    fn best_match(&self, token: &str) -> Option<&'a str> {
        let needle = token.to_lowercase();
        if let Some(name) = self.exact.get(&needle) {
            return Some(*name);
        }
        self.lowered
            .iter()
            .find(|(lower, _)| lower.contains(&needle))
            .map(|(_, name)| *name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: i64, name: &str) -> ReferenceRecord {
        ReferenceRecord {
            id,
            kind: "fuel".into(),
            name: name.into(),
            composition: serde_json::json!({}),
            unit_price: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn exact_match_beats_substring() {
        let candidates = vec![record(1, "Coke breeze fine"), record(2, "Coke Breeze")];
        let matcher = NameMatcher::new(&candidates);
        assert_eq!(matcher.best_match("coke breeze"), Some("Coke Breeze"));
    }

    #[test]
    fn substring_match_is_fallback() {
        let candidates = vec![record(1, "Anthracite (imported)")];
        let matcher = NameMatcher::new(&candidates);
        assert_eq!(matcher.best_match("ANTHRACITE"), Some("Anthracite (imported)"));
        assert_eq!(matcher.best_match("lignite"), None);
    }
}
