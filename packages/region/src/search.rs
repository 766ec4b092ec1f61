//! Case-insensitive name search over regions.
//!
//! Matching is exact substring on case-folded names; there is no fuzzy
//! matching. Results are ordered by level (a preferred level first, then
//! from the root downwards) and alphabetically within a level.

use statline_region_models::{Region, RegionLevel};

use crate::hierarchy::RegionHierarchy;

fn fold(text: &str) -> String {
    text.trim().to_lowercase()
}

fn sort_key(region: &Region, preferred: Option<RegionLevel>) -> (bool, usize, String, String) {
    (
        preferred.is_some_and(|p| p != region.level),
        region.level.depth(),
        fold(&region.name),
        region.code.to_string(),
    )
}

/// Filters `regions` to those whose name contains `text` and orders them.
pub(crate) fn rank_matches<'a>(
    regions: impl Iterator<Item = &'a Region>,
    text: &str,
    preferred: Option<RegionLevel>,
) -> Vec<&'a Region> {
    let needle = fold(text);
    if needle.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<&Region> = regions
        .filter(|r| fold(&r.name).contains(&needle))
        .collect();
    matches.sort_by_cached_key(|r| sort_key(r, preferred));
    matches
}

struct IndexEntry {
    folded_name: String,
    region: Region,
}

/// Pre-folded name index backing municipality suggestions.
///
/// Built once from the hierarchy at load time; entries are kept in final
/// result order so a lookup is a single filtered scan.
pub struct SearchIndex {
    entries: Vec<IndexEntry>,
}

impl SearchIndex {
    /// Level whose regions are listed first in suggestions.
    pub const PREFERRED_LEVEL: RegionLevel = RegionLevel::Municipality;

    /// Builds the index over every region name in the hierarchy.
    #[must_use]
    pub fn build(hierarchy: &RegionHierarchy) -> Self {
        let mut entries: Vec<IndexEntry> = hierarchy
            .iter()
            .map(|region| IndexEntry {
                folded_name: fold(&region.name),
                region: region.clone(),
            })
            .collect();
        entries.sort_by_cached_key(|e| sort_key(&e.region, Some(Self::PREFERRED_LEVEL)));

        log::debug!("Built search index over {} region names", entries.len());
        Self { entries }
    }

    /// Returns at most `limit` regions whose name contains `text`
    /// (case-insensitive).
    #[must_use]
    pub fn suggest(&self, text: &str, limit: usize) -> Vec<Region> {
        let needle = fold(text);
        if needle.is_empty() || limit == 0 {
            return Vec::new();
        }

        self.entries
            .iter()
            .filter(|e| e.folded_name.contains(&needle))
            .take(limit)
            .map(|e| e.region.clone())
            .collect()
    }

    /// Number of indexed names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_hierarchy;

    fn hierarchy() -> RegionHierarchy {
        load_hierarchy(include_str!("../../../test-data/regions.csv").as_bytes()).unwrap()
    }

    #[test]
    fn finds_amsterdam_regardless_of_casing() {
        let index = SearchIndex::build(&hierarchy());
        for query in ["amster", "AMSTER", "Amster"] {
            let names: Vec<String> = index
                .suggest(query, 10)
                .into_iter()
                .map(|r| r.name)
                .collect();
            assert!(names.contains(&"Amsterdam".to_string()), "{query}: {names:?}");
        }
    }

    #[test]
    fn suggestions_prefer_municipalities() {
        let index = SearchIndex::build(&hierarchy());
        let codes: Vec<String> = index
            .suggest("amst", 10)
            .into_iter()
            .map(|r| r.code.to_string())
            .collect();
        // Amstelveen, Amsterdam, Ouder-Amstel, then the COROP region.
        assert_eq!(codes, ["GM0362", "GM0363", "GM0437", "CR23"]);
    }

    #[test]
    fn suggest_respects_limit_and_blank_input() {
        let index = SearchIndex::build(&hierarchy());
        assert_eq!(index.suggest("amst", 2).len(), 2);
        assert!(index.suggest("   ", 10).is_empty());
        assert!(index.suggest("amst", 0).is_empty());
        assert!(index.suggest("zzz", 10).is_empty());
    }

    #[test]
    fn hierarchy_search_orders_by_level_then_name() {
        let h = hierarchy();
        let codes: Vec<&str> = h
            .search("utrecht")
            .iter()
            .map(|r| r.code.as_str())
            .collect();
        assert_eq!(codes, ["PV26", "CR17", "GM0344"]);

        let preferred: Vec<&str> = h
            .search_at("utrecht", RegionLevel::Municipality)
            .iter()
            .map(|r| r.code.as_str())
            .collect();
        assert_eq!(preferred, ["GM0344", "PV26", "CR17"]);
    }

    #[test]
    fn groningen_matches_every_level_it_appears_at() {
        let h = hierarchy();
        let codes: Vec<&str> = h
            .search("GRONINGEN")
            .iter()
            .map(|r| r.code.as_str())
            .collect();
        assert_eq!(codes, ["PV20", "CR03", "GM0014"]);
    }
}
