//! Arena-backed region hierarchy.
//!
//! Regions are stored in a [`BTreeMap`] keyed by code. Each node keeps its
//! parent code and a sorted list of child codes, so walking the tree in
//! either direction is a series of map lookups and iteration order is
//! always deterministic.

use std::collections::{BTreeMap, VecDeque};

use statline_region_models::{Region, RegionCode, RegionLevel};

use crate::RegionError;
use crate::search::rank_matches;

/// One row of the static region mapping, before structural validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionEntry {
    /// Region code.
    pub code: RegionCode,
    /// Region name.
    pub name: String,
    /// Declared level.
    pub level: RegionLevel,
    /// Parent code (`None` for the National root).
    pub parent: Option<RegionCode>,
    /// Land area in square kilometres.
    pub area_km2: Option<f64>,
}

/// The five-level administrative tree.
///
/// Built once at startup and read-only afterwards, so a shared reference
/// can be handed to any number of concurrent readers.
#[derive(Debug, Clone)]
pub struct RegionHierarchy {
    regions: BTreeMap<RegionCode, Region>,
    root: RegionCode,
}

impl RegionHierarchy {
    /// Builds the hierarchy from raw entries, validating every structural
    /// invariant.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::InvalidHierarchy`] if a code is duplicated,
    /// a code prefix disagrees with its declared level, a parent is missing
    /// or sits at the wrong level, or there is not exactly one National
    /// root.
    pub fn build(entries: Vec<RegionEntry>) -> Result<Self, RegionError> {
        let mut regions: BTreeMap<RegionCode, Region> = BTreeMap::new();
        let mut rows: BTreeMap<RegionCode, usize> = BTreeMap::new();
        let mut root: Option<RegionCode> = None;

        for (idx, entry) in entries.into_iter().enumerate() {
            let row = idx + 1;

            if entry.code.level() != entry.level {
                return Err(RegionError::invalid(
                    row,
                    format!(
                        "code {} has a {} prefix but is declared as {}",
                        entry.code,
                        entry.code.level(),
                        entry.level
                    ),
                ));
            }

            if entry.level == RegionLevel::National {
                if let Some(parent) = &entry.parent {
                    return Err(RegionError::invalid(
                        row,
                        format!("national region {} cannot have parent {parent}", entry.code),
                    ));
                }
                if let Some(existing) = &root {
                    return Err(RegionError::invalid(
                        row,
                        format!("second national root {} (already have {existing})", entry.code),
                    ));
                }
                root = Some(entry.code.clone());
            } else if entry.parent.is_none() {
                return Err(RegionError::invalid(
                    row,
                    format!("{} region {} has no parent", entry.level, entry.code),
                ));
            }

            if regions.contains_key(&entry.code) {
                return Err(RegionError::invalid(
                    row,
                    format!("duplicate region code {}", entry.code),
                ));
            }

            rows.insert(entry.code.clone(), row);
            regions.insert(
                entry.code.clone(),
                Region {
                    code: entry.code,
                    name: entry.name,
                    level: entry.level,
                    parent: entry.parent,
                    children: Vec::new(),
                    area_km2: entry.area_km2,
                },
            );
        }

        let Some(root) = root else {
            return Err(RegionError::invalid(0, "no national root region"));
        };

        // Parents must sit exactly one level up. Since depth strictly
        // decreases along every parent link, this also rules out cycles.
        let mut links: Vec<(RegionCode, RegionCode)> = Vec::new();
        for region in regions.values() {
            let Some(parent_code) = &region.parent else {
                continue;
            };
            let row = rows.get(&region.code).copied().unwrap_or_default();
            let Some(parent) = regions.get(parent_code) else {
                return Err(RegionError::invalid(
                    row,
                    format!("parent {parent_code} of {} does not exist", region.code),
                ));
            };
            if Some(parent.level) != region.level.parent() {
                return Err(RegionError::invalid(
                    row,
                    format!(
                        "parent {parent_code} of {} is a {} region, expected {}",
                        region.code,
                        parent.level,
                        region
                            .level
                            .parent()
                            .map_or_else(|| "none".to_string(), |l| l.to_string())
                    ),
                ));
            }
            links.push((parent_code.clone(), region.code.clone()));
        }

        for (parent, child) in links {
            if let Some(node) = regions.get_mut(&parent) {
                node.children.push(child);
            }
        }
        for region in regions.values_mut() {
            region.children.sort();
        }

        log::debug!("Built region hierarchy with {} regions", regions.len());

        Ok(Self { regions, root })
    }

    /// Resolves a code (case-insensitive, surrounding whitespace ignored).
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::UnknownRegion`] if the code is malformed or
    /// not part of the hierarchy.
    pub fn resolve(&self, code: &str) -> Result<&Region, RegionError> {
        RegionCode::parse(code)
            .ok()
            .and_then(|parsed| self.regions.get(&parsed))
            .ok_or_else(|| RegionError::UnknownRegion {
                code: code.trim().to_string(),
            })
    }

    /// Looks up an already-parsed code.
    #[must_use]
    pub fn get(&self, code: &RegionCode) -> Option<&Region> {
        self.regions.get(code)
    }

    /// Returns `true` if the code is part of the hierarchy.
    #[must_use]
    pub fn contains(&self, code: &RegionCode) -> bool {
        self.regions.contains_key(code)
    }

    /// The National root.
    #[must_use]
    pub fn root(&self) -> &Region {
        &self.regions[&self.root]
    }

    /// Ancestors ordered from the immediate parent up to the National root.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::UnknownRegion`] if the code is not found.
    pub fn ancestors(&self, code: &str) -> Result<Vec<&Region>, RegionError> {
        let mut current = self.resolve(code)?;
        let mut chain = Vec::with_capacity(current.level.depth());

        while let Some(parent_code) = &current.parent {
            let Some(parent) = self.regions.get(parent_code) else {
                break;
            };
            chain.push(parent);
            current = parent;
        }

        Ok(chain)
    }

    /// All descendants of `code` at exactly `level`, sorted by code.
    ///
    /// Returns an empty list when `level` is not below the region's own
    /// level.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::UnknownRegion`] if the code is not found.
    pub fn descendants(&self, code: &str, level: RegionLevel) -> Result<Vec<&Region>, RegionError> {
        let start = self.resolve(code)?;
        let mut found = Vec::new();
        if level <= start.level {
            return Ok(found);
        }

        let mut queue: VecDeque<&Region> = VecDeque::from([start]);
        while let Some(region) = queue.pop_front() {
            for child_code in &region.children {
                let Some(child) = self.regions.get(child_code) else {
                    continue;
                };
                if child.level == level {
                    found.push(child);
                } else if child.level < level {
                    queue.push_back(child);
                }
            }
        }

        found.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(found)
    }

    /// Direct children of `code`, sorted by code.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::UnknownRegion`] if the code is not found.
    pub fn children(&self, code: &str) -> Result<Vec<&Region>, RegionError> {
        let region = self.resolve(code)?;
        Ok(region
            .children
            .iter()
            .filter_map(|c| self.regions.get(c))
            .collect())
    }

    /// Other children of the same parent, sorted by code. Empty for the
    /// National root.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::UnknownRegion`] if the code is not found.
    pub fn siblings(&self, code: &str) -> Result<Vec<&Region>, RegionError> {
        let region = self.resolve(code)?;
        let Some(parent) = region.parent.as_ref().and_then(|p| self.regions.get(p)) else {
            return Ok(Vec::new());
        };
        Ok(parent
            .children
            .iter()
            .filter(|c| **c != region.code)
            .filter_map(|c| self.regions.get(c))
            .collect())
    }

    /// Every region at `level`, sorted by code.
    #[must_use]
    pub fn regions_at(&self, level: RegionLevel) -> Vec<&Region> {
        self.regions.values().filter(|r| r.level == level).collect()
    }

    /// Case-insensitive substring search over region names, ordered by
    /// level from the root downwards and then alphabetically.
    #[must_use]
    pub fn search(&self, text: &str) -> Vec<&Region> {
        rank_matches(self.regions.values(), text, None)
    }

    /// Like [`Self::search`], but regions at `preferred` come first.
    #[must_use]
    pub fn search_at(&self, text: &str, preferred: RegionLevel) -> Vec<&Region> {
        rank_matches(self.regions.values(), text, Some(preferred))
    }

    /// Land area of a region: its own published area, otherwise the sum
    /// of its municipalities' areas when every one of them has one.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::UnknownRegion`] if the code is not found.
    pub fn area_km2(&self, code: &str) -> Result<Option<f64>, RegionError> {
        let region = self.resolve(code)?;
        if region.area_km2.is_some() || region.level == RegionLevel::Municipality {
            return Ok(region.area_km2);
        }

        let municipalities = self.descendants(code, RegionLevel::Municipality)?;
        if municipalities.is_empty() {
            return Ok(None);
        }
        Ok(municipalities
            .iter()
            .map(|m| m.area_km2)
            .sum::<Option<f64>>())
    }

    /// Iterates all regions in code order.
    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether the hierarchy is empty (never true for a built hierarchy).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_hierarchy;

    const REGIONS_CSV: &str = include_str!("../../../test-data/regions.csv");

    fn hierarchy() -> RegionHierarchy {
        load_hierarchy(REGIONS_CSV.as_bytes()).unwrap()
    }

    fn entry(code: &str, level: RegionLevel, parent: Option<&str>) -> RegionEntry {
        RegionEntry {
            code: RegionCode::parse(code).unwrap(),
            name: code.to_string(),
            level,
            parent: parent.map(|p| RegionCode::parse(p).unwrap()),
            area_km2: None,
        }
    }

    #[test]
    fn ancestors_end_at_root_with_depth_length() {
        let h = hierarchy();
        for region in h.iter() {
            let chain = h.ancestors(region.code.as_str()).unwrap();
            assert_eq!(chain.len(), region.level.depth(), "{}", region.code);
            if let Some(last) = chain.last() {
                assert_eq!(last.code, h.root().code);
            }
        }
    }

    #[test]
    fn ancestors_are_ordered_from_parent_upwards() {
        let h = hierarchy();
        let chain: Vec<&str> = h
            .ancestors("GM0363")
            .unwrap()
            .iter()
            .map(|r| r.code.as_str())
            .collect();
        assert_eq!(chain, ["CR23", "PV27", "LD03", "NL01"]);
    }

    #[test]
    fn resolve_is_case_insensitive_and_rejects_unknown() {
        let h = hierarchy();
        assert_eq!(h.resolve("gm0363").unwrap().name, "Amsterdam");
        assert!(matches!(
            h.resolve("GM9999"),
            Err(RegionError::UnknownRegion { .. })
        ));
        assert!(matches!(
            h.resolve("not-a-code"),
            Err(RegionError::UnknownRegion { .. })
        ));
    }

    #[test]
    fn descendants_restricted_to_level() {
        let h = hierarchy();
        let codes: Vec<&str> = h
            .descendants("PV27", RegionLevel::Municipality)
            .unwrap()
            .iter()
            .map(|r| r.code.as_str())
            .collect();
        assert_eq!(codes, ["GM0362", "GM0363", "GM0392", "GM0437"]);

        let coro: Vec<&str> = h
            .descendants("PV27", RegionLevel::Corop)
            .unwrap()
            .iter()
            .map(|r| r.code.as_str())
            .collect();
        assert_eq!(coro, ["CR21", "CR23"]);

        assert!(h.descendants("PV27", RegionLevel::Landsdeel).unwrap().is_empty());
        assert!(h.descendants("PV27", RegionLevel::Province).unwrap().is_empty());
    }

    #[test]
    fn siblings_exclude_self_and_root_has_none() {
        let h = hierarchy();
        let sibs: Vec<&str> = h
            .siblings("GM0363")
            .unwrap()
            .iter()
            .map(|r| r.code.as_str())
            .collect();
        assert_eq!(sibs, ["GM0362", "GM0437"]);
        assert!(h.siblings("NL01").unwrap().is_empty());
    }

    #[test]
    fn area_falls_back_to_complete_municipality_sum() {
        let h = hierarchy();
        // Utrecht province has no own area but a single municipality with one.
        let area = h.area_km2("PV26").unwrap().unwrap();
        assert!((area - 94.33).abs() < 1e-9);
        // Groot-Amsterdam includes Ouder-Amstel, which has no area.
        assert_eq!(h.area_km2("CR23").unwrap(), None);
        // National carries its own area.
        assert!(h.area_km2("NL01").unwrap().is_some());
    }

    #[test]
    fn rejects_parent_at_wrong_level() {
        let result = RegionHierarchy::build(vec![
            entry("NL01", RegionLevel::National, None),
            entry("PV27", RegionLevel::Province, Some("NL01")),
        ]);
        assert!(matches!(
            result,
            Err(RegionError::InvalidHierarchy { row: 2, .. })
        ));
    }

    #[test]
    fn rejects_missing_root_and_duplicate_root() {
        let no_root = RegionHierarchy::build(vec![entry(
            "LD01",
            RegionLevel::Landsdeel,
            Some("NL01"),
        )]);
        assert!(no_root.is_err());

        let two_roots = RegionHierarchy::build(vec![
            entry("NL01", RegionLevel::National, None),
            entry("NL02", RegionLevel::National, None),
        ]);
        assert!(matches!(
            two_roots,
            Err(RegionError::InvalidHierarchy { row: 2, .. })
        ));
    }

    #[test]
    fn rejects_prefix_level_mismatch_and_duplicates() {
        let mismatch = RegionHierarchy::build(vec![
            entry("NL01", RegionLevel::National, None),
            entry("GM0001", RegionLevel::Landsdeel, Some("NL01")),
        ]);
        assert!(mismatch.is_err());

        let duplicate = RegionHierarchy::build(vec![
            entry("NL01", RegionLevel::National, None),
            entry("LD01", RegionLevel::Landsdeel, Some("NL01")),
            entry("LD01", RegionLevel::Landsdeel, Some("NL01")),
        ]);
        assert!(matches!(
            duplicate,
            Err(RegionError::InvalidHierarchy { row: 3, .. })
        ));
    }

    #[test]
    fn rejects_dangling_parent() {
        let result = RegionHierarchy::build(vec![
            entry("NL01", RegionLevel::National, None),
            entry("PV27", RegionLevel::Province, Some("LD03")),
        ]);
        assert!(result.is_err());
    }
}
