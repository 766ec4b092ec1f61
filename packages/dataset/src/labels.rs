//! Label mapping for the crime table's dimension columns.
//!
//! The published table uses free-text labels for sex and for the packed
//! characteristic column (`"Method: Stabbing"`, `"Age: 20 to 30 years"`,
//! `"Location: Home"`). These helpers map them onto the typed
//! [`Sex`] and [`Characteristic`] vocabularies. Matching is
//! case-insensitive; anything unrecognised is rejected rather than guessed.

use statline_dataset_models::{Characteristic, Sex};

const METHOD_PREFIX: &str = "method:";
const AGE_PREFIX: &str = "age:";
const LOCATION_PREFIX: &str = "location:";

/// Maps a sex label to [`Sex`].
///
/// Returns `None` for unrecognised labels.
#[must_use]
pub fn parse_sex_label(raw: &str) -> Option<Sex> {
    let lower = raw.trim().to_lowercase();
    match lower.as_str() {
        "total male and female" | "total" | "men and women" => Some(Sex::Total),
        "men" | "male" | "males" => Some(Sex::Male),
        "women" | "female" | "females" => Some(Sex::Female),
        _ => None,
    }
}

/// Maps a characteristic label to [`Characteristic`].
///
/// Returns `None` for an unrecognised prefix or an empty sub-category.
#[must_use]
pub fn parse_characteristic_label(raw: &str) -> Option<Characteristic> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("total") {
        return Some(Characteristic::Total);
    }

    for (prefix, make) in [
        (METHOD_PREFIX, Characteristic::Method as fn(String) -> Characteristic),
        (AGE_PREFIX, Characteristic::AgeGroup),
        (LOCATION_PREFIX, Characteristic::Location),
    ] {
        if let Some(head) = trimmed.get(..prefix.len())
            && head.eq_ignore_ascii_case(prefix)
        {
            let label = trimmed[prefix.len()..].trim();
            if label.is_empty() {
                return None;
            }
            return Some(make(label.to_string()));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_published_sex_labels() {
        assert_eq!(parse_sex_label("Total male and female"), Some(Sex::Total));
        assert_eq!(parse_sex_label("Men"), Some(Sex::Male));
        assert_eq!(parse_sex_label(" women "), Some(Sex::Female));
        assert_eq!(parse_sex_label("unknown"), None);
    }

    #[test]
    fn maps_prefixed_characteristics() {
        assert_eq!(
            parse_characteristic_label("Method: Stabbing"),
            Some(Characteristic::Method("Stabbing".to_string()))
        );
        assert_eq!(
            parse_characteristic_label("Age:20 to 30 years"),
            Some(Characteristic::AgeGroup("20 to 30 years".to_string()))
        );
        assert_eq!(
            parse_characteristic_label("LOCATION: Home"),
            Some(Characteristic::Location("Home".to_string()))
        );
        assert_eq!(parse_characteristic_label("Total"), Some(Characteristic::Total));
    }

    #[test]
    fn rejects_unknown_or_empty_characteristics() {
        assert_eq!(parse_characteristic_label("Weapon: Knife"), None);
        assert_eq!(parse_characteristic_label("Method:"), None);
        assert_eq!(parse_characteristic_label(""), None);
    }
}
