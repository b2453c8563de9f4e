use super::model::RegionFeature;

// ---------------------------------------------------------------------------
// Region names
// ---------------------------------------------------------------------------

/// Regions dropped from the basemap before any join: the map only covers
/// the contiguous states.
pub const DEFAULT_EXCLUDED_REGIONS: [&str; 3] = ["Alaska", "Hawaii", "Puerto Rico"];

/// Canonical join key for a region name: surrounding whitespace removed,
/// lower-cased.
pub fn region_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Remove features whose name is in `excluded` (exact match).
///
/// Returns the number of features removed.
pub fn retain_regions(features: &mut Vec<RegionFeature>, excluded: &[String]) -> usize {
    let before = features.len();
    features.retain(|f| !excluded.iter().any(|name| name == &f.name));
    before - features.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::MultiPolygon;

    fn feature(name: &str) -> RegionFeature {
        RegionFeature::new(name, MultiPolygon(Vec::new()))
    }

    #[test]
    fn region_key_trims_and_lowercases() {
        assert_eq!(region_key("  New York "), "new york");
        assert_eq!(region_key("COLORADO"), "colorado");
        assert_eq!(region_key(""), "");
    }

    #[test]
    fn excluded_regions_are_removed() {
        let mut features = vec![
            feature("Colorado"),
            feature("Alaska"),
            feature("Utah"),
            feature("Hawaii"),
        ];
        let excluded: Vec<String> = DEFAULT_EXCLUDED_REGIONS
            .iter()
            .map(|s| s.to_string())
            .collect();

        let removed = retain_regions(&mut features, &excluded);

        assert_eq!(removed, 2);
        let names: Vec<&str> = features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Colorado", "Utah"]);
    }

    #[test]
    fn exclusion_is_exact_match() {
        let mut features = vec![feature("alaska")];
        let removed = retain_regions(&mut features, &["Alaska".to_string()]);
        assert_eq!(removed, 0);
        assert_eq!(features.len(), 1);
    }
}
