use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::basemap::region_containing;
use super::filter::region_key;
use super::index::region_average;
use super::model::{RegionFeature, Sample};

/// Value a region takes when no sample of the year is assigned to it.
pub const DEFAULT_REGION_VALUE: f64 = 0.0;

// ---------------------------------------------------------------------------
// Join strategy
// ---------------------------------------------------------------------------

/// How samples are assigned to basemap regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionJoin {
    /// Match the sample `state` column against the feature name.
    ///
    /// With `normalize` the sample name is trimmed and lower-cased and the
    /// feature name lower-cased; without it both are compared raw, so
    /// differently cased names never match.
    ByName { normalize: bool },
    /// Assign each sample to the first region polygon containing it.
    Spatial,
}

impl Default for RegionJoin {
    fn default() -> Self {
        RegionJoin::ByName { normalize: true }
    }
}

// ---------------------------------------------------------------------------
// Per-frame recomputation
// ---------------------------------------------------------------------------

/// Mean sample value per region index. Regions without samples are absent.
pub fn region_values(
    samples: &[Sample],
    regions: &[RegionFeature],
    join: RegionJoin,
) -> BTreeMap<usize, f64> {
    match join {
        RegionJoin::ByName { normalize } => {
            let key_of = |name: &str| {
                if normalize {
                    region_key(name)
                } else {
                    name.to_string()
                }
            };
            let by_name = region_average(samples, |s| s.state.as_deref().map(key_of));
            regions
                .iter()
                .enumerate()
                .filter_map(|(i, region)| {
                    let key = if normalize {
                        region.name.to_lowercase()
                    } else {
                        region.name.clone()
                    };
                    by_name.get(&key).map(|&v| (i, v))
                })
                .collect()
        }
        RegionJoin::Spatial => {
            region_average(samples, |s| region_containing(regions, s.position()))
        }
    }
}

/// Overwrite every region's `pct_change` from this year's samples.
///
/// Values are recomputed from scratch; regions without samples get
/// [`DEFAULT_REGION_VALUE`]. Returns the number of regions that matched.
pub fn assign_region_values(
    regions: &mut [RegionFeature],
    samples: &[Sample],
    join: RegionJoin,
) -> usize {
    let values = region_values(samples, regions, join);
    for (i, region) in regions.iter_mut().enumerate() {
        region.pct_change = values.get(&i).copied().unwrap_or(DEFAULT_REGION_VALUE);
    }
    values.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn square(name: &str, x0: f64) -> RegionFeature {
        let poly = polygon![
            (x: x0, y: 30.0),
            (x: x0 + 10.0, y: 30.0),
            (x: x0 + 10.0, y: 40.0),
            (x: x0, y: 40.0),
            (x: x0, y: 30.0),
        ];
        RegionFeature::new(name, MultiPolygon(vec![poly]))
    }

    fn regions() -> Vec<RegionFeature> {
        vec![square("Colorado", -110.0), square("Kansas", -100.0)]
    }

    #[test]
    fn normalized_name_join_averages() {
        let samples = vec![
            Sample::new(2025, 35.0, -105.0, 10.0).with_state(" colorado "),
            Sample::new(2025, 36.0, -104.0, 20.0).with_state("COLORADO"),
            Sample::new(2025, 35.0, -95.0, -5.0).with_state("Kansas"),
        ];
        let mut regions = regions();
        let matched =
            assign_region_values(&mut regions, &samples, RegionJoin::ByName { normalize: true });
        assert_eq!(matched, 2);
        assert!((regions[0].pct_change - 15.0).abs() < 1e-9);
        assert!((regions[1].pct_change + 5.0).abs() < 1e-9);
    }

    #[test]
    fn raw_name_join_leaves_defaults_on_mismatch() {
        let samples = vec![
            Sample::new(2025, 35.0, -105.0, 10.0).with_state("colorado"),
            Sample::new(2025, 35.0, -95.0, -5.0).with_state("Kansas"),
        ];
        let mut regions = regions();
        let matched =
            assign_region_values(&mut regions, &samples, RegionJoin::ByName { normalize: false });
        assert_eq!(matched, 1);
        assert_eq!(regions[0].pct_change, DEFAULT_REGION_VALUE);
        assert!((regions[1].pct_change + 5.0).abs() < 1e-9);
    }

    #[test]
    fn spatial_join_uses_containment() {
        let samples = vec![
            Sample::new(2025, 35.0, -105.0, 4.0),
            Sample::new(2025, 35.0, -106.0, 8.0),
            Sample::new(2025, 35.0, -50.0, 99.0),
        ];
        let mut regions = regions();
        let matched = assign_region_values(&mut regions, &samples, RegionJoin::Spatial);
        assert_eq!(matched, 1);
        assert!((regions[0].pct_change - 6.0).abs() < 1e-9);
        assert_eq!(regions[1].pct_change, DEFAULT_REGION_VALUE);
    }

    #[test]
    fn spatial_join_keeps_border_samples() {
        let samples = vec![
            Sample::new(2025, 38.0, -110.0, 2.0),
            Sample::new(2025, 40.0, -105.0, 4.0),
        ];
        let mut regions = regions();
        let matched = assign_region_values(&mut regions, &samples, RegionJoin::Spatial);
        assert_eq!(matched, 1);
        assert!((regions[0].pct_change - 3.0).abs() < 1e-9);
    }

    #[test]
    fn values_are_overwritten_not_accumulated() {
        let mut regions = regions();
        let first = vec![Sample::new(2025, 35.0, -105.0, 30.0)];
        let second = vec![Sample::new(2026, 35.0, -95.0, -10.0)];

        assign_region_values(&mut regions, &first, RegionJoin::Spatial);
        assert!((regions[0].pct_change - 30.0).abs() < 1e-9);

        assign_region_values(&mut regions, &second, RegionJoin::Spatial);
        assert_eq!(regions[0].pct_change, DEFAULT_REGION_VALUE);
        assert!((regions[1].pct_change + 10.0).abs() < 1e-9);
    }

    #[test]
    fn join_kind_parses_from_json() {
        let join: RegionJoin = serde_json::from_str(r#"{ "kind": "spatial" }"#).unwrap();
        assert_eq!(join, RegionJoin::Spatial);
        let join: RegionJoin =
            serde_json::from_str(r#"{ "kind": "by_name", "normalize": false }"#).unwrap();
        assert_eq!(join, RegionJoin::ByName { normalize: false });
    }
}
