use std::collections::BTreeMap;

use geo::Point;

use super::model::{Sample, Year};

// ---------------------------------------------------------------------------
// YearIndex – samples partitioned by year
// ---------------------------------------------------------------------------

/// Samples grouped by exact year value.
///
/// Built once after loading and never mutated afterwards. Within a year the
/// samples keep their input order, which is what makes [`nearest`] ties
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearIndex {
    by_year: BTreeMap<Year, Vec<Sample>>,
    len: usize,
}

impl YearIndex {
    /// Partition `samples` by year. No validation is done on which years
    /// are present.
    pub fn build<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = Sample>,
    {
        let mut by_year: BTreeMap<Year, Vec<Sample>> = BTreeMap::new();
        let mut len = 0;
        for sample in samples {
            by_year.entry(sample.year).or_default().push(sample);
            len += 1;
        }
        Self { by_year, len }
    }

    /// All samples for `year`, or an empty slice when the year is absent.
    pub fn samples_for_year(&self, year: Year) -> &[Sample] {
        self.by_year.get(&year).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_year(&self, year: Year) -> bool {
        self.by_year.contains_key(&year)
    }

    /// Years present in the index, ascending.
    pub fn years(&self) -> impl Iterator<Item = Year> + '_ {
        self.by_year.keys().copied()
    }

    /// First and last year present.
    pub fn year_range(&self) -> Option<(Year, Year)> {
        let first = *self.by_year.keys().next()?;
        let last = *self.by_year.keys().next_back()?;
        Some((first, last))
    }

    /// Every sample, year by year.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.by_year.values().flatten()
    }

    /// Whether any sample carries a region name to join on.
    pub fn has_region_names(&self) -> bool {
        self.iter().any(|s| s.state.is_some())
    }

    /// Total number of samples across all years.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// ---------------------------------------------------------------------------
// Per-year queries
// ---------------------------------------------------------------------------

/// The sample closest to `point` by squared Euclidean distance in degrees
/// (x = longitude, y = latitude).
///
/// Ties go to the first sample in sequence order. Returns `None` for an
/// empty slice.
pub fn nearest(samples: &[Sample], point: Point<f64>) -> Option<&Sample> {
    let mut best: Option<(&Sample, f64)> = None;
    for sample in samples {
        let dx = sample.lon - point.x();
        let dy = sample.lat - point.y();
        let d2 = dx * dx + dy * dy;
        if d2.is_nan() {
            continue;
        }
        if best.map(|(_, bd2)| d2 < bd2).unwrap_or(true) {
            best = Some((sample, d2));
        }
    }
    best.map(|(sample, _)| sample)
}

/// Mean `pct_change` per key.
///
/// `key_fn` returning `None` drops the sample, as does a non-finite
/// `pct_change`. Keys with no samples are absent from the result, so
/// callers supply their own default.
pub fn region_average<K, F>(samples: &[Sample], mut key_fn: F) -> BTreeMap<K, f64>
where
    K: Ord,
    F: FnMut(&Sample) -> Option<K>,
{
    let mut sums: BTreeMap<K, (f64, usize)> = BTreeMap::new();
    for sample in samples.iter().filter(|s| s.pct_change.is_finite()) {
        let Some(key) = key_fn(sample) else {
            continue;
        };
        let entry = sums.entry(key).or_insert((0.0, 0));
        entry.0 += sample.pct_change;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(key, (sum, count))| (key, sum / count as f64))
        .collect()
}

/// Smallest and largest `pct_change`, ignoring non-finite values.
pub fn value_domain(samples: &[Sample]) -> Option<(f64, f64)> {
    samples
        .iter()
        .map(|s| s.pct_change)
        .filter(|v| v.is_finite())
        .fold(None::<(f64, f64)>, |acc, v| match acc {
            None => Some((v, v)),
            Some((min, max)) => Some((f64::min(min, v), f64::max(max, v))),
        })
}
