use std::fmt;

use anyhow::Result;
use geo::Point;

use crate::config::AtlasConfig;
use crate::data::basemap::load_basemap;
use crate::data::filter::retain_regions;
use crate::data::index::{nearest, value_domain, YearIndex};
use crate::data::join::{assign_region_values, RegionJoin};
use crate::data::loader::{load_resorts, load_year_index};
use crate::data::model::{RegionFeature, Resort, Sample, Year};

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// Region colouring input for one year.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethLayer {
    pub year: Year,
    pub regions: Vec<RegionValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionValue {
    pub name: String,
    pub pct_change: f64,
}

/// Discrete heatmap input: the year's grid cells and their value range.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayer {
    pub year: Year,
    pub cells: Vec<Sample>,
    pub domain: Option<(f64, f64)>,
}

/// Resort markers with the value of the nearest grid sample.
#[derive(Debug, Clone, PartialEq)]
pub struct ResortLayer {
    pub year: Year,
    pub markers: Vec<ResortMarker>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResortMarker {
    pub name: String,
    pub state: String,
    /// x = longitude, y = latitude.
    pub position: Point<f64>,
    /// `None` when the year has no samples at all.
    pub pct_change: Option<f64>,
}

impl ResortMarker {
    pub fn tooltip(&self) -> String {
        format!(
            "{} ({}) Δ Precip: {}%",
            self.name,
            self.state,
            format_pct(self.pct_change)
        )
    }
}

/// One decimal place, or `n/a`.
pub fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "n/a".to_string(),
    }
}

// ---------------------------------------------------------------------------
// RenderState – the currently displayed layers
// ---------------------------------------------------------------------------

/// Layers currently on screen. Every redraw tears these down before the
/// replacements are installed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderState {
    pub choropleth: Option<ChoroplethLayer>,
    pub grid: Option<GridLayer>,
    pub resorts: Option<ResortLayer>,
}

impl RenderState {
    /// Drop all layers, returning how many were present.
    pub fn clear(&mut self) -> usize {
        usize::from(self.choropleth.take().is_some())
            + usize::from(self.grid.take().is_some())
            + usize::from(self.resorts.take().is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.choropleth.is_none() && self.grid.is_none() && self.resorts.is_none()
    }
}

// ---------------------------------------------------------------------------
// MapState – render controller
// ---------------------------------------------------------------------------

/// Loaded data plus the layers derived for the selected year.
pub struct MapState {
    /// Immutable after construction.
    pub index: YearIndex,
    pub resorts: Vec<Resort>,
    /// Basemap regions; `pct_change` is rewritten on every accepted year.
    pub regions: Vec<RegionFeature>,
    pub region_join: RegionJoin,

    /// Year of the layers currently displayed.
    pub year: Option<Year>,
    pub layers: RenderState,
}

impl MapState {
    pub fn new(
        index: YearIndex,
        resorts: Vec<Resort>,
        regions: Vec<RegionFeature>,
        region_join: RegionJoin,
    ) -> Self {
        Self {
            index,
            resorts,
            regions,
            region_join,
            year: None,
            layers: RenderState::default(),
        }
    }

    /// Load every input named by `config`. Any failure aborts the whole
    /// load; there is no partial-data fallback.
    ///
    /// A name join over a table without any `state` values falls back to
    /// the spatial join.
    pub fn from_config(config: &AtlasConfig) -> Result<Self> {
        let index = load_year_index(&config.samples_path)?;
        let resorts = load_resorts(&config.resorts_path)?;
        let regions = match &config.basemap_path {
            Some(path) => {
                let mut regions = load_basemap(path)?;
                let removed = retain_regions(&mut regions, &config.excluded_regions);
                log::info!("Excluded {removed} regions, {} remain", regions.len());
                regions
            }
            None => Vec::new(),
        };
        let region_join = match config.region_join {
            RegionJoin::ByName { .. } if !regions.is_empty() && !index.has_region_names() => {
                log::warn!("Sample table has no state names; joining regions spatially");
                RegionJoin::Spatial
            }
            join => join,
        };
        Ok(Self::new(index, resorts, regions, region_join))
    }

    /// Select `year` and rebuild every layer.
    ///
    /// A year without samples is not an error: nothing is redrawn, the
    /// previous layers stay up, and `false` is returned.
    pub fn set_year(&mut self, year: Year) -> bool {
        let samples = self.index.samples_for_year(year);
        if samples.is_empty() {
            log::debug!("No samples for {year}; keeping current layers");
            return false;
        }

        let removed = self.layers.clear();
        log::debug!("Tore down {removed} layers for redraw at {year}");

        let choropleth = if self.regions.is_empty() {
            None
        } else {
            let matched = assign_region_values(&mut self.regions, samples, self.region_join);
            if matched < self.regions.len() {
                log::warn!(
                    "{year}: {} of {} regions matched no samples, defaulting to 0",
                    self.regions.len() - matched,
                    self.regions.len()
                );
            }
            Some(ChoroplethLayer {
                year,
                regions: self
                    .regions
                    .iter()
                    .map(|r| RegionValue {
                        name: r.name.clone(),
                        pct_change: r.pct_change,
                    })
                    .collect(),
            })
        };

        let grid = GridLayer {
            year,
            cells: samples.to_vec(),
            domain: value_domain(samples),
        };

        let resorts = ResortLayer {
            year,
            markers: resort_markers(&self.resorts, samples),
        };

        self.layers = RenderState {
            choropleth,
            grid: Some(grid),
            resorts: Some(resorts),
        };
        self.year = Some(year);
        true
    }
}

/// Pair each resort with its nearest sample in `samples`.
pub fn resort_markers(resorts: &[Resort], samples: &[Sample]) -> Vec<ResortMarker> {
    resorts
        .iter()
        .map(|r| ResortMarker {
            name: r.name.clone(),
            state: r.state.clone(),
            position: r.position(),
            pct_change: nearest(samples, r.position()).map(|s| s.pct_change),
        })
        .collect()
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(grid) = &self.grid {
            write!(f, "Year {}: {} grid cells", grid.year, grid.cells.len())?;
            if let Some((min, max)) = grid.domain {
                write!(f, ", range {min:+.1}% .. {max:+.1}%")?;
            }
            writeln!(f)?;
        }
        if let Some(choropleth) = &self.choropleth {
            writeln!(f, "Regions:")?;
            for region in &choropleth.regions {
                writeln!(f, "  {:<24} {:+7.1}%", region.name, region.pct_change)?;
            }
        }
        if let Some(resorts) = &self.resorts {
            writeln!(f, "Resorts:")?;
            for marker in &resorts.markers {
                writeln!(f, "  {}", marker.tooltip())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn state() -> MapState {
        let index = YearIndex::build(vec![
            Sample::new(2025, 39.6, -106.0, 12.0).with_state("Colorado"),
            Sample::new(2025, 40.6, -111.5, -8.0).with_state("Utah"),
            Sample::new(2030, 39.6, -106.0, 20.0).with_state("Colorado"),
        ]);
        let resorts = vec![
            Resort {
                name: "Vail".into(),
                state: "CO".into(),
                lat: 39.64,
                lon: -106.37,
            },
            Resort {
                name: "Park City".into(),
                state: "UT".into(),
                lat: 40.65,
                lon: -111.51,
            },
        ];
        let colorado = polygon![
            (x: -109.0, y: 37.0),
            (x: -102.0, y: 37.0),
            (x: -102.0, y: 41.0),
            (x: -109.0, y: 41.0),
            (x: -109.0, y: 37.0),
        ];
        let regions = vec![RegionFeature::new("Colorado", MultiPolygon(vec![colorado]))];
        MapState::new(index, resorts, regions, RegionJoin::default())
    }

    #[test]
    fn selecting_year_builds_layers() {
        let mut state = state();
        assert!(state.set_year(2025));
        assert_eq!(state.year, Some(2025));

        let grid = state.layers.grid.as_ref().unwrap();
        assert_eq!(grid.cells.len(), 2);
        assert_eq!(grid.domain, Some((-8.0, 12.0)));

        let choropleth = state.layers.choropleth.as_ref().unwrap();
        assert_eq!(choropleth.regions[0].name, "Colorado");
        assert!((choropleth.regions[0].pct_change - 12.0).abs() < 1e-9);

        let markers = &state.layers.resorts.as_ref().unwrap().markers;
        assert_eq!(markers[0].pct_change, Some(12.0));
        assert_eq!(markers[1].pct_change, Some(-8.0));
        assert_eq!(markers[1].tooltip(), "Park City (UT) Δ Precip: -8.0%");
    }

    #[test]
    fn missing_year_keeps_previous_layers() {
        let mut state = state();
        assert!(state.set_year(2025));
        let before = state.layers.clone();

        assert!(!state.set_year(2026));
        assert_eq!(state.year, Some(2025));
        assert_eq!(state.layers, before);
    }

    #[test]
    fn redraw_replaces_layers() {
        let mut state = state();
        state.set_year(2025);
        state.set_year(2030);

        let choropleth = state.layers.choropleth.as_ref().unwrap();
        assert_eq!(choropleth.year, 2030);
        assert!((choropleth.regions[0].pct_change - 20.0).abs() < 1e-9);
        let markers = &state.layers.resorts.as_ref().unwrap().markers;
        // Only one sample in 2030, so both resorts resolve to it.
        assert!(markers.iter().all(|m| m.pct_change == Some(20.0)));
    }

    #[test]
    fn no_basemap_means_no_choropleth() {
        let mut state = state();
        state.regions.clear();
        assert!(state.set_year(2025));
        assert!(state.layers.choropleth.is_none());
        assert!(state.layers.grid.is_some());
    }

    #[test]
    fn clear_counts_layers() {
        let mut state = state();
        assert!(state.layers.is_empty());
        state.set_year(2025);
        assert_eq!(state.layers.clear(), 3);
        assert!(state.layers.is_empty());
    }

    #[test]
    fn markers_without_samples_read_na() {
        let markers = resort_markers(&state().resorts, &[]);
        assert!(markers.iter().all(|m| m.pct_change.is_none()));
        assert_eq!(format_pct(None), "n/a");
        assert_eq!(format_pct(Some(3.14159)), "3.1");
    }
}
