use std::fmt;

use geo::{MultiPolygon, Point};
use serde::{Deserialize, Serialize};

/// Projection year as stored in the `year` column.
pub type Year = i32;

// ---------------------------------------------------------------------------
// Sample – one grid cell for one year
// ---------------------------------------------------------------------------

/// A modelled precipitation change at one grid cell for one year.
///
/// `pct_change` is a signed percentage; `lat` / `lon` are decimal degrees.
/// The optional `state` column is only present in tables prepared for
/// name-based region joins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub year: Year,
    pub lat: f64,
    pub lon: f64,
    pub pct_change: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl Sample {
    pub fn new(year: Year, lat: f64, lon: f64, pct_change: f64) -> Self {
        Self {
            year,
            lat,
            lon,
            pct_change,
            state: None,
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Geographic position, x = longitude, y = latitude.
    pub fn position(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.3}, {:.3}) {:+.1}%",
            self.year, self.lat, self.lon, self.pct_change
        )?;
        if let Some(state) = &self.state {
            write!(f, " [{state}]")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Resort – static marker, not year-indexed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resort {
    pub name: String,
    pub state: String,
    pub lat: f64,
    pub lon: f64,
}

impl Resort {
    /// Geographic position, x = longitude, y = latitude.
    pub fn position(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

// ---------------------------------------------------------------------------
// RegionFeature – a named basemap polygon
// ---------------------------------------------------------------------------

/// A named region polygon (a state boundary) from the basemap.
///
/// `pct_change` is derived: it is overwritten on every year selection with
/// the mean of the samples assigned to the region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFeature {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    pub pct_change: f64,
}

impl RegionFeature {
    pub fn new(name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            name: name.into(),
            geometry,
            pct_change: 0.0,
        }
    }
}
