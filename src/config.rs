//! Configuration for the precipitation atlas.
//!
//! Loaded from a JSON file; every field has a default matching the stock
//! `data/` layout, so an empty object is a valid config.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

use crate::data::filter::DEFAULT_EXCLUDED_REGIONS;
use crate::data::join::RegionJoin;
use crate::data::model::Year;

/// Year selected before any user input.
pub const DEFAULT_INITIAL_YEAR: Year = 2025;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub samples_path: PathBuf,
    pub resorts_path: PathBuf,
    /// Region polygons; without one only the grid and resort layers exist.
    pub basemap_path: Option<PathBuf>,
    pub initial_year: Year,
    pub excluded_regions: Vec<String>,
    pub region_join: RegionJoin,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            samples_path: PathBuf::from("data/us_pr_change_by_year.csv"),
            resorts_path: PathBuf::from("data/resorts.csv"),
            basemap_path: Some(PathBuf::from("data/us-states.json")),
            initial_year: DEFAULT_INITIAL_YEAR,
            excluded_regions: DEFAULT_EXCLUDED_REGIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            region_join: RegionJoin::default(),
        }
    }
}

impl AtlasConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = AtlasConfig::from_json_str(&contents)?;
        Ok(config)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse atlas config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read atlas config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
