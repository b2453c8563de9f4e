pub mod config;
pub mod data;
pub mod error;
pub mod state;

pub use config::AtlasConfig;
pub use data::index::{nearest, region_average, YearIndex};
pub use data::model::{RegionFeature, Resort, Sample, Year};
pub use state::MapState;
