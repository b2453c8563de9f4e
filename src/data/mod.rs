/// Data layer: core types, loading, indexing and region joins.
///
/// Architecture:
/// ```text
///  samples .csv / .json / .parquet      resorts .csv      basemap .geojson
///        │                                  │                   │
///        ▼                                  │                   ▼
///   ┌──────────┐                            │            ┌───────────┐
///   │  loader   │  parse file → Vec<Sample>  │            │  basemap   │ → Vec<RegionFeature>
///   └──────────┘                            │            └───────────┘
///        │                                  │                   │
///        ▼                                  │                   ▼
///   ┌───────────┐                           │            ┌───────────┐
///   │ YearIndex  │  year → Vec<Sample>       │            │  filter    │  drop excluded regions
///   └───────────┘                           │            └───────────┘
///        │  samples_for_year / nearest      │                   │
///        ▼                                  ▼                   ▼
///   ┌──────────────────────────────────────────────────────────────┐
///   │  join   │  region_average per region → RegionFeature.pct_change │
///   └──────────────────────────────────────────────────────────────┘
/// ```

pub mod basemap;
pub mod filter;
pub mod index;
pub mod join;
pub mod loader;
pub mod model;
