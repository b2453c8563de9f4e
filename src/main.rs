use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use precip_atlas::config::AtlasConfig;
use precip_atlas::data::join::RegionJoin;
use precip_atlas::{MapState, Year};

#[derive(Parser, Debug)]
#[command(about = "Replay year selections over precipitation-change projections")]
struct Args {
    /// JSON config file; built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sample table (.csv, .json or .parquet).
    #[arg(long)]
    samples: Option<PathBuf>,

    #[arg(long)]
    resorts: Option<PathBuf>,

    /// GeoJSON FeatureCollection of region polygons.
    #[arg(long, conflicts_with = "no_basemap")]
    basemap: Option<PathBuf>,

    /// Skip the region layer entirely.
    #[arg(long)]
    no_basemap: bool,

    #[arg(long, value_enum)]
    join: Option<JoinArg>,

    /// Years to select after the initial draw, in order.
    #[arg(long = "year")]
    years: Vec<Year>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum JoinArg {
    /// Case- and whitespace-insensitive name match.
    Name,
    /// Exact name match.
    RawName,
    /// Point-in-polygon.
    Spatial,
}

impl From<JoinArg> for RegionJoin {
    fn from(arg: JoinArg) -> Self {
        match arg {
            JoinArg::Name => RegionJoin::ByName { normalize: true },
            JoinArg::RawName => RegionJoin::ByName { normalize: false },
            JoinArg::Spatial => RegionJoin::Spatial,
        }
    }
}

fn resolve_config(args: &Args) -> Result<AtlasConfig> {
    let mut config = match &args.config {
        Some(path) => AtlasConfig::from_file(path)?,
        None => AtlasConfig::default(),
    };
    if let Some(path) = &args.samples {
        config.samples_path = path.clone();
    }
    if let Some(path) = &args.resorts {
        config.resorts_path = path.clone();
    }
    if let Some(path) = &args.basemap {
        config.basemap_path = Some(path.clone());
    }
    if args.no_basemap {
        config.basemap_path = None;
    }
    if let Some(join) = args.join {
        config.region_join = join.into();
    }
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = resolve_config(&args)?;
    let mut state = MapState::from_config(&config).context("loading atlas data")?;

    for year in std::iter::once(config.initial_year).chain(args.years.iter().copied()) {
        if state.set_year(year) {
            print!("{}", state.layers);
        } else {
            println!("Year {year}: no data, skipped");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
