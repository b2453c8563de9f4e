use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

use precip_atlas::{Resort, Sample, Year};

/// Write a synthetic precipitation-change grid and resort list.
#[derive(Parser, Debug)]
struct Args {
    /// Output directory.
    #[arg(long, default_value = "data")]
    out: PathBuf,

    #[arg(long, default_value_t = 2025)]
    first_year: Year,

    #[arg(long, default_value_t = 2100)]
    last_year: Year,

    /// Grid spacing in degrees.
    #[arg(long, default_value_t = 1.0)]
    step: f64,

    /// Also write the grid as Parquet.
    #[arg(long)]
    parquet: bool,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

// Contiguous U.S. bounding box.
const LAT_RANGE: (f64, f64) = (25.0, 49.0);
const LON_RANGE: (f64, f64) = (-124.0, -67.0);

/// Wetter toward the north-east, drier toward the south-west, with the
/// contrast growing over the century.
fn projected_change(lat: f64, lon: f64, year: Year, rng: &mut SimpleRng) -> f64 {
    let t = (year - 2025) as f64 / 75.0;
    let north = (lat - 37.0) / 12.0;
    let east = (lon + 95.5) / 28.5;
    let trend = 25.0 * t * (0.6 * north + 0.4 * east);
    let value = trend + rng.gauss(0.0, 2.0 + 3.0 * t);
    (value * 100.0).round() / 100.0
}

fn grid(args: &Args, rng: &mut SimpleRng) -> Vec<Sample> {
    let n_lat = ((LAT_RANGE.1 - LAT_RANGE.0) / args.step).floor() as usize + 1;
    let n_lon = ((LON_RANGE.1 - LON_RANGE.0) / args.step).floor() as usize + 1;

    let mut samples = Vec::new();
    for year in args.first_year..=args.last_year {
        for i in 0..n_lat {
            let lat = LAT_RANGE.0 + i as f64 * args.step;
            for j in 0..n_lon {
                let lon = LON_RANGE.0 + j as f64 * args.step;
                let pct_change = projected_change(lat, lon, year, rng);
                samples.push(Sample::new(year, lat, lon, pct_change));
            }
        }
    }
    samples
}

fn resorts() -> Vec<Resort> {
    [
        ("Vail", "CO", 39.6403, -106.3742),
        ("Aspen Snowmass", "CO", 39.2084, -106.9490),
        ("Park City", "UT", 40.6514, -111.5080),
        ("Alta", "UT", 40.5884, -111.6386),
        ("Jackson Hole", "WY", 43.5875, -110.8279),
        ("Big Sky", "MT", 45.2840, -111.4014),
        ("Sun Valley", "ID", 43.6971, -114.3517),
        ("Mammoth Mountain", "CA", 37.6308, -119.0326),
        ("Palisades Tahoe", "CA", 39.1970, -120.2357),
        ("Mt. Bachelor", "OR", 43.9792, -121.6886),
        ("Crystal Mountain", "WA", 46.9282, -121.5045),
        ("Taos Ski Valley", "NM", 36.5960, -105.4545),
        ("Stowe", "VT", 44.5303, -72.7814),
        ("Killington", "VT", 43.6045, -72.8201),
        ("Sugarloaf", "ME", 45.0314, -70.3131),
        ("Whiteface", "NY", 44.3659, -73.9026),
    ]
    .into_iter()
    .map(|(name, state, lat, lon)| Resort {
        name: name.to_string(),
        state: state.to_string(),
        lat,
        lon,
    })
    .collect()
}

fn write_csv<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, samples: &[Sample]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("year", DataType::Int32, false),
        Field::new("lat", DataType::Float64, false),
        Field::new("lon", DataType::Float64, false),
        Field::new("pct_change", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int32Array::from_iter_values(samples.iter().map(|s| s.year))),
            Arc::new(Float64Array::from_iter_values(samples.iter().map(|s| s.lat))),
            Arc::new(Float64Array::from_iter_values(samples.iter().map(|s| s.lon))),
            Arc::new(Float64Array::from_iter_values(
                samples.iter().map(|s| s.pct_change),
            )),
        ],
    )
    .context("building record batch")?;

    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    anyhow::ensure!(args.step > 0.0, "--step must be positive");
    anyhow::ensure!(
        args.first_year <= args.last_year,
        "--first-year must not exceed --last-year"
    );

    fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    let mut rng = SimpleRng::new(args.seed);
    let samples = grid(&args, &mut rng);
    let resorts = resorts();

    let grid_path = args.out.join("us_pr_change_by_year.csv");
    write_csv(&grid_path, &samples)?;
    log::info!("Wrote {} samples to {}", samples.len(), grid_path.display());

    let resort_path = args.out.join("resorts.csv");
    write_csv(&resort_path, &resorts)?;
    log::info!("Wrote {} resorts to {}", resorts.len(), resort_path.display());

    if args.parquet {
        let parquet_path = args.out.join("us_pr_change_by_year.parquet");
        write_parquet(&parquet_path, &samples)?;
        log::info!("Wrote {}", parquet_path.display());
    }

    println!(
        "Wrote {} samples ({}..={}) and {} resorts to {}",
        samples.len(),
        args.first_year,
        args.last_year,
        resorts.len(),
        args.out.display()
    );
    Ok(())
}
