use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray, StringArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::index::YearIndex;
use super::model::{Resort, Sample, Year};
use crate::error::DataError;

const SAMPLE_COLUMNS: [&str; 4] = ["year", "lat", "lon", "pct_change"];
const RESORT_COLUMNS: [&str; 4] = ["name", "state", "lat", "lon"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the grid-sample table.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header `year,lat,lon,pct_change[,state]`
/// * `.json`    – `[{ "year": 2025, "lat": ..., "lon": ..., "pct_change": ... }, ...]`
/// * `.parquet` – columns `year`, `lat`, `lon`, `pct_change` and optional `state`
pub fn load_samples(path: &Path) -> Result<Vec<Sample>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let samples = match ext.as_str() {
        "csv" => load_samples_csv(path),
        "json" => load_samples_json(path),
        "parquet" | "pq" => load_samples_parquet(path),
        other => Err(DataError::UnsupportedFormat(other.to_string()).into()),
    }
    .with_context(|| format!("loading samples from {}", path.display()))?;

    log::info!("Loaded {} samples from {}", samples.len(), path.display());
    Ok(samples)
}

/// Load the sample table and partition it by year.
pub fn load_year_index(path: &Path) -> Result<YearIndex> {
    let index = YearIndex::build(load_samples(path)?);
    match index.year_range() {
        Some((first, last)) => log::info!(
            "Indexed {} samples over {} years ({first}..={last})",
            index.len(),
            index.years().count()
        ),
        None => log::warn!("{} contains no samples", path.display()),
    }
    Ok(index)
}

/// Load resort markers from a CSV with header `name,state,lat,lon`.
pub fn load_resorts(path: &Path) -> Result<Vec<Resort>> {
    let mut reader = csv_reader(path)?;
    require_columns(&mut reader, "resort table", &RESORT_COLUMNS)?;

    let mut resorts = Vec::new();
    for (row_no, result) in reader.deserialize::<Resort>().enumerate() {
        let resort = result.with_context(|| format!("resort CSV row {row_no}"))?;
        resorts.push(resort);
    }

    log::info!("Loaded {} resorts from {}", resorts.len(), path.display());
    Ok(resorts)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn csv_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .with_context(|| format!("opening CSV {}", path.display()))
}

fn require_columns(
    reader: &mut csv::Reader<std::fs::File>,
    table: &'static str,
    columns: &[&'static str],
) -> Result<()> {
    let headers = reader.headers().context("reading CSV headers")?;
    for &column in columns {
        if !headers.iter().any(|h| h == column) {
            return Err(DataError::MissingColumn { table, column }.into());
        }
    }
    Ok(())
}

fn load_samples_csv(path: &Path) -> Result<Vec<Sample>> {
    let mut reader = csv_reader(path)?;
    require_columns(&mut reader, "sample table", &SAMPLE_COLUMNS)?;

    let mut samples = Vec::new();
    for (row_no, result) in reader.deserialize::<Sample>().enumerate() {
        let sample = result.with_context(|| format!("sample CSV row {row_no}"))?;
        samples.push(sample);
    }
    Ok(samples)
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Records-oriented JSON, one object per sample.
fn load_samples_json(path: &Path) -> Result<Vec<Sample>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let samples: Vec<Sample> =
        serde_json::from_str(&text).context("expected a JSON array of sample records")?;
    Ok(samples)
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Load a Parquet sample table.
///
/// `year` may be Int32 or Int64; the coordinate and value columns may be
/// Float64, Float32, Int32 or Int64. Works with files written by both
/// Pandas and Polars.
fn load_samples_parquet(path: &Path) -> Result<Vec<Sample>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut samples = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let mut columns = Vec::with_capacity(SAMPLE_COLUMNS.len());
        for column in SAMPLE_COLUMNS {
            let idx = schema.index_of(column).map_err(|_| DataError::MissingColumn {
                table: "sample table",
                column,
            })?;
            columns.push(batch.column(idx));
        }
        let state_col = schema.index_of("state").ok().map(|idx| batch.column(idx));

        for row in 0..batch.num_rows() {
            let year = extract_year(columns[0], row)
                .with_context(|| format!("Row {row}: failed to read 'year'"))?;
            let lat = extract_f64("lat", columns[1], row)
                .with_context(|| format!("Row {row}: failed to read 'lat'"))?;
            let lon = extract_f64("lon", columns[2], row)
                .with_context(|| format!("Row {row}: failed to read 'lon'"))?;
            let pct_change = extract_f64("pct_change", columns[3], row)
                .with_context(|| format!("Row {row}: failed to read 'pct_change'"))?;
            let state = match state_col {
                Some(col) => extract_string(col, row)?,
                None => None,
            };

            samples.push(Sample {
                year,
                lat,
                lon,
                pct_change,
                state,
            });
        }
    }

    Ok(samples)
}

// -- Parquet / Arrow helpers --

fn column_type_error(name: &str, col: &Arc<dyn Array>, expected: &'static str) -> DataError {
    DataError::ColumnType {
        column: name.to_string(),
        found: format!("{:?}", col.data_type()),
        expected,
    }
}

fn extract_year(col: &Arc<dyn Array>, row: usize) -> Result<Year> {
    if col.is_null(row) {
        bail!("null year");
    }
    match col.data_type() {
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            Ok(arr.value(row))
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            Year::try_from(arr.value(row)).context("year out of range")
        }
        _ => Err(column_type_error("year", col, "Int32 or Int64").into()),
    }
}

fn extract_f64(name: &str, col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        return Ok(f64::NAN);
    }
    match col.data_type() {
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            Ok(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            Ok(arr.value(row) as f64)
        }
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            Ok(arr.value(row) as f64)
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            Ok(arr.value(row) as f64)
        }
        _ => Err(column_type_error(name, col, "a numeric type").into()),
    }
}

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<Option<String>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let value = match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .context("expected StringArray")?
            .value(row),
        DataType::LargeUtf8 => col
            .as_any()
            .downcast_ref::<LargeStringArray>()
            .context("expected LargeStringArray")?
            .value(row),
        _ => return Err(column_type_error("state", col, "Utf8").into()),
    };
    Ok((!value.is_empty()).then(|| value.to_string()))
}
