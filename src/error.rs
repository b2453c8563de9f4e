use thiserror::Error;

/// Failures that the loaders report with a specific shape.
///
/// I/O and per-row parse failures are wrapped with `anyhow` context at the
/// call site; these variants cover the structural problems.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
    #[error("{table} is missing the '{column}' column")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error("column '{column}' has type {found}, expected {expected}")]
    ColumnType {
        column: String,
        found: String,
        expected: &'static str,
    },
    #[error("basemap is not a GeoJSON FeatureCollection")]
    NotFeatureCollection,
    #[error("feature '{name}' has an invalid geometry: {reason}")]
    InvalidGeometry { name: String, reason: String },
}
