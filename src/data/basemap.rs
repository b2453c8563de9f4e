use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use geo::{Geometry, Intersects, MultiPolygon, Point};
use geojson::GeoJson;

use super::model::RegionFeature;
use crate::error::DataError;

/// Property holding the region name in the state-boundary collection.
pub const NAME_PROPERTY: &str = "name";

/// Read a GeoJSON FeatureCollection of region polygons from disk.
pub fn load_basemap(path: &Path) -> Result<Vec<RegionFeature>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading basemap {}", path.display()))?;
    let features =
        parse_basemap(&text).with_context(|| format!("parsing basemap {}", path.display()))?;
    log::info!("Loaded {} regions from {}", features.len(), path.display());
    Ok(features)
}

/// Convert a GeoJSON FeatureCollection into region features.
///
/// Polygon and MultiPolygon geometries are kept; features with any other
/// geometry, or none, are skipped. A missing `name` property becomes an
/// empty name, which never matches a name join.
pub fn parse_basemap(text: &str) -> Result<Vec<RegionFeature>> {
    let GeoJson::FeatureCollection(fc) = GeoJson::from_str(text)? else {
        return Err(DataError::NotFeatureCollection.into());
    };

    let mut features = Vec::with_capacity(fc.features.len());
    for feature in fc.features {
        let name = feature
            .properties
            .as_ref()
            .and_then(|p| p.get(NAME_PROPERTY).and_then(|v| v.as_str()))
            .unwrap_or("")
            .to_string();

        let Some(gj) = feature.geometry else {
            log::debug!("Skipping region '{name}' without geometry");
            continue;
        };
        let geom: Geometry<f64> =
            gj.value
                .try_into()
                .map_err(|e: geojson::Error| DataError::InvalidGeometry {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
        let geometry: MultiPolygon<f64> = match geom {
            Geometry::Polygon(p) => p.into(),
            Geometry::MultiPolygon(m) => m,
            _ => {
                log::debug!("Skipping region '{name}' with non-polygon geometry");
                continue;
            }
        };

        features.push(RegionFeature::new(name, geometry));
    }
    Ok(features)
}

/// Index of the first region whose polygon contains `point`
/// (x = longitude, y = latitude). Points on a boundary belong to the
/// first region touching them.
pub fn region_containing(features: &[RegionFeature], point: Point<f64>) -> Option<usize> {
    features
        .iter()
        .position(|f| f.geometry.intersects(&point))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SQUARES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "name": "West" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[-110, 30], [-100, 30], [-100, 40], [-110, 40], [-110, 30]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "East" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[[[-100, 30], [-90, 30], [-90, 40], [-100, 40], [-100, 30]]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "Capital" },
                "geometry": { "type": "Point", "coordinates": [-95, 35] }
            }
        ]
    }"#;

    #[test]
    fn keeps_polygonal_features() {
        let features = parse_basemap(TWO_SQUARES).unwrap();
        let names: Vec<&str> = features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["West", "East"]);
        assert!(features.iter().all(|f| f.pct_change == 0.0));
    }

    #[test]
    fn locates_containing_region() {
        let features = parse_basemap(TWO_SQUARES).unwrap();
        assert_eq!(region_containing(&features, Point::new(-105.0, 35.0)), Some(0));
        assert_eq!(region_containing(&features, Point::new(-95.0, 35.0)), Some(1));
        assert_eq!(region_containing(&features, Point::new(-80.0, 35.0)), None);
    }

    #[test]
    fn boundary_points_go_to_first_touching_region() {
        let features = parse_basemap(TWO_SQUARES).unwrap();
        assert_eq!(region_containing(&features, Point::new(-110.0, 35.0)), Some(0));
        assert_eq!(region_containing(&features, Point::new(-105.0, 40.0)), Some(0));
        // Shared edge between West and East.
        assert_eq!(region_containing(&features, Point::new(-100.0, 35.0)), Some(0));
        assert_eq!(region_containing(&features, Point::new(-90.0, 30.0)), Some(1));
    }

    #[test]
    fn rejects_bare_geometry() {
        let err = parse_basemap(r#"{ "type": "Point", "coordinates": [0, 0] }"#).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::NotFeatureCollection)
        ));
    }
}
