//! Converts geodata rows into [`PolygonRef`] values.
//!
//! Rows carry `id`, `name`, and `geometry`, either as a positional array
//! (the tabular query response shape) or as an object. The geometry is
//! either a collection (`{"geometries": [...]}`), a wrapper
//! (`{"geometry": {...}}`), or a bare `GeoJSON` polygon. It is resolved
//! once into an [`AreaGeometry`] so nothing downstream has to guess.

use access_map_area_models::{AreaId, LatLng, PolygonRef};
use geo::{Centroid, LineString, MultiPolygon, Polygon};
use serde_json::Value;

use crate::IngestError;
use crate::metrics::area_id_from;

/// Area geometry resolved at ingestion time.
#[derive(Debug, Clone, PartialEq)]
pub enum AreaGeometry {
    /// Several disjoint parts (e.g. an area split by a river).
    MultiPart(MultiPolygon<f64>),
    /// A single polygon.
    SinglePart(Polygon<f64>),
}

impl AreaGeometry {
    /// Returns the area centroid, or `None` for empty geometry.
    #[must_use]
    pub fn centroid(&self) -> Option<LatLng> {
        let point = match self {
            Self::MultiPart(mp) => mp.centroid(),
            Self::SinglePart(p) => p.centroid(),
        }?;
        Some(LatLng::new(point.y(), point.x()))
    }
}

/// One parsed geodata row.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaShape {
    /// Area id.
    pub area_id: AreaId,
    /// Lower-cased area name.
    pub area_name: String,
    /// Resolved geometry.
    pub geometry: AreaGeometry,
}

impl AreaShape {
    /// Builds the shading handle for this shape.
    ///
    /// Returns `None` if the geometry has no centroid.
    #[must_use]
    pub fn to_polygon_ref(&self) -> Option<PolygonRef> {
        Some(PolygonRef {
            area_id: self.area_id.clone(),
            area_name: self.area_name.clone(),
            centroid: self.geometry.centroid()?,
        })
    }
}

/// Parses every usable row of a geodata document.
///
/// Accepts a bare array of rows or an object with a `rows` array. Rows
/// with a missing id or unreadable geometry are skipped with a warning.
///
/// # Errors
///
/// * [`IngestError::InvalidInput`] if the document has no row array.
pub fn parse_rows(document: &Value) -> Result<Vec<AreaShape>, IngestError> {
    let rows = match document {
        Value::Array(rows) => rows,
        Value::Object(obj) => obj
            .get("rows")
            .and_then(Value::as_array)
            .ok_or_else(|| IngestError::invalid("geodata object has no 'rows' array"))?,
        _ => {
            return Err(IngestError::invalid(
                "geodata document must be an array or an object with 'rows'",
            ));
        }
    };

    Ok(rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let shape = parse_row(row);
            if shape.is_none() {
                log::warn!("Skipping geodata row {i}: missing id or unreadable geometry");
            }
            shape
        })
        .collect())
}

/// Parses a geodata document straight into shading handles.
///
/// # Errors
///
/// * [`IngestError::InvalidInput`] if the document has no row array.
pub fn build_polygons(document: &Value) -> Result<Vec<PolygonRef>, IngestError> {
    let polygons: Vec<PolygonRef> = parse_rows(document)?
        .iter()
        .filter_map(|shape| {
            let polygon = shape.to_polygon_ref();
            if polygon.is_none() {
                log::warn!("Skipping area {}: empty geometry", shape.area_id);
            }
            polygon
        })
        .collect();

    log::info!("Built {} area polygons", polygons.len());

    Ok(polygons)
}

fn parse_row(row: &Value) -> Option<AreaShape> {
    let (id, name, geometry) = match row {
        Value::Array(cols) => (cols.first()?, cols.get(1), cols.get(2)?),
        Value::Object(obj) => (obj.get("id")?, obj.get("name"), obj.get("geometry")?),
        _ => return None,
    };

    let area_id = area_id_from(id, "id").ok()?;
    if area_id.as_str().is_empty() {
        return None;
    }

    let area_name = name
        .and_then(Value::as_str)
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();

    Some(AreaShape {
        area_id,
        area_name,
        geometry: resolve_geometry(geometry)?,
    })
}

fn resolve_geometry(value: &Value) -> Option<AreaGeometry> {
    if let Some(parts) = value.get("geometries").and_then(Value::as_array) {
        let polygons: Vec<Polygon<f64>> = parts
            .iter()
            .filter_map(parse_geojson)
            .flat_map(|geometry| match geometry {
                AreaGeometry::SinglePart(p) => vec![p],
                AreaGeometry::MultiPart(mp) => mp.0,
            })
            .collect();
        if polygons.is_empty() {
            return None;
        }
        return Some(AreaGeometry::MultiPart(MultiPolygon(polygons)));
    }

    if let Some(inner) = value.get("geometry") {
        return parse_geojson(inner);
    }

    parse_geojson(value)
}

/// Parses a `GeoJSON` `Polygon`/`MultiPolygon`, keeping only each part's
/// exterior ring.
fn parse_geojson(value: &Value) -> Option<AreaGeometry> {
    let geometry = geojson::Geometry::from_json_value(value.clone()).ok()?;
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;

    match geo_geom {
        geo::Geometry::Polygon(p) => Some(AreaGeometry::SinglePart(exterior_only(p))),
        geo::Geometry::MultiPolygon(mp) => Some(AreaGeometry::MultiPart(MultiPolygon(
            mp.0.into_iter().map(exterior_only).collect(),
        ))),
        _ => None,
    }
}

fn exterior_only(polygon: Polygon<f64>) -> Polygon<f64> {
    let (exterior, _) = polygon.into_inner();
    Polygon::new(exterior, Vec::<LineString<f64>>::new())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[
                [x0, y0],
                [x0 + size, y0],
                [x0 + size, y0 + size],
                [x0, y0 + size],
                [x0, y0],
            ]],
        })
    }

    #[test]
    fn single_geometry_becomes_single_part() {
        let doc = json!({
            "rows": [["8", "NEAR NORTH SIDE", { "geometry": square(-87.7, 41.8, 0.2) }]],
        });
        let shapes = parse_rows(&doc).unwrap();

        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].area_name, "near north side");
        assert!(matches!(shapes[0].geometry, AreaGeometry::SinglePart(_)));

        let centroid = shapes[0].geometry.centroid().unwrap();
        assert!((centroid.lat - 41.9).abs() < 1e-9);
        assert!((centroid.lng - -87.6).abs() < 1e-9);
    }

    #[test]
    fn geometries_collection_becomes_multi_part() {
        let doc = json!([{
            "id": 12,
            "name": "Split Area",
            "geometry": { "geometries": [square(0.0, 0.0, 1.0), square(2.0, 0.0, 1.0)] },
        }]);
        let shapes = parse_rows(&doc).unwrap();

        assert_eq!(shapes[0].area_id.as_str(), "12");
        match &shapes[0].geometry {
            AreaGeometry::MultiPart(mp) => assert_eq!(mp.0.len(), 2),
            AreaGeometry::SinglePart(_) => panic!("expected multi-part geometry"),
        }

        let centroid = shapes[0].geometry.centroid().unwrap();
        assert!((centroid.lng - 1.5).abs() < 1e-9);
        assert!((centroid.lat - 0.5).abs() < 1e-9);
    }

    #[test]
    fn bare_polygon_drops_holes() {
        let mut polygon = square(0.0, 0.0, 4.0);
        polygon["coordinates"]
            .as_array_mut()
            .unwrap()
            .push(json!([[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 2.0], [1.0, 1.0]]));
        let doc = json!([["1", "holey", polygon]]);

        match &parse_rows(&doc).unwrap()[0].geometry {
            AreaGeometry::SinglePart(p) => assert!(p.interiors().is_empty()),
            AreaGeometry::MultiPart(_) => panic!("expected single-part geometry"),
        }
    }

    #[test]
    fn unusable_rows_are_skipped() {
        let doc = json!([
            ["", "no id", square(0.0, 0.0, 1.0)],
            ["2", "no geometry", { "type": "Point", "coordinates": [0.0, 0.0] }],
            ["3", "fine", square(0.0, 0.0, 1.0)],
        ]);
        let polygons = build_polygons(&doc).unwrap();

        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].area_id.as_str(), "3");
    }

    #[test]
    fn integral_float_id_matches_metrics_form() {
        let doc = json!([
            [8.0, "Near North", square(0.0, 0.0, 1.0)],
            [8.5, "bad", square(0.0, 0.0, 1.0)],
        ]);
        let polygons = build_polygons(&doc).unwrap();

        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].area_id, AreaId::from(8));
    }

    #[test]
    fn object_without_rows_is_rejected() {
        assert!(matches!(
            parse_rows(&json!({ "kind": "fusiontables#sqlresponse" })),
            Err(IngestError::InvalidInput { .. })
        ));
    }
}
