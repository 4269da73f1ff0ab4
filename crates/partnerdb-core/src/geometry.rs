//! Typed geometry for partner addresses and coverage areas.
//!
//! Stored geometry is opaque JSON. Everything here turns that JSON into either
//! a valid typed value or a [`GeometryError`] describing why it was rejected.
//! Accepted shapes:
//!
//! - address: GeoJSON `Point` object or a bare `[lng, lat]` array
//! - coverage area: GeoJSON `Polygon` / `MultiPolygon` object, or the bare
//!   nested arrays of either
//!
//! A JSON string holding any of these is parsed once before decoding.

use std::borrow::Cow;

use geo::{Coord, Intersects, LineString, MultiPolygon, Polygon};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

const MIN_RING_POSITIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("coordinate is not a finite number")]
    NonFinite,

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("embedded geometry is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("expected {expected}, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },

    #[error("unsupported geometry type '{0}'")]
    UnsupportedType(String),

    #[error("position must hold exactly two numbers, found {0} items")]
    PositionArity(usize),

    #[error("position component is not a number")]
    NonNumeric,

    #[error(transparent)]
    Coordinate(#[from] CoordinateError),

    #[error("polygon has no rings")]
    EmptyPolygon,

    #[error("coverage area has no polygons")]
    NoPolygons,

    #[error("ring has {0} distinct positions; at least 3 are required")]
    DegenerateRing(usize),
}

/// A validated WGS-84 position in degrees.
///
/// Only constructible through [`Coordinate::new`], so every value in hand is
/// finite and inside the longitude/latitude ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    lng: f64,
    lat: f64,
}

impl Coordinate {
    /// # Errors
    ///
    /// Returns [`CoordinateError`] for non-finite or out-of-range components.
    pub fn new(lng: f64, lat: f64) -> Result<Self, CoordinateError> {
        if !lng.is_finite() || !lat.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::LongitudeOutOfRange(lng));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        Ok(Self { lng, lat })
    }

    #[must_use]
    pub fn lng(&self) -> f64 {
        self.lng
    }

    #[must_use]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    fn as_coord(self) -> Coord<f64> {
        Coord {
            x: self.lng,
            y: self.lat,
        }
    }
}

/// A partner's service region: the union of one or more polygons, each with
/// optional holes.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageArea(MultiPolygon<f64>);

impl CoverageArea {
    /// Whether `point` falls inside the area.
    ///
    /// Boundaries are inclusive: a point on an exterior edge, a vertex, or the
    /// edge of a hole counts as covered. A point strictly inside a hole does not.
    #[must_use]
    pub fn covers(&self, point: Coordinate) -> bool {
        let coord = point.as_coord();
        self.0.iter().any(|polygon| polygon.intersects(&coord))
    }

    #[must_use]
    pub fn polygon_count(&self) -> usize {
        self.0 .0.len()
    }
}

/// Decode a stored address into a [`Coordinate`].
///
/// # Errors
///
/// Returns [`GeometryError`] when the value is not a point with exactly two
/// finite, in-range numbers.
pub fn decode_address(value: &Value) -> Result<Coordinate, GeometryError> {
    let value = unwrap_embedded(value)?;
    match &*value {
        Value::Object(map) => {
            if let Some(kind) = map.get("type") {
                match kind.as_str() {
                    Some("Point") => {}
                    Some(other) => return Err(GeometryError::UnsupportedType(other.to_string())),
                    None => {
                        return Err(GeometryError::UnexpectedShape {
                            expected: "string geometry type",
                            found: json_kind(kind),
                        })
                    }
                }
            }
            let coordinates = map.get("coordinates").ok_or(GeometryError::UnexpectedShape {
                expected: "object with coordinates",
                found: "object without coordinates",
            })?;
            decode_position(coordinates)
        }
        Value::Array(_) => decode_position(&*value),
        other => Err(GeometryError::UnexpectedShape {
            expected: "Point object or [lng, lat] array",
            found: json_kind(other),
        }),
    }
}

/// Decode a stored coverage area into a [`CoverageArea`].
///
/// # Errors
///
/// Returns [`GeometryError`] when the value is not a well-formed polygon or
/// multi-polygon.
pub fn decode_coverage_area(value: &Value) -> Result<CoverageArea, GeometryError> {
    let value = unwrap_embedded(value)?;
    let polygons = match &*value {
        Value::Object(map) => {
            let coordinates = map.get("coordinates").ok_or(GeometryError::UnexpectedShape {
                expected: "object with coordinates",
                found: "object without coordinates",
            })?;
            match map.get("type").map(Value::as_str) {
                Some(Some("Polygon")) => vec![decode_polygon(coordinates)?],
                Some(Some("MultiPolygon")) => decode_multi_polygon(coordinates)?,
                Some(Some(other)) => {
                    return Err(GeometryError::UnsupportedType(other.to_string()))
                }
                Some(None) => {
                    return Err(GeometryError::UnexpectedShape {
                        expected: "string geometry type",
                        found: "non-string type",
                    })
                }
                None => decode_by_depth(coordinates)?,
            }
        }
        Value::Array(_) => decode_by_depth(&*value)?,
        other => {
            return Err(GeometryError::UnexpectedShape {
                expected: "Polygon or MultiPolygon",
                found: json_kind(other),
            })
        }
    };

    Ok(CoverageArea(MultiPolygon::new(polygons)))
}

/// Parse a JSON-encoded string once; other values pass through untouched.
fn unwrap_embedded(value: &Value) -> Result<Cow<'_, Value>, GeometryError> {
    match value {
        Value::String(raw) => {
            let parsed: Value = serde_json::from_str(raw)
                .map_err(|e| GeometryError::InvalidJson(e.to_string()))?;
            if parsed.is_string() {
                return Err(GeometryError::UnexpectedShape {
                    expected: "geometry",
                    found: "doubly encoded string",
                });
            }
            Ok(Cow::Owned(parsed))
        }
        other => Ok(Cow::Borrowed(other)),
    }
}

/// Bare arrays carry no type tag: three levels is a polygon, four a multi-polygon.
fn decode_by_depth(value: &Value) -> Result<Vec<Polygon<f64>>, GeometryError> {
    match array_depth(value) {
        3 => Ok(vec![decode_polygon(value)?]),
        4 => decode_multi_polygon(value),
        0 => Err(GeometryError::UnexpectedShape {
            expected: "coordinate array",
            found: json_kind(value),
        }),
        _ => Err(GeometryError::UnexpectedShape {
            expected: "polygon or multi-polygon nesting",
            found: "array of unexpected depth",
        }),
    }
}

fn array_depth(value: &Value) -> usize {
    let mut depth = 0;
    let mut current = value;
    while let Value::Array(items) = current {
        depth += 1;
        match items.first() {
            Some(first) => current = first,
            None => break,
        }
    }
    depth
}

fn decode_multi_polygon(value: &Value) -> Result<Vec<Polygon<f64>>, GeometryError> {
    let polygons = as_array(value, "array of polygons")?;
    if polygons.is_empty() {
        return Err(GeometryError::NoPolygons);
    }
    polygons.iter().map(decode_polygon).collect()
}

fn decode_polygon(value: &Value) -> Result<Polygon<f64>, GeometryError> {
    let rings = as_array(value, "array of rings")?;
    let (exterior, holes) = rings.split_first().ok_or(GeometryError::EmptyPolygon)?;
    let exterior = decode_ring(exterior)?;
    let holes = holes
        .iter()
        .map(decode_ring)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, holes))
}

fn decode_ring(value: &Value) -> Result<LineString<f64>, GeometryError> {
    let positions = as_array(value, "array of positions")?;
    let mut coords = positions
        .iter()
        .map(|p| decode_position(p).map(Coordinate::as_coord))
        .collect::<Result<Vec<_>, _>>()?;

    // Repeated consecutive positions add no area. The closing position is
    // implicit; drop it if the input repeats it.
    coords.dedup();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    if coords.len() < MIN_RING_POSITIONS {
        return Err(GeometryError::DegenerateRing(coords.len()));
    }
    Ok(LineString::new(coords))
}

fn decode_position(value: &Value) -> Result<Coordinate, GeometryError> {
    let items = as_array(value, "[lng, lat] array")?;
    let [lng, lat] = items.as_slice() else {
        return Err(GeometryError::PositionArity(items.len()));
    };
    let lng = lng.as_f64().ok_or(GeometryError::NonNumeric)?;
    let lat = lat.as_f64().ok_or(GeometryError::NonNumeric)?;
    Ok(Coordinate::new(lng, lat)?)
}

fn as_array<'a>(value: &'a Value, expected: &'static str) -> Result<&'a Vec<Value>, GeometryError> {
    value.as_array().ok_or(GeometryError::UnexpectedShape {
        expected,
        found: json_kind(value),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "geometry_test.rs"]
mod tests;
