#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Area, polygon, and shading types for the access map.
//!
//! These types describe geographic areas (census tracts and community
//! areas), the per-area metric rows that drive the choropleth, and the
//! shade computed for each polygon. They carry no shading logic of their
//! own; see `access_map_shading` for that.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Opacity assigned to polygons whose area has no metric.
pub const NO_DATA_OPACITY: f64 = 0.4;

/// Fill color for polygons with a defined metric.
pub const DATA_FILL_COLOR: &str = "#DB944D";

/// Fill color for polygons without a metric.
pub const NO_DATA_FILL_COLOR: &str = "#9E9E9E";

/// Opaque geographic area identifier.
///
/// Source data uses both strings (census tract GEOIDs) and integers
/// (community area numbers). Both normalize to the same textual form, so
/// `8` and `"8"` name the same area.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawAreaId", into = "String")]
pub struct AreaId(String);

impl AreaId {
    /// Creates an area id from its textual form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AreaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AreaId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AreaId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for AreaId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<AreaId> for String {
    fn from(value: AreaId) -> Self {
        value.0
    }
}

/// Wire form of an [`AreaId`].
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAreaId {
    Text(String),
    Integer(i64),
}

impl From<RawAreaId> for AreaId {
    fn from(raw: RawAreaId) -> Self {
        match raw {
            RawAreaId::Text(s) => Self(s),
            RawAreaId::Integer(n) => Self::from(n),
        }
    }
}

/// One row of metric data for a geographic area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaRecord {
    /// Area this row describes.
    pub area_id: AreaId,
    /// Metric used for shading. `None` means "no data".
    pub access_index: Option<f64>,
    /// Auxiliary numeric fields (e.g. counts at fixed radii), consumed only
    /// by presentation.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, f64>,
}

impl AreaRecord {
    /// Creates a record with no auxiliary fields.
    #[must_use]
    pub fn new(area_id: impl Into<AreaId>, access_index: Option<f64>) -> Self {
        Self {
            area_id: area_id.into(),
            access_index,
            extra: BTreeMap::new(),
        }
    }
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

impl LatLng {
    /// Creates a new point.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A renderable area shape as seen by the shading engine.
///
/// Only the area id and centroid matter for shading; the geometry itself
/// stays with the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonRef {
    /// Foreign key into the active [`AreaRecord`] collection.
    pub area_id: AreaId,
    /// Lower-cased display name.
    pub area_name: String,
    /// Point used for viewport visibility filtering.
    pub centroid: LatLng,
}

impl PolygonRef {
    /// Creates a polygon handle.
    #[must_use]
    pub fn new(area_id: impl Into<AreaId>, area_name: impl Into<String>, centroid: LatLng) -> Self {
        Self {
            area_id: area_id.into(),
            area_name: area_name.into(),
            centroid,
        }
    }
}

/// Axis-aligned map viewport.
///
/// Constructed only through [`Viewport::new`], which guarantees the
/// north-east corner is strictly north and east of the south-west corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    north_east: LatLng,
    south_west: LatLng,
}

impl Viewport {
    /// Creates a viewport from its corners.
    ///
    /// # Errors
    ///
    /// Returns an error if any coordinate is not finite, or if `north_east`
    /// is not strictly north and east of `south_west`.
    pub fn new(north_east: LatLng, south_west: LatLng) -> Result<Self, InvalidViewportError> {
        let finite = [
            north_east.lat,
            north_east.lng,
            south_west.lat,
            south_west.lng,
        ]
        .iter()
        .all(|v| v.is_finite());

        if !finite || north_east.lat <= south_west.lat || north_east.lng <= south_west.lng {
            return Err(InvalidViewportError {
                north_east,
                south_west,
            });
        }

        Ok(Self {
            north_east,
            south_west,
        })
    }

    /// Returns the north-east corner.
    #[must_use]
    pub const fn north_east(&self) -> LatLng {
        self.north_east
    }

    /// Returns the south-west corner.
    #[must_use]
    pub const fn south_west(&self) -> LatLng {
        self.south_west
    }

    /// Whether `point` lies strictly inside the rectangle. Points on an
    /// edge are outside.
    #[must_use]
    pub fn contains_strictly(&self, point: LatLng) -> bool {
        point.lat > self.south_west.lat
            && point.lat < self.north_east.lat
            && point.lng > self.south_west.lng
            && point.lng < self.north_east.lng
    }
}

/// Error returned when viewport corners do not form a valid rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidViewportError {
    /// The rejected north-east corner.
    pub north_east: LatLng,
    /// The rejected south-west corner.
    pub south_west: LatLng,
}

impl std::fmt::Display for InvalidViewportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid viewport: north-east ({}, {}) must be north and east of south-west ({}, {})",
            self.north_east.lat, self.north_east.lng, self.south_west.lat, self.south_west.lng
        )
    }
}

impl std::error::Error for InvalidViewportError {}

/// How the min/max normalization range is chosen.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ShadingMode {
    /// Range over every polygon of the active set.
    #[default]
    Absolute,
    /// Range over polygons whose centroid is inside the viewport.
    RelativeToVisible,
}

/// Geography kind with its own polygons and metrics.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DatasetFamily {
    /// Census tracts, keyed by `TRACT`.
    Census,
    /// Community areas, keyed by `COMMUNITY_AREA`.
    Community,
}

impl DatasetFamily {
    /// Every family, in display order.
    pub const ALL: &[Self] = &[Self::Census, Self::Community];
}

/// One of the discrete opacity levels used to encode the metric.
///
/// The extremes are pulled in from 0 and 1 so the lowest bucket is still
/// visible and the highest does not hide the base map.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OpacityBucket {
    /// 0.05
    Lowest,
    /// 0.2
    Low,
    /// 0.4
    Mid,
    /// 0.6
    High,
    /// 0.8
    Higher,
    /// 0.95
    Highest,
}

impl OpacityBucket {
    /// Every bucket, lowest first. Indexed by snapped step (`0..=5`).
    pub const ALL: &[Self] = &[
        Self::Lowest,
        Self::Low,
        Self::Mid,
        Self::High,
        Self::Higher,
        Self::Highest,
    ];

    /// Returns the fill opacity for this bucket.
    #[must_use]
    pub const fn opacity(self) -> f64 {
        match self {
            Self::Lowest => 0.05,
            Self::Low => 0.2,
            Self::Mid => 0.4,
            Self::High => 0.6,
            Self::Higher => 0.8,
            Self::Highest => 0.95,
        }
    }
}

/// Fill style marker handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Fill {
    /// Regular data fill.
    Data,
    /// Distinct fill for areas without a metric.
    NoData,
}

impl Fill {
    /// Returns the CSS hex color for this fill.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Data => DATA_FILL_COLOR,
            Self::NoData => NO_DATA_FILL_COLOR,
        }
    }
}

/// Shade computed for a single polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shade {
    /// Polygon is in the evaluation set and has a metric.
    Bucketed {
        /// The opacity bucket its normalized metric fell into.
        bucket: OpacityBucket,
    },
    /// Polygon's area has no metric.
    NoData,
    /// Polygon has a metric but lies outside the viewport in
    /// [`ShadingMode::RelativeToVisible`]. The caller decides how to draw
    /// it.
    OutOfView,
}

impl Shade {
    /// Returns the fill opacity, or `None` for [`Shade::OutOfView`].
    #[must_use]
    pub const fn opacity(self) -> Option<f64> {
        match self {
            Self::Bucketed { bucket } => Some(bucket.opacity()),
            Self::NoData => Some(NO_DATA_OPACITY),
            Self::OutOfView => None,
        }
    }

    /// Returns the fill marker for this shade.
    #[must_use]
    pub const fn fill(self) -> Fill {
        match self {
            Self::NoData => Fill::NoData,
            Self::Bucketed { .. } | Self::OutOfView => Fill::Data,
        }
    }
}

/// Shade assigned to one polygon, in the order polygons were supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonShade {
    /// Area id of the shaded polygon.
    pub area_id: AreaId,
    /// Computed shade.
    pub shade: Shade,
}
