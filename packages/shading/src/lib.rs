#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Choropleth shading for the access map.
//!
//! Maps each area polygon to an opacity bucket based on its access index,
//! either against the whole polygon set or against only the polygons in
//! the current viewport. Missing data is a normal state with its own
//! shade, never an error.
//!
//! The free functions are pure over their arguments. [`AreaShadingEngine`]
//! bundles the active dataset and mode for callers that re-shade on every
//! viewport change.

pub mod lookup;
pub mod opacity;

use access_map_area_models::{
    AreaId, AreaRecord, InvalidViewportError, PolygonRef, PolygonShade, ShadingMode, Viewport,
};
use thiserror::Error;

pub use lookup::{index_for, lookup_record};
pub use opacity::{ShadingRange, bucket, compute_bucketed_opacity, filter_visible, index_range};

/// Errors that can occur while shading.
#[derive(Debug, Error)]
pub enum ShadingError {
    /// Input the engine cannot shade (empty sets, bad viewport, bad index).
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of what went wrong.
        message: String,
    },
}

impl ShadingError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

impl From<InvalidViewportError> for ShadingError {
    fn from(e: InvalidViewportError) -> Self {
        Self::invalid(e.to_string())
    }
}

/// The active dataset and shading mode for one dataset family.
///
/// Datasets are replaced wholesale; a failed replacement leaves the
/// previous dataset in place so existing shading stays valid.
#[derive(Debug, Clone)]
pub struct AreaShadingEngine {
    records: Vec<AreaRecord>,
    mode: ShadingMode,
}

impl AreaShadingEngine {
    /// Creates an engine over `records`.
    ///
    /// # Errors
    ///
    /// * [`ShadingError::InvalidInput`] if `records` is empty or contains a
    ///   non-finite index.
    pub fn new(records: Vec<AreaRecord>, mode: ShadingMode) -> Result<Self, ShadingError> {
        opacity::validate_records(&records)?;
        log::debug!("Shading engine created with {} records ({mode})", records.len());
        Ok(Self { records, mode })
    }

    /// Swaps in a new dataset.
    ///
    /// # Errors
    ///
    /// * [`ShadingError::InvalidInput`] if `records` is empty or contains a
    ///   non-finite index. The current dataset is kept.
    pub fn replace_dataset(&mut self, records: Vec<AreaRecord>) -> Result<(), ShadingError> {
        opacity::validate_records(&records)?;
        log::info!(
            "Replacing dataset: {} records -> {} records",
            self.records.len(),
            records.len()
        );
        self.records = records;
        Ok(())
    }

    /// Sets the shading mode used by [`Self::shade`].
    pub fn set_mode(&mut self, mode: ShadingMode) {
        self.mode = mode;
    }

    /// Returns the current shading mode.
    #[must_use]
    pub const fn mode(&self) -> ShadingMode {
        self.mode
    }

    /// Returns the active dataset.
    #[must_use]
    pub fn records(&self) -> &[AreaRecord] {
        &self.records
    }

    /// Looks up the active record for `area_id`.
    #[must_use]
    pub fn lookup(&self, area_id: &AreaId) -> Option<&AreaRecord> {
        lookup_record(area_id, &self.records)
    }

    /// Returns the active access index for `area_id`.
    #[must_use]
    pub fn index_for(&self, area_id: &AreaId) -> Option<f64> {
        index_for(area_id, &self.records)
    }

    /// Shades `polygons` with the active dataset and mode.
    ///
    /// # Errors
    ///
    /// * [`ShadingError::InvalidInput`] if `polygons` is empty, or the mode
    ///   is relative and `viewport` is `None`.
    pub fn shade(
        &self,
        polygons: &[PolygonRef],
        viewport: Option<&Viewport>,
    ) -> Result<Vec<PolygonShade>, ShadingError> {
        compute_bucketed_opacity(polygons, &self.records, self.mode, viewport)
    }
}

#[cfg(test)]
mod tests {
    use access_map_area_models::{LatLng, OpacityBucket, Shade};

    use super::*;

    fn engine() -> AreaShadingEngine {
        AreaShadingEngine::new(
            vec![
                AreaRecord::new("A", Some(10.0)),
                AreaRecord::new("B", Some(20.0)),
            ],
            ShadingMode::Absolute,
        )
        .unwrap()
    }

    #[test]
    fn empty_dataset_is_rejected() {
        assert!(AreaShadingEngine::new(vec![], ShadingMode::Absolute).is_err());
    }

    #[test]
    fn failed_replace_keeps_previous_dataset() {
        let mut engine = engine();
        assert!(engine.replace_dataset(vec![]).is_err());
        assert_eq!(engine.records().len(), 2);
        assert_eq!(engine.index_for(&AreaId::from("B")), Some(20.0));
    }

    #[test]
    fn replace_dataset_swaps_wholesale() {
        let mut engine = engine();
        engine
            .replace_dataset(vec![AreaRecord::new("C", Some(1.0))])
            .unwrap();
        assert!(engine.lookup(&AreaId::from("A")).is_none());
        assert_eq!(engine.index_for(&AreaId::from("C")), Some(1.0));
    }

    #[test]
    fn shade_follows_mode() {
        let mut engine = engine();
        let polygons = vec![
            PolygonRef::new("A", "a", LatLng::new(1.0, 1.0)),
            PolygonRef::new("B", "b", LatLng::new(5.0, 5.0)),
        ];
        let viewport = Viewport::new(LatLng::new(10.0, 10.0), LatLng::new(4.0, 4.0)).unwrap();

        let absolute = engine.shade(&polygons, Some(&viewport)).unwrap();
        assert_eq!(
            absolute[1].shade,
            Shade::Bucketed {
                bucket: OpacityBucket::Highest
            }
        );

        engine.set_mode(ShadingMode::RelativeToVisible);
        let relative = engine.shade(&polygons, Some(&viewport)).unwrap();
        assert_eq!(relative[0].shade, Shade::OutOfView);
        assert_eq!(
            relative[1].shade,
            Shade::Bucketed {
                bucket: OpacityBucket::Lowest
            }
        );
    }

    #[test]
    fn viewport_error_converts_to_invalid_input() {
        let err: ShadingError = Viewport::new(LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0))
            .unwrap_err()
            .into();
        assert!(matches!(err, ShadingError::InvalidInput { .. }));
    }
}
