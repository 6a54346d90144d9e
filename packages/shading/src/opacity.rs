//! Bucketed opacity computation.
//!
//! Each polygon's access index is normalized against the min/max of an
//! evaluation set and snapped to one of the [`OpacityBucket`] levels.
//! Polygons without an index always get the fixed no-data shade.

use access_map_area_models::{
    AreaRecord, OpacityBucket, PolygonRef, PolygonShade, Shade, ShadingMode, Viewport,
};

use crate::ShadingError;
use crate::lookup::RecordIndex;

/// Width of one bucket on the normalized `[0, 1]` scale.
const BUCKET_WIDTH: f64 = 0.2;

/// Min/max of the defined access indices in an evaluation set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingRange {
    /// Smallest defined index.
    pub min: f64,
    /// Largest defined index.
    pub max: f64,
}

impl ShadingRange {
    /// Normalizes `index` into `[0, 1]` relative to this range.
    ///
    /// A degenerate range (`min == max`) normalizes everything to `0`.
    #[must_use]
    pub fn normalize(&self, index: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((index - self.min) / span).clamp(0.0, 1.0)
    }
}

/// Snaps a normalized value to its opacity bucket.
///
/// `t` is rounded to the nearest multiple of `0.2`; the ends map to the
/// pulled-in `0.05` and `0.95` levels. Values outside `[0, 1]` are clamped
/// and `NaN` is treated as `0`.
#[must_use]
pub fn bucket(t: f64) -> OpacityBucket {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let step = (t / BUCKET_WIDTH).round() as usize;

    OpacityBucket::ALL[step.min(OpacityBucket::ALL.len() - 1)]
}

/// Returns the polygons whose centroid lies strictly inside `viewport`,
/// preserving input order.
#[must_use]
pub fn filter_visible<'a>(polygons: &'a [PolygonRef], viewport: &Viewport) -> Vec<&'a PolygonRef> {
    polygons
        .iter()
        .filter(|polygon| viewport.contains_strictly(polygon.centroid))
        .collect()
}

/// Computes the min/max of the defined indices of `evaluation_set`.
///
/// Returns `None` when no polygon in the set has a defined index.
#[must_use]
pub fn index_range<'a>(
    evaluation_set: impl IntoIterator<Item = &'a PolygonRef>,
    records: &[AreaRecord],
) -> Option<ShadingRange> {
    range_of(evaluation_set, &RecordIndex::new(records))
}

fn range_of<'a>(
    evaluation_set: impl IntoIterator<Item = &'a PolygonRef>,
    index: &RecordIndex<'_>,
) -> Option<ShadingRange> {
    evaluation_set
        .into_iter()
        .filter_map(|polygon| index.index_for(&polygon.area_id))
        .fold(None, |range: Option<ShadingRange>, value| {
            Some(range.map_or(
                ShadingRange {
                    min: value,
                    max: value,
                },
                |r| ShadingRange {
                    min: r.min.min(value),
                    max: r.max.max(value),
                },
            ))
        })
}

/// Computes a shade for every polygon in `polygons`.
///
/// Under [`ShadingMode::Absolute`] the range spans every polygon. Under
/// [`ShadingMode::RelativeToVisible`] it spans only polygons inside
/// `viewport`, and polygons outside it come back as [`Shade::OutOfView`].
/// The result has one entry per input polygon, in input order.
///
/// # Errors
///
/// * [`ShadingError::InvalidInput`] if `polygons` or `records` is empty,
///   if a record's index is not finite, or if `mode` is
///   [`ShadingMode::RelativeToVisible`] and no viewport is given.
pub fn compute_bucketed_opacity(
    polygons: &[PolygonRef],
    records: &[AreaRecord],
    mode: ShadingMode,
    viewport: Option<&Viewport>,
) -> Result<Vec<PolygonShade>, ShadingError> {
    if polygons.is_empty() {
        return Err(ShadingError::invalid("polygon list is empty"));
    }
    validate_records(records)?;

    let in_evaluation_set: Vec<bool> = match mode {
        ShadingMode::Absolute => vec![true; polygons.len()],
        ShadingMode::RelativeToVisible => {
            let viewport = viewport.ok_or_else(|| {
                ShadingError::invalid("relative shading requires a viewport")
            })?;
            polygons
                .iter()
                .map(|polygon| viewport.contains_strictly(polygon.centroid))
                .collect()
        }
    };

    let index = RecordIndex::new(records);
    let evaluation_set = polygons
        .iter()
        .zip(&in_evaluation_set)
        .filter_map(|(polygon, &included)| included.then_some(polygon));
    let range = range_of(evaluation_set, &index);

    match range {
        Some(r) => log::debug!(
            "Shading {} polygons ({mode}) over index range [{}, {}]",
            polygons.len(),
            r.min,
            r.max
        ),
        None => log::debug!(
            "No defined index among {} polygons ({mode}); all shaded as no-data",
            polygons.len()
        ),
    }

    Ok(polygons
        .iter()
        .zip(in_evaluation_set)
        .map(|(polygon, included)| {
            let shade = match (range, index.index_for(&polygon.area_id)) {
                (None, _) | (_, None) => Shade::NoData,
                (Some(_), Some(_)) if !included => Shade::OutOfView,
                (Some(r), Some(value)) => Shade::Bucketed {
                    bucket: bucket(r.normalize(value)),
                },
            };
            PolygonShade {
                area_id: polygon.area_id.clone(),
                shade,
            }
        })
        .collect())
}

/// Rejects datasets the engine cannot shade meaningfully.
pub(crate) fn validate_records(records: &[AreaRecord]) -> Result<(), ShadingError> {
    if records.is_empty() {
        return Err(ShadingError::invalid("record collection is empty"));
    }

    if let Some(bad) = records
        .iter()
        .find(|record| record.access_index.is_some_and(|v| !v.is_finite()))
    {
        return Err(ShadingError::invalid(format!(
            "access index for area {} is not a finite number",
            bad.area_id
        )));
    }

    Ok(())
}
