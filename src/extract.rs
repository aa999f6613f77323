//! # Slice Extraction
//!
//! Reads one (ensemble member, start date) slice of an inspected field as a
//! `lead × lat × lon` array.
//!
//! SubX fields are stored as `[P,] S, M, L, Y, X`. A read therefore fixes the
//! level (when there is one), the start date and the member, in that order, and
//! takes every lead, latitude and longitude. Swapping any two fixed indices reads
//! the wrong data without any error from the server.
//!
//! ## Key Components
//!
//! - [`read_indices`]: the index tuple for one slice
//! - [`extract_slice`]: performs the read and attaches the `units` and
//!   `long_name` found when the field was inspected

use crate::backend::{DatasetSource, ReadIndex};
use crate::error::{FetchError, FetchResult};
use crate::inspect::{DatasetHandle, DatasetLayout};
use log::debug;
use ndarray::Array3;

/// One extracted slice and the metadata copied from its source variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    /// Values indexed as `[lead, lat, lon]`.
    pub data: Array3<f32>,
    pub units: String,
    pub long_name: String,
}

/// Builds the read index tuple for one slice.
///
/// With a pressure level the tuple is `(level, start, ensemble, :, :, :)`,
/// without one it is `(start, ensemble, :, :, :)`.
///
/// # Examples
///
/// ```rust,no_run
/// # use subx2nc::inspect::DatasetLayout;
/// use subx2nc::backend::ReadIndex;
/// use subx2nc::extract::read_indices;
///
/// # fn demo(layout: &DatasetLayout) -> Result<(), subx2nc::error::FetchError> {
/// let indices = read_indices(layout, 3, 0)?;
/// assert_eq!(indices[indices.len() - 1], ReadIndex::All);
/// # Ok(())
/// # }
/// ```
pub fn read_indices(layout: &DatasetLayout, start: usize, ensemble: usize) -> FetchResult<Vec<ReadIndex>> {
    if start >= layout.n_starts() {
        return Err(FetchError::IndexOutOfRange {
            axis: layout.start.name(),
            index: start,
            size: layout.n_starts(),
        });
    }
    if ensemble >= layout.n_ensembles() {
        return Err(FetchError::IndexOutOfRange {
            axis: layout.ensemble.name(),
            index: ensemble,
            size: layout.n_ensembles(),
        });
    }

    let mut indices = Vec::with_capacity(layout.ndims());
    if let Some(level) = &layout.level {
        indices.push(ReadIndex::At(level.index));
    }
    indices.push(ReadIndex::At(start));
    indices.push(ReadIndex::At(ensemble));
    indices.extend([ReadIndex::All, ReadIndex::All, ReadIndex::All]);
    Ok(indices)
}

/// Reads the slice for (`start`, `ensemble`) from an inspected field.
///
/// # Errors
///
/// This function will return an error if:
/// - `start` or `ensemble` is outside its axis
/// - the remote read fails
/// - the read returns a different number of values than `lead × lat × lon`
pub fn extract_slice<S: DatasetSource>(
    handle: &DatasetHandle<S>,
    start: usize,
    ensemble: usize,
) -> FetchResult<Slice> {
    let layout = &handle.layout;
    let indices = read_indices(layout, start, ensemble)?;
    let values = handle.source.read_slice(&handle.variable, &indices)?;

    let (nlead, nlat, nlon) = layout.slice_shape();
    let got = values.len();
    let data = Array3::from_shape_vec((nlead, nlat, nlon), values).map_err(|_| FetchError::ShapeMismatch {
        variable: handle.variable.clone(),
        expected: nlead * nlat * nlon,
        got,
    })?;

    debug!(
        "Extracted {} slice S={} M={}: shape {:?}, units '{}'",
        handle.variable,
        start,
        ensemble,
        data.shape(),
        handle.units
    );

    Ok(Slice {
        data,
        units: handle.units.clone(),
        long_name: handle.long_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::{AxisDescriptor, AxisRole, LevelSelection};
    use crate::time::{TimeAxes, TimeEncoding, TimeUnit};

    fn axis(role: AxisRole, size: usize) -> AxisDescriptor {
        AxisDescriptor {
            role,
            size,
            values: (0..size).map(|i| i as f64).collect(),
            units: None,
        }
    }

    fn layout(level: Option<usize>) -> DatasetLayout {
        DatasetLayout {
            lon: axis(AxisRole::Longitude, 4),
            lat: axis(AxisRole::Latitude, 3),
            lead: axis(AxisRole::Lead, 2),
            ensemble: axis(AxisRole::Ensemble, 4),
            start: axis(AxisRole::StartDate, 5),
            level: level.map(|index| LevelSelection {
                axis: axis(AxisRole::Level, 3),
                index,
            }),
            time: TimeAxes {
                start_units: "days since 1960-01-01".to_string(),
                start: TimeEncoding::parse("days since 1960-01-01").unwrap(),
                lead: TimeUnit::Days,
            },
        }
    }

    #[test]
    fn test_read_indices_with_level() {
        let indices = read_indices(&layout(Some(1)), 2, 3).unwrap();
        assert_eq!(
            indices,
            vec![
                ReadIndex::At(1),
                ReadIndex::At(2),
                ReadIndex::At(3),
                ReadIndex::All,
                ReadIndex::All,
                ReadIndex::All,
            ]
        );
    }

    #[test]
    fn test_read_indices_without_level() {
        let indices = read_indices(&layout(None), 4, 0).unwrap();
        assert_eq!(
            indices,
            vec![
                ReadIndex::At(4),
                ReadIndex::At(0),
                ReadIndex::All,
                ReadIndex::All,
                ReadIndex::All,
            ]
        );
    }

    #[test]
    fn test_read_indices_out_of_range() {
        assert!(matches!(
            read_indices(&layout(None), 5, 0),
            Err(FetchError::IndexOutOfRange { axis: "S", index: 5, size: 5 })
        ));
        assert!(matches!(
            read_indices(&layout(None), 0, 4),
            Err(FetchError::IndexOutOfRange { axis: "M", .. })
        ));
    }
}
