//! # Dimension Inspector
//!
//! Opens one SubX field, classifies its axes by their IRI Data Library names and
//! resolves the requested pressure level to an index on the `P` axis.
//!
//! | Name | Role | Values read |
//! |------|------|-------------|
//! | `X` | longitude | yes |
//! | `Y` | latitude | yes |
//! | `L` | lead time | yes |
//! | `M` | ensemble member | no, only the count |
//! | `S` | start date | yes |
//! | `P` | pressure level (optional) | yes |
//!
//! Any other axis name fails the variable. A field has 5 axes without a pressure
//! level and 6 with one; any other count fails the variable as well.

use crate::backend::{DatasetSource, RemoteBackend};
use crate::error::{FetchError, FetchResult};
use crate::time::TimeAxes;
use log::{debug, warn};
use std::collections::HashSet;
use std::fmt;

/// Semantic role of a dataset axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisRole {
    Longitude,
    Latitude,
    Lead,
    Ensemble,
    StartDate,
    Level,
}

impl AxisRole {
    /// Axis order of every SubX field, outermost first, without the optional level.
    pub const SURFACE_ORDER: [AxisRole; 5] = [
        AxisRole::StartDate,
        AxisRole::Ensemble,
        AxisRole::Lead,
        AxisRole::Latitude,
        AxisRole::Longitude,
    ];

    /// Classifies an axis by exact name match.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "X" => Some(AxisRole::Longitude),
            "Y" => Some(AxisRole::Latitude),
            "L" => Some(AxisRole::Lead),
            "M" => Some(AxisRole::Ensemble),
            "S" => Some(AxisRole::StartDate),
            "P" => Some(AxisRole::Level),
            _ => None,
        }
    }

    /// The axis name this role is stored under.
    pub fn axis_name(&self) -> &'static str {
        match self {
            AxisRole::Longitude => "X",
            AxisRole::Latitude => "Y",
            AxisRole::Lead => "L",
            AxisRole::Ensemble => "M",
            AxisRole::StartDate => "S",
            AxisRole::Level => "P",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AxisRole::Longitude => "longitude",
            AxisRole::Latitude => "latitude",
            AxisRole::Lead => "lead time",
            AxisRole::Ensemble => "ensemble member",
            AxisRole::StartDate => "start date",
            AxisRole::Level => "pressure level",
        }
    }
}

impl fmt::Display for AxisRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.axis_name(), self.description())
    }
}

/// One classified axis of an opened dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisDescriptor {
    pub role: AxisRole,
    pub size: usize,
    /// Coordinate values; empty for the ensemble axis, whose values are never read.
    pub values: Vec<f64>,
    /// The `units` attribute of the coordinate variable, when present.
    pub units: Option<String>,
}

impl AxisDescriptor {
    pub fn name(&self) -> &'static str {
        self.role.axis_name()
    }
}

/// The pressure-level axis together with the resolved level index.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSelection {
    pub axis: AxisDescriptor,
    pub index: usize,
}

/// Classified axes of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetLayout {
    pub lon: AxisDescriptor,
    pub lat: AxisDescriptor,
    pub lead: AxisDescriptor,
    pub ensemble: AxisDescriptor,
    pub start: AxisDescriptor,
    pub level: Option<LevelSelection>,
    /// Encodings of `S` and `L`.
    pub time: TimeAxes,
}

impl DatasetLayout {
    /// Number of axes: 6 with a pressure level, 5 without.
    pub fn ndims(&self) -> usize {
        if self.level.is_some() { 6 } else { 5 }
    }

    pub fn has_level(&self) -> bool {
        self.level.is_some()
    }

    pub fn n_ensembles(&self) -> usize {
        self.ensemble.size
    }

    pub fn n_starts(&self) -> usize {
        self.start.size
    }

    /// Shape of one extracted slice: (lead, lat, lon).
    pub fn slice_shape(&self) -> (usize, usize, usize) {
        (self.lead.size, self.lat.size, self.lon.size)
    }

    /// Resolved level index, if the field has a pressure level.
    pub fn level_index(&self) -> Option<usize> {
        self.level.as_ref().map(|l| l.index)
    }
}

/// The request a dataset is opened for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub group: String,
    pub model: String,
    pub variable: String,
    pub plev: String,
}

impl RequestSpec {
    pub fn new(group: &str, model: &str, variable: &str, plev: &str) -> Self {
        RequestSpec {
            group: group.to_string(),
            model: model.to_string(),
            variable: variable.to_string(),
            plev: plev.to_string(),
        }
    }
}

/// An opened field and its classified axes.
///
/// The handle owns everything read while inspecting the field; dropping it
/// releases the axis values of that variable in one go.
pub struct DatasetHandle<S> {
    pub url: String,
    pub variable: String,
    pub source: S,
    pub layout: DatasetLayout,
    /// `units` attribute of the variable.
    pub units: String,
    /// `long_name` attribute of the variable.
    pub long_name: String,
}

impl<S: fmt::Debug> fmt::Debug for DatasetHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetHandle")
            .field("url", &self.url)
            .field("variable", &self.variable)
            .field("source", &self.source)
            .field("layout", &self.layout)
            .field("units", &self.units)
            .field("long_name", &self.long_name)
            .finish()
    }
}

/// Classifies every axis of `variable` exactly once.
///
/// Returns the roles in the order the axes were reported. Unknown names,
/// repeated names and axis counts other than 5 or 6 are errors.
pub fn classify_axes(variable: &str, axes: &[(String, usize)]) -> FetchResult<Vec<(AxisRole, usize)>> {
    let mut seen = HashSet::new();
    let mut roles = Vec::with_capacity(axes.len());

    for (name, size) in axes {
        let role = AxisRole::from_name(name).ok_or_else(|| FetchError::UnrecognizedAxis {
            variable: variable.to_string(),
            axis: name.clone(),
        })?;
        if !seen.insert(role) {
            return Err(FetchError::DuplicateAxis {
                variable: variable.to_string(),
                axis: name.clone(),
            });
        }
        roles.push((role, *size));
    }

    if roles.len() != 5 && roles.len() != 6 {
        return Err(FetchError::UnsupportedDimensionCount {
            variable: variable.to_string(),
            ndims: roles.len(),
        });
    }

    for role in AxisRole::SURFACE_ORDER {
        if !seen.contains(&role) {
            return Err(FetchError::MissingAxis {
                variable: variable.to_string(),
                axis: role.axis_name(),
                role: role.description(),
            });
        }
    }

    Ok(roles)
}

/// Finds the index of the level whose integer value equals `plev`.
///
/// Level values are truncated to integers before comparison, so `500.0` and
/// `500.25` both match `"500"`.
///
/// # Examples
///
/// ```rust
/// use subx2nc::inspect::resolve_level_index;
///
/// assert_eq!(resolve_level_index(&[850.0, 500.0, 200.0], "500").unwrap(), 1);
/// assert!(resolve_level_index(&[850.0, 500.0, 200.0], "700").is_err());
/// ```
pub fn resolve_level_index(levels: &[f64], plev: &str) -> FetchResult<usize> {
    let target: i64 = plev.trim().parse().map_err(|_| FetchError::InvalidLevel {
        plev: plev.to_string(),
    })?;

    levels
        .iter()
        .position(|v| v.is_finite() && v.trunc() as i64 == target)
        .ok_or_else(|| FetchError::LevelNotFound {
            plev: plev.to_string(),
            available: levels.to_vec(),
        })
}

/// Opens `url` and inspects the field named in `request`.
///
/// Everything the per-slice loop depends on is checked here, so a field that
/// cannot be written fails once, before any slice is read: the axes, the
/// level, the time encodings and the `units` and `long_name` attributes.
pub fn inspect<B: RemoteBackend>(
    backend: &B,
    url: &str,
    request: &RequestSpec,
) -> FetchResult<DatasetHandle<B::Source>> {
    let source = backend.open(url)?;
    let layout = inspect_source(&source, &request.variable, &request.plev)?;
    let units = required_attribute(&source, &request.variable, "units")?;
    let long_name = required_attribute(&source, &request.variable, "long_name")?;

    debug!(
        "{}: {} axes, {} ensemble members, {} start dates, level index {:?}",
        request.variable,
        layout.ndims(),
        layout.n_ensembles(),
        layout.n_starts(),
        layout.level_index()
    );

    Ok(DatasetHandle {
        url: url.to_string(),
        variable: request.variable.clone(),
        source,
        layout,
        units,
        long_name,
    })
}

fn required_attribute<S: DatasetSource>(source: &S, variable: &str, name: &str) -> FetchResult<String> {
    source
        .attribute(variable, name)?
        .ok_or_else(|| FetchError::missing_attribute(variable, name))
}

/// Classifies the axes of `variable` on an already opened source.
pub fn inspect_source<S: DatasetSource>(source: &S, variable: &str, plev: &str) -> FetchResult<DatasetLayout> {
    let axes = source.axes(variable)?;
    let roles = classify_axes(variable, &axes)?;

    let storage_order: Vec<AxisRole> = roles.iter().map(|(role, _)| *role).collect();
    if !is_canonical_order(&storage_order) {
        warn!(
            "{}: axes stored as {:?}, reads assume [P,] S, M, L, Y, X",
            variable,
            axes.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>()
        );
    }

    let size_of = |role: AxisRole| {
        roles
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, size)| *size)
            .unwrap_or(0)
    };

    let describe = |role: AxisRole| -> FetchResult<AxisDescriptor> {
        let name = role.axis_name();
        if role == AxisRole::Ensemble {
            return Ok(AxisDescriptor {
                role,
                size: size_of(role),
                values: Vec::new(),
                units: None,
            });
        }
        Ok(AxisDescriptor {
            role,
            size: size_of(role),
            values: source.axis_values(name)?,
            units: source.attribute(name, "units")?,
        })
    };

    let level = if roles.iter().any(|(r, _)| *r == AxisRole::Level) {
        let axis = describe(AxisRole::Level)?;
        let index = resolve_level_index(&axis.values, plev)?;
        Some(LevelSelection { axis, index })
    } else {
        None
    };

    let lead = describe(AxisRole::Lead)?;
    let start = describe(AxisRole::StartDate)?;
    let time = TimeAxes::resolve(&start, &lead)?;

    Ok(DatasetLayout {
        lon: describe(AxisRole::Longitude)?,
        lat: describe(AxisRole::Latitude)?,
        lead,
        ensemble: describe(AxisRole::Ensemble)?,
        start,
        level,
        time,
    })
}

fn is_canonical_order(order: &[AxisRole]) -> bool {
    match order {
        [AxisRole::Level, rest @ ..] => rest == AxisRole::SURFACE_ORDER,
        _ => order == AxisRole::SURFACE_ORDER,
    }
}
