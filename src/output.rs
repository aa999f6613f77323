//! # NetCDF Output Module
//!
//! Writes one extracted slice to its own NetCDF file.
//!
//! ## Layout
//!
//! ```text
//! <out_path>/<var><plev>/daily/full/<group>-<model>/<var>_<plev>_<group>-<model>_<yyyymmdd>.e<member>.daily.nc
//! ```
//!
//! Each file holds:
//! - dimensions `time`, `lat`, `lon` (lead, latitude, longitude of the source)
//! - the data variable under its source name, with `units` and `long_name`
//! - coordinate variables `time` (units of the start-date axis), `lat` and `lon`
//! - global attributes `long_title`, `title`, `comments`, `CreationDate`,
//!   `CreatedBy`, `Source`, `Institution`
//!
//! An existing file at the destination is deleted first, so re-running a batch
//! replaces its artifacts.

use crate::error::{FetchError, FetchResult};
use crate::extract::Slice;
use crate::inspect::AxisDescriptor;
use crate::input::MetadataConfig;
use chrono::Local;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Global attributes shared by every artifact of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalMetadata {
    pub comments: String,
    pub source: String,
    pub institution: String,
    pub creation_date: String,
    pub created_by: String,
}

impl GlobalMetadata {
    /// Stamps the configured strings with the current time and user.
    pub fn for_run(config: &MetadataConfig) -> Self {
        GlobalMetadata {
            comments: config.comments.clone(),
            source: config.source.clone(),
            institution: config.institution.clone(),
            creation_date: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            created_by: current_user(),
        }
    }
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Identity of one output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactId {
    pub variable: String,
    pub plev: String,
    pub group: String,
    pub model: String,
    pub yyyymmdd: String,
    /// 1-based ensemble member.
    pub ensemble: usize,
}

impl ArtifactId {
    pub fn dir(&self, out_path: &Path) -> PathBuf {
        artifact_dir(out_path, &self.variable, &self.plev, &self.group, &self.model)
    }

    pub fn file_name(&self) -> String {
        artifact_file_name(
            &self.variable,
            &self.plev,
            &self.group,
            &self.model,
            &self.yyyymmdd,
            self.ensemble,
        )
    }

    pub fn path(&self, out_path: &Path) -> PathBuf {
        self.dir(out_path).join(self.file_name())
    }
}

/// Directory holding every artifact of one (variable, level, group, model).
pub fn artifact_dir(out_path: &Path, variable: &str, plev: &str, group: &str, model: &str) -> PathBuf {
    out_path
        .join(format!("{}{}", variable, plev))
        .join("daily")
        .join("full")
        .join(format!("{}-{}", group, model))
}

/// File name of one artifact; `ensemble` is the 1-based member number, unpadded.
///
/// # Examples
///
/// ```rust
/// use subx2nc::output::artifact_file_name;
///
/// assert_eq!(
///     artifact_file_name("ua", "850", "GMAO", "GEOS_V2p1", "20170615", 1),
///     "ua_850_GMAO-GEOS_V2p1_20170615.e1.daily.nc"
/// );
/// ```
pub fn artifact_file_name(
    variable: &str,
    plev: &str,
    group: &str,
    model: &str,
    yyyymmdd: &str,
    ensemble: usize,
) -> String {
    format!(
        "{}_{}_{}-{}_{}.e{}.daily.nc",
        variable, plev, group, model, yyyymmdd, ensemble
    )
}

/// Coordinates written next to the data variable.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactCoordinates<'a> {
    /// Valid times, one per lead, in the units of the start-date axis.
    pub time: &'a [f64],
    /// `units` of the start-date axis.
    pub time_units: &'a str,
    pub lat: &'a AxisDescriptor,
    pub lon: &'a AxisDescriptor,
}

/// Writes one slice to `<out_path>/.../<file name>` and returns the file path.
///
/// # Errors
///
/// This function will return an error if:
/// - the output directory cannot be created
/// - a stale file cannot be removed
/// - the NetCDF file, a variable or an attribute cannot be written
/// - the coordinate lengths do not match the slice shape
pub fn write_artifact(
    out_path: &Path,
    id: &ArtifactId,
    slice: &Slice,
    coords: &ArtifactCoordinates<'_>,
    meta: &GlobalMetadata,
    source_url: &str,
) -> FetchResult<PathBuf> {
    let dir = id.dir(out_path);
    fs::create_dir_all(&dir).map_err(|e| FetchError::output(&dir, e))?;

    let path = dir.join(id.file_name());
    if path.exists() {
        debug!("Removing stale artifact: {}", path.display());
        fs::remove_file(&path).map_err(|e| FetchError::output(&path, e))?;
    }

    let (nlead, nlat, nlon) = slice.data.dim();
    if coords.time.len() != nlead || coords.lat.values.len() != nlat || coords.lon.values.len() != nlon {
        return Err(FetchError::ShapeMismatch {
            variable: id.variable.clone(),
            expected: nlead * nlat * nlon,
            got: coords.time.len() * coords.lat.values.len() * coords.lon.values.len(),
        });
    }

    write_netcdf(&path, id, slice, coords, meta, source_url).map_err(|e| FetchError::output(&path, e))?;
    debug!("Wrote artifact: {}", path.display());
    Ok(path)
}

fn write_netcdf(
    path: &Path,
    id: &ArtifactId,
    slice: &Slice,
    coords: &ArtifactCoordinates<'_>,
    meta: &GlobalMetadata,
    source_url: &str,
) -> Result<(), netcdf::Error> {
    let (nlead, nlat, nlon) = slice.data.dim();
    let mut file = netcdf::create(path)?;

    file.add_attribute("long_title", slice.long_name.as_str())?;
    file.add_attribute("title", slice.long_name.as_str())?;
    file.add_attribute("comments", meta.comments.as_str())?;
    file.add_attribute("CreationDate", meta.creation_date.as_str())?;
    file.add_attribute("CreatedBy", meta.created_by.as_str())?;
    file.add_attribute("Source", meta.source.as_str())?;
    file.add_attribute("Institution", format!("{}: {}", meta.institution, source_url))?;

    file.add_dimension("time", nlead)?;
    file.add_dimension("lat", nlat)?;
    file.add_dimension("lon", nlon)?;

    {
        let mut time_var = file.add_variable::<f64>("time", &["time"])?;
        time_var.put_attribute("units", coords.time_units)?;
        time_var.put_values(coords.time, ..)?;
    }

    for (name, axis) in [("lat", coords.lat), ("lon", coords.lon)] {
        let mut var = file.add_variable::<f64>(name, &[name])?;
        if let Some(units) = &axis.units {
            var.put_attribute("units", units.as_str())?;
        }
        var.put_values(&axis.values, ..)?;
    }

    let values: Vec<f32> = slice.data.iter().copied().collect();
    let mut var = file.add_variable::<f32>(&id.variable, &["time", "lat", "lon"])?;
    var.put_attribute("units", slice.units.as_str())?;
    var.put_attribute("long_name", slice.long_name.as_str())?;
    var.put_values(&values, ..)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(
            artifact_file_name("ua", "850", "GMAO", "GEOS_V2p1", "20170615", 1),
            "ua_850_GMAO-GEOS_V2p1_20170615.e1.daily.nc"
        );
        // No zero padding beyond the digits themselves.
        assert_eq!(
            artifact_file_name("tas", "2m", "NCEP", "CFSv2", "19990107", 12),
            "tas_2m_NCEP-CFSv2_19990107.e12.daily.nc"
        );
    }

    #[test]
    fn test_artifact_dir() {
        let dir = artifact_dir(Path::new("/data/subx"), "zg", "500", "RSMAS", "CCSM4");
        assert_eq!(dir, Path::new("/data/subx/zg500/daily/full/RSMAS-CCSM4"));
    }

    #[test]
    fn test_artifact_id_path() {
        let id = ArtifactId {
            variable: "ua".to_string(),
            plev: "850".to_string(),
            group: "GMAO".to_string(),
            model: "GEOS_V2p1".to_string(),
            yyyymmdd: "20170615".to_string(),
            ensemble: 3,
        };
        assert_eq!(
            id.path(Path::new("out")),
            Path::new("out/ua850/daily/full/GMAO-GEOS_V2p1/ua_850_GMAO-GEOS_V2p1_20170615.e3.daily.nc")
        );
    }
}
