//! # Remote Dataset Backend
//!
//! The pipeline talks to the data server through two small traits:
//!
//! - [`RemoteBackend`] opens a resource by URL
//! - [`DatasetSource`] is the opened resource: axis names and sizes, axis values,
//!   string attributes, and index-addressed reads of a named variable
//!
//! [`NetcdfBackend`] implements both on top of the `netcdf` crate, which reads
//! OPeNDAP (`.../dods`) URLs the same way it reads local files.

use crate::error::{FetchError, FetchResult};
use log::debug;
use netcdf::AttributeValue;
use std::ffi::CStr;
use std::ops::Range;

/// Whether the linked libnetcdf can open OPeNDAP URLs.
pub const HAS_DAP: bool = cfg!(netcdf_dap);

/// Version string of the linked libnetcdf, e.g. `4.9.2 of ...`.
pub fn library_version() -> String {
    // SAFETY: nc_inq_libvers returns a pointer to a static NUL-terminated string.
    unsafe { CStr::from_ptr(netcdf_sys::nc_inq_libvers()) }
        .to_string_lossy()
        .into_owned()
}

fn is_remote(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// One entry of an index-addressed read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadIndex {
    /// A single position along the axis; the axis is dropped from the result.
    At(usize),
    /// The whole axis.
    All,
}

/// An opened remote resource.
pub trait DatasetSource {
    /// Names and lengths of the axes of `variable`, in storage order.
    fn axes(&self, variable: &str) -> FetchResult<Vec<(String, usize)>>;

    /// Values of the coordinate variable named `axis`.
    fn axis_values(&self, axis: &str) -> FetchResult<Vec<f64>>;

    /// A string attribute of `variable`, `None` when it is absent.
    fn attribute(&self, variable: &str, name: &str) -> FetchResult<Option<String>>;

    /// Reads `variable` with one [`ReadIndex`] per axis, flattened in row-major order.
    fn read_slice(&self, variable: &str, indices: &[ReadIndex]) -> FetchResult<Vec<f32>>;
}

/// Opens remote resources by URL.
pub trait RemoteBackend {
    type Source: DatasetSource;

    fn open(&self, url: &str) -> FetchResult<Self::Source>;
}

/// Backend reading OPeNDAP resources through libnetcdf.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetcdfBackend;

/// A resource opened by [`NetcdfBackend`].
pub struct NetcdfSource {
    url: String,
    file: netcdf::File,
}

impl RemoteBackend for NetcdfBackend {
    type Source = NetcdfSource;

    fn open(&self, url: &str) -> FetchResult<NetcdfSource> {
        debug!("Opening remote dataset: {}", url);
        if is_remote(url) && !HAS_DAP {
            return Err(FetchError::remote(
                url,
                format!("libnetcdf {} was built without OPeNDAP (DAP) support", library_version()),
            ));
        }
        let file = netcdf::open(url).map_err(|e| FetchError::remote(url, e))?;
        Ok(NetcdfSource {
            url: url.to_string(),
            file,
        })
    }
}

impl NetcdfSource {
    fn variable(&self, name: &str) -> FetchResult<netcdf::Variable<'_>> {
        self.file
            .variable(name)
            .ok_or_else(|| FetchError::MissingVariable {
                url: self.url.clone(),
                variable: name.to_string(),
            })
    }
}

impl DatasetSource for NetcdfSource {
    fn axes(&self, variable: &str) -> FetchResult<Vec<(String, usize)>> {
        let var = self.variable(variable)?;
        Ok(var
            .dimensions()
            .iter()
            .map(|d| (d.name().to_string(), d.len()))
            .collect())
    }

    fn axis_values(&self, axis: &str) -> FetchResult<Vec<f64>> {
        let var = self.variable(axis)?;
        var.get_values::<f64, _>(..)
            .map_err(|e| FetchError::remote(&self.url, e))
    }

    fn attribute(&self, variable: &str, name: &str) -> FetchResult<Option<String>> {
        let var = self.variable(variable)?;
        let Some(attr) = var.attribute(name) else {
            return Ok(None);
        };
        let value = attr.value().map_err(|e| FetchError::remote(&self.url, e))?;
        Ok(Some(attribute_to_string(&value)))
    }

    fn read_slice(&self, variable: &str, indices: &[ReadIndex]) -> FetchResult<Vec<f32>> {
        let var = self.variable(variable)?;
        let lens: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        if lens.len() != indices.len() {
            return Err(FetchError::UnsupportedDimensionCount {
                variable: variable.to_string(),
                ndims: lens.len(),
            });
        }

        let r: Vec<Range<usize>> = indices
            .iter()
            .zip(&lens)
            .map(|(index, &len)| match *index {
                ReadIndex::At(i) => i..i + 1,
                ReadIndex::All => 0..len,
            })
            .collect();

        debug!("Reading {}{:?} from {}", variable, r, self.url);
        let values = match r.as_slice() {
            [a, b, c, d, e] => var.get_values::<f32, _>((
                a.clone(),
                b.clone(),
                c.clone(),
                d.clone(),
                e.clone(),
            )),
            [a, b, c, d, e, f] => var.get_values::<f32, _>((
                a.clone(),
                b.clone(),
                c.clone(),
                d.clone(),
                e.clone(),
                f.clone(),
            )),
            _ => {
                return Err(FetchError::UnsupportedDimensionCount {
                    variable: variable.to_string(),
                    ndims: r.len(),
                });
            }
        };
        values.map_err(|e| FetchError::remote(&self.url, e))
    }
}

fn attribute_to_string(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Str(s) => s.clone(),
        AttributeValue::Strs(items) => items.join(" "),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linked_libnetcdf_supports_dap() {
        assert!(HAS_DAP, "libnetcdf {} has no DAP support", library_version());
    }

    #[test]
    fn test_library_version() {
        let version = library_version();
        assert!(version.starts_with('4'), "unexpected libnetcdf version '{}'", version);
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("http://iridl.ldeo.columbia.edu/SOURCES/.Models/.SubX/.GMAO/.GEOS_V2p1/.hindcast/.ua/dods"));
        assert!(is_remote("HTTPS://example.org/dods"));
        assert!(!is_remote("/data/subx/ua.nc"));
    }
}
