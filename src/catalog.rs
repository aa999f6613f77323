//! # Catalog Resolver
//!
//! Builds the OPeNDAP address of one SubX field on the IRI Data Library. The
//! catalog is organised as `<base>.<group>/.<model>/.<forecast type>/.<variable>/dods`;
//! nothing here checks that the resource exists, an unknown address only fails
//! when the dataset is opened.

/// IRI Data Library root of the SubX catalog.
pub const DEFAULT_BASE_URL: &str = "http://iridl.ldeo.columbia.edu/SOURCES/.Models/.SubX/";

/// Forecast type used when none is configured.
pub const DEFAULT_FORECAST_TYPE: &str = "hindcast";

/// Returns the OPeNDAP URL for a (group, model, variable) triple.
///
/// # Examples
///
/// ```rust
/// use subx2nc::catalog::{resolve_url, DEFAULT_BASE_URL};
///
/// let url = resolve_url(DEFAULT_BASE_URL, "hindcast", "GMAO", "GEOS_V2p1", "ua");
/// assert_eq!(
///     url,
///     "http://iridl.ldeo.columbia.edu/SOURCES/.Models/.SubX/.GMAO/.GEOS_V2p1/.hindcast/.ua/dods"
/// );
/// ```
pub fn resolve_url(
    base_url: &str,
    forecast_type: &str,
    group: &str,
    model: &str,
    variable: &str,
) -> String {
    format!(
        "{}.{}/.{}/.{}/.{}/dods",
        base_url, group, model, forecast_type, variable
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_hindcast_url() {
        let url = resolve_url(
            "http://iridl.ldeo.columbia.edu/SOURCES/.Models/.SubX/",
            DEFAULT_FORECAST_TYPE,
            "RSMAS",
            "CCSM4",
            "zg",
        );
        assert_eq!(
            url,
            "http://iridl.ldeo.columbia.edu/SOURCES/.Models/.SubX/.RSMAS/.CCSM4/.hindcast/.zg/dods"
        );
    }

    #[test]
    fn test_resolve_is_plain_concatenation() {
        // No separator is inserted or trimmed around the base.
        let url = resolve_url("http://host/SubX", "forecast", "NCEP", "CFSv2", "tas");
        assert_eq!(url, "http://host/SubX.NCEP/.CFSv2/.forecast/.tas/dods");
    }
}
