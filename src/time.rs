//! # Start Date Decoding
//!
//! SubX start dates are stored as numbers in CF-style units such as
//! `days since 1960-01-01`. This module decodes them into calendar dates
//! (proleptic Gregorian, UTC) for output file names, and builds the valid-time
//! coordinate written to each artifact.

use crate::error::{FetchError, FetchResult};
use crate::inspect::AxisDescriptor;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

/// Time step units understood in `units` attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Parses a unit word (`days`, `hour`, `s`, ...).
    pub fn parse(word: &str) -> Option<Self> {
        match word.trim().to_lowercase().as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => Some(TimeUnit::Seconds),
            "minutes" | "minute" | "mins" | "min" => Some(TimeUnit::Minutes),
            "hours" | "hour" | "hrs" | "hr" | "h" => Some(TimeUnit::Hours),
            "days" | "day" | "d" => Some(TimeUnit::Days),
            _ => None,
        }
    }

    pub fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3_600.0,
            TimeUnit::Days => 86_400.0,
        }
    }
}

/// A parsed `<unit> since <reference>` encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeEncoding {
    pub unit: TimeUnit,
    pub reference: NaiveDateTime,
}

impl TimeEncoding {
    /// Parses a units string such as `days since 1960-01-01` or
    /// `hours since 1999-01-07T00:00:00Z`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use subx2nc::time::{TimeEncoding, TimeUnit};
    ///
    /// let enc = TimeEncoding::parse("days since 1960-01-01").unwrap();
    /// assert_eq!(enc.unit, TimeUnit::Days);
    /// assert_eq!(enc.decode(20985.0).unwrap().format("%Y%m%d").to_string(), "20170615");
    /// ```
    pub fn parse(units: &str) -> FetchResult<Self> {
        let lower = units.to_lowercase();
        let (unit_word, reference) = lower
            .split_once(" since ")
            .ok_or_else(|| FetchError::time_decode(units, "expected '<unit> since <date>'"))?;

        let unit = TimeUnit::parse(unit_word)
            .ok_or_else(|| FetchError::time_decode(units, format!("unsupported unit '{}'", unit_word.trim())))?;
        let reference = parse_reference(reference)
            .ok_or_else(|| FetchError::time_decode(units, format!("bad reference date '{}'", reference.trim())))?;

        Ok(TimeEncoding { unit, reference })
    }

    /// Converts an encoded value into a date and time.
    pub fn decode(&self, value: f64) -> FetchResult<NaiveDateTime> {
        let out_of_range = || FetchError::TimeDecode {
            units: format!("{:?} since {}", self.unit, self.reference),
            reason: format!("value {} is out of range", value),
        };
        if !value.is_finite() {
            return Err(out_of_range());
        }
        let millis = (value * self.unit.seconds() * 1_000.0).round();
        if millis.abs() > i64::MAX as f64 {
            return Err(out_of_range());
        }
        let delta = TimeDelta::try_milliseconds(millis as i64).ok_or_else(out_of_range)?;
        self.reference.checked_add_signed(delta).ok_or_else(out_of_range)
    }
}

fn parse_reference(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    let text = text
        .strip_suffix(" utc")
        .or_else(|| text.strip_suffix('z'))
        .or_else(|| text.strip_suffix("+00:00"))
        .unwrap_or(text)
        .trim();
    let normalized = text.replacen('t', " ", 1);
    let mut parts = normalized.split_whitespace();

    let date = NaiveDate::parse_from_str(parts.next()?, "%Y-%m-%d").ok()?;
    let time = match parts.next() {
        None => NaiveTime::MIN,
        Some(t) => ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(t, fmt).ok())?,
    };
    if parts.next().is_some() {
        return None;
    }
    Some(date.and_time(time))
}

/// How the time axes of one field are encoded, resolved once when the field is
/// inspected.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxes {
    /// `units` of the `S` axis, written verbatim on the output `time` coordinate.
    pub start_units: String,
    pub start: TimeEncoding,
    /// Unit of the `L` values; `days` when the axis carries no units.
    pub lead: TimeUnit,
}

impl TimeAxes {
    /// Reads the encodings of the `S` and `L` axes.
    ///
    /// # Errors
    ///
    /// Fails when `S` has no `units`, or when either axis uses units that cannot
    /// be decoded.
    pub fn resolve(start: &AxisDescriptor, lead: &AxisDescriptor) -> FetchResult<Self> {
        let start_units = start
            .units
            .clone()
            .ok_or_else(|| FetchError::missing_attribute(start.name(), "units"))?;
        let encoding = TimeEncoding::parse(&start_units)?;
        let lead = match lead.units.as_deref() {
            None => TimeUnit::Days,
            Some(units) => TimeUnit::parse(units)
                .or_else(|| TimeEncoding::parse(units).ok().map(|e| e.unit))
                .ok_or_else(|| FetchError::time_decode(units, "unsupported lead unit"))?,
        };

        Ok(TimeAxes {
            start_units,
            start: encoding,
            lead,
        })
    }

    /// Decodes start date `index` of the `S` axis.
    pub fn start_date(&self, start: &AxisDescriptor, index: usize) -> FetchResult<NaiveDateTime> {
        self.start.decode(start_value(start, index)?)
    }

    /// Valid times of one forecast, in the units of the `S` axis.
    ///
    /// Entry `k` is start date `index` plus lead `k`, that is the valid time of
    /// lead `k` rather than the bare start date repeated once per lead.
    pub fn valid_times(&self, start: &AxisDescriptor, lead: &AxisDescriptor, index: usize) -> FetchResult<Vec<f64>> {
        let origin = start_value(start, index)?;
        let scale = self.lead.seconds() / self.start.unit.seconds();
        Ok(lead.values.iter().map(|l| origin + l * scale).collect())
    }
}

fn start_value(start: &AxisDescriptor, index: usize) -> FetchResult<f64> {
    start.values.get(index).copied().ok_or(FetchError::IndexOutOfRange {
        axis: start.name(),
        index,
        size: start.values.len(),
    })
}

/// Formats a date as `yyyymmdd` for output file names.
pub fn yyyymmdd(date: &NaiveDateTime) -> String {
    date.format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::AxisRole;

    fn axis(role: AxisRole, values: Vec<f64>, units: Option<&str>) -> AxisDescriptor {
        AxisDescriptor {
            role,
            size: values.len(),
            values,
            units: units.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_days_since() {
        let enc = TimeEncoding::parse("days since 1960-01-01").unwrap();
        assert_eq!(enc.unit, TimeUnit::Days);
        assert_eq!(
            enc.reference,
            NaiveDate::from_ymd_opt(1960, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_with_time_and_zone() {
        let enc = TimeEncoding::parse("hours since 1999-01-07T06:30:00Z").unwrap();
        assert_eq!(enc.unit, TimeUnit::Hours);
        assert_eq!(
            enc.reference,
            NaiveDate::from_ymd_opt(1999, 1, 7).unwrap().and_hms_opt(6, 30, 0).unwrap()
        );

        let enc = TimeEncoding::parse("Seconds since 1970-1-1 00:00:00").unwrap();
        assert_eq!(enc.unit, TimeUnit::Seconds);
    }

    #[test]
    fn test_parse_rejects_bad_units() {
        assert!(matches!(
            TimeEncoding::parse("days"),
            Err(FetchError::TimeDecode { .. })
        ));
        assert!(TimeEncoding::parse("fortnights since 1960-01-01").is_err());
        assert!(TimeEncoding::parse("days since yesterday").is_err());
    }

    #[test]
    fn test_decode_start_dates() {
        let enc = TimeEncoding::parse("days since 1960-01-01").unwrap();
        assert_eq!(yyyymmdd(&enc.decode(20985.0).unwrap()), "20170615");
        assert_eq!(yyyymmdd(&enc.decode(14251.0).unwrap()), "19990107");
        assert!(enc.decode(f64::NAN).is_err());
    }

    #[test]
    fn test_start_date_from_axis() {
        let s = axis(AxisRole::StartDate, vec![20985.0, 20992.0], Some("days since 1960-01-01"));
        let l = axis(AxisRole::Lead, vec![0.5], Some("days"));
        let time = TimeAxes::resolve(&s, &l).unwrap();
        assert_eq!(yyyymmdd(&time.start_date(&s, 1).unwrap()), "20170622");
        assert!(matches!(time.start_date(&s, 2), Err(FetchError::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_resolve_requires_start_units() {
        let no_units = axis(AxisRole::StartDate, vec![20985.0], None);
        let l = axis(AxisRole::Lead, vec![0.5], None);
        assert!(matches!(
            TimeAxes::resolve(&no_units, &l),
            Err(FetchError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_resolve_rejects_unknown_lead_unit() {
        let s = axis(AxisRole::StartDate, vec![20985.0], Some("days since 1960-01-01"));
        let l = axis(AxisRole::Lead, vec![0.5], Some("fortnights"));
        assert!(matches!(
            TimeAxes::resolve(&s, &l),
            Err(FetchError::TimeDecode { .. })
        ));
    }

    #[test]
    fn test_valid_times_use_start_units() {
        let s = axis(AxisRole::StartDate, vec![20985.0, 20992.0], Some("days since 1960-01-01"));
        let l = axis(AxisRole::Lead, vec![0.5, 1.5, 2.5], Some("days"));
        let time = TimeAxes::resolve(&s, &l).unwrap();
        assert_eq!(time.start_units, "days since 1960-01-01");
        assert_eq!(time.valid_times(&s, &l, 1).unwrap(), vec![20992.5, 20993.5, 20994.5]);

        let hourly = axis(AxisRole::StartDate, vec![24.0], Some("hours since 2000-01-01"));
        let time = TimeAxes::resolve(&hourly, &l).unwrap();
        assert_eq!(time.valid_times(&hourly, &l, 0).unwrap(), vec![36.0, 60.0, 84.0]);
    }

    #[test]
    fn test_valid_times_default_to_days() {
        let s = axis(AxisRole::StartDate, vec![100.0], Some("days since 1960-01-01"));
        let l = axis(AxisRole::Lead, vec![0.0, 1.0], None);
        let time = TimeAxes::resolve(&s, &l).unwrap();
        assert_eq!(time.lead, TimeUnit::Days);
        assert_eq!(time.valid_times(&s, &l, 0).unwrap(), vec![100.0, 101.0]);
    }
}
