//! # Remote Field Information Module
//!
//! This module opens a single SubX field and reports its axes, attributes and,
//! when a pressure level is given, the level index the fetcher would read.

use crate::backend::{DatasetSource, RemoteBackend};
use crate::inspect::{AxisRole, RequestSpec, classify_axes, resolve_level_index};
use crate::time::{TimeEncoding, yyyymmdd};
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// Information about one axis of a remote field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisInfo {
    pub name: String,
    pub role: String,
    pub size: usize,
    pub first: Option<f64>,
    pub last: Option<f64>,
    pub units: Option<String>,
}

/// Complete information about a remote field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldInfo {
    pub url: String,
    pub variable: String,
    pub ndims: usize,
    pub axes: Vec<AxisInfo>,
    pub units: Option<String>,
    pub long_name: Option<String>,
    pub first_start_date: Option<String>,
    pub last_start_date: Option<String>,
    pub level_index: Option<usize>,
}

/// Extract information about the field at `url`
pub fn get_field_info<B: RemoteBackend>(backend: &B, url: &str, request: &RequestSpec) -> Result<FieldInfo> {
    debug!("Inspecting remote field: {}", url);
    let source = backend
        .open(url)
        .with_context(|| format!("Failed to open remote field: {}", url))?;

    let axes = source.axes(&request.variable)?;
    let roles = classify_axes(&request.variable, &axes)?;

    let mut axis_infos = Vec::new();
    let mut level_values = None;
    let mut start_values = None;
    for ((name, size), (role, _)) in axes.iter().zip(&roles) {
        let (values, units) = if *role == AxisRole::Ensemble {
            (Vec::new(), None)
        } else {
            (source.axis_values(name)?, source.attribute(name, "units")?)
        };

        match role {
            AxisRole::Level => level_values = Some(values.clone()),
            AxisRole::StartDate => start_values = Some((values.clone(), units.clone())),
            _ => {}
        }

        axis_infos.push(AxisInfo {
            name: name.clone(),
            role: role.description().to_string(),
            size: *size,
            first: values.first().copied(),
            last: values.last().copied(),
            units,
        });
    }

    let level_index = match (&level_values, request.plev.trim().is_empty()) {
        (Some(levels), false) => Some(resolve_level_index(levels, &request.plev)?),
        _ => None,
    };

    let (first_start_date, last_start_date) = match start_values {
        Some((values, Some(units))) => {
            let encoding = TimeEncoding::parse(&units)?;
            let decode = |v: Option<&f64>| -> Result<Option<String>> {
                Ok(match v {
                    Some(v) => Some(yyyymmdd(&encoding.decode(*v)?)),
                    None => None,
                })
            };
            (decode(values.first())?, decode(values.last())?)
        }
        _ => (None, None),
    };

    Ok(FieldInfo {
        url: url.to_string(),
        variable: request.variable.clone(),
        ndims: roles.len(),
        axes: axis_infos,
        units: source.attribute(&request.variable, "units")?,
        long_name: source.attribute(&request.variable, "long_name")?,
        first_start_date,
        last_start_date,
        level_index,
    })
}

/// Print field info in human-readable format
pub fn print_field_info_human(info: &FieldInfo) {
    println!("SubX Field Information:");
    println!("  URL: {}", info.url);
    println!("  Variable: {}", info.variable);
    if let Some(long_name) = &info.long_name {
        println!("  Long name: {}", long_name);
    }
    if let Some(units) = &info.units {
        println!("  Units: {}", units);
    }
    println!(
        "  Axes: {} total ({})",
        info.ndims,
        if info.ndims == 6 { "with pressure level" } else { "no pressure level" }
    );
    for axis in &info.axes {
        let range = match (axis.first, axis.last) {
            (Some(first), Some(last)) => format!(" [{} .. {}]", first, last),
            _ => String::new(),
        };
        let units = axis
            .units
            .as_deref()
            .map(|u| format!(" {}", u))
            .unwrap_or_default();
        println!("    {} ({}): {}{}{}", axis.name, axis.role, axis.size, range, units);
    }
    if let (Some(first), Some(last)) = (&info.first_start_date, &info.last_start_date) {
        println!("  Start dates: {} .. {}", first, last);
    }
    if let Some(index) = info.level_index {
        println!("  Level index: {}", index);
    }
}

/// Print field info in JSON format
pub fn print_field_info_json(info: &FieldInfo) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(info)?);
    Ok(())
}

/// Print field info in YAML format
pub fn print_field_info_yaml(info: &FieldInfo) -> Result<()> {
    let yaml = serde_yaml::to_string(info).context("Failed to serialize field info to YAML")?;
    println!("{}", yaml);
    Ok(())
}

/// Print field info in CSV format (axes only)
pub fn print_field_info_csv(info: &FieldInfo) -> Result<()> {
    println!("axis_name,role,size,first,last,units");
    for axis in &info.axes {
        println!(
            "{},{},{},{},{},\"{}\"",
            axis.name,
            axis.role,
            axis.size,
            axis.first.map(|v| v.to_string()).unwrap_or_default(),
            axis.last.map(|v| v.to_string()).unwrap_or_default(),
            axis.units.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
