//! # subx2nc
//!
//! A Rust library for fetching SubX subseasonal hindcast fields from the IRI Data
//! Library over OPeNDAP and writing one NetCDF file per (model, variable,
//! ensemble member, start date).
//!
//! ## Features
//!
//! - **Axis discovery**: Classifies the `X`, `Y`, `L`, `M`, `S` and optional `P` axes
//!   of every field at runtime
//! - **Level resolution**: Maps a requested pressure level to its index on the `P` axis
//! - **Shaped reads**: Reads one `lead × lat × lon` slice per member and start date
//! - **Resilient batches**: A failing variable or artifact is logged and skipped,
//!   and reported in the run summary
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use subx2nc::{process_subx_job, RunOptions, input::JobConfig};
//!
//! let config = JobConfig::from_file("subx.json").expect("Failed to load config");
//! let summary = process_subx_job(&config, &RunOptions::default()).expect("Batch aborted");
//! println!("{} files written, {} failures", summary.artifacts.len(), summary.failures.len());
//! ```
//!
//! ## Configuration Example
//!
//! ```json
//! {
//!   "out_path": "/data/subx",
//!   "fields": [
//!     {"variable": "ua", "plev": "850"},
//!     {"variable": "tas", "plev": "2m"}
//!   ],
//!   "models": [
//!     {"group": "GMAO", "model": "GEOS_V2p1"},
//!     {"group": "RSMAS", "model": "CCSM4"}
//!   ]
//! }
//! ```

pub mod backend;
pub mod catalog;
pub mod cli;
pub mod error;
pub mod extract;
pub mod info;
pub mod input;
pub mod inspect;
pub mod log;
pub mod output;
pub mod time;


use crate::backend::{DatasetSource, NetcdfBackend, RemoteBackend};
use crate::error::{FetchError, FetchResult};
use crate::extract::extract_slice;
use crate::input::JobConfig;
use crate::inspect::{DatasetHandle, RequestSpec, inspect};
use crate::output::{ArtifactCoordinates, ArtifactId, GlobalMetadata, write_artifact};
use ::log::{debug, error, info, warn};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;

/// Switches for one batch run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Inspect every field and plan every artifact without reading slices or writing files
    pub dry_run: bool,
    /// Stop at the first failure instead of recording it and continuing
    pub fail_fast: bool,
    /// Show a progress bar per variable
    pub show_progress: bool,
}

/// One unit of work that failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub group: String,
    pub model: String,
    pub variable: String,
    pub plev: String,
    /// 1-based member; `None` when the whole variable failed
    pub ensemble: Option<usize>,
    /// `yyyymmdd`, or the start index when the date itself could not be decoded
    pub start_date: Option<String>,
    pub error: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Files written, or planned in a dry run
    pub artifacts: Vec<PathBuf>,
    pub failures: Vec<Failure>,
    /// Variables that were opened and inspected successfully
    pub variables_processed: usize,
    pub dry_run: bool,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs a job against the IRI Data Library.
///
/// # Examples
///
/// ```rust,no_run
/// use subx2nc::{process_subx_job, RunOptions, input::JobConfig};
///
/// let config = JobConfig::from_file("subx.yaml")?;
/// let summary = process_subx_job(&config, &RunOptions::default())?;
/// assert!(summary.is_success());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn process_subx_job(config: &JobConfig, options: &RunOptions) -> FetchResult<BatchSummary> {
    run_batch(config, &NetcdfBackend, options)
}

/// Runs a job against any [`RemoteBackend`].
///
/// Models are visited in order, and within each model the configured fields in
/// order. Every field is opened and inspected once; its slices are then
/// extracted and written for every ensemble member and, within each member,
/// every start date.
///
/// # Errors
///
/// Returns an error for an invalid configuration, or for the first failure when
/// [`RunOptions::fail_fast`] is set. Otherwise failures are collected in the
/// returned [`BatchSummary`].
pub fn run_batch<B: RemoteBackend>(
    config: &JobConfig,
    backend: &B,
    options: &RunOptions,
) -> FetchResult<BatchSummary> {
    config.validate()?;

    let meta = GlobalMetadata::for_run(&config.metadata);
    let mut summary = BatchSummary {
        dry_run: options.dry_run,
        ..Default::default()
    };

    for model in &config.models {
        for field in &config.fields {
            let request = RequestSpec::new(&model.group, &model.model, &field.variable, &field.plev);
            let url = catalog::resolve_url(
                &config.base_url,
                &config.forecast_type,
                &request.group,
                &request.model,
                &request.variable,
            );
            info!(
                "Processing {}-{} {} (plev {})",
                request.group, request.model, request.variable, request.plev
            );

            // The handle, and every axis value read for this variable, is
            // dropped at the end of this iteration.
            let handle = match inspect(backend, &url, &request) {
                Ok(handle) => handle,
                Err(e) => {
                    error!(
                        "{}-{} {}: skipping variable: {}",
                        request.group, request.model, request.variable, e
                    );
                    if options.fail_fast {
                        return Err(e);
                    }
                    summary.failures.push(Failure {
                        group: request.group.clone(),
                        model: request.model.clone(),
                        variable: request.variable.clone(),
                        plev: request.plev.clone(),
                        ensemble: None,
                        start_date: None,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            summary.variables_processed += 1;
            process_variable(config, &handle, &request, &meta, options, &mut summary)?;
        }
    }

    Ok(summary)
}

fn process_variable<S: DatasetSource>(
    config: &JobConfig,
    handle: &DatasetHandle<S>,
    request: &RequestSpec,
    meta: &GlobalMetadata,
    options: &RunOptions,
    summary: &mut BatchSummary,
) -> FetchResult<()> {
    let nens = handle.layout.n_ensembles();
    let nics = handle.layout.n_starts();

    let progress = variable_progress(options, request, (nens * nics) as u64);

    for ens in 0..nens {
        for ic in 0..nics {
            match process_artifact(config, handle, request, meta, options, ens, ic) {
                Ok(path) => summary.artifacts.push(path),
                Err((start_date, e)) => {
                    warn!(
                        "{}-{} {} e{} {}: {}",
                        request.group, request.model, request.variable, ens + 1, start_date, e
                    );
                    if options.fail_fast {
                        progress.abandon();
                        return Err(e);
                    }
                    summary.failures.push(Failure {
                        group: request.group.clone(),
                        model: request.model.clone(),
                        variable: request.variable.clone(),
                        plev: request.plev.clone(),
                        ensemble: Some(ens + 1),
                        start_date: Some(start_date),
                        error: e.to_string(),
                    });
                }
            }
            progress.inc(1);
        }
    }

    progress.finish_and_clear();
    Ok(())
}

/// Extracts and writes the artifact for member `ens` and start `ic`.
///
/// On failure returns the start date label (or `S[ic]` when it could not be
/// decoded) alongside the error.
fn process_artifact<S: DatasetSource>(
    config: &JobConfig,
    handle: &DatasetHandle<S>,
    request: &RequestSpec,
    meta: &GlobalMetadata,
    options: &RunOptions,
    ens: usize,
    ic: usize,
) -> Result<PathBuf, (String, FetchError)> {
    let layout = &handle.layout;
    let yyyymmdd = layout
        .time
        .start_date(&layout.start, ic)
        .map(|d| time::yyyymmdd(&d))
        .map_err(|e| (format!("S[{}]", ic), e))?;

    let id = ArtifactId {
        variable: request.variable.clone(),
        plev: request.plev.clone(),
        group: request.group.clone(),
        model: request.model.clone(),
        yyyymmdd: yyyymmdd.clone(),
        ensemble: ens + 1,
    };

    if options.dry_run {
        let path = id.path(&config.out_path);
        debug!("Would write {}", path.display());
        return Ok(path);
    }

    extract_and_write(config, handle, meta, &id, ens, ic).map_err(|e| (yyyymmdd, e))
}

fn extract_and_write<S: DatasetSource>(
    config: &JobConfig,
    handle: &DatasetHandle<S>,
    meta: &GlobalMetadata,
    id: &ArtifactId,
    ens: usize,
    ic: usize,
) -> FetchResult<PathBuf> {
    let layout = &handle.layout;
    let slice = extract_slice(handle, ic, ens)?;
    let time = layout.time.valid_times(&layout.start, &layout.lead, ic)?;
    let coords = ArtifactCoordinates {
        time: &time,
        time_units: &layout.time.start_units,
        lat: &layout.lat,
        lon: &layout.lon,
    };
    write_artifact(&config.out_path, id, &slice, &coords, meta, &handle.url)
}

fn variable_progress(options: &RunOptions, request: &RequestSpec, len: u64) -> ProgressBar {
    if !options.show_progress {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} ({eta})") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message(format!("{}-{} {}", request.group, request.model, request.variable));
    bar
}
