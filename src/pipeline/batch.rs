//! Directory traversal and parallel execution of units

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::errors::{GeoLabelError, Result};
use crate::pipeline::report::{BatchReport, UnitOutcome};
use crate::utils::logger::Logger;
use crate::utils::progress::ProgressTracker;

pub const RASTER_EXTENSIONS: [&str; 2] = ["tif", "tiff"];
pub const VECTOR_EXTENSIONS: [&str; 2] = ["geojson", "json"];
pub const LABEL_EXTENSIONS: [&str; 1] = ["txt"];
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Input files under `path`, sorted
///
/// A file is returned as is; a directory is walked recursively for files
/// with one of `extensions`.
pub fn collect_inputs(path: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(GeoLabelError::InvalidArgument(format!(
            "{} is neither a file nor a directory",
            path.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(true) {
        let entry = entry.map_err(|e| {
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory loop"));
            GeoLabelError::io_at(path, source)
        })?;
        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    debug!("Found {} input(s) under {}", files.len(), path.display());
    Ok(files)
}

/// Inputs matched by file stem, and primary inputs left without a partner
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StemPairs {
    pub pairs: Vec<(PathBuf, PathBuf)>,
    pub unpaired: Vec<PathBuf>,
}

impl StemPairs {
    /// One skipped outcome per unpaired input, `partner` naming what is missing
    pub fn unpaired_outcomes(&self, partner: &str) -> Vec<UnitOutcome> {
        self.unpaired
            .iter()
            .map(|path| UnitOutcome::skipped(path.display().to_string(), format!("no matching {} file", partner)))
            .collect()
    }
}

/// Pair files of two inputs by file stem
///
/// Two plain files always pair, whatever their names. Otherwise files of
/// `primary` with no partner in `secondary` end up in
/// [`StemPairs::unpaired`]. Pairs are ordered by stem.
pub fn pair_by_stem(
    primary: &Path,
    primary_extensions: &[&str],
    secondary: &Path,
    secondary_extensions: &[&str],
) -> Result<StemPairs> {
    if primary.is_file() && secondary.is_file() {
        return Ok(StemPairs {
            pairs: vec![(primary.to_path_buf(), secondary.to_path_buf())],
            unpaired: Vec::new(),
        });
    }

    let partners: BTreeMap<String, PathBuf> = collect_inputs(secondary, secondary_extensions)?
        .into_iter()
        .filter_map(|p| stem_of(&p).map(|s| (s, p)))
        .collect();

    let mut result = StemPairs::default();
    for path in collect_inputs(primary, primary_extensions)? {
        match stem_of(&path).and_then(|s| partners.get(&s)) {
            Some(partner) => result.pairs.push((path, partner.clone())),
            None => {
                warn!("No partner found for {}", path.display());
                result.unpaired.push(path);
            }
        }
    }
    Ok(result)
}

fn stem_of(path: &Path) -> Option<String> {
    path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
}

/// Runs units sequentially or on the rayon pool and gathers a report
pub struct BatchRunner<'a> {
    parallel: bool,
    show_progress: bool,
    logger: &'a Logger,
}

impl<'a> BatchRunner<'a> {
    pub fn new(parallel: bool, logger: &'a Logger) -> Self {
        BatchRunner {
            parallel,
            show_progress: true,
            logger,
        }
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Run `work` on every unit
    ///
    /// A failing unit never stops the others. Outcomes keep the order of
    /// `units`.
    pub fn run<T, L, F>(&self, command: &str, units: &[T], label: L, work: F) -> BatchReport
    where
        T: Sync,
        L: Fn(&T) -> String + Sync,
        F: Fn(&T) -> Result<BatchReport> + Sync,
    {
        let outcomes = self.collect_outcomes(command, units, label, work);
        self.finish(command, outcomes)
    }

    /// Run `work` on every pair; unpaired inputs are reported as skipped
    pub fn run_pairs<L, F>(&self, command: &str, pairing: &StemPairs, partner: &str, label: L, work: F) -> BatchReport
    where
        L: Fn(&(PathBuf, PathBuf)) -> String + Sync,
        F: Fn(&(PathBuf, PathBuf)) -> Result<BatchReport> + Sync,
    {
        let mut outcomes = self.collect_outcomes(command, &pairing.pairs, label, work);
        for outcome in pairing.unpaired_outcomes(partner) {
            self.log_outcome(&outcome);
            outcomes.push(outcome);
        }
        self.finish(command, outcomes)
    }

    fn log_outcome(&self, outcome: &UnitOutcome) {
        if let Err(e) = self.logger.log(&outcome.to_string()) {
            debug!("Run log write failed: {}", e);
        }
    }

    fn finish(&self, command: &str, outcomes: Vec<UnitOutcome>) -> BatchReport {
        let mut report = BatchReport::new(command);
        for outcome in outcomes {
            report.push(outcome);
        }
        info!("{}", report.summary());
        report
    }

    fn collect_outcomes<T, L, F>(&self, command: &str, units: &[T], label: L, work: F) -> Vec<UnitOutcome>
    where
        T: Sync,
        L: Fn(&T) -> String + Sync,
        F: Fn(&T) -> Result<BatchReport> + Sync,
    {
        let tracker = if self.show_progress {
            ProgressTracker::new(units.len() as u64, command)
        } else {
            ProgressTracker::hidden(units.len() as u64)
        };

        let process = |unit: &T| -> Vec<UnitOutcome> {
            let name = label(unit);
            let outcomes = match work(unit) {
                Ok(nested) if !nested.units.is_empty() => nested.units,
                Ok(_) => vec![UnitOutcome::succeeded(name)],
                Err(e) => {
                    warn!("{}: {}", name, e);
                    vec![UnitOutcome::from_error(name, &e)]
                }
            };
            for outcome in &outcomes {
                self.log_outcome(outcome);
            }
            tracker.increment(1);
            outcomes
        };

        let outcomes: Vec<Vec<UnitOutcome>> = if self.parallel {
            units.par_iter().map(process).collect()
        } else {
            units.iter().map(process).collect()
        };
        tracker.finish();
        outcomes.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::report::UnitStatus;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn collects_matching_files_recursively() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.TIF"), b"").unwrap();
        fs::write(dir.path().join("nested/a.tif"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let files = collect_inputs(dir.path(), &RASTER_EXTENSIONS).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| has_extension(f, &RASTER_EXTENSIONS)));
        assert!(collect_inputs(&dir.path().join("missing"), &RASTER_EXTENSIONS).is_err());
    }

    #[test]
    fn pairs_by_stem() {
        let dir = tempdir().unwrap();
        let (rasters, vectors) = (dir.path().join("r"), dir.path().join("v"));
        fs::create_dir(&rasters).unwrap();
        fs::create_dir(&vectors).unwrap();
        for stem in ["one", "two", "lonely"] {
            fs::write(rasters.join(format!("{}.tif", stem)), b"").unwrap();
        }
        for stem in ["one", "two"] {
            fs::write(vectors.join(format!("{}.geojson", stem)), b"").unwrap();
        }

        let pairing = pair_by_stem(&rasters, &RASTER_EXTENSIONS, &vectors, &VECTOR_EXTENSIONS).unwrap();
        assert_eq!(pairing.pairs.len(), 2);
        assert!(pairing.pairs[0].0.ends_with("one.tif") && pairing.pairs[0].1.ends_with("one.geojson"));
        assert_eq!(pairing.unpaired, vec![rasters.join("lonely.tif")]);

        let skipped = pairing.unpaired_outcomes("vector");
        assert_eq!(skipped[0].status, UnitStatus::Skipped);
        assert_eq!(skipped[0].reason.as_deref(), Some("no matching vector file"));
    }

    #[test]
    fn single_file_directories_pair_by_stem_only() {
        let dir = tempdir().unwrap();
        let (rasters, vectors) = (dir.path().join("r"), dir.path().join("v"));
        fs::create_dir(&rasters).unwrap();
        fs::create_dir(&vectors).unwrap();
        fs::write(rasters.join("a.tif"), b"").unwrap();
        fs::write(vectors.join("b.geojson"), b"").unwrap();

        let pairing = pair_by_stem(&rasters, &RASTER_EXTENSIONS, &vectors, &VECTOR_EXTENSIONS).unwrap();
        assert!(pairing.pairs.is_empty());
        assert_eq!(pairing.unpaired, vec![rasters.join("a.tif")]);
    }

    #[test]
    fn unpaired_inputs_are_reported_as_skipped() {
        let logger = Logger::disabled();
        let pairing = StemPairs {
            pairs: vec![(PathBuf::from("a.tif"), PathBuf::from("a.txt"))],
            unpaired: vec![PathBuf::from("b.tif")],
        };
        for parallel in [false, true] {
            let report = BatchRunner::new(parallel, &logger).show_progress(false).run_pairs(
                "detections",
                &pairing,
                "label",
                |(raster, _)| raster.display().to_string(),
                |_| Ok(BatchReport::default()),
            );
            assert_eq!((report.succeeded(), report.skipped(), report.failed()), (1, 1, 0));
            assert_eq!(report.units[1].unit, "b.tif");
            assert_eq!(report.units[1].reason.as_deref(), Some("no matching label file"));
        }
    }

    #[test]
    fn single_files_pair_directly() {
        let dir = tempdir().unwrap();
        let (r, v) = (dir.path().join("scene.tif"), dir.path().join("fields.geojson"));
        fs::write(&r, b"").unwrap();
        fs::write(&v, b"").unwrap();
        let pairing = pair_by_stem(&r, &RASTER_EXTENSIONS, &v, &VECTOR_EXTENSIONS).unwrap();
        assert_eq!(pairing.pairs, vec![(r, v)]);
        assert!(pairing.unpaired.is_empty());
    }

    #[test]
    fn failures_do_not_stop_the_batch() {
        let logger = Logger::disabled();
        let units: Vec<u32> = (0..8).collect();
        for parallel in [false, true] {
            let report = BatchRunner::new(parallel, &logger).show_progress(false).run(
                "test",
                &units,
                |u| format!("unit{}", u),
                |u| match u % 4 {
                    1 => Err(GeoLabelError::EmptyIntersection),
                    2 => Err(GeoLabelError::InvalidArgument("bad".into())),
                    _ => Ok(BatchReport::default()),
                },
            );
            assert_eq!(report.units.len(), 8);
            assert_eq!((report.succeeded(), report.skipped(), report.failed()), (4, 2, 2));
            assert_eq!(report.units[1].unit, "unit1");
            assert_eq!(report.units[1].status, UnitStatus::Skipped);
        }
    }

    #[test]
    fn nested_reports_are_flattened() {
        let logger = Logger::disabled();
        let report = BatchRunner::new(false, &logger).show_progress(false).run(
            "clip",
            &["scene"],
            |s| s.to_string(),
            |_| {
                let mut nested = BatchReport::new("clip");
                nested.record::<()>("scene#0", &Ok(()));
                nested.record::<()>("scene#1", &Err(GeoLabelError::EmptyIntersection));
                Ok(nested)
            },
        );
        assert_eq!(report.units.len(), 2);
        assert_eq!(report.skipped(), 1);
    }
}
