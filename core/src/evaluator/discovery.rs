use std::{
    collections::HashSet,
    fs::File,
    path::{Component, Path},
    sync::Arc,
};

use walkdir::WalkDir;
use zip::ZipArchive;

use crate::evaluator::{
    error::DiscoveryError,
    ports::{EvaluatorDiscoveryPort, UnitKind, UnitLoader},
    types::EvaluatorDescriptor,
};

/// Marks nested units; such units are never evaluators in their own right.
pub const INNER_UNIT_MARKER: char = '$';
pub const DEFAULT_UNIT_SUFFIX: &str = ".rule";

const ARCHIVE_EXTENSIONS: [&str; 2] = ["jar", "zip"];

/// Scans search-path locations for unit files and keeps the concrete evaluators.
pub struct EvaluatorDiscovery {
    loader: Arc<dyn UnitLoader>,
    unit_suffix: String,
}

impl EvaluatorDiscovery {
    pub fn new(loader: Arc<dyn UnitLoader>, unit_suffix: impl Into<String>) -> Self {
        Self {
            loader,
            unit_suffix: unit_suffix.into(),
        }
    }

    pub fn with_default_suffix(loader: Arc<dyn UnitLoader>) -> Self {
        Self::new(loader, DEFAULT_UNIT_SUFFIX)
    }

    pub fn unit_suffix(&self) -> &str {
        &self.unit_suffix
    }

    /// Qualified names of every unit file at `location`, before identification.
    pub fn candidate_names(&self, location: &str) -> Result<Vec<String>, DiscoveryError> {
        let path = Path::new(location);
        if !path.exists() {
            return Err(DiscoveryError::MissingLocation {
                location: location.to_string(),
            });
        }
        if path.is_dir() {
            return Ok(self.directory_candidates(location, path));
        }
        if is_archive(path) {
            return self.archive_candidates(location, path);
        }
        Err(DiscoveryError::UnsupportedLocation {
            location: location.to_string(),
        })
    }

    fn directory_candidates(&self, location: &str, root: &Path) -> Vec<String> {
        let mut names = Vec::new();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let err = DiscoveryError::Walk {
                        location: location.to_string(),
                        message: err.to_string(),
                    };
                    tracing::warn!(
                        target: "discovery",
                        error = %err,
                        "directory_entry_skipped"
                    );
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy();
            if !self.is_unit_file(&file_name) {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            match self.qualified_name_from_path(relative) {
                Some(name) => names.push(name),
                None => tracing::warn!(
                    target: "discovery",
                    location = %location,
                    path = %relative.display(),
                    "unit_path_not_utf8"
                ),
            }
        }
        names
    }

    fn archive_candidates(
        &self,
        location: &str,
        path: &Path,
    ) -> Result<Vec<String>, DiscoveryError> {
        let archive_error = |message: String| DiscoveryError::Archive {
            location: location.to_string(),
            message,
        };
        let file = File::open(path).map_err(|err| archive_error(err.to_string()))?;
        let mut archive = ZipArchive::new(file).map_err(|err| archive_error(err.to_string()))?;

        let mut names = Vec::new();
        for index in 0..archive.len() {
            let entry_name = match archive.by_index_raw(index) {
                Ok(entry) if entry.is_dir() => continue,
                Ok(entry) => entry.name().to_string(),
                Err(err) => {
                    tracing::warn!(
                        target: "discovery",
                        location = %location,
                        index,
                        error = %err,
                        "archive_entry_skipped"
                    );
                    continue;
                }
            };
            if !self.is_unit_file(&entry_name) {
                continue;
            }
            let dotted = entry_name.replace(['/', '\\'], ".");
            if let Some(name) = dotted.strip_suffix(self.unit_suffix.as_str()) {
                names.push(name.trim_start_matches('.').to_string());
            }
        }
        Ok(names)
    }

    fn is_unit_file(&self, name: &str) -> bool {
        name.ends_with(self.unit_suffix.as_str()) && !name.contains(INNER_UNIT_MARKER)
    }

    fn qualified_name_from_path(&self, relative: &Path) -> Option<String> {
        let mut segments = Vec::new();
        for component in relative.components() {
            if let Component::Normal(segment) = component {
                segments.push(segment.to_str()?);
            }
        }
        let file_name = segments.pop()?;
        let stem = file_name.strip_suffix(self.unit_suffix.as_str())?;
        segments.push(stem);
        Some(segments.join("."))
    }
}

impl EvaluatorDiscoveryPort for EvaluatorDiscovery {
    fn discover(&self, locations: &[String]) -> Vec<EvaluatorDescriptor> {
        let mut seen = HashSet::new();
        let mut discovered = Vec::new();

        for location in locations {
            let names = match self.candidate_names(location) {
                Ok(names) => names,
                Err(err) => {
                    tracing::warn!(
                        target: "discovery",
                        location = %location,
                        error = %err,
                        "location_skipped"
                    );
                    continue;
                }
            };

            for name in names {
                if seen.contains(&name) {
                    tracing::debug!(
                        target: "discovery",
                        location = %location,
                        unit = %name,
                        "duplicate_unit_shadowed"
                    );
                    continue;
                }
                match self.loader.identify(&name) {
                    Ok(UnitKind::Evaluator) => {
                        seen.insert(name.clone());
                        discovered.push(EvaluatorDescriptor::new(name, location.as_str()));
                    }
                    Ok(kind) => {
                        tracing::debug!(
                            target: "discovery",
                            unit = %name,
                            kind = ?kind,
                            "unit_not_an_evaluator"
                        );
                    }
                    Err(err) => {
                        tracing::warn!(
                            target: "discovery",
                            location = %location,
                            unit = %name,
                            error = %err,
                            "unit_skipped"
                        );
                    }
                }
            }
        }

        tracing::debug!(
            target: "discovery",
            locations = locations.len(),
            evaluators = discovered.len(),
            "discovery_completed"
        );
        discovered
    }
}

fn is_archive(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                ARCHIVE_EXTENSIONS
                    .iter()
                    .any(|candidate| ext.eq_ignore_ascii_case(candidate))
            })
}
