use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use serde::Serialize;

use crate::{error::Error, handler::ContentHandler};

#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownMetadata {
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub authors: Vec<String>,
}

/// Known values keep first-seen order and are never cleared by a later scan.
#[derive(Debug, Default)]
pub struct MetadataAggregator {
    known: KnownMetadata,
    root_path: Option<PathBuf>,
}

/// Adds the atomic values of `value` to `known_values`, skipping ones already there.
///
/// `value` is split on `;` when it holds one, on `,` otherwise.
pub fn fold(known_values: &mut Vec<String>, value: &str) {
    let separator = if value.contains(';') { ';' } else { ',' };
    for v in value.split(separator).map(str::trim) {
        if !v.is_empty() && !known_values.iter().any(|known| known == v) {
            debug!("Appending {v}");
            known_values.push(v.to_string());
        }
    }
}

impl MetadataAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_path(root: impl AsRef<Path>) -> Self {
        let mut aggregator = Self::new();
        aggregator.scan(root);
        aggregator
    }

    pub fn tags(&self) -> &[String] {
        &self.known.tags
    }

    pub fn categories(&self) -> &[String] {
        &self.known.categories
    }

    pub fn authors(&self) -> &[String] {
        &self.known.authors
    }

    pub fn known(&self) -> &KnownMetadata {
        &self.known
    }

    pub fn into_known(self) -> KnownMetadata {
        self.known
    }

    pub fn root_path(&self) -> Option<&Path> {
        self.root_path.as_deref()
    }

    /// Files that cannot be handled are logged and skipped; nothing here is fatal.
    pub fn scan(&mut self, root: impl AsRef<Path>) {
        let root = root.as_ref();
        if !root.is_dir() {
            warn!("{root:?} is not a directory. ignoring...");
            return;
        }
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());

        let mut q = VecDeque::new();
        q.push_back(root.clone());
        while let Some(dir) = q.pop_front() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Cannot read directory {dir:?}: {e}");
                    continue;
                }
            };
            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Cannot read entry in {dir:?}: {e}");
                        continue;
                    }
                };
                let path = entry.path();
                match entry.file_type() {
                    Ok(t) if t.is_dir() => q.push_back(path),
                    Ok(_) => self.fold_file(&path),
                    Err(e) => warn!("Cannot stat {path:?}: {e}"),
                }
            }
        }

        self.root_path = Some(root);
    }

    fn fold_file(&mut self, path: &Path) {
        debug!("Processing {path:?}");

        let handler = match ContentHandler::open(path) {
            Ok(handler) => handler,
            Err(Error::UnsupportedFormat { .. }) => {
                info!("Ignoring {path:?} because it has unsupported extension");
                return;
            }
            Err(e) => {
                warn!("Skipping {path:?}: {e}");
                return;
            }
        };

        for (name, value) in handler.block().fields.iter() {
            let known_values = match name.as_str() {
                "tags" => &mut self.known.tags,
                "category" => &mut self.known.categories,
                "authors" => &mut self.known.authors,
                _ => continue,
            };
            fold(known_values, value);
        }
    }
}
