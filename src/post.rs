use std::path::Path;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use log::info;

use crate::{
    error::Result,
    handler::{ContentHandler, Format},
    metadata::Fields,
};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Written,
    /// The file already had a header block and was left untouched; the caller
    /// picks between [`PostMetadata::save_prepend`] and [`PostMetadata::save_overwrite`].
    HasHeaders,
}

/// Metadata of the post being edited. Empty strings mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostMetadata {
    pub title: String,
    pub slug: String,
    pub date: String,
    pub modified: String,
    pub category: String,
    pub tags: Vec<String>,
    pub authors: Vec<String>,
    pub summary: String,
    pub format: Format,
}

fn sorted_lowercase(values: &[String]) -> Vec<&str> {
    let mut values: Vec<&str> = values.iter().map(String::as_str).collect();
    values.sort_by_key(|v| v.to_lowercase());
    values
}

impl PostMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_title(&mut self, value: impl Into<String>) {
        self.title = value.into();
    }

    pub fn set_slug(&mut self, value: impl Into<String>) {
        self.slug = value.into();
    }

    pub fn set_date(&mut self, value: NaiveDateTime) {
        self.date = value.format(DATE_FORMAT).to_string();
    }

    pub fn set_modified(&mut self, value: Option<NaiveDateTime>) {
        self.modified = value
            .map(|v| v.format(DATE_FORMAT).to_string())
            .unwrap_or_default();
    }

    pub fn set_category(&mut self, value: impl Into<String>) {
        self.category = value.into();
    }

    pub fn add_tag(&mut self, value: impl Into<String>) {
        self.tags.push(value.into());
    }

    pub fn remove_tag(&mut self, value: &str) {
        if let Some(i) = self.tags.iter().position(|t| t == value) {
            self.tags.remove(i);
        }
    }

    /// A single author, or none for an empty value.
    pub fn set_author(&mut self, value: &str) {
        self.authors = if value.is_empty() {
            vec![]
        } else {
            vec![value.to_string()]
        };
    }

    pub fn set_summary(&mut self, value: impl Into<String>) {
        self.summary = value.into();
    }

    /// Header mapping with tags and authors already joined for display.
    pub fn headers(&self) -> Fields {
        let mut headers = IndexMap::new();

        for (separator, key, values) in [(", ", "tags", &self.tags), ("; ", "authors", &self.authors)]
        {
            let value = sorted_lowercase(values).join(separator);
            if !value.is_empty() {
                headers.insert(key.to_string(), value);
            }
        }

        for (key, value) in [
            ("title", &self.title),
            ("slug", &self.slug),
            ("date", &self.date),
            ("modified", &self.modified),
            ("category", &self.category),
            ("summary", &self.summary),
        ] {
            if !value.is_empty() {
                headers.insert(key.to_string(), value.clone());
            }
        }

        headers
    }

    pub fn as_header_text(&self) -> String {
        self.format.handler().format(&self.headers())
    }

    /// Prepends the headers unless the file already carries some.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<SaveOutcome> {
        let mut file = ContentHandler::open(path)?;
        if file.has_metadata() {
            info!("{:?} already has headers", file.path());
            return Ok(SaveOutcome::HasHeaders);
        }
        file.prepend_headers(&self.headers())?;
        Ok(SaveOutcome::Written)
    }

    pub fn save_prepend(&self, path: impl AsRef<Path>) -> Result<()> {
        ContentHandler::open(path)?.prepend_headers(&self.headers())
    }

    pub fn save_overwrite(&self, path: impl AsRef<Path>) -> Result<()> {
        ContentHandler::open(path)?.overwrite_headers(&self.headers())
    }
}
