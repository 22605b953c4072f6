use std::path::PathBuf;

use clap::ArgMatches;

/// Defaults that come from the environment rather than the command line.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub content_dir: PathBuf,
    pub default_author: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            content_dir: PathBuf::from(
                std::env::var("POSTMETA_CONTENT_DIR").unwrap_or("content".to_string()),
            ),
            default_author: std::env::var("POSTMETA_AUTHOR").unwrap_or("".to_string()),
        }
    }

    pub fn scan_dir(&self, matches: &ArgMatches) -> PathBuf {
        matches
            .get_one::<PathBuf>("dir")
            .cloned()
            .unwrap_or_else(|| self.content_dir.clone())
    }

    pub fn author(&self, matches: &ArgMatches) -> String {
        matches
            .get_one::<String>("author")
            .cloned()
            .unwrap_or_else(|| self.default_author.clone())
    }
}
