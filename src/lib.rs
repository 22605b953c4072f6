//! Reading, writing and harvesting the `Key: Value` header block at the top
//! of plain-text blog posts.

use std::path::Path;

pub mod aggregator;
pub mod error;
pub mod handler;
pub mod metadata;
pub mod parser;
pub mod post;
pub mod serializer;

pub use aggregator::{KnownMetadata, MetadataAggregator};
pub use error::{Error, Result};
pub use handler::{ContentHandler, Format, HeaderFormat};
pub use metadata::{Fields, HeaderBlock};
pub use parser::parse_text;
pub use post::{PostMetadata, SaveOutcome};

/// Header block of the post at `path`. A missing file gives an empty block
/// with `exists == false`.
pub fn parse(path: impl AsRef<Path>) -> Result<HeaderBlock> {
    Ok(ContentHandler::open(path)?.into_block())
}

pub fn format_headers(fields: &Fields) -> String {
    serializer::format(fields)
}

pub fn write_prepend(path: impl AsRef<Path>, fields: &Fields) -> Result<()> {
    ContentHandler::open(path)?.prepend_headers(fields)
}

pub fn write_overwrite(path: impl AsRef<Path>, fields: &Fields) -> Result<()> {
    ContentHandler::open(path)?.overwrite_headers(fields)
}

pub fn scan_directory(path: impl AsRef<Path>) -> KnownMetadata {
    MetadataAggregator::from_path(path).into_known()
}
