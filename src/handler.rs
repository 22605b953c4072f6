use std::{
    fs::{self, OpenOptions},
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
};

use log::{debug, info};

use crate::{
    error::{Error, Result},
    metadata::{Fields, HeaderBlock},
    parser, serializer,
};

/// What a post format has to provide to take part in reading and writing headers.
pub trait HeaderFormat: Send + Sync {
    fn parse(&self, text: &str) -> HeaderBlock;

    fn format(&self, fields: &Fields) -> String;

    fn prepend(&self, fields: &Fields, existing: &str, sink: &mut dyn Write) -> io::Result<()>;

    fn overwrite(&self, fields: &Fields, parsed_body: &str, sink: &mut dyn Write)
        -> io::Result<()>;
}

/// `Key: Value` headers at the top of a Markdown post.
#[derive(Debug, Default)]
pub struct MarkdownFormat;

impl HeaderFormat for MarkdownFormat {
    fn parse(&self, text: &str) -> HeaderBlock {
        parser::parse_text(text)
    }

    fn format(&self, fields: &Fields) -> String {
        serializer::format(fields)
    }

    fn prepend(&self, fields: &Fields, existing: &str, sink: &mut dyn Write) -> io::Result<()> {
        serializer::prepend(fields, existing, sink)
    }

    fn overwrite(
        &self,
        fields: &Fields,
        parsed_body: &str,
        sink: &mut dyn Write,
    ) -> io::Result<()> {
        serializer::overwrite(fields, parsed_body, sink)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Markdown,
}

impl Format {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "md" | "markdown" | "mdown" | "mkd" => Some(Self::Markdown),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| Error::unsupported(path))
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Markdown => &["md", "markdown", "mdown", "mkd"],
        }
    }

    pub fn handler(&self) -> &'static dyn HeaderFormat {
        match self {
            Self::Markdown => &MarkdownFormat,
        }
    }
}

// temp file next to the real target, then rename over it
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    // a symlinked post keeps its link; the file it points to is rewritten
    let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let permissions = fs::metadata(&target).ok().map(|m| m.permissions());

    let temp_name = format!(
        ".{}.{}.tmp",
        target
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = target.with_file_name(temp_name);

    let written = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .and_then(|mut fd| {
            fd.write_all(content)?;
            fd.sync_all()
        })
        .and_then(|_| match permissions {
            Some(permissions) => fs::set_permissions(&temp_path, permissions),
            None => Ok(()),
        })
        .and_then(|_| fs::rename(&temp_path, &target));

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(Error::io(path, e));
    }
    Ok(())
}

/// One post on disk together with its parsed header block.
#[derive(Debug)]
pub struct ContentHandler {
    path: PathBuf,
    format: Format,
    raw: String,
    block: HeaderBlock,
}

impl ContentHandler {
    /// A missing file is fine and reads as an empty block with `exists == false`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let mut handler = Self {
            path: path.to_path_buf(),
            format,
            raw: String::new(),
            block: HeaderBlock::default(),
        };
        handler.read()?;
        Ok(handler)
    }

    pub fn read(&mut self) -> Result<&HeaderBlock> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                self.block = self.format.handler().parse(&raw);
                self.raw = raw;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{:?} does not exist, reading as empty", self.path);
                self.block = HeaderBlock::default();
                self.raw.clear();
            }
            Err(e) => return Err(Error::io(&self.path, e)),
        }
        Ok(&self.block)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn block(&self) -> &HeaderBlock {
        &self.block
    }

    pub fn into_block(self) -> HeaderBlock {
        self.block
    }

    pub fn exists(&self) -> bool {
        self.block.exists
    }

    pub fn has_metadata(&self) -> bool {
        self.block.has_metadata()
    }

    /// New header block above everything the file holds now.
    pub fn prepend_headers_to(&self, fields: &Fields, sink: &mut dyn Write) -> io::Result<()> {
        self.format.handler().prepend(fields, &self.raw, sink)
    }

    pub fn overwrite_headers_to(&self, fields: &Fields, sink: &mut dyn Write) -> io::Result<()> {
        self.format.handler().overwrite(fields, &self.block.body, sink)
    }

    pub fn prepend_headers(&mut self, fields: &Fields) -> Result<()> {
        let mut content = Vec::new();
        self.prepend_headers_to(fields, &mut content)
            .map_err(|e| Error::io(&self.path, e))?;
        self.commit(content)
    }

    pub fn overwrite_headers(&mut self, fields: &Fields) -> Result<()> {
        let mut content = Vec::new();
        self.overwrite_headers_to(fields, &mut content)
            .map_err(|e| Error::io(&self.path, e))?;
        self.commit(content)
    }

    fn commit(&mut self, content: Vec<u8>) -> Result<()> {
        write_atomic(&self.path, &content)?;
        info!("Wrote headers to {:?}", self.path);

        let raw = String::from_utf8(content)
            .map_err(|e| Error::io(&self.path, io::Error::new(ErrorKind::InvalidData, e)))?;
        self.block = self.format.handler().parse(&raw);
        self.raw = raw;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_extension("md"), Some(Format::Markdown));
        assert_eq!(Format::from_extension("MarkDown"), Some(Format::Markdown));
        assert_eq!(Format::from_extension("rst"), None);
        assert_eq!(Format::from_extension(""), None);
    }

    #[test]
    fn format_from_path() {
        assert_eq!(
            Format::from_path(Path::new("content/post.mkd")).unwrap(),
            Format::Markdown
        );
        assert!(matches!(
            Format::from_path(Path::new("content/post.rst")),
            Err(Error::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            Format::from_path(Path::new("content/Makefile")),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn every_listed_extension_dispatches_back() {
        let format = Format::Markdown;
        for ext in format.extensions() {
            assert_eq!(Format::from_extension(ext), Some(format));
        }
    }

    #[test]
    fn open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let handler = ContentHandler::open(dir.path().join("missing.md")).unwrap();

        assert!(!handler.exists());
        assert!(!handler.has_metadata());
        assert_eq!(handler.block(), &HeaderBlock::default());
    }

    #[test]
    fn open_unsupported_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ContentHandler::open(dir.path().join("post.rst")),
            Err(Error::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn write_refreshes_block_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.md");
        fs::write(&path, "Title: Old\n\nBody\n").unwrap();

        let mut fields = Fields::new();
        fields.insert("title".to_string(), "New".to_string());

        let mut handler = ContentHandler::open(&path).unwrap();
        handler.overwrite_headers(&fields).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "Title: New\n\nBody\n");
        assert_eq!(handler.block().get("title"), Some("New"));
        assert_eq!(handler.block().body, "Body\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn write_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("post.md");

        let mut fields = Fields::new();
        fields.insert("title".to_string(), "New".to_string());

        let mut handler = ContentHandler::open(&path).unwrap();
        assert!(matches!(
            handler.prepend_headers(&fields),
            Err(Error::Io { .. })
        ));
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn rewrite_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post.md");
        fs::write(&path, "Body\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        let mut fields = Fields::new();
        fields.insert("title".to_string(), "New".to_string());
        ContentHandler::open(&path)
            .unwrap()
            .prepend_headers(&fields)
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert_eq!(fs::read_to_string(&path).unwrap(), "Title: New\n\nBody\n");
    }

    #[cfg(unix)]
    #[test]
    fn rewrite_through_symlink_updates_target() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.md");
        let link = dir.path().join("link.md");
        fs::write(&real, "Title: Old\n\nBody\n").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let mut fields = Fields::new();
        fields.insert("title".to_string(), "New".to_string());
        ContentHandler::open(&link)
            .unwrap()
            .overwrite_headers(&fields)
            .unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "Title: New\n\nBody\n");
    }
}
