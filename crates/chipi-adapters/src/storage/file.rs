//! File-backed buffer storage.
//!
//! A [`FileStore`] maps each buffer to `<root>/<label>.<ext>`, so a whole
//! [`BufferManager`] dumps to one directory:
//!
//! ```text
//! root/
//!   temperature.json
//!   humidity.json
//! ```

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chipi_common::utils::error::{Error, Result};
use chipi_core::{Buffer, BufferManager, Decoded, Format, codec_for};
use tracing::{debug, info, warn};

/// Reads and writes buffers as files under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory holding one file per buffer. Created on first write.
    root: PathBuf,
}

/// Outcome of [`FileStore::dump`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    /// Format every file was written in.
    pub format: Format,
    /// Written files, in label order.
    pub written: Vec<PathBuf>,
}

/// Outcome of [`FileStore::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// Format every file was read in.
    pub format: Format,
    /// Labels whose buffer was replaced from its file.
    pub loaded: Vec<String>,
    /// Labels without a file. Their buffers are untouched.
    pub missing: Vec<String>,
}

impl LoadReport {
    /// Returns true if every label had a file.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

impl FileStore {
    /// Creates a store rooted at `root`. Nothing is touched until the first
    /// read or write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file that holds the buffer `label` in `format`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `label` cannot be a file name.
    pub fn path_for(&self, label: &str, format: Format) -> Result<PathBuf> {
        validate_label(label)?;
        Ok(self.root.join(format!("{label}.{}", format.extension())))
    }

    /// Writes `buffer` to `<root>/<label>.<ext>`, returning the path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a label that cannot be a file
    /// name, or [`Error::Io`] if the file cannot be written.
    pub fn export_buffer(&self, buffer: &Buffer, format: Format) -> Result<PathBuf> {
        let path = self.path_for(buffer.label(), format)?;
        fs::create_dir_all(&self.root)?;
        write_payload(&path, &buffer.export(format)?)?;
        Ok(path)
    }

    /// Replaces the values of `buffer` with the contents of
    /// `<root>/<label>.<ext>`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read (including when it
    /// does not exist), or the codec's error.
    pub fn import_buffer(&self, buffer: &mut Buffer, format: Format) -> Result<()> {
        let path = self.path_for(buffer.label(), format)?;
        let payload = read_payload(&path)?;
        buffer.import_data(format, &payload)
    }

    /// Writes `buffer` to an explicit path. With no `format`, it is inferred
    /// from the extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the format cannot be inferred,
    /// or [`Error::Io`] if the file cannot be written.
    pub fn export_to_path(
        buffer: &Buffer,
        path: impl AsRef<Path>,
        format: Option<Format>,
    ) -> Result<()> {
        let path = path.as_ref();
        let format = resolve_format(path, format)?;
        write_payload(path, &buffer.export(format)?)
    }

    /// Replaces the values of `buffer` with the contents of an explicit path.
    /// With no `format`, it is inferred from the extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] if the format cannot be inferred,
    /// [`Error::Io`] if the file cannot be read, or the codec's error.
    pub fn import_from_path(
        buffer: &mut Buffer,
        path: impl AsRef<Path>,
        format: Option<Format>,
    ) -> Result<()> {
        let path = path.as_ref();
        let format = resolve_format(path, format)?;
        let payload = read_payload(path)?;
        buffer.import_data(format, &payload)
    }

    /// Writes every buffer of `manager`, one file per label.
    ///
    /// All labels are checked before the first file is written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a label that cannot be a file
    /// name, or [`Error::Io`] if a file cannot be written. Files written
    /// before an I/O failure are left in place.
    pub fn dump(&self, manager: &BufferManager, format: Format) -> Result<DumpReport> {
        for label in manager.labels() {
            validate_label(label)?;
        }
        fs::create_dir_all(&self.root)?;

        let mut written = Vec::with_capacity(manager.len());
        for (_, buffer) in manager.iter() {
            written.push(self.export_buffer(buffer, format)?);
        }

        info!(
            root = %self.root.display(),
            %format,
            buffers = written.len(),
            "dumped buffers"
        );
        Ok(DumpReport { format, written })
    }

    /// Imports every label of `manager` whose file exists. Labels without a
    /// file are reported in [`LoadReport::missing`] and left untouched.
    ///
    /// Every label is checked and every file is read and decoded before any
    /// buffer is replaced, so a failed load leaves the manager unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for a label that cannot be a file
    /// name, [`Error::Io`] for read failures other than a missing file, or
    /// the codec's error.
    pub fn load(&self, manager: &mut BufferManager, format: Format) -> Result<LoadReport> {
        let targets = manager
            .labels()
            .map(|label| Ok((label.to_string(), self.path_for(label, format)?)))
            .collect::<Result<Vec<(String, PathBuf)>>>()?;

        let codec = codec_for(format);
        let mut staged: Vec<(String, Decoded)> = Vec::with_capacity(targets.len());
        let mut missing = Vec::new();
        for (label, path) in targets {
            let payload = match read_payload(&path) {
                Ok(payload) => payload,
                Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                    warn!(%label, path = %path.display(), "no file for buffer, skipping");
                    missing.push(label);
                    continue;
                }
                Err(e) => return Err(e),
            };
            staged.push((label, codec.decode(&payload)?));
        }

        let mut loaded = Vec::with_capacity(staged.len());
        for (label, decoded) in staged {
            manager.get_mut(&label)?.import_decoded(decoded);
            loaded.push(label);
        }

        info!(
            root = %self.root.display(),
            %format,
            loaded = loaded.len(),
            missing = missing.len(),
            "loaded buffers"
        );
        Ok(LoadReport {
            format,
            loaded,
            missing,
        })
    }
}

fn validate_label(label: &str) -> Result<()> {
    let reason = if label.is_empty() {
        "label is empty"
    } else if label == "." || label == ".." {
        "label is a relative directory"
    } else if label.contains(['/', '\\', '\0']) {
        "label contains a path separator or NUL"
    } else {
        return Ok(());
    };
    Err(Error::InvalidArgument(format!(
        "cannot store buffer '{}': {reason}",
        label.escape_default()
    )))
}

fn resolve_format(path: &Path, format: Option<Format>) -> Result<Format> {
    if let Some(format) = format {
        return Ok(format);
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
    Format::from_extension(extension)
}

fn write_payload(path: &Path, payload: &[u8]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(payload)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    debug!(path = %path.display(), bytes = payload.len(), "wrote buffer file");
    Ok(())
}

fn read_payload(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut payload = Vec::new();
    reader.read_to_end(&mut payload)?;
    Ok(payload)
}
