use crate::domain::model::ArchiveEntry;
use crate::utils::error::Result;
use crate::utils::io::{copy_to_file, require_directory, resolve_entry_path};
use crate::utils::mode::apply_mode;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Callback invoked once per entry while streaming an archive.
///
/// Returning `Ok(false)` stops the iteration.
pub type EntryVisitor<'v> = dyn FnMut(&mut StreamEntry<'_>) -> Result<bool> + 'v;

/// The entry currently positioned in an archive stream.
///
/// Content is only readable while the visitor for this entry runs.
pub struct StreamEntry<'a> {
    entry: ArchiveEntry,
    reader: &'a mut dyn Read,
}

impl<'a> StreamEntry<'a> {
    pub fn new(entry: ArchiveEntry, reader: &'a mut dyn Read) -> Self {
        Self { entry, reader }
    }

    pub fn entry(&self) -> &ArchiveEntry {
        &self.entry
    }

    pub fn name(&self) -> &str {
        &self.entry.name
    }

    pub fn size(&self) -> u64 {
        self.entry.size
    }

    pub fn is_directory(&self) -> bool {
        self.entry.is_directory
    }

    /// Writes this entry below `destination` and returns the created path.
    pub fn extract(&mut self, destination: &Path) -> Result<PathBuf> {
        let target = self.unpack(destination)?;
        apply_mode(&target, self.entry.mode);
        Ok(target)
    }

    /// Like `extract`, but a directory's mode is queued in `directory_modes`
    /// and only applied by `DirectoryModes::apply`.
    pub fn extract_deferred(
        &mut self,
        destination: &Path,
        directory_modes: &mut DirectoryModes,
    ) -> Result<PathBuf> {
        let target = self.unpack(destination)?;
        if self.entry.is_directory {
            directory_modes.push(target.clone(), self.entry.mode);
        } else {
            apply_mode(&target, self.entry.mode);
        }
        Ok(target)
    }

    fn unpack(&mut self, destination: &Path) -> Result<PathBuf> {
        let target = resolve_entry_path(destination, &self.entry.name)?;

        if self.entry.is_directory {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let written = copy_to_file(&mut self.reader, &target)?;
            tracing::debug!("Extracted {} ({} bytes)", self.entry.name, written);
        }
        Ok(target)
    }
}

/// Directory modes collected during an extraction, applied once it is done.
#[derive(Debug, Default)]
pub struct DirectoryModes {
    pending: Vec<(PathBuf, Option<u32>)>,
}

impl DirectoryModes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: PathBuf, mode: Option<u32>) {
        if mode.is_some() {
            self.pending.push((path, mode));
        }
    }

    /// Applies the queued modes, deepest directories first.
    pub fn apply(mut self) {
        self.pending.sort_by(|a, b| b.0.cmp(&a.0));
        for (path, mode) in &self.pending {
            apply_mode(path, *mode);
        }
    }
}

impl Read for StreamEntry<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// A writer that has to be finished to complete its output, such as a
/// compression encoder writing its trailer.
pub trait FinishingWriter<W>: Write {
    /// Completes the output and hands back the inner writer.
    fn finish(self: Box<Self>) -> io::Result<W>;
}

/// Creates and extracts archives of one format, optionally compressed.
pub trait Archiver: Send + Sync {
    /// Creates `archive` (extension appended when missing) inside `destination`
    /// from the given files and directories, returning the archive path.
    fn create(&self, archive: &str, destination: &Path, sources: &[PathBuf]) -> Result<PathBuf>;

    /// Visits the entries of the archive file in order.
    fn stream(&self, archive: &Path, visitor: &mut EntryVisitor<'_>) -> Result<()>;

    /// Visits the entries of an archive read from a byte stream.
    fn stream_reader(&self, archive: &mut dyn Read, visitor: &mut EntryVisitor<'_>) -> Result<()>;

    /// File name extension produced by `create`, e.g. `.tar.gz`.
    fn filename_extension(&self) -> String;

    fn extract(&self, archive: &Path, destination: &Path) -> Result<()> {
        require_directory(destination)?;
        let mut count = 0usize;
        let mut directory_modes = DirectoryModes::new();
        self.stream(archive, &mut |entry: &mut StreamEntry<'_>| -> Result<bool> {
            entry.extract_deferred(destination, &mut directory_modes)?;
            count += 1;
            Ok(true)
        })?;
        directory_modes.apply();
        tracing::info!(
            "Extracted {} entries from {} into {}",
            count,
            archive.display(),
            destination.display()
        );
        Ok(())
    }

    fn extract_reader(&self, archive: &mut dyn Read, destination: &Path) -> Result<()> {
        require_directory(destination)?;
        let mut count = 0usize;
        let mut directory_modes = DirectoryModes::new();
        self.stream_reader(archive, &mut |entry: &mut StreamEntry<'_>| -> Result<bool> {
            entry.extract_deferred(destination, &mut directory_modes)?;
            count += 1;
            Ok(true)
        })?;
        directory_modes.apply();
        tracing::info!("Extracted {} entries into {}", count, destination.display());
        Ok(())
    }

    fn list(&self, archive: &Path) -> Result<Vec<ArchiveEntry>> {
        let mut entries = Vec::new();
        self.stream(archive, &mut |entry: &mut StreamEntry<'_>| -> Result<bool> {
            entries.push(entry.entry().clone());
            Ok(true)
        })?;
        Ok(entries)
    }
}

/// Compresses and decompresses single files or streams.
pub trait Compressor: Send + Sync {
    /// Compresses `source` into `destination`; a directory destination receives
    /// `<source name><extension>`.
    fn compress(&self, source: &Path, destination: &Path) -> Result<PathBuf>;

    /// Decompresses `source` into `destination`; a directory destination receives
    /// the source name without its compression suffix.
    fn decompress(&self, source: &Path, destination: &Path) -> Result<PathBuf>;

    /// Decompresses a byte stream into the file `destination`.
    fn decompress_reader(&self, source: &mut dyn Read, destination: &Path) -> Result<PathBuf>;

    fn decompressing_reader<'a>(&self, reader: Box<dyn Read + 'a>) -> Result<Box<dyn Read + 'a>>;

    fn compressing_writer<'a>(
        &self,
        writer: Box<dyn Write + 'a>,
    ) -> Result<Box<dyn FinishingWriter<Box<dyn Write + 'a>> + 'a>>;

    fn filename_extension(&self) -> String;
}
