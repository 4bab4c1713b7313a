use crate::adapters::walk::{collect_entries, SourceEntry};
use crate::adapters::{ar, cpio, sevenz, tar, zip};
use crate::core::compressor::StreamCompressor;
use crate::domain::model::ArchiveFormat;
use crate::domain::ports::{Archiver, EntryVisitor};
use crate::utils::error::{ArchiveError, Result};
use crate::utils::io::{copy, require_directory};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Path of the archive named `archive` in `destination`, with `extension`
/// appended unless the name already carries it.
pub fn archive_file_path(archive: &str, destination: &Path, extension: &str) -> PathBuf {
    if archive.to_lowercase().ends_with(&extension.to_lowercase()) {
        destination.join(archive)
    } else {
        destination.join(format!("{}{}", archive, extension))
    }
}

/// Runs `write` against `path`, removing the partial file when it fails.
fn write_or_cleanup(path: &Path, write: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
    let result = write(path);
    if result.is_err() && path.exists() {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!("Could not remove partial archive {}: {}", path.display(), e);
        }
    }
    result
}

/// `Archiver` for a single, uncompressed archive format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatArchiver {
    format: ArchiveFormat,
}

impl FormatArchiver {
    pub fn new(format: ArchiveFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    fn unsupported(&self, operation: &str) -> ArchiveError {
        ArchiveError::Unsupported {
            operation: operation.to_string(),
            format: self.format.name().to_string(),
        }
    }

    /// Writes a stream format (tar, ar, cpio) into `writer`.
    pub(crate) fn write_stream<W: Write>(&self, writer: W, entries: &[SourceEntry]) -> Result<W> {
        match self.format {
            ArchiveFormat::Tar => tar::write_tar(writer, entries),
            ArchiveFormat::Ar => ar::write_ar(writer, entries),
            ArchiveFormat::Cpio => cpio::write_cpio(writer, entries),
            _ => Err(self.unsupported("stream writing")),
        }
    }

    /// Writes the archive file at `path`.
    pub(crate) fn write_file(&self, path: &Path, entries: &[SourceEntry]) -> Result<()> {
        match self.format {
            ArchiveFormat::Zip | ArchiveFormat::Jar => {
                let jar = self.format == ArchiveFormat::Jar;
                let file = zip::write_zip(File::create(path)?, entries, jar)?;
                file.sync_all()?;
                Ok(())
            }
            ArchiveFormat::SevenZ => sevenz::write_7z(path, entries),
            ArchiveFormat::Dump => Err(self.unsupported("creation")),
            ArchiveFormat::Tar | ArchiveFormat::Ar | ArchiveFormat::Cpio => {
                let writer = self.write_stream(BufWriter::new(File::create(path)?), entries)?;
                writer
                    .into_inner()
                    .map_err(|e| ArchiveError::IoError(e.into_error()))?
                    .sync_all()?;
                Ok(())
            }
        }
    }
}

impl Archiver for FormatArchiver {
    fn create(&self, archive: &str, destination: &Path, sources: &[PathBuf]) -> Result<PathBuf> {
        if self.format == ArchiveFormat::Dump {
            return Err(self.unsupported("creation"));
        }
        let entries = collect_entries(sources)?;
        require_directory(destination)?;

        let archive_path = archive_file_path(archive, destination, &self.filename_extension());
        write_or_cleanup(&archive_path, |path| self.write_file(path, &entries))?;

        tracing::info!(
            "Created {} with {} entries",
            archive_path.display(),
            entries.len()
        );
        Ok(archive_path)
    }

    fn stream(&self, archive: &Path, visitor: &mut EntryVisitor<'_>) -> Result<()> {
        match self.format {
            ArchiveFormat::Zip | ArchiveFormat::Jar => {
                zip::read_zip(BufReader::new(File::open(archive)?), visitor)
            }
            ArchiveFormat::SevenZ => sevenz::read_7z(archive, visitor),
            ArchiveFormat::Dump => Err(self.unsupported("reading")),
            ArchiveFormat::Tar | ArchiveFormat::Ar | ArchiveFormat::Cpio => {
                let mut input = BufReader::new(File::open(archive)?);
                self.stream_reader(&mut input, visitor)
            }
        }
    }

    fn stream_reader(&self, archive: &mut dyn Read, visitor: &mut EntryVisitor<'_>) -> Result<()> {
        match self.format {
            ArchiveFormat::Tar => tar::read_tar(archive, visitor),
            ArchiveFormat::Ar => ar::read_ar(archive, visitor),
            ArchiveFormat::Cpio => cpio::read_cpio(archive, visitor),
            ArchiveFormat::Dump => Err(self.unsupported("reading")),
            ArchiveFormat::Zip | ArchiveFormat::Jar | ArchiveFormat::SevenZ => {
                // Random access formats need a seekable file.
                let mut spool = tempfile::NamedTempFile::new()?;
                let spooled = copy(archive, spool.as_file_mut())?;
                spool.as_file_mut().flush()?;
                tracing::debug!("Spooled {} bytes of {} input to {}", spooled, self.format, spool.path().display());
                self.stream(spool.path(), visitor)
            }
        }
    }

    fn filename_extension(&self) -> String {
        self.format.default_file_extension()
    }
}

/// An archiver whose archives are additionally compressed, e.g. `.tar.gz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressedArchiver {
    archiver: FormatArchiver,
    compressor: StreamCompressor,
}

impl CompressedArchiver {
    pub fn new(archiver: FormatArchiver, compressor: StreamCompressor) -> Self {
        Self {
            archiver,
            compressor,
        }
    }

    pub fn archiver(&self) -> &FormatArchiver {
        &self.archiver
    }

    pub fn compressor(&self) -> &StreamCompressor {
        &self.compressor
    }

    fn write_file(&self, path: &Path, entries: &[SourceEntry]) -> Result<()> {
        if self.archiver.format().is_random_access() {
            let parent = path.parent().unwrap_or_else(|| Path::new("."));
            let staging = tempfile::NamedTempFile::new_in(parent)?;
            self.archiver.write_file(staging.path(), entries)?;

            let mut input = BufReader::new(File::open(staging.path())?);
            let mut encoder = self.compressor.encoder(BufWriter::new(File::create(path)?))?;
            copy(&mut input, &mut encoder)?;
            encoder.finish()?.flush()?;
        } else {
            let encoder = self.compressor.encoder(BufWriter::new(File::create(path)?))?;
            let encoder = self.archiver.write_stream(encoder, entries)?;
            encoder.finish()?.flush()?;
        }
        Ok(())
    }
}

impl Archiver for CompressedArchiver {
    fn create(&self, archive: &str, destination: &Path, sources: &[PathBuf]) -> Result<PathBuf> {
        if self.archiver.format() == ArchiveFormat::Dump {
            return Err(self.archiver.unsupported("creation"));
        }
        self.compressor.ensure_supported()?;

        let entries = collect_entries(sources)?;
        require_directory(destination)?;

        let archive_path = archive_file_path(archive, destination, &self.filename_extension());
        write_or_cleanup(&archive_path, |path| self.write_file(path, &entries))?;

        tracing::info!(
            "Created {} with {} entries",
            archive_path.display(),
            entries.len()
        );
        Ok(archive_path)
    }

    fn stream(&self, archive: &Path, visitor: &mut EntryVisitor<'_>) -> Result<()> {
        let mut input = BufReader::new(File::open(archive)?);
        self.stream_reader(&mut input, visitor)
    }

    fn stream_reader(&self, archive: &mut dyn Read, visitor: &mut EntryVisitor<'_>) -> Result<()> {
        let mut decoder = self.compressor.decoder(archive)?;
        self.archiver.stream_reader(&mut *decoder, visitor)
    }

    fn filename_extension(&self) -> String {
        format!(
            "{}{}",
            self.archiver.filename_extension(),
            self.compressor.compression_type().default_file_extension()
        )
    }
}
