use crate::utils::error::ArchiveError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A compression algorithm such as gzip or bzip2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    Bzip2,
    #[serde(rename = "gz", alias = "gzip")]
    Gzip,
    Xz,
    Pack200,
}

impl CompressionType {
    pub const ALL: [CompressionType; 4] = [
        CompressionType::Bzip2,
        CompressionType::Gzip,
        CompressionType::Xz,
        CompressionType::Pack200,
    ];

    /// The name by which the compression algorithm is identified.
    pub fn name(&self) -> &'static str {
        match self {
            CompressionType::Bzip2 => "bzip2",
            CompressionType::Gzip => "gz",
            CompressionType::Xz => "xz",
            CompressionType::Pack200 => "pack200",
        }
    }

    /// Default file extension preceded by a dot, e.g. `.gz`.
    pub fn default_file_extension(&self) -> &'static str {
        match self {
            CompressionType::Bzip2 => ".bz2",
            CompressionType::Gzip => ".gz",
            CompressionType::Xz => ".xz",
            CompressionType::Pack200 => ".pack",
        }
    }

    pub fn is_valid_compression_type(compression: &str) -> bool {
        compression.parse::<CompressionType>().is_ok()
    }
}

impl FromStr for CompressionType {
    type Err = ArchiveError;

    fn from_str(compression: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(compression))
            .ok_or_else(|| ArchiveError::UnknownCompressionType {
                name: compression.to_string(),
            })
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An archive container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    Ar,
    Cpio,
    Dump,
    Jar,
    #[serde(rename = "7z")]
    SevenZ,
    Tar,
    Zip,
}

impl ArchiveFormat {
    pub const ALL: [ArchiveFormat; 7] = [
        ArchiveFormat::Ar,
        ArchiveFormat::Cpio,
        ArchiveFormat::Dump,
        ArchiveFormat::Jar,
        ArchiveFormat::SevenZ,
        ArchiveFormat::Tar,
        ArchiveFormat::Zip,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ArchiveFormat::Ar => "ar",
            ArchiveFormat::Cpio => "cpio",
            ArchiveFormat::Dump => "dump",
            ArchiveFormat::Jar => "jar",
            ArchiveFormat::SevenZ => "7z",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::Zip => "zip",
        }
    }

    pub fn default_file_extension(&self) -> String {
        format!(".{}", self.name())
    }

    pub fn is_valid_archive_format(archive_format: &str) -> bool {
        archive_format.parse::<ArchiveFormat>().is_ok()
    }

    /// Formats whose readers need a seekable file rather than a byte stream.
    pub fn is_random_access(&self) -> bool {
        matches!(
            self,
            ArchiveFormat::Zip | ArchiveFormat::Jar | ArchiveFormat::SevenZ
        )
    }
}

impl FromStr for ArchiveFormat {
    type Err = ArchiveError;

    fn from_str(archive_format: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(archive_format))
            .ok_or_else(|| ArchiveError::UnknownArchiveFormat {
                name: archive_format.to_string(),
            })
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A file name suffix with the archive format and/or compression it denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileType {
    suffix: &'static str,
    archive_format: Option<ArchiveFormat>,
    compression: Option<CompressionType>,
}

// First match wins, so compound suffixes precede their tails.
const FILE_TYPES: &[FileType] = &[
    // compressed archives
    FileType::new(".tar.gz", Some(ArchiveFormat::Tar), Some(CompressionType::Gzip)),
    FileType::new(".tgz", Some(ArchiveFormat::Tar), Some(CompressionType::Gzip)),
    FileType::new(".tar.bz2", Some(ArchiveFormat::Tar), Some(CompressionType::Bzip2)),
    FileType::new(".tbz2", Some(ArchiveFormat::Tar), Some(CompressionType::Bzip2)),
    FileType::new(".tar.xz", Some(ArchiveFormat::Tar), Some(CompressionType::Xz)),
    FileType::new(".txz", Some(ArchiveFormat::Tar), Some(CompressionType::Xz)),
    // archive formats
    FileType::new(".7z", Some(ArchiveFormat::SevenZ), None),
    FileType::new(".a", Some(ArchiveFormat::Ar), None),
    FileType::new(".ar", Some(ArchiveFormat::Ar), None),
    FileType::new(".deb", Some(ArchiveFormat::Ar), None),
    FileType::new(".rpm", Some(ArchiveFormat::Cpio), None),
    FileType::new(".cpio", Some(ArchiveFormat::Cpio), None),
    FileType::new(".dump", Some(ArchiveFormat::Dump), None),
    FileType::new(".jar", Some(ArchiveFormat::Jar), None),
    FileType::new(".tar", Some(ArchiveFormat::Tar), None),
    FileType::new(".zip", Some(ArchiveFormat::Zip), None),
    FileType::new(".zipx", Some(ArchiveFormat::Zip), None),
    // compression formats
    FileType::new(".bz2", None, Some(CompressionType::Bzip2)),
    FileType::new(".xz", None, Some(CompressionType::Xz)),
    FileType::new(".gzip", None, Some(CompressionType::Gzip)),
    FileType::new(".gz", None, Some(CompressionType::Gzip)),
    FileType::new(".pack", None, Some(CompressionType::Pack200)),
];

impl FileType {
    /// Special case for an unknown archive/compression file type.
    pub const UNKNOWN: FileType = FileType::new("", None, None);

    const fn new(
        suffix: &'static str,
        archive_format: Option<ArchiveFormat>,
        compression: Option<CompressionType>,
    ) -> Self {
        Self {
            suffix,
            archive_format,
            compression,
        }
    }

    /// Looks up the file type for the suffix of `filename`, ignoring case.
    pub fn get(filename: &str) -> FileType {
        let lower = filename.to_lowercase();
        FILE_TYPES
            .iter()
            .copied()
            .find(|t| lower.ends_with(t.suffix))
            .unwrap_or(FileType::UNKNOWN)
    }

    /// Looks up the file type for the final component of `path`.
    pub fn of_path(path: &Path) -> FileType {
        path.file_name()
            .map(|name| FileType::get(&name.to_string_lossy()))
            .unwrap_or(FileType::UNKNOWN)
    }

    pub fn known_types() -> &'static [FileType] {
        FILE_TYPES
    }

    pub fn is_archive(&self) -> bool {
        self.archive_format.is_some()
    }

    pub fn is_compressed(&self) -> bool {
        self.compression.is_some()
    }

    pub fn is_unknown(&self) -> bool {
        *self == FileType::UNKNOWN
    }

    pub fn suffix(&self) -> &'static str {
        self.suffix
    }

    pub fn archive_format(&self) -> Option<ArchiveFormat> {
        self.archive_format
    }

    pub fn compression_type(&self) -> Option<CompressionType> {
        self.compression
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix)
    }
}

/// Metadata of a single entry inside an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub name: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub is_directory: bool,
    pub mode: Option<u32>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, size: u64, is_directory: bool) -> Self {
        Self {
            name: name.into(),
            size,
            last_modified: None,
            is_directory,
            mode: None,
        }
    }

    pub fn with_last_modified(mut self, last_modified: Option<DateTime<Utc>>) -> Self {
        self.last_modified = last_modified;
        self
    }

    pub fn with_mode(mut self, mode: Option<u32>) -> Self {
        self.mode = mode;
        self
    }
}
