use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("7z operation failed: {message}")]
    SevenZError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Unknown archive format {name}")]
    UnknownArchiveFormat { name: String },

    #[error("Unknown compression type {name}")]
    UnknownCompressionType { name: String },

    #[error("Unknown file type for {path}")]
    UnknownFileType { path: String },

    #[error("{operation} is not supported for {format}")]
    Unsupported { operation: String, format: String },

    #[error("Invalid source {path}: {reason}")]
    InvalidSource { path: PathBuf, reason: String },

    #[error("Invalid destination {path}: {reason}")]
    InvalidDestination { path: PathBuf, reason: String },

    #[error("Entry {name} would be extracted outside of {destination}")]
    UnsafeEntryPath { name: String, destination: PathBuf },

    #[error("Invalid archive: {message}")]
    InvalidArchive { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Batch job {job} failed: {message}")]
    JobError { job: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Format,
    Configuration,
    Security,
    Runtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ArchiveError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ArchiveError::IoError(_) => ErrorCategory::Io,
            ArchiveError::ZipError(_)
            | ArchiveError::SevenZError { .. }
            | ArchiveError::SerializationError(_)
            | ArchiveError::UnknownArchiveFormat { .. }
            | ArchiveError::UnknownCompressionType { .. }
            | ArchiveError::UnknownFileType { .. }
            | ArchiveError::Unsupported { .. }
            | ArchiveError::InvalidArchive { .. } => ErrorCategory::Format,
            ArchiveError::InvalidSource { .. }
            | ArchiveError::InvalidDestination { .. }
            | ArchiveError::ConfigError { .. }
            | ArchiveError::InvalidConfigValueError { .. }
            | ArchiveError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ArchiveError::UnsafeEntryPath { .. } => ErrorCategory::Security,
            ArchiveError::JobError { .. } => ErrorCategory::Runtime,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Format => ErrorSeverity::High,
            ErrorCategory::Runtime => ErrorSeverity::Medium,
            ErrorCategory::Io | ErrorCategory::Security => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ArchiveError::IoError(_) => "Check that the paths exist and that you have permission to read and write them",
            ArchiveError::ZipError(_) | ArchiveError::SevenZError { .. } | ArchiveError::InvalidArchive { .. } => {
                "The archive may be corrupt or truncated; try re-creating or re-downloading it"
            }
            ArchiveError::SerializationError(_) => "Retry without JSON output or report the entry that failed",
            ArchiveError::UnknownArchiveFormat { .. } => "Use one of: ar, cpio, dump, jar, 7z, tar, zip",
            ArchiveError::UnknownCompressionType { .. } => "Use one of: bzip2, gz, xz, pack200",
            ArchiveError::UnknownFileType { .. } => "Rename the file with a known extension or pass --format/--compression explicitly",
            ArchiveError::Unsupported { .. } => "Convert the archive with another tool or pick a different format",
            ArchiveError::InvalidSource { .. } => "Make sure every source exists and is readable",
            ArchiveError::InvalidDestination { .. } => "Choose a writable directory as destination",
            ArchiveError::UnsafeEntryPath { .. } => "Do not extract archives from untrusted origins; inspect it with `list` first",
            ArchiveError::ConfigError { .. }
            | ArchiveError::InvalidConfigValueError { .. }
            | ArchiveError::MissingConfigError { .. } => "Fix the manifest and run again",
            ArchiveError::JobError { .. } => "Inspect the batch report for the failing job",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ArchiveError::IoError(e) => format!("File system error: {}", e),
            ArchiveError::UnsafeEntryPath { name, .. } => {
                format!("Refusing to extract '{}': it points outside the destination", name)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
