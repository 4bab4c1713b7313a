use crate::adapters::walk::SourceEntry;
use crate::domain::model::ArchiveEntry;
use crate::domain::ports::{EntryVisitor, StreamEntry};
use crate::utils::error::{ArchiveError, Result};
use chrono::{DateTime, Utc};
use sevenz_rust::{Password, SevenZArchiveEntry, SevenZReader, SevenZWriter};
use std::fs::File;
use std::path::Path;

fn sevenz_error(error: sevenz_rust::Error) -> ArchiveError {
    ArchiveError::SevenZError {
        message: error.to_string(),
    }
}

/// Writes `entries` into a new 7z archive at `path`.
pub fn write_7z(path: &Path, entries: &[SourceEntry]) -> Result<()> {
    let mut writer = SevenZWriter::create(path).map_err(sevenz_error)?;

    for entry in entries {
        let archive_entry = SevenZArchiveEntry::from_path(&entry.path, entry.name.clone());
        if entry.is_directory {
            writer
                .push_archive_entry::<File>(archive_entry, None)
                .map_err(sevenz_error)?;
        } else {
            let source = File::open(&entry.path)?;
            writer
                .push_archive_entry(archive_entry, Some(source))
                .map_err(sevenz_error)?;
        }
        tracing::debug!("Added {} to 7z", entry.name);
    }

    writer.finish()?;
    Ok(())
}

fn last_modified(entry: &SevenZArchiveEntry) -> Option<DateTime<Utc>> {
    if !entry.has_last_modified_date {
        return None;
    }
    DateTime::from_timestamp(entry.last_modified_date().to_unix_time(), 0)
}

/// Visits the entries of the 7z archive at `path`.
pub fn read_7z(path: &Path, visitor: &mut EntryVisitor<'_>) -> Result<()> {
    let mut reader = SevenZReader::open(path, Password::empty()).map_err(sevenz_error)?;

    // The reader callback speaks sevenz_rust::Error, so visitor errors are parked here.
    let mut failure: Option<ArchiveError> = None;
    reader
        .for_each_entries(|entry, data| {
            let metadata = ArchiveEntry::new(
                entry.name().trim_end_matches('/').to_string(),
                entry.size(),
                entry.is_directory(),
            )
            .with_last_modified(last_modified(entry));
            let mut stream_entry = StreamEntry::new(metadata, data);
            match visitor(&mut stream_entry) {
                Ok(keep_going) => Ok(keep_going),
                Err(e) => {
                    failure = Some(e);
                    Ok(false)
                }
            }
        })
        .map_err(sevenz_error)?;

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
