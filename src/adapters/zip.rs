use crate::adapters::walk::SourceEntry;
use crate::domain::model::ArchiveEntry;
use crate::domain::ports::{EntryVisitor, StreamEntry};
use crate::utils::error::Result;
use crate::utils::io::copy;
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use std::fs::File;
use std::io::{BufReader, Read, Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const MANIFEST_DIRECTORY: &str = "META-INF";
pub const MANIFEST_NAME: &str = "META-INF/MANIFEST.MF";
const DEFAULT_MANIFEST: &[u8] = b"Manifest-Version: 1.0\r\nCreated-By: archivekit\r\n\r\n";

/// Writes `entries` as a zip archive. With `jar` set, a minimal manifest is
/// written first unless the sources already carry one.
pub fn write_zip<W: Write + Seek>(writer: W, entries: &[SourceEntry], jar: bool) -> Result<W> {
    let mut zip = ZipWriter::new(writer);

    if jar && !entries.iter().any(|e| e.name.eq_ignore_ascii_case(MANIFEST_NAME)) {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        if !entries.iter().any(|e| e.name == MANIFEST_DIRECTORY) {
            zip.add_directory(format!("{}/", MANIFEST_DIRECTORY), options)?;
        }
        zip.start_file(MANIFEST_NAME, options)?;
        zip.write_all(DEFAULT_MANIFEST)?;
    }

    for entry in entries {
        let options = file_options(entry);
        if entry.is_directory {
            zip.add_directory(format!("{}/", entry.name), options)?;
        } else {
            zip.start_file(entry.name.as_str(), options)?;
            let mut input = BufReader::new(File::open(&entry.path)?);
            copy(&mut input, &mut zip)?;
        }
        tracing::debug!("Added {} to zip", entry.name);
    }

    Ok(zip.finish()?)
}

fn file_options(entry: &SourceEntry) -> SimpleFileOptions {
    let mut options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(entry.size >= u64::from(u32::MAX));
    if let Some(mode) = entry.mode {
        options = options.unix_permissions(mode);
    }
    if let Some(time) = entry.last_modified.and_then(to_zip_datetime) {
        options = options.last_modified_time(time);
    }
    options
}

/// Visits the entries of a zip archive in central directory order.
pub fn read_zip<R: Read + Seek>(reader: R, visitor: &mut EntryVisitor<'_>) -> Result<()> {
    let mut archive = ZipArchive::new(reader)?;

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        let metadata = ArchiveEntry::new(
            file.name().trim_end_matches('/').to_string(),
            file.size(),
            file.is_dir(),
        )
        .with_mode(file.unix_mode())
        .with_last_modified(file.last_modified().and_then(from_zip_datetime));

        let mut stream_entry = StreamEntry::new(metadata, &mut file);
        if !visitor(&mut stream_entry)? {
            break;
        }
    }
    Ok(())
}

fn to_zip_datetime(time: DateTime<Utc>) -> Option<zip::DateTime> {
    zip::DateTime::from_date_and_time(
        u16::try_from(time.year()).ok()?,
        time.month() as u8,
        time.day() as u8,
        time.hour() as u8,
        time.minute() as u8,
        time.second() as u8,
    )
    .ok()
}

fn from_zip_datetime(time: zip::DateTime) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(
        i32::from(time.year()),
        u32::from(time.month()),
        u32::from(time.day()),
    )?
    .and_hms_opt(
        u32::from(time.hour()),
        u32::from(time.minute()),
        u32::from(time.second()),
    )
    .map(|naive| naive.and_utc())
}
