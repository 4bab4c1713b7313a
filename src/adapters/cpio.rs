//! Portable ASCII ("newc") cpio archives.
//!
//! Each member is a 110 byte header of hexadecimal fields, the NUL terminated
//! name padded to a multiple of four, then the data padded the same way. The
//! member named `TRAILER!!!` ends the archive.

use crate::adapters::walk::SourceEntry;
use crate::adapters::{from_unix_seconds, unix_seconds};
use crate::domain::model::ArchiveEntry;
use crate::domain::ports::{EntryVisitor, StreamEntry};
use crate::utils::error::{ArchiveError, Result};
use crate::utils::io::copy;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};

pub const MAGIC_NEWC: &[u8; 6] = b"070701";
pub const MAGIC_NEWC_CRC: &[u8; 6] = b"070702";
pub const TRAILER: &str = "TRAILER!!!";

const HEADER_LEN: usize = 110;
const S_IFMT: u32 = 0o170000;
const S_IFDIR: u32 = 0o040000;
const S_IFREG: u32 = 0o100000;

fn padding(len: u64) -> usize {
    ((4 - (len % 4)) % 4) as usize
}

/// Parsed newc member header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Header {
    ino: u32,
    mode: u32,
    mtime: u32,
    file_size: u32,
    name: String,
}

impl Header {
    fn is_directory(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }

    fn is_regular(&self) -> bool {
        self.mode & S_IFMT == S_IFREG
    }
}

/// Streaming newc writer. Call `finish` to append the trailer.
pub struct NewcWriter<W: Write> {
    inner: W,
    next_ino: u32,
}

impl<W: Write> NewcWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, next_ino: 1 }
    }

    pub fn append_directory(&mut self, name: &str, mode: u32, mtime: u32) -> Result<()> {
        let ino = self.take_ino();
        self.write_header(ino, S_IFDIR | (mode & 0o7777), mtime, 2, 0, name)
    }

    pub fn append_file<R: Read>(
        &mut self,
        name: &str,
        mode: u32,
        mtime: u32,
        size: u64,
        data: R,
    ) -> Result<()> {
        let file_size = u32::try_from(size).map_err(|_| ArchiveError::InvalidArchive {
            message: format!("{} is too large for a cpio archive ({} bytes)", name, size),
        })?;

        let ino = self.take_ino();
        self.write_header(ino, S_IFREG | (mode & 0o7777), mtime, 1, file_size, name)?;

        let written = copy(&mut data.take(size), &mut self.inner)?;
        if written != size {
            return Err(ArchiveError::InvalidArchive {
                message: format!("{} changed size while archiving", name),
            });
        }
        self.inner.write_all(&[0u8; 3][..padding(size)])?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.write_header(0, 0, 0, 1, 0, TRAILER)?;
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn take_ino(&mut self) -> u32 {
        let ino = self.next_ino;
        self.next_ino += 1;
        ino
    }

    fn write_header(
        &mut self,
        ino: u32,
        mode: u32,
        mtime: u32,
        nlink: u32,
        file_size: u32,
        name: &str,
    ) -> Result<()> {
        let name_size = name.len() as u32 + 1;
        let header = format!(
            "070701{:08x}{:08x}{:08x}{:08x}{:08x}{:08x}{:08x}{:08x}{:08x}{:08x}{:08x}{:08x}{:08x}",
            ino,
            mode,
            0, // uid
            0, // gid
            nlink,
            mtime,
            file_size,
            0, // devmajor
            0, // devminor
            0, // rdevmajor
            0, // rdevminor
            name_size,
            0, // check
        );
        self.inner.write_all(header.as_bytes())?;
        self.inner.write_all(name.as_bytes())?;
        self.inner.write_all(&[0u8])?;
        let pad = padding(HEADER_LEN as u64 + u64::from(name_size));
        self.inner.write_all(&[0u8; 3][..pad])?;
        Ok(())
    }
}

pub fn write_cpio<W: Write>(writer: W, entries: &[SourceEntry]) -> Result<W> {
    let mut cpio = NewcWriter::new(writer);
    for entry in entries {
        let mtime = u32::try_from(unix_seconds(entry.last_modified)).unwrap_or(u32::MAX);
        if entry.is_directory {
            cpio.append_directory(&entry.name, entry.mode.unwrap_or(0o755), mtime)?;
        } else {
            let data = BufReader::new(File::open(&entry.path)?);
            cpio.append_file(&entry.name, entry.mode.unwrap_or(0o644), mtime, entry.size, data)?;
        }
        tracing::debug!("Added {} to cpio", entry.name);
    }
    cpio.finish()
}

fn invalid(message: impl Into<String>) -> ArchiveError {
    ArchiveError::InvalidArchive {
        message: message.into(),
    }
}

fn hex_field(raw: &[u8], index: usize) -> Result<u32> {
    let start = 6 + index * 8;
    let field = std::str::from_utf8(&raw[start..start + 8])
        .map_err(|_| invalid("cpio header field is not ASCII"))?;
    u32::from_str_radix(field, 16)
        .map_err(|_| invalid(format!("cpio header field {:?} is not hexadecimal", field)))
}

fn skip(reader: &mut dyn Read, count: usize) -> Result<()> {
    let mut scratch = [0u8; 3];
    reader.read_exact(&mut scratch[..count])?;
    Ok(())
}

fn read_header(reader: &mut dyn Read) -> Result<Header> {
    let mut raw = [0u8; HEADER_LEN];
    reader.read_exact(&mut raw).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            invalid("truncated cpio archive, trailer missing")
        } else {
            ArchiveError::IoError(e)
        }
    })?;

    if &raw[..6] != MAGIC_NEWC && &raw[..6] != MAGIC_NEWC_CRC {
        return Err(invalid(format!(
            "unsupported cpio magic {:?}, only newc archives are readable",
            String::from_utf8_lossy(&raw[..6])
        )));
    }

    let name_size = hex_field(&raw, 11)? as usize;
    if name_size == 0 {
        return Err(invalid("cpio entry with empty name"));
    }
    let mut name = vec![0u8; name_size];
    reader.read_exact(&mut name)?;
    skip(reader, padding((HEADER_LEN + name_size) as u64))?;
    if name.last() == Some(&0) {
        name.pop();
    }

    Ok(Header {
        ino: hex_field(&raw, 0)?,
        mode: hex_field(&raw, 1)?,
        mtime: hex_field(&raw, 5)?,
        file_size: hex_field(&raw, 6)?,
        name: String::from_utf8_lossy(&name).into_owned(),
    })
}

/// Visits the members of a newc archive up to its trailer.
pub fn read_cpio(reader: &mut dyn Read, visitor: &mut EntryVisitor<'_>) -> Result<()> {
    loop {
        let header = read_header(reader)?;
        if header.name == TRAILER {
            break;
        }

        let size = u64::from(header.file_size);
        let mut data = (&mut *reader).take(size);

        let keep_going = if header.is_regular() || header.is_directory() {
            let metadata = ArchiveEntry::new(
                header.name.trim_end_matches('/').to_string(),
                size,
                header.is_directory(),
            )
            .with_mode(Some(header.mode & 0o7777))
            .with_last_modified(from_unix_seconds(u64::from(header.mtime)));
            let mut stream_entry = StreamEntry::new(metadata, &mut data);
            visitor(&mut stream_entry)?
        } else {
            tracing::debug!("Skipping cpio member {} (inode {})", header.name, header.ino);
            true
        };

        io::copy(&mut data, &mut io::sink())?;
        if data.limit() > 0 {
            return Err(invalid(format!("truncated data for {}", header.name)));
        }
        skip(reader, padding(size))?;

        if !keep_going {
            break;
        }
    }
    Ok(())
}
