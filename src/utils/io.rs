use crate::utils::error::{ArchiveError, Result};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

/// Default buffer size used for `copy` operations.
pub const DEFAULT_BUFFER_SIZE: usize = 8024;

/// Copies `reader` into `writer` until EOF and returns the number of bytes written.
pub fn copy<R: Read + ?Sized, W: Write + ?Sized>(reader: &mut R, writer: &mut W) -> io::Result<u64> {
    copy_with_buffer(reader, writer, DEFAULT_BUFFER_SIZE)
}

pub fn copy_with_buffer<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    buffer_size: usize,
) -> io::Result<u64> {
    if buffer_size == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "buffer size must be greater than zero",
        ));
    }

    let mut buffer = vec![0u8; buffer_size];
    let mut count = 0u64;
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buffer[..n])?;
        count += n as u64;
    }
    Ok(count)
}

/// Copies the content of `reader` into a newly created (or truncated) file.
pub fn copy_to_file<R: Read + ?Sized>(reader: &mut R, destination: &Path) -> io::Result<u64> {
    let mut output = File::create(destination)?;
    let count = copy(reader, &mut output)?;
    output.flush()?;
    Ok(count)
}

/// Path of `node` relative to `root`, `/` separated.
///
/// With root `/home/user/project` and node `/home/user/project/assembly/pom.xml`
/// the result is `assembly/pom.xml`.
pub fn relative_path(root: &Path, node: &Path) -> Result<String> {
    let root = root.canonicalize()?;
    let node = node.canonicalize()?;

    let relative = node
        .strip_prefix(&root)
        .map_err(|_| ArchiveError::InvalidSource {
            path: node.clone(),
            reason: format!("not located under {}", root.display()),
        })?;

    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

/// Makes sure that `destination` is a writable directory, creating it when missing.
pub fn require_directory(destination: &Path) -> Result<()> {
    if destination.is_file() {
        return Err(ArchiveError::InvalidDestination {
            path: destination.to_path_buf(),
            reason: "exists and is a file, directory or path expected".to_string(),
        });
    } else if !destination.exists() {
        fs::create_dir_all(destination)?;
    }

    let metadata = fs::metadata(destination)?;
    if metadata.permissions().readonly() {
        return Err(ArchiveError::InvalidDestination {
            path: destination.to_path_buf(),
            reason: "Can not write to destination".to_string(),
        });
    }
    Ok(())
}

/// Direct children of a directory sorted by name, or the path itself for a file.
pub fn files_contained_in(source: &Path) -> Result<Vec<PathBuf>> {
    if source.is_dir() {
        let mut children = fs::read_dir(source)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<io::Result<Vec<_>>>()?;
        children.sort();
        Ok(children)
    } else {
        Ok(vec![source.to_path_buf()])
    }
}

/// Resolves an archive entry name below `destination`.
///
/// Leading separators are dropped; names that climb above `destination`
/// or carry a drive prefix are rejected.
pub fn resolve_entry_path(destination: &Path, entry_name: &str) -> Result<PathBuf> {
    let unsafe_entry = || ArchiveError::UnsafeEntryPath {
        name: entry_name.to_string(),
        destination: destination.to_path_buf(),
    };

    let normalized = entry_name.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();
    for part in normalized.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(unsafe_entry());
                }
            }
            other => {
                if Path::new(other)
                    .components()
                    .any(|c| matches!(c, Component::Prefix(_)))
                {
                    return Err(unsafe_entry());
                }
                parts.push(other);
            }
        }
    }

    let mut resolved = destination.to_path_buf();
    for part in parts {
        resolved.push(part);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_copy_counts_bytes() {
        let data = vec![7u8; DEFAULT_BUFFER_SIZE * 3 + 11];
        let mut output = Vec::new();
        let count = copy(&mut Cursor::new(&data), &mut output).unwrap();
        assert_eq!(count, data.len() as u64);
        assert_eq!(output, data);
    }

    #[test]
    fn test_copy_with_zero_buffer_fails() {
        let mut output = Vec::new();
        let result = copy_with_buffer(&mut Cursor::new(b"abc"), &mut output, 0);
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_relative_path() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("assembly");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("pom.xml"), b"<project/>").unwrap();

        let relative = relative_path(temp_dir.path(), &nested.join("pom.xml")).unwrap();
        assert_eq!(relative, "assembly/pom.xml");
    }

    #[test]
    fn test_relative_path_outside_root() {
        let root = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        assert!(relative_path(root.path(), other.path()).is_err());
    }

    #[test]
    fn test_require_directory_creates_missing() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("a/b/c");
        require_directory(&target).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn test_require_directory_rejects_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            require_directory(&file),
            Err(ArchiveError::InvalidDestination { .. })
        ));
    }

    #[test]
    fn test_files_contained_in() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.txt"), b"b").unwrap();
        fs::write(temp_dir.path().join("a.txt"), b"a").unwrap();

        let children = files_contained_in(temp_dir.path()).unwrap();
        assert_eq!(
            children,
            vec![temp_dir.path().join("a.txt"), temp_dir.path().join("b.txt")]
        );

        let single = files_contained_in(&temp_dir.path().join("a.txt")).unwrap();
        assert_eq!(single, vec![temp_dir.path().join("a.txt")]);
    }

    #[test]
    fn test_resolve_entry_path() {
        let root = Path::new("/tmp/out");
        assert_eq!(
            resolve_entry_path(root, "dir/file.txt").unwrap(),
            root.join("dir").join("file.txt")
        );
        assert_eq!(
            resolve_entry_path(root, "/etc/passwd").unwrap(),
            root.join("etc").join("passwd")
        );
        assert_eq!(
            resolve_entry_path(root, "a/../b.txt").unwrap(),
            root.join("b.txt")
        );
        assert!(resolve_entry_path(root, "../escape.txt").is_err());
        assert!(resolve_entry_path(root, "a/../../escape.txt").is_err());
    }

    #[test]
    fn test_resolve_entry_path_keeps_colons_in_names() {
        let root = Path::new("/tmp/out");
        assert_eq!(
            resolve_entry_path(root, "logs/log_12:30.txt").unwrap(),
            root.join("logs").join("log_12:30.txt")
        );
        assert_eq!(
            resolve_entry_path(root, "backup-2024-01-01T12:30:00.log").unwrap(),
            root.join("backup-2024-01-01T12:30:00.log")
        );
    }

    #[cfg(windows)]
    #[test]
    fn test_resolve_entry_path_rejects_drive_prefix() {
        assert!(resolve_entry_path(Path::new("C:\\out"), "D:/windows").is_err());
    }
}
