use anyhow::Result;
use archivekit::{ArchiveFormat, Archiver, ArchiverFactory, CompressionType};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builds `project/{README.md, src/main.rs, src/lib/util.rs}` plus `notes.txt` under `root`.
fn sample_tree(root: &Path) -> Result<Vec<PathBuf>> {
    let project = root.join("project");
    fs::create_dir_all(project.join("src/lib"))?;
    fs::write(project.join("README.md"), "# Project\n")?;
    fs::write(project.join("src/main.rs"), "fn main() {}\n")?;
    fs::write(project.join("src/lib/util.rs"), "pub fn util() {}\n")?;
    let notes = root.join("notes.txt");
    fs::write(&notes, "remember the milk\n")?;
    Ok(vec![project, notes])
}

fn assert_tree_restored(out: &Path) -> Result<()> {
    assert_eq!(fs::read_to_string(out.join("project/README.md"))?, "# Project\n");
    assert_eq!(fs::read_to_string(out.join("project/src/main.rs"))?, "fn main() {}\n");
    assert_eq!(fs::read_to_string(out.join("project/src/lib/util.rs"))?, "pub fn util() {}\n");
    assert_eq!(fs::read_to_string(out.join("notes.txt"))?, "remember the milk\n");
    Ok(())
}

fn round_trip(archiver: Box<dyn Archiver>, expected_name: &str) -> Result<()> {
    let temp_dir = TempDir::new()?;
    let sources = sample_tree(temp_dir.path())?;
    let archives = temp_dir.path().join("archives");
    fs::create_dir_all(&archives)?;

    let archive = archiver.create("bundle", &archives, &sources)?;
    assert_eq!(archive, archives.join(expected_name));

    let out = temp_dir.path().join("out");
    fs::create_dir_all(&out)?;
    archiver.extract(&archive, &out)?;
    assert_tree_restored(&out)
}

#[test]
fn test_tar_round_trip() -> Result<()> {
    round_trip(ArchiverFactory::create_archiver(ArchiveFormat::Tar), "bundle.tar")
}

#[test]
fn test_zip_round_trip() -> Result<()> {
    round_trip(ArchiverFactory::create_archiver(ArchiveFormat::Zip), "bundle.zip")
}

#[test]
fn test_cpio_round_trip() -> Result<()> {
    round_trip(ArchiverFactory::create_archiver(ArchiveFormat::Cpio), "bundle.cpio")
}

#[test]
fn test_7z_round_trip() -> Result<()> {
    round_trip(ArchiverFactory::create_archiver(ArchiveFormat::SevenZ), "bundle.7z")
}

#[test]
fn test_compressed_tar_round_trips() -> Result<()> {
    for (compression, name) in [
        (CompressionType::Gzip, "bundle.tar.gz"),
        (CompressionType::Bzip2, "bundle.tar.bz2"),
        (CompressionType::Xz, "bundle.tar.xz"),
    ] {
        round_trip(
            ArchiverFactory::create_compressed_archiver(ArchiveFormat::Tar, compression),
            name,
        )?;
    }
    Ok(())
}

#[test]
fn test_compressed_zip_round_trip() -> Result<()> {
    round_trip(
        ArchiverFactory::create_compressed_archiver(ArchiveFormat::Zip, CompressionType::Gzip),
        "bundle.zip.gz",
    )
}

#[test]
fn test_jar_starts_with_manifest() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let sources = sample_tree(temp_dir.path())?;
    let archiver = ArchiverFactory::create_archiver(ArchiveFormat::Jar);
    let archive = archiver.create("app", temp_dir.path(), &sources)?;

    let names: Vec<String> = archiver.list(&archive)?.into_iter().map(|e| e.name).collect();
    assert_eq!(names[0], "META-INF");
    assert_eq!(names[1], "META-INF/MANIFEST.MF");
    assert!(names.contains(&"project/src/lib/util.rs".to_string()));
    Ok(())
}

#[test]
fn test_ar_keeps_flat_files() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let objects = temp_dir.path().join("objects");
    fs::create_dir_all(&objects)?;
    fs::write(objects.join("a.o"), b"\x7fELF-a")?;
    fs::write(objects.join("b.o"), b"\x7fELF-b")?;

    let archiver = ArchiverFactory::create_archiver(ArchiveFormat::Ar);
    let archive = archiver.create("libobjects.a", temp_dir.path(), &[objects])?;
    assert_eq!(archive, temp_dir.path().join("libobjects.a.ar"));

    let names: Vec<String> = archiver.list(&archive)?.into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["a.o", "b.o"]);

    let out = temp_dir.path().join("out");
    fs::create_dir_all(&out)?;
    archiver.extract(&archive, &out)?;
    assert_eq!(fs::read(out.join("b.o"))?, b"\x7fELF-b");
    Ok(())
}

#[test]
fn test_extract_from_reader() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let sources = sample_tree(temp_dir.path())?;

    for archiver in [
        ArchiverFactory::create_compressed_archiver(ArchiveFormat::Tar, CompressionType::Gzip),
        ArchiverFactory::create_archiver(ArchiveFormat::Zip),
    ] {
        let archive = archiver.create("stream", temp_dir.path(), &sources)?;
        let bytes = fs::read(&archive)?;

        let out = TempDir::new()?;
        archiver.extract_reader(&mut bytes.as_slice(), out.path())?;
        assert_tree_restored(out.path())?;
    }
    Ok(())
}

#[test]
fn test_factory_by_path_reads_what_was_written() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let sources = sample_tree(temp_dir.path())?;
    let archive = ArchiverFactory::create_archiver_from_names("tar", Some("bzip2"))?
        .create("site", temp_dir.path(), &sources)?;

    let renamed = temp_dir.path().join("site.tbz2");
    fs::rename(&archive, &renamed)?;

    let entries = ArchiverFactory::create_archiver_for_path(&renamed)?.list(&renamed)?;
    let readme = entries
        .iter()
        .find(|e| e.name == "project/README.md")
        .expect("README entry");
    assert_eq!(readme.size, 10);
    assert!(!readme.is_directory);
    assert!(entries.iter().any(|e| e.name == "project/src" && e.is_directory));
    Ok(())
}

#[test]
fn test_create_with_missing_source_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let archiver = ArchiverFactory::create_archiver(ArchiveFormat::Tar);
    let result = archiver.create("x", temp_dir.path(), &[temp_dir.path().join("missing")]);

    assert!(matches!(result, Err(archivekit::ArchiveError::InvalidSource { .. })));
    assert!(!temp_dir.path().join("x.tar").exists());
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_tar_preserves_executable_bit() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new()?;
    let script = temp_dir.path().join("run.sh");
    fs::write(&script, "#!/bin/sh\n")?;
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755))?;

    let archiver = ArchiverFactory::create_archiver(ArchiveFormat::Tar);
    let archive = archiver.create("scripts", temp_dir.path(), &[script])?;
    let out = temp_dir.path().join("out");
    fs::create_dir_all(&out)?;
    archiver.extract(&archive, &out)?;

    let mode = fs::metadata(out.join("run.sh"))?.permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_read_only_directory_round_trip() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new()?;
    let ro = temp_dir.path().join("ro");
    fs::create_dir_all(&ro)?;
    fs::write(ro.join("a.txt"), "inside\n")?;
    fs::set_permissions(&ro, fs::Permissions::from_mode(0o555))?;

    let archives = temp_dir.path().join("archives");
    let out = temp_dir.path().join("out");
    for archiver in [
        ArchiverFactory::create_archiver(ArchiveFormat::Tar),
        ArchiverFactory::create_archiver(ArchiveFormat::Cpio),
    ] {
        let archive = archiver.create("ro", &archives, &[ro.clone()])?;
        let target = out.join(archiver.filename_extension().trim_start_matches('.'));
        archiver.extract(&archive, &target)?;

        let extracted = target.join("ro");
        assert_eq!(fs::read_to_string(extracted.join("a.txt"))?, "inside\n");
        assert_eq!(fs::metadata(&extracted)?.permissions().mode() & 0o777, 0o555);
        fs::set_permissions(&extracted, fs::Permissions::from_mode(0o755))?;
    }

    fs::set_permissions(&ro, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_names_with_colons_round_trip() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let logs = temp_dir.path().join("logs");
    fs::create_dir_all(&logs)?;
    fs::write(logs.join("backup-2024-01-01T12:30:00.log"), "tar\n")?;
    fs::write(logs.join("log_12:30.txt"), "cpio\n")?;

    for archiver in [
        ArchiverFactory::create_archiver(ArchiveFormat::Tar),
        ArchiverFactory::create_archiver(ArchiveFormat::Cpio),
        ArchiverFactory::create_archiver(ArchiveFormat::Zip),
    ] {
        let archive = archiver.create("logs", temp_dir.path(), &[logs.clone()])?;
        let out = TempDir::new()?;
        archiver.extract(&archive, out.path())?;

        assert_eq!(
            fs::read_to_string(out.path().join("logs/backup-2024-01-01T12:30:00.log"))?,
            "tar\n"
        );
        assert_eq!(fs::read_to_string(out.path().join("logs/log_12:30.txt"))?, "cpio\n");
    }
    Ok(())
}
