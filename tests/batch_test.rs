use anyhow::Result;
use archivekit::{BatchEngine, BatchManifest, JobStatus};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn toml_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[tokio::test]
async fn test_manifest_end_to_end() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    fs::create_dir_all(root.join("docs"))?;
    fs::write(root.join("docs/guide.md"), "# Guide\n")?;
    fs::write(root.join("log.txt"), "line\n".repeat(50))?;

    let manifest = format!(
        r#"
[settings]
concurrent_jobs = 2

[[jobs]]
name = "docs-zip"
action = "create"
archive = "docs.zip"
destination = "{root}/out"
sources = ["{root}/docs"]

[[jobs]]
name = "docs-txz"
action = "create"
format = "tar"
compression = "xz"
archive = "docs"
destination = "{root}/out"
sources = ["{root}/docs"]

[[jobs]]
name = "log-gz"
action = "compress"
compression = "gz"
destination = "{root}/out"
sources = ["{root}/log.txt"]
"#,
        root = toml_path(root)
    );
    let manifest_path = root.join("archivekit.toml");
    fs::write(&manifest_path, manifest)?;

    let report = BatchEngine::run_manifest(&BatchManifest::from_file(&manifest_path)?).await?;
    assert!(report.is_success());
    assert_eq!(report.succeeded, 3);
    let names: Vec<&str> = report.jobs.iter().map(|j| j.name.as_str()).collect();
    assert_eq!(names, vec!["docs-zip", "docs-txz", "log-gz"]);

    assert!(root.join("out/docs.zip").exists());
    assert!(root.join("out/docs.tar.xz").exists());
    assert!(root.join("out/log.txt.gz").exists());

    let follow_up = format!(
        r#"
[[jobs]]
name = "unpack"
action = "extract"
archive = "{root}/out/docs.tar.xz"
destination = "{root}/restored"

[[jobs]]
name = "peek"
action = "list"
archive = "{root}/out/docs.zip"

[[jobs]]
name = "unlog"
action = "decompress"
destination = "{root}/restored"
sources = ["{root}/out/log.txt.gz"]
"#,
        root = toml_path(root)
    );

    let report = BatchEngine::run_manifest(&BatchManifest::from_toml_str(&follow_up)?).await?;
    assert!(report.is_success());
    assert_eq!(report.job("peek").and_then(|j| j.entry_count), Some(2));
    assert_eq!(fs::read_to_string(root.join("restored/docs/guide.md"))?, "# Guide\n");
    assert_eq!(fs::read_to_string(root.join("restored/log.txt"))?, "line\n".repeat(50));
    Ok(())
}

#[tokio::test]
async fn test_failed_job_does_not_stop_others() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let root = toml_path(temp_dir.path());
    let manifest = BatchManifest::from_toml_str(&format!(
        r#"
[[jobs]]
name = "broken"
action = "extract"
archive = "{root}/missing.tar.gz"
destination = "{root}/out"

[[jobs]]
name = "unknown-type"
action = "list"
archive = "{root}/file.unknown"
"#
    ))?;

    let report = BatchEngine::run_manifest(&manifest).await?;
    assert_eq!(report.failed, 2);
    assert!(report.jobs.iter().all(|j| j.status == JobStatus::Failed));
    assert!(report.jobs[1]
        .error
        .as_deref()
        .unwrap_or_default()
        .contains("Unknown file type"));
    Ok(())
}
