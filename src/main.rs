use archivekit::utils::error::{ArchiveError, ErrorSeverity};
use archivekit::utils::{logger, validation::Validate};
use archivekit::{
    Archiver, ArchiverFactory, BatchEngine, BatchManifest, CliConfig, Command, Compressor,
    CompressorFactory, JobStatus,
};
use clap::Parser;
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger(config.verbose);
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting archivekit CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = run(config.command).await {
        tracing::error!(
            "❌ Operation failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn archiver_for(
    archive: &Path,
    format: Option<&str>,
    compression: Option<&str>,
) -> archivekit::Result<Box<dyn Archiver>> {
    match format {
        Some(format) => ArchiverFactory::create_archiver_from_names(format, compression),
        None => ArchiverFactory::create_archiver_for_path(archive),
    }
}

/// Directory next to `source`, used when no destination is given.
fn sibling_directory(source: &Path) -> PathBuf {
    source
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

async fn run(command: Command) -> archivekit::Result<()> {
    match command {
        Command::Create {
            archive,
            destination,
            format,
            compression,
            sources,
        } => {
            let archiver = archiver_for(Path::new(&archive), format.as_deref(), compression.as_deref())?;
            let created = archiver.create(&archive, &destination, &sources)?;
            println!("✅ Created {}", created.display());
        }
        Command::Extract {
            archive,
            destination,
            format,
            compression,
        } => {
            let archiver = archiver_for(&archive, format.as_deref(), compression.as_deref())?;
            archiver.extract(&archive, &destination)?;
            println!("✅ Extracted {} into {}", archive.display(), destination.display());
        }
        Command::List {
            archive,
            format,
            compression,
            json,
        } => {
            let archiver = archiver_for(&archive, format.as_deref(), compression.as_deref())?;
            let entries = archiver.list(&archive)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in &entries {
                    let modified = entry
                        .last_modified
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".to_string());
                    let kind = if entry.is_directory { 'd' } else { '-' };
                    println!("{} {:>12} {:>16} {}", kind, entry.size, modified, entry.name);
                }
            }
        }
        Command::Compress {
            source,
            compression,
            destination,
        } => {
            let compressor = CompressorFactory::create_compressor_from_name(&compression)?;
            let destination = destination.unwrap_or_else(|| sibling_directory(&source));
            let compressed = compressor.compress(&source, &destination)?;
            println!("✅ Compressed into {}", compressed.display());
        }
        Command::Decompress {
            source,
            compression,
            destination,
        } => {
            let compressor: Box<dyn Compressor> = match compression {
                Some(name) => CompressorFactory::create_compressor_from_name(&name)?,
                None => CompressorFactory::create_compressor_for_path(&source)?,
            };
            let destination = destination.unwrap_or_else(|| sibling_directory(&source));
            let decompressed = compressor.decompress(&source, &destination)?;
            println!("✅ Decompressed into {}", decompressed.display());
        }
        Command::Batch {
            manifest,
            concurrent_jobs,
            fail_fast,
            report,
            dry_run,
        } => {
            tracing::info!("📁 Loading manifest from: {}", manifest.display());
            let mut batch = BatchManifest::from_file(&manifest)?;

            // 應用命令列覆蓋設定
            if let Some(concurrent_jobs) = concurrent_jobs {
                batch.settings.concurrent_jobs = concurrent_jobs;
            }
            if let Some(fail_fast) = fail_fast {
                batch.settings.fail_fast = fail_fast;
            }

            batch.validate()?;
            tracing::info!("✅ Manifest loaded and validated ({} jobs)", batch.jobs.len());

            if dry_run {
                tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
                for job in &batch.jobs {
                    println!("{:<24} {}", job.name, job.action);
                }
                return Ok(());
            }

            let batch_report = BatchEngine::run_manifest(&batch).await?;
            let json = batch_report.to_json()?;
            match report {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("📁 Report saved to: {}", path.display());
                }
                None => println!("{}", json),
            }

            if !batch_report.is_success() {
                let failed: Vec<&str> = batch_report
                    .jobs
                    .iter()
                    .filter(|j| j.status == JobStatus::Failed)
                    .map(|j| j.name.as_str())
                    .collect();
                return Err(ArchiveError::JobError {
                    job: failed.join(", "),
                    message: format!(
                        "{} failed, {} skipped",
                        batch_report.failed, batch_report.skipped
                    ),
                });
            }
        }
    }
    Ok(())
}
