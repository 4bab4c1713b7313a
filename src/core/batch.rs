use crate::config::manifest::{
    BatchManifest, BatchSettings, JobAction, JobConfig, MAX_CONCURRENT_JOBS,
};
use crate::core::factory::{ArchiverFactory, CompressorFactory};
use crate::domain::ports::{Archiver, Compressor};
use crate::utils::error::{ArchiveError, Result};
use crate::utils::io::require_directory;
use crate::utils::validation::{validate_required_field, Validate};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Outcome of a single batch job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub name: String,
    pub action: JobAction,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_ms: u64,
}

impl JobReport {
    fn skipped(job: &JobConfig) -> Self {
        Self {
            name: job.name.clone(),
            action: job.action,
            status: JobStatus::Skipped,
            outputs: Vec::new(),
            entry_count: None,
            error: None,
            started_at: None,
            duration_ms: 0,
        }
    }

    fn failed(
        job: &JobConfig,
        started_at: DateTime<Utc>,
        duration_ms: u64,
        error: &ArchiveError,
    ) -> Self {
        Self {
            name: job.name.clone(),
            action: job.action,
            status: JobStatus::Failed,
            outputs: Vec::new(),
            entry_count: None,
            error: Some(error.to_string()),
            started_at: Some(started_at),
            duration_ms,
        }
    }
}

/// Aggregated result of a batch run, in manifest order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub jobs: Vec<JobReport>,
}

impl BatchReport {
    fn new(started_at: DateTime<Utc>, duration_ms: u64, jobs: Vec<JobReport>) -> Self {
        let count = |status: JobStatus| jobs.iter().filter(|j| j.status == status).count();
        Self {
            started_at,
            duration_ms,
            succeeded: count(JobStatus::Succeeded),
            failed: count(JobStatus::Failed),
            skipped: count(JobStatus::Skipped),
            jobs,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }

    pub fn job(&self, name: &str) -> Option<&JobReport> {
        self.jobs.iter().find(|j| j.name == name)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Default)]
struct JobOutcome {
    outputs: Vec<PathBuf>,
    entry_count: Option<usize>,
}

enum PendingJob {
    Skipped(JobReport),
    Running(JobConfig, JoinHandle<JobReport>),
}

/// Runs manifest jobs on the blocking pool, bounded by `concurrent_jobs`.
pub struct BatchEngine {
    settings: BatchSettings,
}

impl BatchEngine {
    pub fn new(settings: BatchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Validates the manifest, then runs its jobs with its settings.
    pub async fn run_manifest(manifest: &BatchManifest) -> Result<BatchReport> {
        manifest.validate()?;
        Self::new(manifest.settings.clone()).run(&manifest.jobs).await
    }

    pub async fn run(&self, jobs: &[JobConfig]) -> Result<BatchReport> {
        tracing::info!(
            "🚀 Starting batch of {} jobs ({} concurrent, fail_fast={})",
            jobs.len(),
            self.settings.concurrent_jobs,
            self.settings.fail_fast
        );
        let started_at = Utc::now();
        let clock = Instant::now();

        let permits = self.settings.concurrent_jobs.clamp(1, MAX_CONCURRENT_JOBS);
        let semaphore = Arc::new(Semaphore::new(permits));
        let aborted = Arc::new(AtomicBool::new(false));
        let mut pending = Vec::with_capacity(jobs.len());

        // Permits are taken in manifest order so jobs also start in that order.
        for job in jobs {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| ArchiveError::JobError {
                    job: job.name.clone(),
                    message: e.to_string(),
                })?;

            if self.settings.fail_fast && aborted.load(Ordering::SeqCst) {
                tracing::warn!("⏭️ Skipping job {} after an earlier failure", job.name);
                pending.push(PendingJob::Skipped(JobReport::skipped(job)));
                continue;
            }

            let task_job = job.clone();
            let aborted = Arc::clone(&aborted);
            let handle = tokio::task::spawn_blocking(move || {
                let report = run_job(&task_job);
                if report.status == JobStatus::Failed {
                    aborted.store(true, Ordering::SeqCst);
                }
                drop(permit);
                report
            });
            pending.push(PendingJob::Running(job.clone(), handle));
        }

        let mut reports = Vec::with_capacity(pending.len());
        for job in pending {
            let report = match job {
                PendingJob::Skipped(report) => report,
                PendingJob::Running(job, handle) => match handle.await {
                    Ok(report) => report,
                    Err(e) => {
                        let error = ArchiveError::JobError {
                            job: job.name.clone(),
                            message: e.to_string(),
                        };
                        tracing::error!("❌ {}", error);
                        JobReport::failed(&job, started_at, 0, &error)
                    }
                },
            };
            reports.push(report);
        }

        let report = BatchReport::new(started_at, elapsed_ms(clock), reports);
        tracing::info!(
            "✅ Batch finished: {} succeeded, {} failed, {} skipped",
            report.succeeded,
            report.failed,
            report.skipped
        );
        Ok(report)
    }
}

fn elapsed_ms(clock: Instant) -> u64 {
    u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn run_job(job: &JobConfig) -> JobReport {
    let started_at = Utc::now();
    let clock = Instant::now();
    tracing::info!("▶️ Job {} ({}) started", job.name, job.action);

    match execute(job) {
        Ok(outcome) => {
            let duration_ms = elapsed_ms(clock);
            tracing::info!("✅ Job {} finished in {} ms", job.name, duration_ms);
            JobReport {
                name: job.name.clone(),
                action: job.action,
                status: JobStatus::Succeeded,
                outputs: outcome.outputs,
                entry_count: outcome.entry_count,
                error: None,
                started_at: Some(started_at),
                duration_ms,
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Job {} failed: {} (Category: {:?}, Severity: {:?})",
                job.name,
                e,
                e.category(),
                e.severity()
            );
            JobReport::failed(job, started_at, elapsed_ms(clock), &e)
        }
    }
}

fn required<'a>(job: &JobConfig, field: &str, value: &'a Option<String>) -> Result<&'a String> {
    validate_required_field(&format!("jobs.{}.{}", job.name, field), value)
}

fn archiver_for(job: &JobConfig, archive: &str) -> Result<Box<dyn Archiver>> {
    match &job.format {
        Some(format) => {
            ArchiverFactory::create_archiver_from_names(format, job.compression.as_deref())
        }
        None => ArchiverFactory::create_archiver_for_path(Path::new(archive)),
    }
}

fn execute(job: &JobConfig) -> Result<JobOutcome> {
    match job.action {
        JobAction::Create => {
            let archive = required(job, "archive", &job.archive)?;
            let destination = required(job, "destination", &job.destination)?;
            let archiver = archiver_for(job, archive)?;
            let created = archiver.create(archive, Path::new(destination), &job.source_paths())?;
            Ok(JobOutcome {
                outputs: vec![created],
                entry_count: None,
            })
        }
        JobAction::Extract => {
            let archive = required(job, "archive", &job.archive)?;
            let destination = required(job, "destination", &job.destination)?;
            let archiver = archiver_for(job, archive)?;
            archiver.extract(Path::new(archive), Path::new(destination))?;
            Ok(JobOutcome {
                outputs: vec![PathBuf::from(destination)],
                entry_count: None,
            })
        }
        JobAction::List => {
            let archive = required(job, "archive", &job.archive)?;
            let entries = archiver_for(job, archive)?.list(Path::new(archive))?;
            for entry in &entries {
                tracing::debug!("{} {}", job.name, entry.name);
            }
            Ok(JobOutcome {
                outputs: Vec::new(),
                entry_count: Some(entries.len()),
            })
        }
        JobAction::Compress => {
            let compression = required(job, "compression", &job.compression)?;
            let destination = required(job, "destination", &job.destination)?;
            let compressor = CompressorFactory::create_compressor_from_name(compression)?;
            require_directory(Path::new(destination))?;
            let outputs = job
                .source_paths()
                .iter()
                .map(|source| compressor.compress(source, Path::new(destination)))
                .collect::<Result<Vec<_>>>()?;
            Ok(JobOutcome {
                outputs,
                entry_count: None,
            })
        }
        JobAction::Decompress => {
            let destination = required(job, "destination", &job.destination)?;
            require_directory(Path::new(destination))?;
            let mut outputs = Vec::new();
            for source in job.source_paths() {
                let compressor: Box<dyn Compressor> = match &job.compression {
                    Some(name) => CompressorFactory::create_compressor_from_name(name)?,
                    None => CompressorFactory::create_compressor_for_path(&source)?,
                };
                outputs.push(compressor.decompress(&source, Path::new(destination))?);
            }
            Ok(JobOutcome {
                outputs,
                entry_count: None,
            })
        }
    }
}
