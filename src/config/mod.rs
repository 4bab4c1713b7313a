pub mod manifest;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "archivekit")]
#[command(version)]
#[command(about = "Create, extract and compress archives")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create an archive from files and directories
    Create {
        /// Archive name; the format extension is appended when missing
        archive: String,

        #[arg(short, long, default_value = ".")]
        destination: PathBuf,

        /// Archive format (ar, cpio, jar, tar, zip, 7z); inferred from the name when omitted
        #[arg(short, long)]
        format: Option<String>,

        /// Compression applied to the archive (bzip2, gz, xz)
        #[arg(short, long)]
        compression: Option<String>,

        #[arg(required = true)]
        sources: Vec<PathBuf>,
    },

    /// Extract an archive into a directory
    Extract {
        archive: PathBuf,

        #[arg(short, long, default_value = ".")]
        destination: PathBuf,

        #[arg(short, long)]
        format: Option<String>,

        #[arg(short, long)]
        compression: Option<String>,
    },

    /// List the entries of an archive
    List {
        archive: PathBuf,

        #[arg(short, long)]
        format: Option<String>,

        #[arg(short, long)]
        compression: Option<String>,

        /// Print the entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compress a single file
    Compress {
        source: PathBuf,

        #[arg(short, long, default_value = "gz")]
        compression: String,

        /// Output file or directory; defaults to the source directory
        #[arg(short, long)]
        destination: Option<PathBuf>,
    },

    /// Decompress a single file
    Decompress {
        source: PathBuf,

        /// Compression type; inferred from the file name when omitted
        #[arg(short, long)]
        compression: Option<String>,

        #[arg(short, long)]
        destination: Option<PathBuf>,
    },

    /// Run the jobs of a TOML manifest
    Batch {
        #[arg(short, long, default_value = "archivekit.toml")]
        manifest: PathBuf,

        /// Override settings.concurrent_jobs
        #[arg(long)]
        concurrent_jobs: Option<usize>,

        /// Override settings.fail_fast
        #[arg(long)]
        fail_fast: Option<bool>,

        /// Write the JSON report to this file instead of stdout
        #[arg(long)]
        report: Option<PathBuf>,

        /// Validate the manifest and print the jobs without running them
        #[arg(long)]
        dry_run: bool,
    },
}
