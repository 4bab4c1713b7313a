use crate::domain::model::{ArchiveFormat, CompressionType};
use crate::utils::error::{ArchiveError, Result};
use crate::utils::validation::{
    validate_non_empty_list, validate_non_empty_string, validate_one_of, validate_path,
    validate_range, validate_required_field, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// A TOML batch manifest: global settings plus a list of jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchManifest {
    #[serde(default)]
    pub settings: BatchSettings,
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    #[serde(default = "default_concurrent_jobs")]
    pub concurrent_jobs: usize,
    #[serde(default)]
    pub fail_fast: bool,
}

/// Upper bound for `settings.concurrent_jobs`.
pub const MAX_CONCURRENT_JOBS: usize = 1024;

fn default_concurrent_jobs() -> usize {
    4
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            concurrent_jobs: default_concurrent_jobs(),
            fail_fast: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobAction {
    Create,
    Extract,
    List,
    Compress,
    Decompress,
}

impl fmt::Display for JobAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobAction::Create => "create",
            JobAction::Extract => "extract",
            JobAction::List => "list",
            JobAction::Compress => "compress",
            JobAction::Decompress => "decompress",
        };
        f.write_str(name)
    }
}

/// One unit of work in a manifest.
///
/// `archive` is the archive name for `create` and the archive path for
/// `extract`/`list`. `sources` are the inputs of `create`, `compress` and
/// `decompress`. Without `format`, the format is taken from the archive name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub action: JobAction,
    pub format: Option<String>,
    pub compression: Option<String>,
    pub archive: Option<String>,
    pub destination: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl JobConfig {
    pub fn source_paths(&self) -> Vec<PathBuf> {
        self.sources.iter().map(PathBuf::from).collect()
    }

    fn field(&self, name: &str) -> String {
        format!("jobs.{}.{}", self.name, name)
    }

    fn require_path(&self, name: &str, value: &Option<String>) -> Result<()> {
        let field = self.field(name);
        validate_path(&field, validate_required_field(&field, value)?)
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("jobs.name", &self.name)?;

        if let Some(format) = &self.format {
            let names: Vec<&str> = ArchiveFormat::ALL.iter().map(|f| f.name()).collect();
            validate_one_of(&self.field("format"), format, &names)?;
        }
        if let Some(compression) = &self.compression {
            let names: Vec<&str> = CompressionType::ALL.iter().map(|c| c.name()).collect();
            validate_one_of(&self.field("compression"), compression, &names)?;
        }

        match self.action {
            JobAction::Create => {
                self.require_path("archive", &self.archive)?;
                self.require_path("destination", &self.destination)?;
                validate_non_empty_list(&self.field("sources"), &self.sources)?;
            }
            JobAction::Extract => {
                self.require_path("archive", &self.archive)?;
                self.require_path("destination", &self.destination)?;
            }
            JobAction::List => {
                self.require_path("archive", &self.archive)?;
            }
            JobAction::Compress => {
                validate_required_field(&self.field("compression"), &self.compression)?;
                self.require_path("destination", &self.destination)?;
                validate_non_empty_list(&self.field("sources"), &self.sources)?;
            }
            JobAction::Decompress => {
                self.require_path("destination", &self.destination)?;
                validate_non_empty_list(&self.field("sources"), &self.sources)?;
            }
        }

        for source in &self.sources {
            validate_path(&self.field("sources"), source)?;
        }
        Ok(())
    }
}

impl BatchManifest {
    /// 從 TOML 檔案載入
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ArchiveError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ArchiveError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ArchiveError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for BatchManifest {
    fn validate(&self) -> Result<()> {
        validate_range(
            "settings.concurrent_jobs",
            self.settings.concurrent_jobs,
            1,
            MAX_CONCURRENT_JOBS,
        )?;
        validate_non_empty_list("jobs", &self.jobs)?;

        let mut names = HashSet::new();
        for job in &self.jobs {
            job.validate()?;
            if !names.insert(job.name.as_str()) {
                return Err(ArchiveError::InvalidConfigValueError {
                    field: "jobs.name".to_string(),
                    value: job.name.clone(),
                    reason: "Job names must be unique".to_string(),
                });
            }
        }
        Ok(())
    }
}
