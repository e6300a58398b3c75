use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use summerlog_core::{Cadence, Error, Result, RetryPolicy, SchedulerBackend};

// ============================================================================
// Config (~/.config/summerlog/config.toml)
// ============================================================================

/// Persisted summerlog settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub summary: SummaryConfig,

    #[serde(default)]
    pub mail: MailConfig,

    #[serde(default)]
    pub collection: CollectionConfig,

    #[serde(default)]
    pub redaction: RedactionConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_summary_timeout")]
    pub timeout_secs: u64,

    /// Trailing characters of each container's log sent for summarization
    #[serde(default = "default_max_log_chars")]
    pub max_log_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub from: String,

    #[serde(default)]
    pub to: Vec<String>,

    #[serde(default = "default_mail_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Containers to summarize; empty means every running container
    #[serde(default)]
    pub containers: Vec<String>,

    /// Window for the first run, before any run has succeeded
    #[serde(default = "default_since_hours")]
    pub since_hours: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_lines: Option<usize>,

    #[serde(default = "default_collection_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedactionConfig {
    /// Extra patterns applied after the built-in rules, in order
    #[serde(default)]
    pub custom_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub cadence: Cadence,

    #[serde(default)]
    pub backend: SchedulerBackend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Age after which an in-progress marker is treated as abandoned
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_api_base(),
            model: default_model(),
            timeout_secs: default_summary_timeout(),
            max_log_chars: default_max_log_chars(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from: String::new(),
            to: Vec::new(),
            timeout_secs: default_mail_timeout(),
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            containers: Vec::new(),
            since_hours: default_since_hours(),
            max_lines: None,
            timeout_secs: default_collection_timeout(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_summary_timeout() -> u64 {
    60
}

fn default_max_log_chars() -> usize {
    20_000
}

fn default_smtp_port() -> u16 {
    587
}

fn default_mail_timeout() -> u64 {
    30
}

fn default_since_hours() -> u32 {
    24
}

fn default_collection_timeout() -> u64 {
    30
}

fn default_stale_after() -> u64 {
    2 * 60 * 60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    2_000
}

fn default_max_delay() -> u64 {
    30_000
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

impl RunConfig {
    pub fn stale_after(&self) -> time::Duration {
        time::Duration::seconds(i64::try_from(self.stale_after_secs).unwrap_or(i64::MAX))
    }
}

impl Config {
    /// Check that everything a run needs is present and well-formed.
    ///
    /// Reports every problem at once so the wizard and the scheduled job can
    /// print a single actionable message.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.summary.api_key.trim().is_empty() {
            problems.push("summary.api_key is missing".to_string());
        }
        if !self.summary.api_base.starts_with("http://")
            && !self.summary.api_base.starts_with("https://")
        {
            problems.push(format!(
                "summary.api_base must start with http:// or https:// (got '{}')",
                self.summary.api_base
            ));
        }
        if self.mail.host.trim().is_empty() {
            problems.push("mail.host is missing".to_string());
        }
        if self.mail.port == 0 {
            problems.push("mail port invalid: must be between 1 and 65535".to_string());
        }
        if self.mail.from.trim().is_empty() {
            problems.push("mail.from is missing".to_string());
        } else if !looks_like_email(&self.mail.from) {
            problems.push(format!("mail.from '{}' is not an email address", self.mail.from));
        }
        if self.mail.to.iter().all(|addr| addr.trim().is_empty()) {
            problems.push("mail.to is missing".to_string());
        }
        for addr in self.mail.to.iter().filter(|a| !a.trim().is_empty()) {
            if !looks_like_email(addr) {
                problems.push(format!("mail.to '{}' is not an email address", addr));
            }
        }
        if self.retry.max_attempts == 0 {
            problems.push("retry.max_attempts must be at least 1".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(problems.join("; ")))
        }
    }
}

/// Basic shape check: something@domain.tld
pub fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    // Accept "Name <addr@host>" as well
    let addr = match (value.find('<'), value.rfind('>')) {
        (Some(start), Some(end)) if start < end => &value[start + 1..end],
        _ => value,
    };
    match addr.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Parse a port typed by the user, with a remediation message on failure.
pub fn parse_port(value: &str) -> Result<u16> {
    match value.trim().parse::<u32>() {
        Ok(port) if (1..=65535).contains(&port) => Ok(port as u16),
        Ok(_) => Err(Error::Config(
            "mail port invalid: must be between 1 and 65535".to_string(),
        )),
        Err(_) => Err(Error::Config("mail port invalid: must be an integer".to_string())),
    }
}

// ============================================================================
// ConfigStore
// ============================================================================

const CONFIG_FILE: &str = "config.toml";
const STATE_FILE: &str = "state.toml";

/// Location of the config and run-state files
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store at the platform config directory
    pub fn from_default_location() -> Self {
        Self::new(Self::default_dir())
    }

    /// Get the default config directory
    pub fn default_dir() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "summerlog", "summerlog") {
            dirs.config_dir().to_path_buf()
        } else {
            PathBuf::from("~/.config/summerlog")
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// Run-state file, kept alongside the config
    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    pub fn exists(&self) -> bool {
        self.config_path().exists()
    }

    /// Load the config; a missing file is a configuration error.
    pub fn load(&self) -> Result<Config> {
        let path = self.config_path();
        if !path.exists() {
            return Err(Error::Config(format!(
                "no configuration at {}; run `summerlog configure` first",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid {}: {}", path.display(), e)))
    }

    /// Load the config, or defaults when none has been written yet.
    pub fn load_or_default(&self) -> Result<Config> {
        if self.exists() {
            self.load()
        } else {
            Ok(Config::default())
        }
    }

    /// Write the config atomically (temp file + rename), owner-only on Unix.
    pub fn save(&self, config: &Config) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let content = toml::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("could not serialize config: {}", e)))?;

        let path = self.config_path();
        let tmp = self.dir.join(format!("{}.tmp", CONFIG_FILE));
        std::fs::write(&tmp, content)?;
        restrict_permissions(&tmp)?;
        std::fs::rename(&tmp, &path)?;

        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
