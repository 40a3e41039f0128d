use crate::error::HarvestError;
use crate::youtube::{DEFAULT_API_BASE, MAX_PAGE_SIZE};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Run options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct HarvestOptions {
    pub credentials: Vec<String>,      // rotation order = configured order
    pub queries: Vec<String>,          // walked in order, each from its first page
    pub output: PathBuf,
    pub target: usize,                 // stop once this many records are collected
    pub checkpoint_every: usize,       // save whenever the count hits a multiple of this
    pub page_size: u32,                // 1..=MAX_PAGE_SIZE
    pub min_subscribers: u64,          // accept iff subscriberCount >= this
    pub rate_limit_backoff: Duration,
    pub remote_error_backoff: Duration,
    pub max_consecutive_failures: Option<u32>, // None retries forever
    pub progress: bool,
    pub api_base: String,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            credentials: Vec::new(),
            queries: Vec::new(),
            output: PathBuf::from("channels.csv"),
            target: 5000,
            checkpoint_every: 100,
            page_size: 50,
            min_subscribers: 5000,
            rate_limit_backoff: Duration::from_secs(10),
            remote_error_backoff: Duration::from_secs(5),
            max_consecutive_failures: None,
            progress: true,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

impl HarvestOptions {
    pub fn with_credentials<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.credentials = keys.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_queries<I, S>(mut self, queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.queries = queries.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_output(mut self, path: impl AsRef<Path>) -> Self {
        self.output = path.as_ref().to_path_buf();
        self
    }
    pub fn with_target(mut self, n: usize) -> Self {
        self.target = n;
        self
    }
    pub fn with_checkpoint_interval(mut self, n: usize) -> Self {
        self.checkpoint_every = n;
        self
    }
    pub fn with_page_size(mut self, n: u32) -> Self {
        self.page_size = n;
        self
    }
    pub fn with_min_subscribers(mut self, n: u64) -> Self {
        self.min_subscribers = n;
        self
    }
    pub fn with_backoff(mut self, rate_limited: Duration, remote_error: Duration) -> Self {
        self.rate_limit_backoff = rate_limited;
        self.remote_error_backoff = remote_error;
        self
    }
    pub fn with_max_consecutive_failures(mut self, cap: Option<u32>) -> Self {
        self.max_consecutive_failures = cap;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Reject anything that would make a run meaningless before any work starts.
    pub fn validate(&self) -> Result<(), HarvestError> {
        let bad = |msg: String| Err(HarvestError::Configuration(msg));
        if self.credentials.is_empty() {
            return bad("no API credentials configured".into());
        }
        if self.credentials.iter().any(|c| c.trim().is_empty()) {
            return bad("credential list contains a blank entry".into());
        }
        if self.queries.is_empty() {
            return bad("no search queries configured".into());
        }
        if self.queries.iter().any(|q| q.trim().is_empty()) {
            return bad("query list contains a blank entry".into());
        }
        if self.output.as_os_str().is_empty() {
            return bad("output path is empty".into());
        }
        if self.target == 0 {
            return bad("target must be a positive integer".into());
        }
        if self.checkpoint_every == 0 {
            return bad("checkpoint interval must be a positive integer".into());
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return bad(format!("page size must be within 1..={MAX_PAGE_SIZE}, got {}", self.page_size));
        }
        if let Some(0) = self.max_consecutive_failures {
            return bad("max_consecutive_failures must be positive when set".into());
        }
        Ok(())
    }

    /// Read options from a JSON file. Missing keys keep their defaults; unknown keys are rejected.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        let file: FileConfig = serde_json::from_str(&text)
            .map_err(|e| HarvestError::Configuration(format!("{}: {e}", path.display())))?;
        Ok(file.apply(Self::default()))
    }

    /// Overlay `HARVEST_*` environment variables on top of these options.
    /// - HARVEST_API_KEYS: comma/semicolon/space separated
    /// - HARVEST_QUERIES: `;` or newline separated (queries contain spaces)
    /// - HARVEST_OUTPUT, HARVEST_TARGET, HARVEST_CHECKPOINT_EVERY, HARVEST_PAGE_SIZE, HARVEST_MIN_SUBSCRIBERS
    pub fn merge_env(mut self) -> Result<Self, HarvestError> {
        if let Some(s) = env_str("HARVEST_API_KEYS") {
            self.credentials = split_list(&s, |c| c == ',' || c == ';' || c.is_whitespace());
        }
        if let Some(s) = env_str("HARVEST_QUERIES") {
            self.queries = split_list(&s, |c| c == ';' || c == '\n');
        }
        if let Some(s) = env_str("HARVEST_OUTPUT") {
            self.output = PathBuf::from(s);
        }
        if let Some(n) = env_number("HARVEST_TARGET")? { self.target = n; }
        if let Some(n) = env_number("HARVEST_CHECKPOINT_EVERY")? { self.checkpoint_every = n; }
        if let Some(n) = env_number("HARVEST_PAGE_SIZE")? { self.page_size = n; }
        if let Some(n) = env_number("HARVEST_MIN_SUBSCRIBERS")? { self.min_subscribers = n; }
        Ok(self)
    }
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    credentials: Option<Vec<String>>,
    queries: Option<Vec<String>>,
    output: Option<PathBuf>,
    target: Option<usize>,
    checkpoint_every: Option<usize>,
    page_size: Option<u32>,
    min_subscribers: Option<u64>,
    rate_limit_backoff_secs: Option<u64>,
    remote_error_backoff_secs: Option<u64>,
    max_consecutive_failures: Option<u32>,
    progress: Option<bool>,
    api_base: Option<String>,
}

impl FileConfig {
    fn apply(self, mut o: HarvestOptions) -> HarvestOptions {
        if let Some(v) = self.credentials { o.credentials = v; }
        if let Some(v) = self.queries { o.queries = v; }
        if let Some(v) = self.output { o.output = v; }
        if let Some(v) = self.target { o.target = v; }
        if let Some(v) = self.checkpoint_every { o.checkpoint_every = v; }
        if let Some(v) = self.page_size { o.page_size = v; }
        if let Some(v) = self.min_subscribers { o.min_subscribers = v; }
        if let Some(v) = self.rate_limit_backoff_secs { o.rate_limit_backoff = Duration::from_secs(v); }
        if let Some(v) = self.remote_error_backoff_secs { o.remote_error_backoff = Duration::from_secs(v); }
        if self.max_consecutive_failures.is_some() { o.max_consecutive_failures = self.max_consecutive_failures; }
        if let Some(v) = self.progress { o.progress = v; }
        if let Some(v) = self.api_base { o.api_base = v; }
        o
    }
}

fn env_str(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn env_number<T: FromStr>(name: &str) -> Result<Option<T>, HarvestError> {
    match env_str(name) {
        None => Ok(None),
        Some(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| HarvestError::Configuration(format!("{name}={s:?} is not a valid number"))),
    }
}

fn split_list(s: &str, sep: impl Fn(char) -> bool) -> Vec<String> {
    s.split(sep)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}
