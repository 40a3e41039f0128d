//! Error kinds: local fatal failures (`HarvestError`) and remote call classes (`RemoteError`).

use std::path::PathBuf;
use thiserror::Error;

/// Failures that stop a run. Everything remote-side is absorbed by the engine
/// unless a retry cap was configured.
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("cannot read persisted records from {}: {reason}", .path.display())]
    StorageRead { path: PathBuf, reason: String },
    #[error("cannot write records to {}: {reason}", .path.display())]
    StorageWrite { path: PathBuf, reason: String },
    #[error("giving up after {failures} consecutive remote failures (last: {last})")]
    RetriesExhausted { failures: u32, last: RemoteError },
}

/// Classified failure of a single catalog call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("remote error: {0}")]
    Other(String),
}

const QUOTA_REASONS: &[&str] = &["quotaExceeded", "dailyLimitExceeded"];
const RATE_REASONS: &[&str] = &["rateLimitExceeded", "userRateLimitExceeded"];

impl RemoteError {
    /// Classify a failed HTTP response from its status code and body.
    ///
    /// The provider reports quota and rate problems as 403s with a `reason`
    /// string inside the error body, so the body is checked before the status.
    pub fn classify(status: u16, body: &str) -> Self {
        let reasons = error_reasons(body);
        let has = |wanted: &[&str]| {
            reasons.iter().any(|r| wanted.contains(&r.as_str()))
                || (reasons.is_empty() && wanted.iter().any(|w| body.contains(w)))
        };
        let msg = format!("HTTP {status}: {}", summarize(body));
        if has(QUOTA_REASONS) {
            RemoteError::QuotaExceeded(msg)
        } else if has(RATE_REASONS) || status == 429 {
            RemoteError::RateLimited(msg)
        } else {
            RemoteError::Other(msg)
        }
    }

    pub fn is_quota(&self) -> bool {
        matches!(self, RemoteError::QuotaExceeded(_))
    }

    /// Quota and rate failures clear on their own (rotation or waiting); `Other`
    /// is only retried on the assumption that it is.
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::QuotaExceeded(_) | RemoteError::RateLimited(_))
    }
}

/// Pull `error.errors[].reason` out of a Google-style JSON error body.
fn error_reasons(body: &str) -> Vec<String> {
    let Ok(v) = serde_json::from_str::<serde_json::Value>(body) else {
        return Vec::new();
    };
    v.pointer("/error/errors")
        .and_then(|e| e.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|e| e.get("reason").and_then(|r| r.as_str()))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn summarize(body: &str) -> String {
    let msg = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string());
    if msg.chars().count() > 200 {
        let cut: String = msg.chars().take(200).collect();
        format!("{cut}…")
    } else {
        msg
    }
}
