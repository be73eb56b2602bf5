use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Canonical lookup fields for one lead, immutable for the duration of a run.
///
/// `first_name`, `last_name` and `email` are always present on the record but
/// may be empty strings when upstream data is incomplete; request derivation
/// treats empty as absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadLookupInput {
    pub lead_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_website: Option<String>,
}

impl LeadLookupInput {
    /// First and last name joined; empty when both parts are blank.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Terminal status of one waterfall run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WaterfallStatus {
    Found,
    NotFound,
    Error,
}

/// Terminal output of one waterfall run.
///
/// Invariant, enforced by the constructors: `Found` implies `phone` and
/// `provider` are present; `NotFound` and `Error` imply both are absent.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WaterfallResult {
    pub status: WaterfallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WaterfallResult {
    pub fn found(phone: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            status: WaterfallStatus::Found,
            phone: Some(phone.into()),
            provider: Some(provider.into()),
            error: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: WaterfallStatus::NotFound,
            phone: None,
            provider: None,
            error: None,
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            status: WaterfallStatus::Error,
            phone: None,
            provider: None,
            error: Some(reason.into()),
        }
    }
}

/// Four-valued outcome of a single provider call attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Provider returned a non-empty phone string.
    Found(String),
    /// Provider answered with a valid "no phone for this lead".
    Empty,
    /// Retryable failure (network, 5xx, timeout).
    Transient(String),
    /// Non-retryable failure (4xx, auth, malformed response).
    Permanent(String),
}

/// One provider call attempt. Never persisted beyond the run; feeds the final
/// error aggregation, logging, and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub provider: String,
    /// 1-based attempt number within this provider's retry sequence.
    pub attempt: u32,
    pub started_at: DateTime<Utc>,
    pub outcome: AttemptOutcome,
    pub latency: Duration,
}

/// Terminal per-provider outcome produced by the retry executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Short-circuits the waterfall.
    Found(String),
    /// No phone, not an error: the waterfall moves to the next provider.
    Empty,
    /// Hard failure: permanent error or retries exhausted.
    Failed(String),
}

/// Per-lead entry in the batch report.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadResultEntry {
    pub lead_id: String,
    pub status: WaterfallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Per-lead error entry for leads that never reached the orchestrator.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeadErrorEntry {
    pub lead_id: String,
    pub lead_name: String,
    pub error: String,
}

/// Summary assembled by the batch coordinator.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub success: bool,
    pub found_count: usize,
    pub results: Vec<LeadResultEntry>,
    pub errors: Vec<LeadErrorEntry>,
}
