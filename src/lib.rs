//! Phone Waterfall Enrichment Library
//!
//! Enriches a lead record with a phone number by querying three data
//! providers in a fixed priority order, stopping at the first success.
//! Guarantees: at most one active run per lead at a time, per-provider
//! bounded call rates independent of lead concurrency, and per-attempt
//! retry with exponential backoff.
//!
//! # Modules
//!
//! - `batch`: Batch coordinator fanning lead ids out to waterfall runs.
//! - `config`: Environment-driven configuration.
//! - `dedup`: One in-flight run per lead key, with a retention window.
//! - `errors`: Error taxonomy (transient/permanent, application-level).
//! - `models`: Lead input, run results, attempt records, batch report.
//! - `obs`: Tracing subscriber bootstrap.
//! - `providers`: Request mapping and the three provider HTTP adapters.
//! - `rate_limiter`: Per-provider admission at a configured max rate.
//! - `retry`: Bounded-attempt executor with exponential backoff.
//! - `waterfall`: The orchestration engine.

pub mod batch;
pub mod config;
pub mod dedup;
pub mod errors;
pub mod models;
pub mod obs;
pub mod providers;
pub mod rate_limiter;
pub mod retry;
pub mod waterfall;
