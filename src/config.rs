use crate::providers::{ProviderKind, DEFAULT_PROVIDER_BASE_URL};
use crate::retry::RetryPolicy;
use std::collections::HashSet;
use std::time::Duration;

/// Static configuration for one provider: priority comes from its position
/// in `Config::providers`.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub base_url: String,
    pub api_key: String,
    /// Maximum calls per second, possibly fractional.
    pub max_rps: f64,
    /// Burst allowance for the rate limiter, at least 1.
    pub burst: u32,
    pub retry: RetryPolicy,
    pub attempt_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Providers in ascending priority order (first is tried first).
    pub providers: Vec<ProviderSettings>,
    /// Grace window during which a completed run's result is reused for
    /// duplicate requests.
    pub dedup_retention: Duration,
    /// Optional overall deadline for a full waterfall run.
    pub run_deadline: Option<Duration>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let order = std::env::var("PROVIDER_ORDER")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "orion_connect,astra_dialer,nimbus_lookup".to_string());

        let mut providers = Vec::new();
        let mut seen = HashSet::new();
        for name in order.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let kind = ProviderKind::parse(name).ok_or_else(|| {
                anyhow::anyhow!("unknown provider '{}' in PROVIDER_ORDER", name)
            })?;
            if !seen.insert(kind) {
                anyhow::bail!("provider '{}' listed twice in PROVIDER_ORDER", name);
            }
            providers.push(provider_from_env(kind)?);
        }
        if providers.is_empty() {
            anyhow::bail!("PROVIDER_ORDER resolves to an empty provider list");
        }

        let config = Self {
            providers,
            dedup_retention: env_duration_ms("DEDUP_RETENTION_MS", 30_000)?,
            run_deadline: env_optional_duration_ms("RUN_DEADLINE_MS")?,
        };

        tracing::info!(
            "Configuration loaded: {} provider(s), dedup retention {:?}",
            config.providers.len(),
            config.dedup_retention
        );
        for provider in &config.providers {
            tracing::debug!(
                "Provider {}: {} rps, burst {}, {} attempts, timeout {:?}",
                provider.kind.name(),
                provider.max_rps,
                provider.burst,
                provider.retry.max_attempts,
                provider.attempt_timeout
            );
        }

        Ok(config)
    }
}

fn provider_from_env(kind: ProviderKind) -> anyhow::Result<ProviderSettings> {
    let prefix = match kind {
        ProviderKind::OrionConnect => "ORION",
        ProviderKind::AstraDialer => "ASTRA",
        ProviderKind::NimbusLookup => "NIMBUS",
    };
    let default_rps = match kind {
        ProviderKind::OrionConnect => 1.0,
        ProviderKind::AstraDialer => 5.0,
        ProviderKind::NimbusLookup => 2.0,
    };

    let key_var = format!("{}_API_KEY", kind.name().to_uppercase());
    let api_key = std::env::var(&key_var)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", key_var))
        .and_then(|key| {
            if key.trim().is_empty() {
                anyhow::bail!("{} cannot be empty", key_var);
            }
            Ok(key)
        })?;

    let base_url = std::env::var(format!("{}_BASE_URL", prefix))
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.to_string());
    let parsed = url::Url::parse(&base_url)
        .map_err(|e| anyhow::anyhow!("{}_BASE_URL is not a valid URL: {}", prefix, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{}_BASE_URL must start with http:// or https://", prefix);
    }

    let max_rps = env_f64_with_fallback(&format!("{}_MAX_RPS", prefix), None, default_rps)?;
    if max_rps <= 0.0 {
        anyhow::bail!("{}_MAX_RPS must be positive", prefix);
    }

    let burst = env_u32_with_fallback(&format!("{}_BURST", prefix), None, 1)?;
    if burst == 0 {
        anyhow::bail!("{}_BURST must be at least 1", prefix);
    }

    let max_attempts = env_u32_with_fallback(
        &format!("{}_MAX_ATTEMPTS", prefix),
        Some("LOOKUP_MAX_ATTEMPTS"),
        3,
    )?;
    if max_attempts == 0 {
        anyhow::bail!("{}_MAX_ATTEMPTS must be at least 1", prefix);
    }

    let initial_backoff_ms = env_u64_with_fallback(
        &format!("{}_INITIAL_BACKOFF_MS", prefix),
        Some("LOOKUP_INITIAL_BACKOFF_MS"),
        1_000,
    )?;

    let backoff_multiplier = env_f64_with_fallback(
        &format!("{}_BACKOFF_MULTIPLIER", prefix),
        Some("LOOKUP_BACKOFF_MULTIPLIER"),
        2.0,
    )?;
    if backoff_multiplier < 1.0 {
        anyhow::bail!("{}_BACKOFF_MULTIPLIER must be >= 1", prefix);
    }

    let timeout_ms = env_u64_with_fallback(
        &format!("{}_TIMEOUT_MS", prefix),
        Some("ATTEMPT_TIMEOUT_MS"),
        5_000,
    )?;
    if timeout_ms == 0 {
        anyhow::bail!("{}_TIMEOUT_MS must be positive", prefix);
    }

    Ok(ProviderSettings {
        kind,
        base_url,
        api_key,
        max_rps,
        burst,
        retry: RetryPolicy {
            max_attempts,
            initial_interval: Duration::from_millis(initial_backoff_ms),
            backoff_multiplier,
        },
        attempt_timeout: Duration::from_millis(timeout_ms),
    })
}

fn env_raw(specific: &str, global: Option<&str>) -> Option<(String, String)> {
    if let Ok(value) = std::env::var(specific) {
        if !value.trim().is_empty() {
            return Some((specific.to_string(), value));
        }
    }
    if let Some(global) = global {
        if let Ok(value) = std::env::var(global) {
            if !value.trim().is_empty() {
                return Some((global.to_string(), value));
            }
        }
    }
    None
}

fn env_f64_with_fallback(
    specific: &str,
    global: Option<&str>,
    default: f64,
) -> anyhow::Result<f64> {
    match env_raw(specific, global) {
        Some((var, value)) => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", var)),
        None => Ok(default),
    }
}

fn env_u32_with_fallback(
    specific: &str,
    global: Option<&str>,
    default: u32,
) -> anyhow::Result<u32> {
    match env_raw(specific, global) {
        Some((var, value)) => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid integer", var)),
        None => Ok(default),
    }
}

fn env_u64_with_fallback(
    specific: &str,
    global: Option<&str>,
    default: u64,
) -> anyhow::Result<u64> {
    match env_raw(specific, global) {
        Some((var, value)) => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid integer", var)),
        None => Ok(default),
    }
}

fn env_duration_ms(var: &str, default_ms: u64) -> anyhow::Result<Duration> {
    Ok(Duration::from_millis(env_u64_with_fallback(
        var, None, default_ms,
    )?))
}

fn env_optional_duration_ms(var: &str) -> anyhow::Result<Option<Duration>> {
    match env_raw(var, None) {
        Some((var, value)) => {
            let ms: u64 = value
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("{} must be a valid integer", var))?;
            Ok(Some(Duration::from_millis(ms)))
        }
        None => Ok(None),
    }
}
