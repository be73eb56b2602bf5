use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes the tracing subscriber with an env-filter.
///
/// Intended for binaries and examples embedding this crate; safe to call
/// more than once (subsequent calls are no-ops).
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_phone_waterfall=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
