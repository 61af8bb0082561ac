use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_FILTER: &str = "app=info,quiz_server=info,services=info,storage=info,tower_http=info";

/// Install the global subscriber: `RUST_LOG` when set, `DEFAULT_FILTER` otherwise.
pub fn init() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
