pub mod build_info;

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor a configured directive is present.
/// Covers every workspace crate, since the services log from `dairy_core`.
pub const DEFAULT_LOG_FILTER: &str =
    "dairy_ledger=info,dairy_core=info,dairy_storage_json=info,dairy_config=info";

static TRACING_INIT: Once = Once::new();

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over `directive`; an unparsable directive falls back to
/// [`DEFAULT_LOG_FILTER`]. Only the first call has any effect.
pub fn init_tracing(directive: &str) {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(directive))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

        // Another subscriber may already be installed by the host process.
        let _ = fmt().with_env_filter(filter).try_init();
    });
}
