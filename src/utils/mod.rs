pub mod build_info;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVE: &str = "slnic_bridge=info";

/// Initializes the global tracing subscriber with sensible defaults.
///
/// `RUST_LOG` directives are honoured; the crate itself logs at `info` unless
/// overridden.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = DEFAULT_DIRECTIVE.parse() {
            filter = filter.add_directive(directive);
        }

        // A subscriber installed by the host wins.
        let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
    });
}
