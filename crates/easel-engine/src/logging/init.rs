use std::sync::Once;

use log::LevelFilter;

/// Modules held at `warn` under the default filter: the wgpu internals log
/// every surface reconfiguration, which the presenter does on each resize.
const QUIET_MODULES: [&str; 2] = ["wgpu_core", "wgpu_hal"];

/// Logger setup for easel binaries.
///
/// `env_filter` takes `env_logger` directives, e.g.
/// `"easel_engine::present=trace,wgpu_hal=warn"`; left empty, `RUST_LOG`
/// decides.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

/// Filter the logger ends up with.
#[derive(Debug, PartialEq)]
enum Filter {
    Directives(String),
    /// `info`, with [`QUIET_MODULES`] lowered to `warn`.
    Default,
}

fn resolve_filter(explicit: Option<String>, rust_log: Option<String>) -> Filter {
    explicit
        .or(rust_log)
        .filter(|directives| !directives.trim().is_empty())
        .map_or(Filter::Default, Filter::Directives)
}

static INIT: Once = Once::new();

/// Installs `env_logger` as the `log` backend.
///
/// Only the first call has an effect. Directives come from the config, else
/// from `RUST_LOG`; without either the engine logs at `info` and the wgpu
/// internals at `warn`. A logger installed beforehand (a test harness, an
/// embedding application) is left in place.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        match resolve_filter(config.env_filter, std::env::var("RUST_LOG").ok()) {
            Filter::Directives(directives) => {
                builder.parse_filters(&directives);
            }
            Filter::Default => {
                builder.filter_level(LevelFilter::Info);
                for module in QUIET_MODULES {
                    builder.filter_module(module, LevelFilter::Warn);
                }
            }
        }
        builder.write_style(config.write_style);

        if builder.try_init().is_ok() {
            log::debug!("easel logging ready");
        }
    });
}
