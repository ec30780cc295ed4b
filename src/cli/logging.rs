//! Logging configuration using tracing
//!
//! Diagnostics go to stderr next to the presenter's output. The level is controlled by
//! the `POABOT_PANEL_LOG` environment variable, e.g. `POABOT_PANEL_LOG=debug`.

use std::io::IsTerminal;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the filter directives
pub const LOG_ENV: &str = "POABOT_PANEL_LOG";

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "poabot_panel=debug,info"
    } else {
        "poabot_panel=info,warn"
    }
}

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init(verbose: bool) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(verbose),
        )
        .try_init();
}
