//! Diagnostics for debugging the dispatcher itself.
//!
//! Tracing output (this module) is controlled by `RUST_LOG` or `-v` and goes
//! to stderr. Task progress (`==> task`, echoed commands, labeled
//! `chore: error:` lines) is printed by `dispatch` regardless of the filter.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins when set. Otherwise `verbosity` picks the level:
/// 0 = warn, 1 = info, 2+ = debug.
///
/// # Example
/// ```bash
/// RUST_LOG=chore=trace chore check
/// chore -vv test
/// ```
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "chore=info",
        _ => "chore=debug",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_directive(0), "warn");
        assert_eq!(default_directive(1), "chore=info");
        assert_eq!(default_directive(5), "chore=debug");
    }
}
