//! Subscriber setup. The core crate only emits events; the binary decides
//! where they go.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Crates whose level follows `-v`. Dependencies stay at `warn` unless
/// `RUST_LOG` says otherwise.
const OWN_TARGETS: &[&str] = &["unbundle_cli", "unbundle_core"];

/// Level for our own crates: none → INFO, `-v` → DEBUG, `-vv` → TRACE.
fn level(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn filter(verbosity: u8) -> EnvFilter {
    let level = level(verbosity);
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    for target in OWN_TARGETS {
        if let Ok(directive) = format!("{target}={level}").parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Install the global subscriber, writing to stderr so `unbundle transform`
/// keeps stdout for module output. `json` switches to one JSON object per
/// event (request fields such as `path`, `kind` and `code` included).
///
/// # Panics
/// Panics if a global subscriber is already set.
pub fn init(verbosity: u8, json: bool) {
    let registry = tracing_subscriber::registry().with(filter(verbosity));

    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level(0), Level::INFO);
        assert_eq!(level(1), Level::DEBUG);
        assert_eq!(level(5), Level::TRACE);
    }

    #[test]
    fn test_filter_names_own_crates() {
        let rendered = filter(1).to_string().to_lowercase();
        for target in OWN_TARGETS {
            assert!(rendered.contains(&format!("{target}=debug")), "{rendered}");
        }
    }
}
