use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when RUST_LOG is not set
pub fn default_directives(debug: bool, quiet: bool) -> &'static str {
    if debug {
        "mood_recommender=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}

/// Install the global subscriber; logs go to stderr so stdout stays the result listing
pub fn init_logging(debug: bool, quiet: bool) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(default_directives(debug, quiet)));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(debug);

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
    // A subscriber installed earlier keeps receiving events
    if let Err(e) = result {
        tracing::debug!("logging already initialised: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_wins_over_quiet() {
        assert_eq!(default_directives(true, true), "mood_recommender=debug");
        assert_eq!(default_directives(false, true), "error");
        assert_eq!(default_directives(false, false), "warn");
    }

    #[test]
    fn test_second_init_is_harmless() {
        init_logging(false, true);
        init_logging(true, false);
        tracing::debug!("still logging");
    }
}
