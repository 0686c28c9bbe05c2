use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
///
/// The `ids_forest` target prefix covers every crate of the workspace.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "ids_forest=debug"
    } else {
        "ids_forest=info"
    }
}

/// Install the global subscriber, `RUST_LOG` takes precedence over `verbose`
pub fn init(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose))),
        )
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_directive(false), "ids_forest=info");
        assert_eq!(default_directive(true), "ids_forest=debug");
    }
}
