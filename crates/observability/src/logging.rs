//! Logging configuration for chainsync hosts.

use eyre::Result;
use tracing_subscriber::EnvFilter;

use crate::LogArgs;

/// Build the log filter from arguments.
///
/// Precedence:
/// 1. If `--quiet` is set, only errors are shown
/// 2. Otherwise, start with `RUST_LOG` if set, or the level implied by `-v` flags
/// 3. Apply any custom directives from `--log.filter`
pub fn build_filter(args: &LogArgs) -> EnvFilter {
    if args.quiet {
        return EnvFilter::new("error");
    }

    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.base_level()));

    if let Some(custom_filter) = &args.filter {
        for directive in custom_filter.split(',') {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }
    }

    filter
}

/// Install the global tracing subscriber. Fails if one is already installed.
pub fn init_logging(args: &LogArgs) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(build_filter(args));

    if args.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
    .map_err(|e| eyre::eyre!("failed to install log subscriber: {e}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_filter() {
        let args = LogArgs {
            quiet: true,
            verbosity: 2,
            ..Default::default()
        };
        assert_eq!(build_filter(&args).to_string(), "error");
    }

    #[test]
    fn test_custom_directives_are_added() {
        let args = LogArgs {
            filter: Some("chainsync=trace,chainsync_peers=loud".to_string()),
            ..Default::default()
        };
        let filter = build_filter(&args).to_string();
        assert!(filter.contains("chainsync=trace"));
    }

    #[test]
    fn test_init_twice_fails() {
        let args = LogArgs::default();
        // The first call may lose against another test's subscriber; the second never wins.
        let _ = init_logging(&args);
        assert!(init_logging(&args).is_err());
    }
}
