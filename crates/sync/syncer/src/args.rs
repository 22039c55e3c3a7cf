//! Block sync CLI arguments.

use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};

/// Default idle timeout per block in seconds (three 2s block times).
const DEFAULT_BLOCK_TIMEOUT_SECS: u64 = 6;

/// Block sync configuration.
#[derive(Debug, Args, Clone, Serialize, Deserialize)]
#[command(next_help_heading = "Sync")]
#[serde(default)]
pub struct SyncArgs {
    /// Seconds to wait for the next block from a peer before giving up on it.
    #[arg(
        long = "sync.block-timeout",
        default_value_t = DEFAULT_BLOCK_TIMEOUT_SECS,
        value_name = "SECS"
    )]
    pub block_timeout_secs: u64,

    /// Stop after the initial catch-up instead of following new blocks.
    ///
    /// Read by the host binary, which decides whether to call
    /// [`crate::Syncer::watch_sync`]; the syncer itself never checks it.
    #[arg(long = "sync.no-watch")]
    #[serde(rename = "no_watch")]
    pub disable_watch: bool,
}

impl Default for SyncArgs {
    fn default() -> Self {
        Self {
            block_timeout_secs: DEFAULT_BLOCK_TIMEOUT_SECS,
            disable_watch: false,
        }
    }
}

impl SyncArgs {
    /// Per-block idle timeout as a [`Duration`].
    pub fn block_timeout(&self) -> Duration {
        Duration::from_secs(self.block_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        sync: SyncArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["chainsync"]);
        assert_eq!(cli.sync.block_timeout(), Duration::from_secs(6));
        assert!(!cli.sync.disable_watch);
    }

    #[test]
    fn test_parse() {
        let cli = Cli::parse_from([
            "chainsync",
            "--sync.block-timeout",
            "30",
            "--sync.no-watch",
        ]);
        assert_eq!(cli.sync.block_timeout(), Duration::from_secs(30));
        assert!(cli.sync.disable_watch);
    }
}
