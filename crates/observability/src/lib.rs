//! Logging for hosts embedding the syncer.
//!
//! Library crates only emit `tracing` events; the host binary calls
//! [`init_logging`] once with its [`LogArgs`].

mod args;
mod logging;

pub use args::LogArgs;
pub use logging::{build_filter, init_logging};
