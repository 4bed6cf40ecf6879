//! Command-line surface for the payload sync.
//!
//! Parses flags and environment (including a `.env` file loaded by the
//! binary), wires the Slack and Salesforce collaborators, and runs one pass.

mod bootstrap;
mod cli_args;
mod cli_types;

pub use bootstrap::{
    build_alert_sink, build_authenticator, build_history_source, build_store_connector,
    init_tracing, run_sync,
};
pub use cli_args::{default_window_start, parse_window_bound, Cli};
pub use cli_types::{
    CliAmbiguousQueuePolicy, CliAuthMode, CliPayloadCheckPolicy, CliRepeatedMarkerPolicy,
};

#[cfg(test)]
mod tests;
