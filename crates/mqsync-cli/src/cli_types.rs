use clap::ValueEnum;
use mqsync_runtime::{AmbiguousQueuePolicy, PayloadCheckPolicy, RepeatedMarkerPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliAuthMode {
    Jwt,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliAmbiguousQueuePolicy {
    UseFirst,
    Reject,
}

impl From<CliAmbiguousQueuePolicy> for AmbiguousQueuePolicy {
    fn from(value: CliAmbiguousQueuePolicy) -> Self {
        match value {
            CliAmbiguousQueuePolicy::UseFirst => AmbiguousQueuePolicy::UseFirst,
            CliAmbiguousQueuePolicy::Reject => AmbiguousQueuePolicy::Reject,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliRepeatedMarkerPolicy {
    Forward,
    Skip,
}

impl From<CliRepeatedMarkerPolicy> for RepeatedMarkerPolicy {
    fn from(value: CliRepeatedMarkerPolicy) -> Self {
        match value {
            CliRepeatedMarkerPolicy::Forward => RepeatedMarkerPolicy::Forward,
            CliRepeatedMarkerPolicy::Skip => RepeatedMarkerPolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliPayloadCheckPolicy {
    Forward,
    RequireJson,
}

impl From<CliPayloadCheckPolicy> for PayloadCheckPolicy {
    fn from(value: CliPayloadCheckPolicy) -> Self {
        match value {
            CliPayloadCheckPolicy::Forward => PayloadCheckPolicy::Forward,
            CliPayloadCheckPolicy::RequireJson => PayloadCheckPolicy::RequireJson,
        }
    }
}
