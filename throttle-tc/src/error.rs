use throttle_common::command;

use crate::netem::Direction;

/// Step of the ingress redirection setup that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStep {
    /// Adding the `ingress` qdisc to the physical interface.
    IngressQdisc,
    /// Adding the mirred redirect filter under `ffff:`.
    RedirectFilter,
}

impl std::fmt::Display for InstallStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IngressQdisc => f.write_str("ingress qdisc"),
            Self::RedirectFilter => f.write_str("redirect filter"),
        }
    }
}

/// Failure to start or stop link emulation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The interface to shape could not be determined.
    #[error("failed to resolve the default network interface: {reason}")]
    Resolution {
        /// What the route query reported.
        reason: String,
    },
    /// The ifb device could not be set up.
    #[error("failed to bring up device {device}: {source}")]
    DeviceUp {
        /// The ifb device.
        device: String,
        #[source]
        source: command::Error,
    },
    /// The ingress redirection could not be installed.
    #[error("failed to install {step} on {interface}: {source}")]
    Install {
        /// The physical interface.
        interface: String,
        /// The step that failed.
        step: InstallStep,
        #[source]
        source: command::Error,
    },
    /// A netem qdisc was rejected.
    #[error("failed to apply {direction} shaping on {device}: {source}")]
    Shaping {
        /// The direction being shaped.
        direction: Direction,
        /// The device the qdisc was added to.
        device: String,
        #[source]
        source: command::Error,
    },
    /// The link conditions are out of range. Nothing was run.
    #[error("invalid link conditions: {0}")]
    InvalidConditions(String),
}

impl Error {
    /// Returns `true` if the error happened while building the redirection plumbing, i.e.
    /// bringing up the ifb device or installing the ingress redirect.
    ///
    /// The system may be left half-configured; the next `start` cleans it up.
    pub const fn is_setup(&self) -> bool {
        matches!(self, Self::DeviceUp { .. } | Self::Install { .. })
    }
}

/// Result of a [`crate::Throttle`] operation.
pub type Result<T> = std::result::Result<T, Error>;
