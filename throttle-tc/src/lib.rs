#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

//! Link emulation on Linux with `tc`, `netem` and an `ifb` device.
//!
//! [`Throttle::start`] shapes both directions of the interface carrying the default route:
//! outbound traffic with a netem qdisc on the interface itself, inbound traffic by mirroring it
//! into an ifb device and shaping that device's egress. [`Throttle::stop`] removes everything
//! again. The kernel offers neither transactions nor a cheap way to query what is installed, so
//! every step is built to be retried after a partial failure.
//!
//! ```no_run
//! use throttle_tc::{LinkConditions, Throttle};
//!
//! # async fn run() -> throttle_tc::Result<()> {
//! let throttle = Throttle::default();
//! throttle.start(&LinkConditions::new().up(768).down(1600).rtt(150)).await?;
//! // ...
//! throttle.stop().await?;
//! # Ok(())
//! # }
//! ```

/// Options of a [`Throttle`].
pub mod config;
/// The [`Throttle`] session controller.
pub mod controller;
/// Errors returned by [`Throttle`].
pub mod error;
pub mod ifb;
/// Discovery of the default network interface.
pub mod interface;
pub mod mock;
pub mod netem;
/// Named link condition presets.
pub mod profile;
/// Mirroring of inbound traffic into the ifb device.
pub mod redirect;
mod utils;

pub use config::ThrottleConfig;
pub use controller::Throttle;
pub use error::{Error, Result};
pub use netem::{Direction, LinkConditions};
pub use profile::Profile;
