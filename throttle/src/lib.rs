#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

//! Simulate slow, lossy network links on Linux.
//!
//! Re-exports [`throttle_tc`], which drives `tc`, and [`throttle_common`], which runs the
//! commands.

pub use throttle_common::{command, Escalation, Executor, Output, SystemExecutor};
pub use throttle_tc::*;
