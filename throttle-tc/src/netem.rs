//! Translation of link conditions into `tc qdisc add ... netem` argument lists.
//!
//! Egress traffic is shaped by a netem qdisc at the root of the physical interface. Ingress
//! traffic is mirrored into the ifb device (see [`crate::redirect`]) and shaped by a second netem
//! qdisc at the root of that device:
//!
//! ```text
//!  outbound ──► eth0 root 1:0 netem [delay] [rate up] [loss] ──► wire
//!
//!  wire ──► eth0 ingress ffff: ──► u32 match-all, mirred redirect
//!                                          │
//!                                          ▼
//!           ifb0 root 1:0 netem [delay] [rate down] [loss] ──► inbound
//! ```
//!
//! Delay is half of the round trip time on each side, so a full round trip sees the whole RTT.

use std::fmt;

use crate::error::{Error, Result};

/// Link conditions to emulate. A zero value leaves that dimension unconstrained: its clause is
/// omitted from the netem command entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinkConditions {
    /// Upload (egress) rate cap in kbit/s.
    pub up_kbit: u64,
    /// Download (ingress) rate cap in kbit/s.
    pub down_kbit: u64,
    /// Round trip time in ms, split evenly between the two directions.
    pub rtt_ms: u32,
    /// Jitter in ms, only applied together with a delay.
    pub jitter_ms: u32,
    /// Packet loss percentage (0.0 to 100.0), applied in both directions.
    pub packet_loss: f64,
}

impl LinkConditions {
    /// Unconstrained conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the upload rate in kbit/s.
    pub const fn up(mut self, kbit: u64) -> Self {
        self.up_kbit = kbit;
        self
    }

    /// Set the download rate in kbit/s.
    pub const fn down(mut self, kbit: u64) -> Self {
        self.down_kbit = kbit;
        self
    }

    /// Set the round trip time in ms.
    pub const fn rtt(mut self, ms: u32) -> Self {
        self.rtt_ms = ms;
        self
    }

    /// Set the jitter in ms.
    pub const fn jitter(mut self, ms: u32) -> Self {
        self.jitter_ms = ms;
        self
    }

    /// Set the packet loss in percent.
    pub fn packet_loss(mut self, percent: f64) -> Self {
        self.packet_loss = percent;
        self
    }

    /// One-way delay applied in each direction, in ms.
    pub fn half_rtt_ms(&self) -> f64 {
        f64::from(self.rtt_ms) / 2.0
    }

    fn has_delay(&self) -> bool {
        self.half_rtt_ms() > 0.0
    }

    fn has_loss(&self) -> bool {
        self.packet_loss > 0.0
    }

    /// Returns `true` if a netem qdisc must be installed for `direction`, i.e. its command
    /// carries at least one of the rate, delay or loss clauses.
    pub fn shapes(&self, direction: Direction) -> bool {
        let rate = match direction {
            Direction::Ingress => self.down_kbit,
            Direction::Egress => self.up_kbit,
        };

        rate > 0 || self.has_delay() || self.has_loss()
    }

    /// Returns `true` if a loopback netem qdisc is needed in localhost mode.
    pub fn shapes_loopback(&self) -> bool {
        self.has_delay() || self.has_loss()
    }

    /// Checks that the packet loss is a percentage.
    pub fn validate(&self) -> Result<()> {
        if self.packet_loss.is_nan() || !(0.0..=100.0).contains(&self.packet_loss) {
            return Err(Error::InvalidConditions(format!(
                "packet loss must be between 0 and 100 percent, got {}",
                self.packet_loss
            )));
        }

        Ok(())
    }
}

/// Direction of the traffic being shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Inbound traffic, shaped on the ifb device.
    Ingress,
    /// Outbound traffic, shaped on the physical interface.
    Egress,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingress => f.write_str("ingress"),
            Self::Egress => f.write_str("egress"),
        }
    }
}

/// The pair of netem commands for a session. Each is a full `tc` argv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetemCommands {
    /// Shaping of the ifb device.
    pub ingress: Vec<String>,
    /// Shaping of the physical interface.
    pub egress: Vec<String>,
}

impl NetemCommands {
    /// The command shaping `direction`.
    pub fn get(&self, direction: Direction) -> &[String] {
        match direction {
            Direction::Ingress => &self.ingress,
            Direction::Egress => &self.egress,
        }
    }
}

/// `tc qdisc add dev <device> root handle 1:0 netem`
fn netem_qdisc_add(device: &str) -> Vec<String> {
    ["tc", "qdisc", "add", "dev", device, "root", "handle", "1:0", "netem"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn push_delay(args: &mut Vec<String>, conditions: &LinkConditions) {
    if conditions.has_delay() {
        args.push("delay".into());
        args.push(format!("{}ms", conditions.half_rtt_ms()));

        if conditions.jitter_ms > 0 {
            args.push(format!("{}ms", conditions.jitter_ms));
        }
    }
}

fn push_rate(args: &mut Vec<String>, kbit: u64) {
    if kbit > 0 {
        args.push("rate".into());
        args.push(format!("{kbit}kbit"));
    }
}

fn push_loss(args: &mut Vec<String>, conditions: &LinkConditions) {
    if conditions.has_loss() {
        args.push("loss".into());
        args.push(format!("{}%", conditions.packet_loss));
    }
}

/// Builds the ingress (on `ifb_device`) and egress (on `interface`) netem commands.
///
/// The commands are always built; whether each one should run is decided by
/// [`LinkConditions::shapes`].
pub fn translate(conditions: &LinkConditions, interface: &str, ifb_device: &str) -> NetemCommands {
    let mut ingress = netem_qdisc_add(ifb_device);
    let mut egress = netem_qdisc_add(interface);

    push_delay(&mut ingress, conditions);
    push_delay(&mut egress, conditions);

    push_rate(&mut ingress, conditions.down_kbit);
    push_rate(&mut egress, conditions.up_kbit);

    push_loss(&mut ingress, conditions);
    push_loss(&mut egress, conditions);

    NetemCommands { ingress, egress }
}

/// Builds the netem command shaping `device` in localhost mode: delay, jitter and loss only.
pub fn translate_loopback(conditions: &LinkConditions, device: &str) -> Vec<String> {
    let mut args = netem_qdisc_add(device);
    push_delay(&mut args, conditions);
    push_loss(&mut args, conditions);
    args
}
