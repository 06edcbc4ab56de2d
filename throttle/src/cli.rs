use clap::Parser;
use throttle::{
    config::DEFAULT_IFB_DEVICE, interface::ROUTE_QUERY_UNPRIVILEGED, Escalation, LinkConditions,
    Profile, SystemExecutor, ThrottleConfig,
};

/// Simulate slow network connections on Linux.
///
/// Start from a profile and/or explicit values; explicit values win. Stop with `--stop`.
#[derive(Parser, Debug)]
#[command(name = "throttle", version, about)]
pub(crate) struct Cli {
    /// Network profile to start from (see --profiles)
    pub(crate) profile: Option<Profile>,

    /// Upload speed in kbit/s
    #[arg(long)]
    pub(crate) up: Option<u64>,

    /// Download speed in kbit/s
    #[arg(long)]
    pub(crate) down: Option<u64>,

    /// Round trip time in ms
    #[arg(long)]
    pub(crate) rtt: Option<u32>,

    /// Jitter in ms, added on top of the delay
    #[arg(long)]
    pub(crate) jitter: Option<u32>,

    /// Packet loss in percent
    #[arg(long)]
    pub(crate) packet_loss: Option<f64>,

    /// Stop the running emulation
    #[arg(
        long,
        conflicts_with_all = ["profile", "up", "down", "rtt", "jitter", "packet_loss", "hold"]
    )]
    pub(crate) stop: bool,

    /// Only shape the loopback device
    #[arg(long)]
    pub(crate) localhost: bool,

    /// Interface to shape instead of the one carrying the default route
    #[arg(long)]
    pub(crate) interface: Option<String>,

    /// ifb device used to shape inbound traffic
    #[arg(long, default_value = DEFAULT_IFB_DEVICE)]
    pub(crate) ifb: String,

    /// Run commands without sudo, e.g. when already root
    #[arg(long)]
    pub(crate) no_sudo: bool,

    /// Keep running after starting and stop on Ctrl-C
    #[arg(long)]
    pub(crate) hold: bool,

    /// Print the available profiles and exit
    #[arg(long)]
    pub(crate) profiles: bool,
}

impl Cli {
    /// Profile values overridden by the explicit flags.
    pub(crate) fn conditions(&self) -> LinkConditions {
        let base = self.profile.map(Profile::conditions).unwrap_or_default();

        LinkConditions {
            up_kbit: self.up.unwrap_or(base.up_kbit),
            down_kbit: self.down.unwrap_or(base.down_kbit),
            rtt_ms: self.rtt.unwrap_or(base.rtt_ms),
            jitter_ms: self.jitter.unwrap_or(base.jitter_ms),
            packet_loss: self.packet_loss.unwrap_or(base.packet_loss),
        }
    }

    pub(crate) fn config(&self) -> ThrottleConfig {
        let mut config = ThrottleConfig::default().with_ifb_device(&self.ifb);

        if let Some(interface) = &self.interface {
            config = config.with_interface(interface);
        }

        if self.no_sudo {
            config = config.with_route_query(ROUTE_QUERY_UNPRIVILEGED);
        }

        config
    }

    pub(crate) fn executor(&self) -> SystemExecutor {
        let escalation = if self.no_sudo { Escalation::None } else { Escalation::Sudo };
        SystemExecutor::new(escalation)
    }
}

/// The `--profiles` table.
pub(crate) fn profile_table() -> String {
    let mut table = format!("{:<8} {:>9} {:>11} {:>7}\n", "profile", "up kbit", "down kbit", "rtt ms");

    for profile in Profile::ALL {
        let c = profile.conditions();
        table.push_str(&format!(
            "{:<8} {:>9} {:>11} {:>7}\n",
            profile.name(),
            c.up_kbit,
            c.down_kbit,
            c.rtt_ms
        ));
    }

    table
}
