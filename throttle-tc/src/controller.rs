use throttle_common::{command, Executor, Output, SystemExecutor};

use crate::{
    config::{ThrottleConfig, LOOPBACK_DEVICE},
    error::{Error, Result},
    ifb, interface,
    netem::{self, Direction, LinkConditions},
    redirect,
    utils::best_effort,
};

/// Starts and stops link emulation on the host.
///
/// The controller holds no session state: the kernel is the only source of truth, and every
/// step is either safe to repeat or preceded by a teardown. A failed [`Throttle::start`] may
/// leave the host half-configured; the next `start` (or [`Throttle::stop`]) cleans it up.
///
/// Only one session can exist on a host at a time. Concurrent callers must serialize `start` and
/// `stop` themselves.
#[derive(Debug)]
pub struct Throttle<E = SystemExecutor> {
    executor: E,
    config: ThrottleConfig,
}

impl Default for Throttle<SystemExecutor> {
    fn default() -> Self {
        Self::new(SystemExecutor::default(), ThrottleConfig::default())
    }
}

impl<E: Executor> Throttle<E> {
    /// Creates a controller running its commands through `executor`.
    pub const fn new(executor: E, config: ThrottleConfig) -> Self {
        Self { executor, config }
    }

    /// The executor commands are run through.
    pub const fn executor(&self) -> &E {
        &self.executor
    }

    /// The options this controller was created with.
    pub const fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// The physical interface to shape: the configured one, or the default route's device.
    pub async fn interface(&self) -> Result<String> {
        match &self.config.interface {
            Some(name) => Ok(name.clone()),
            None => interface::resolve(&self.executor, &self.config.route_query).await,
        }
    }

    /// Begins emulating `conditions`, replacing any session already in place.
    pub async fn start(&self, conditions: &LinkConditions) -> Result<()> {
        conditions.validate()?;

        if let Err(error) = self.stop().await {
            tracing::debug!(%error, "ignoring failed teardown before start");
        }

        let interface = self.interface().await?;
        let ifb_device = self.config.ifb_device.as_str();

        tracing::info!(%interface, ifb_device, ?conditions, "starting link emulation");

        ifb::ensure_device(&self.executor, ifb_device).await;
        ifb::bring_up(&self.executor, ifb_device).await?;
        redirect::install(&self.executor, &interface, ifb_device).await?;

        let commands = netem::translate(conditions, &interface, ifb_device);

        for (direction, device) in
            [(Direction::Ingress, ifb_device), (Direction::Egress, interface.as_str())]
        {
            if !conditions.shapes(direction) {
                tracing::debug!(%direction, device, "no shaping required");
                continue;
            }

            self.shape(direction, device, commands.get(direction)).await?;
        }

        Ok(())
    }

    /// Ends any emulation session. Only fails if the interface cannot be determined.
    pub async fn stop(&self) -> Result<()> {
        let interface = self.interface().await?;
        let ifb_device = self.config.ifb_device.as_str();

        tracing::info!(%interface, ifb_device, "stopping link emulation");

        if !best_effort("delete root qdisc", self.delete_qdisc(&interface, "root")).await {
            best_effort("delete ingress qdisc", self.delete_qdisc(&interface, "ingress")).await;
        }
        // The ingress qdisc is independent from the root one: try again whatever happened above.
        best_effort("delete ingress qdisc", self.delete_qdisc(&interface, "ingress")).await;

        best_effort("delete ifb root qdisc", self.delete_qdisc(ifb_device, "root")).await;

        Ok(())
    }

    /// Emulates `conditions` on the loopback device only. Rates are ignored.
    pub async fn start_localhost(&self, conditions: &LinkConditions) -> Result<()> {
        conditions.validate()?;

        self.stop_localhost().await;

        tracing::info!(device = LOOPBACK_DEVICE, ?conditions, "starting localhost emulation");

        if !conditions.shapes_loopback() {
            tracing::debug!(device = LOOPBACK_DEVICE, "no shaping required");
            return Ok(());
        }

        let argv = netem::translate_loopback(conditions, LOOPBACK_DEVICE);
        self.shape(Direction::Egress, LOOPBACK_DEVICE, &argv).await
    }

    /// Ends localhost emulation. Never fails.
    pub async fn stop_localhost(&self) {
        tracing::info!(device = LOOPBACK_DEVICE, "stopping localhost emulation");

        best_effort("delete loopback root qdisc", self.delete_qdisc(LOOPBACK_DEVICE, "root")).await;
    }

    async fn shape(&self, direction: Direction, device: &str, argv: &[String]) -> Result<()> {
        let argv: Vec<&str> = argv.iter().map(String::as_str).collect();

        self.executor.privileged(&argv).await.map_err(|source| Error::Shaping {
            direction,
            device: device.to_string(),
            source,
        })?;

        tracing::debug!(%direction, device, "installed netem qdisc");

        Ok(())
    }

    async fn delete_qdisc(&self, device: &str, parent: &str) -> command::Result<Output> {
        self.executor.privileged(&["tc", "qdisc", "del", "dev", device, parent]).await
    }
}
