use crate::interface::ROUTE_QUERY;

/// Name of the intermediate functional block device used to shape ingress traffic.
pub const DEFAULT_IFB_DEVICE: &str = "ifb0";

/// Name of the loopback device shaped in localhost mode.
pub const LOOPBACK_DEVICE: &str = "lo";

/// Options of a [`crate::Throttle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// The ifb device inbound traffic is redirected to. Default is [`DEFAULT_IFB_DEVICE`].
    pub ifb_device: String,
    /// The physical interface to shape. Default is `None`, and the interface carrying the
    /// default route is discovered on every `start` and `stop`.
    pub interface: Option<String>,
    /// Shell pipeline printing the default interface. Default is [`ROUTE_QUERY`].
    pub route_query: String,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            ifb_device: DEFAULT_IFB_DEVICE.to_string(),
            interface: None,
            route_query: ROUTE_QUERY.to_string(),
        }
    }
}

impl ThrottleConfig {
    /// Sets the ifb device name.
    pub fn with_ifb_device(mut self, name: impl Into<String>) -> Self {
        self.ifb_device = name.into();
        self
    }

    /// Pins the physical interface instead of discovering it.
    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.interface = Some(name.into());
        self
    }

    /// Sets the shell pipeline used to discover the default interface.
    pub fn with_route_query(mut self, query: impl Into<String>) -> Self {
        self.route_query = query.into();
        self
    }
}
