//! In-memory [`Executor`] for testing without root privileges.
//!
//! [`MockExecutor`] records every command it is asked to run and can fail selected commands by
//! argv prefix. Optionally it keeps a [`Kernel`] model of the objects `ip` and `tc` would create,
//! rejecting duplicate creations and deletions of missing objects the way the kernel does.
//!
//! ```
//! use throttle_tc::{mock::MockExecutor, LinkConditions, Throttle, ThrottleConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let throttle = Throttle::new(MockExecutor::simulated("eth0"), ThrottleConfig::default());
//! throttle.start(&LinkConditions::new().rtt(100)).await.unwrap();
//!
//! let kernel = throttle.executor().kernel().unwrap();
//! assert!(kernel.devices["eth0"].ingress);
//! # }
//! ```

use std::{collections::BTreeMap, io};

use async_trait::async_trait;
use parking_lot::Mutex;
use throttle_common::{
    command::{self, Output},
    Executor,
};

/// A network device as seen by the [`Kernel`] model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Device {
    /// Whether the device is administratively up.
    pub up: bool,
    /// Arguments of the root qdisc after `root`, e.g. `handle 1:0 netem delay 50ms`.
    pub root: Option<String>,
    /// Whether an ingress qdisc is attached.
    pub ingress: bool,
    /// Filters attached to the ingress qdisc, as their arguments after `parent ffff:`.
    pub filters: Vec<String>,
}

/// Model of the kernel objects touched by the traffic control commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kernel {
    /// Whether `modprobe ifb` succeeds. When it does, it creates `ifb0` and `ifb1`.
    pub modprobe_available: bool,
    /// Devices by name.
    pub devices: BTreeMap<String, Device>,
}

impl Kernel {
    /// A kernel with the loopback device and the given physical interfaces, all up.
    pub fn new<'a>(interfaces: impl IntoIterator<Item = &'a str>) -> Self {
        let devices = std::iter::once("lo")
            .chain(interfaces)
            .map(|name| (name.to_string(), Device { up: true, ..Default::default() }))
            .collect();

        Self { modprobe_available: true, devices }
    }

    /// Number of root qdiscs, ingress qdiscs and filters across all devices.
    pub fn object_count(&self) -> usize {
        self.devices
            .values()
            .map(|d| usize::from(d.root.is_some()) + usize::from(d.ingress) + d.filters.len())
            .sum()
    }

    fn device_mut(&mut self, name: &str) -> Result<&mut Device, String> {
        self.devices.get_mut(name).ok_or_else(|| format!("Cannot find device \"{name}\""))
    }

    /// Applies a privileged command. The error is the message the real tool would print.
    fn apply(&mut self, argv: &[&str]) -> Result<(), String> {
        match argv {
            ["modprobe", "ifb"] => {
                if !self.modprobe_available {
                    return Err("modprobe: FATAL: Module ifb not found".to_string());
                }
                for name in ["ifb0", "ifb1"] {
                    self.devices.entry(name.to_string()).or_default();
                }
            }
            ["ip", "link", "add", name, "type", "ifb"] => {
                if self.devices.contains_key(*name) {
                    return Err("RTNETLINK answers: File exists".to_string());
                }
                self.devices.insert(name.to_string(), Device::default());
            }
            ["ip", "link", "set", "dev", name, "up"] => self.device_mut(name)?.up = true,
            ["tc", "qdisc", "add", "dev", name, "ingress"] => {
                let device = self.device_mut(name)?;
                if device.ingress {
                    return Err("Error: Exclusivity flag on, cannot modify.".to_string());
                }
                device.ingress = true;
            }
            ["tc", "qdisc", "add", "dev", name, "root", rest @ ..] => {
                let device = self.device_mut(name)?;
                if device.root.is_some() {
                    return Err("Error: Exclusivity flag on, cannot modify.".to_string());
                }
                device.root = Some(rest.join(" "));
            }
            ["tc", "filter", "add", "dev", name, "parent", "ffff:", rest @ ..] => {
                let device = self.device_mut(name)?;
                if !device.ingress {
                    return Err("Error: Parent Qdisc doesn't exists.".to_string());
                }
                device.filters.push(rest.join(" "));
            }
            ["tc", "qdisc", "del", "dev", name, "root"] => {
                if self.device_mut(name)?.root.take().is_none() {
                    return Err("Error: Cannot delete qdisc with handle of zero.".to_string());
                }
            }
            ["tc", "qdisc", "del", "dev", name, "ingress"] => {
                let device = self.device_mut(name)?;
                if !device.ingress {
                    return Err("Error: Invalid handle.".to_string());
                }
                device.ingress = false;
                device.filters.clear();
            }
            _ => {}
        }

        Ok(())
    }
}

#[derive(Debug)]
struct State {
    privileged: Vec<String>,
    shell: Vec<String>,
    failures: Vec<Vec<String>>,
    route_output: Output,
    route_spawn_error: Option<io::ErrorKind>,
    kernel: Option<Kernel>,
}

/// [`Executor`] that records commands and simulates their effect.
#[derive(Debug)]
pub struct MockExecutor {
    state: Mutex<State>,
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExecutor {
    /// A mock where every command succeeds and the route query prints `eth0`.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                privileged: Vec::new(),
                shell: Vec::new(),
                failures: Vec::new(),
                route_output: Output::with_stdout("eth0"),
                route_spawn_error: None,
                kernel: None,
            }),
        }
    }

    /// A mock backed by a [`Kernel`] model with the physical interface `interface`, which the
    /// route query resolves to.
    pub fn simulated(interface: &str) -> Self {
        Self::new().with_route_output(interface, "").with_kernel(Kernel::new([interface]))
    }

    /// Replaces the kernel model.
    pub fn with_kernel(self, kernel: Kernel) -> Self {
        self.state.lock().kernel = Some(kernel);
        self
    }

    /// Sets what the route query prints.
    pub fn with_route_output(self, stdout: &str, stderr: &str) -> Self {
        self.state.lock().route_output =
            Output { code: Some(0), stdout: stdout.to_string(), stderr: stderr.to_string() };
        self
    }

    /// Makes the route query exit with `code`. Non-zero codes fail with
    /// [`command::Error::NonZero`] carrying the configured output.
    pub fn with_route_status(self, code: i32) -> Self {
        self.state.lock().route_output.code = Some(code);
        self
    }

    /// Makes the route query fail to spawn with an io error of `kind`.
    pub fn with_route_spawn_error(self, kind: io::ErrorKind) -> Self {
        self.state.lock().route_spawn_error = Some(kind);
        self
    }

    /// Fails every privileged command starting with `prefix`.
    pub fn fail_on(self, prefix: &[&str]) -> Self {
        self.inject_failure(prefix);
        self
    }

    /// Same as [`Self::fail_on`], for a mock that is already in use.
    pub fn inject_failure(&self, prefix: &[&str]) {
        self.state.lock().failures.push(prefix.iter().map(|s| s.to_string()).collect());
    }

    /// Removes all injected failures.
    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    /// The privileged commands run so far, each joined with spaces.
    pub fn privileged_calls(&self) -> Vec<String> {
        self.state.lock().privileged.clone()
    }

    /// The shell pipelines run so far.
    pub fn shell_calls(&self) -> Vec<String> {
        self.state.lock().shell.clone()
    }

    /// Forgets the commands recorded so far.
    pub fn clear_calls(&self) {
        let mut state = self.state.lock();
        state.privileged.clear();
        state.shell.clear();
    }

    /// Snapshot of the kernel model, if any.
    pub fn kernel(&self) -> Option<Kernel> {
        self.state.lock().kernel.clone()
    }
}

fn rejected(stderr: String) -> command::Error {
    command::Error::NonZero(Output { code: Some(2), stdout: String::new(), stderr })
}

#[async_trait]
impl Executor for MockExecutor {
    async fn privileged(&self, argv: &[&str]) -> command::Result<Output> {
        if argv.is_empty() {
            return Err(command::Error::Empty);
        }

        let mut state = self.state.lock();
        state.privileged.push(argv.join(" "));

        let injected = state.failures.iter().any(|prefix| {
            prefix.len() <= argv.len() && prefix.iter().zip(argv).all(|(a, b)| a == b)
        });
        if injected {
            return Err(rejected(format!("injected failure: {}", argv.join(" "))));
        }

        if let Some(kernel) = state.kernel.as_mut() {
            kernel.apply(argv).map_err(rejected)?;
        }

        Ok(Output::with_stdout(""))
    }

    async fn shell(&self, pipeline: &str) -> command::Result<Output> {
        let mut state = self.state.lock();
        state.shell.push(pipeline.to_string());

        if let Some(kind) = state.route_spawn_error {
            return Err(io::Error::from(kind).into());
        }

        let output = state.route_output.clone();
        if !output.success() {
            return Err(command::Error::NonZero(output));
        }

        Ok(output)
    }
}
