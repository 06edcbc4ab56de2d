use throttle_common::Executor;

use crate::error::{Error, InstallStep, Result};

/// Handle of the ingress qdisc, fixed by the kernel.
pub const INGRESS_HANDLE: &str = "ffff:";

/// `tc qdisc add dev <interface> ingress`
fn ingress_qdisc_add(interface: &str) -> Vec<&str> {
    vec!["tc", "qdisc", "add", "dev", interface, "ingress"]
}

/// Match-all u32 filter mirroring every inbound IP packet to the egress of `ifb_device`.
fn redirect_filter_add<'a>(interface: &'a str, ifb_device: &'a str) -> Vec<&'a str> {
    vec![
        "tc",
        "filter",
        "add",
        "dev",
        interface,
        "parent",
        INGRESS_HANDLE,
        "protocol",
        "ip",
        "u32",
        "match",
        "u32",
        "0",
        "0",
        "flowid",
        "1:1",
        "action",
        "mirred",
        "egress",
        "redirect",
        "dev",
        ifb_device,
    ]
}

/// Redirects all inbound traffic of `interface` to `ifb_device`, where it can be shaped.
///
/// The ingress qdisc must be installed before the filter can attach to it.
pub async fn install<E: Executor + ?Sized>(
    executor: &E,
    interface: &str,
    ifb_device: &str,
) -> Result<()> {
    let steps = [
        (InstallStep::IngressQdisc, ingress_qdisc_add(interface)),
        (InstallStep::RedirectFilter, redirect_filter_add(interface, ifb_device)),
    ];

    for (step, argv) in steps {
        executor.privileged(&argv).await.map_err(|source| Error::Install {
            interface: interface.to_string(),
            step,
            source,
        })?;
    }

    tracing::debug!(interface, ifb_device, "installed ingress redirection");

    Ok(())
}
