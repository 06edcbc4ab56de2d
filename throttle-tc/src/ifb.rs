//! Management of the intermediate functional block (ifb) device.
//!
//! The kernel cannot shape inbound traffic directly, so it is redirected to an ifb device and
//! shaped on that device's egress path instead.

use throttle_common::Executor;

use crate::{
    config::DEFAULT_IFB_DEVICE,
    error::{Error, Result},
    utils::best_effort,
};

/// Makes sure the ifb device `name` exists. Never fails.
///
/// Loading the `ifb` module creates `ifb0` (and `ifb1`). When the module cannot be loaded, which
/// is common in containers without module tooling, the device is created directly. Any other
/// name is always created directly, since the module never creates it. Creation fails if the
/// device is left over from a previous session, which is fine.
pub async fn ensure_device<E: Executor + ?Sized>(executor: &E, name: &str) {
    let loaded = best_effort("load ifb module", executor.privileged(&["modprobe", "ifb"])).await;
    if loaded && name == DEFAULT_IFB_DEVICE {
        return;
    }

    best_effort(
        "create ifb device",
        executor.privileged(&["ip", "link", "add", name, "type", "ifb"]),
    )
    .await;
}

/// Sets the device `name` administratively up.
pub async fn bring_up<E: Executor + ?Sized>(executor: &E, name: &str) -> Result<()> {
    executor
        .privileged(&["ip", "link", "set", "dev", name, "up"])
        .await
        .map_err(|source| Error::DeviceUp { device: name.to_string(), source })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockExecutor;

    #[tokio::test]
    async fn module_load_skips_device_creation() {
        let executor = MockExecutor::new();

        ensure_device(&executor, "ifb0").await;

        assert_eq!(executor.privileged_calls(), ["modprobe ifb"]);
    }

    #[tokio::test]
    async fn falls_back_to_creating_the_device() {
        let executor = MockExecutor::new().fail_on(&["modprobe"]);

        ensure_device(&executor, "ifb0").await;

        assert_eq!(executor.privileged_calls(), ["modprobe ifb", "ip link add ifb0 type ifb"]);
    }

    #[tokio::test]
    async fn custom_device_is_created_after_module_load() {
        let executor = MockExecutor::new();

        ensure_device(&executor, "ifb2").await;

        assert_eq!(executor.privileged_calls(), ["modprobe ifb", "ip link add ifb2 type ifb"]);
    }

    #[tokio::test]
    async fn both_failing_is_not_an_error() {
        let executor = MockExecutor::new().fail_on(&["modprobe"]).fail_on(&["ip", "link", "add"]);

        ensure_device(&executor, "ifb0").await;

        assert_eq!(executor.privileged_calls().len(), 2);
    }

    #[tokio::test]
    async fn bring_up_failure_names_the_device() {
        let executor = MockExecutor::new().fail_on(&["ip", "link", "set"]);

        let err = bring_up(&executor, "ifb0").await.unwrap_err();

        assert!(err.is_setup());
        assert!(matches!(err, Error::DeviceUp { ref device, .. } if device == "ifb0"));
    }
}
