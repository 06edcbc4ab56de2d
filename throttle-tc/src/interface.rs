use throttle_common::{
    command::{self, Output},
    Executor,
};

use crate::error::{Error, Result};

/// Prints the device of the first default route in the routing table, without a trailing
/// newline.
pub const ROUTE_QUERY: &str = "sudo route | grep -m 1 '^default' | grep -o '[^ ]*$' | tr -d '\\n'";

/// Same as [`ROUTE_QUERY`] for callers that already run as root and have no `sudo`.
pub const ROUTE_QUERY_UNPRIVILEGED: &str =
    "route | grep -m 1 '^default' | grep -o '[^ ]*$' | tr -d '\\n'";

/// Discovers the interface carrying the default route by running `query` through the shell.
///
/// A query exiting with a non-zero status still resolves if it printed a name. An empty result
/// is a [`Error::Resolution`] failure rather than an empty name: every later command would
/// target a device named `""`.
pub async fn resolve<E: Executor + ?Sized>(executor: &E, query: &str) -> Result<String> {
    match executor.shell(query).await {
        Ok(output) | Err(command::Error::NonZero(output)) => interface_from_output(&output),
        Err(e) => Err(Error::Resolution { reason: e.to_string() }),
    }
}

fn interface_from_output(output: &Output) -> Result<String> {
    let name = output.stdout.trim();
    if !name.is_empty() {
        return Ok(name.to_string());
    }

    let stderr = output.stderr.trim();
    let reason = if stderr.is_empty() {
        "no default route found".to_string()
    } else {
        format!("route query failed:\n\n{stderr}")
    };

    Err(Error::Resolution { reason })
}
