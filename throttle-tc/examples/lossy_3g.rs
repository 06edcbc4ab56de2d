//! Lossy 3G link on the default interface
//!
//! Applies the `3g` profile with 50ms of jitter and 1% packet loss, keeps it for a few seconds so
//! it can be observed (e.g. with `ping` or `tc -s qdisc show`), then restores the interface.
//!
//! ```bash
//! cargo run --example lossy_3g -p throttle-tc
//! ```

#[cfg(not(target_os = "linux"))]
fn main() {}

#[cfg(target_os = "linux")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::time::Duration;

    use throttle_tc::{Profile, Throttle};
    use tracing_subscriber::EnvFilter;

    const HOLD: Duration = Duration::from_secs(10);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .try_init();

    let throttle = Throttle::default();
    let conditions = Profile::ThreeG.conditions().jitter(50).packet_loss(1.0);

    throttle.start(&conditions).await?;
    tracing::info!(interface = %throttle.interface().await?, ?HOLD, "3g link active");

    tokio::time::sleep(HOLD).await;

    throttle.stop().await?;

    Ok(())
}
