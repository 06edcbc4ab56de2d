use anyhow::Context as _;
use clap::Parser as _;
use throttle::Throttle;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if cli.profiles {
        print!("{}", cli::profile_table());
        return Ok(());
    }

    let throttle = Throttle::new(cli.executor(), cli.config());

    if cli.stop {
        return stop(&throttle, cli.localhost).await;
    }

    let conditions = cli.conditions();
    if cli.localhost {
        throttle.start_localhost(&conditions).await.context("failed to start localhost emulation")?;
    } else {
        throttle.start(&conditions).await.context("failed to start link emulation")?;
    }

    if cli.hold {
        tracing::info!("emulation running, press Ctrl-C to stop");
        tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
        stop(&throttle, cli.localhost).await?;
    }

    Ok(())
}

async fn stop(throttle: &Throttle, localhost: bool) -> anyhow::Result<()> {
    if localhost {
        throttle.stop_localhost().await;
    } else {
        throttle.stop().await.context("failed to stop link emulation")?;
    }

    Ok(())
}
