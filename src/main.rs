use color_eyre::{eyre::eyre, Result};
use padbridge::bridge;
use padbridge::config::BridgeConfig;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = BridgeConfig::load().map_err(|e| eyre!("{}", e))?;
    setup_logging(config.verbose);

    info!(
        "Bridging {} to bus session {} at {} Hz",
        config.device.path, config.bus.session, config.bus.frequency
    );

    bridge::run(config).await.map_err(|e| eyre!("{}", e))?;

    info!("Bridge shut down");
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    Ok(())
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
