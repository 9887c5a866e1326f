//! Siege - Host Server
//!
//! Usage: `siege_server [server-config.ron]`
//!
//! `SIEGE_SEED` and `SIEGE_POWER` pick the match seed and the power rating
//! used to generate the enemy's starting army.

use std::sync::Arc;

use siege_core::army::BuiltinGenerator;
use siege_core::components::Side;
use siege_core::data::GameConfig;
use siege_core::simulation::{MatchConfig, Simulation};
use siege_server::army_service::ArmyService;
use siege_server::driver::DriverHandle;
use siege_server::{DriverError, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn env_number(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<(), DriverError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Siege host server");

    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    let power = u32::try_from(env_number("SIEGE_POWER", 300)).unwrap_or(u32::MAX);
    let match_config = MatchConfig {
        seed: env_number("SIEGE_SEED", 0),
        ..MatchConfig::default()
    };

    let armies = ArmyService::new(Arc::new(BuiltinGenerator), config.generator_timeout());
    let mut sim = Simulation::new(GameConfig::default(), &match_config, 0);
    armies.army(power).await.deploy(&mut sim, Side::Enemy);

    let mut driver = DriverHandle::spawn(sim, &config)?;

    tokio::select! {
        status = driver.wait_until_over() => {
            let status = status?;
            let report = armies.report(status, power).await;
            tracing::info!(?status, title = %report.title, "{}", report.summary);
        }
        result = tokio::signal::ctrl_c() => {
            if let Err(error) = result {
                tracing::error!(%error, "Signal handler failed");
            }
            tracing::info!("Interrupted");
        }
    }

    let sim = driver.stop().await?;
    tracing::info!(
        ticks = sim.tick_count(),
        state_hash = sim.state_hash(),
        "Server shut down"
    );
    Ok(())
}
