mod client;
mod config;
mod error;
mod generator;

use chrono::Utc;
use client::BackendClient;
use config::Config;
use generator::ReadingGenerator;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let cfg_path = std::env::var("APP_CONFIG").unwrap_or_else(|_| "config/config.yaml".into());
    let cfg = Config::load(&cfg_path)?;
    info!(backend = %cfg.backend.url, "loaded config");

    let mut client = BackendClient::new(&cfg.backend.url);
    if let Some((email, password)) = cfg.credentials() {
        client.login(email, password).await?;
        info!(email = %email, "logged in");
    }

    let device_id = match cfg.device.id {
        Some(id) => {
            info!(device_id = %id, "using configured device");
            id
        }
        None => {
            let device = client
                .create_device(&cfg.device.name, &cfg.device.location)
                .await?;
            info!(
                device_id = %device.id,
                name = %device.name,
                location = %device.location,
                "device created"
            );
            device.id
        }
    };

    let sim = &cfg.simulation;
    let mut generator = ReadingGenerator::new(rand::thread_rng(), device_id, sim);
    let mut ticker = tokio::time::interval(Duration::from_secs(sim.interval_secs));

    let sig = tokio::signal::ctrl_c();
    tokio::pin!(sig);
    for i in 1..=sim.count {
        tokio::select! {
            biased;
            _ = &mut sig => {
                info!("stopped simulation");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        let reading = generator.next_reading(Utc::now());
        match client.post_reading(&reading).await {
            Ok(()) => info!(
                "sent reading {}/{}: {} W ({:.4} kWh total)",
                i, sim.count, reading.watts, reading.energy
            ),
            Err(e) => warn!(error = %e, "failed to send reading {}", i),
        }
    }

    info!("simulation finished");
    Ok(())
}
