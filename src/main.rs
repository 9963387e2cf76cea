use remocon_poller::config::Config;
use remocon_poller::db::{self, PostgresSink};
use remocon_poller::influx::InfluxSink;
use remocon_poller::mqtt::MqttSink;
use remocon_poller::poller::Poller;
use remocon_poller::scheduler::Scheduler;
use remocon_poller::sink::Sink;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let cfg_path =
        std::env::var("APP_CONFIG").unwrap_or_else(|_| "config/config.example.yaml".into());
    let cfg = Config::load(&cfg_path)?;
    info!(
        portal = %cfg.portal.url,
        period_secs = cfg.portal.periodicity,
        "loaded config"
    );

    let mut sinks: Vec<Box<dyn Sink>> = vec![
        Box::new(MqttSink::new(cfg.mqtt.clone())),
        Box::new(InfluxSink::new(cfg.influxdb.clone())?),
    ];

    if cfg.database.enabled {
        let pool = db::connect(&cfg.database).await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        info!(host = %cfg.database.host, "connected to database");
        sinks.push(Box::new(PostgresSink::new(
            pool,
            cfg.database.table.clone(),
        )));
    } else {
        info!("database sink disabled");
    }

    let poller = Arc::new(Poller::new(cfg.portal.clone(), sinks));
    let scheduler = Scheduler::new(cfg.portal.periodicity);

    let sig = tokio::signal::ctrl_c();
    tokio::pin!(sig);
    tokio::select! {
        biased;
        _ = &mut sig => {
            info!("shutdown requested");
        }
        _ = scheduler.run(|| {
            let poller = poller.clone();
            async move { poller.run_cycle().await }
        }) => {}
    }

    Ok(())
}
