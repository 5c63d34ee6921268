use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use cdc_producer_service::{handlers, CdcProducer, Config, KafkaEnvelopePublisher};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cdc_producer_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting cdc-producer-service");

    let config = Config::from_env().context("Failed to load configuration")?;

    let publisher = KafkaEnvelopePublisher::new(&config.kafka)
        .context("Failed to create Kafka publisher")?;
    let producer = Arc::new(CdcProducer::new(config.producer.clone(), Arc::new(publisher)));

    if config.producer.enabled {
        producer
            .start()
            .await
            .context("Failed to start CDC producer")?;
    } else {
        tracing::info!("CDC producer disabled; waiting for POST /api/v1/producer/start");
    }

    let stats_reporter = producer.spawn_stats_reporter(Duration::from_secs(
        config.producer.stats_interval_secs.max(1),
    ));

    let bind_address = format!("0.0.0.0:{}", config.http_port);
    tracing::info!("HTTP server listening on {}", bind_address);

    let producer_http = Arc::clone(&producer);
    // Runs until SIGINT/SIGTERM
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(Arc::clone(&producer_http)))
            .wrap(actix_middleware::Logger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await
    .context("HTTP server failed")?;

    tracing::info!("Shutting down cdc-producer-service");
    stats_reporter.abort();
    producer.stop().await;

    Ok(())
}
