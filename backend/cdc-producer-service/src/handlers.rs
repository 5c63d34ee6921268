use actix_web::{web, HttpResponse};
use std::sync::Arc;
use tracing::error;

use crate::error::Result;
use crate::metrics::gather_metrics;
use crate::services::CdcProducer;

pub type ProducerData = web::Data<Arc<CdcProducer>>;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/ready", web::get().to(ready))
        .route("/metrics", web::get().to(metrics))
        .service(
            web::scope("/api/v1/producer")
                .route("/stats", web::get().to(stats))
                .route("/start", web::post().to(start))
                .route("/stop", web::post().to(stop)),
        );
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

pub async fn ready(producer: ProducerData) -> HttpResponse {
    if producer.is_running() {
        HttpResponse::Ok().body("READY")
    } else {
        HttpResponse::ServiceUnavailable().body("NOT_RUNNING")
    }
}

pub async fn metrics() -> HttpResponse {
    match gather_metrics() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

pub async fn stats(producer: ProducerData) -> HttpResponse {
    HttpResponse::Ok().json(producer.snapshot())
}

pub async fn start(producer: ProducerData) -> Result<HttpResponse> {
    producer.start().await?;
    Ok(HttpResponse::Ok().json(producer.snapshot()))
}

pub async fn stop(producer: ProducerData) -> HttpResponse {
    producer.stop().await;
    HttpResponse::Ok().json(producer.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProducerConfig;
    use crate::context::ProducerContext;
    use crate::services::publisher::MockEnvelopePublisher;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    fn producer(mode: &str) -> Arc<CdcProducer> {
        let mut publisher = MockEnvelopePublisher::new();
        publisher.expect_publish().returning(|_, _, _| Ok(()));

        let config = ProducerConfig {
            mode: mode.to_string(),
            events_per_second: 20,
            threads: 1,
            ..ProducerConfig::default()
        };
        Arc::new(CdcProducer::with_context(
            config,
            Arc::new(publisher),
            Arc::new(ProducerContext::with_position_seed(0)),
        ))
    }

    #[actix_web::test]
    async fn test_lifecycle_endpoints() {
        let producer = producer("db2");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Arc::clone(&producer)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/ready").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/api/v1/producer/start").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/ready").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::post().uri("/api/v1/producer/stop").to_request(),
        )
        .await;
        assert_eq!(body["running"], false);
        assert_eq!(body["sequences"]["customers"], 0);
        assert!(body["positions"]["db2_lsn"].is_u64());
    }

    #[actix_web::test]
    async fn test_start_with_bad_mode_is_bad_request() {
        let producer = producer("mysql");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Arc::clone(&producer)))
                .configure(configure),
        )
        .await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post().uri("/api/v1/producer/start").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(!producer.is_running());
    }

    #[actix_web::test]
    async fn test_metrics_endpoint_serves_text() {
        crate::metrics::helpers::worker_started();
        crate::metrics::helpers::worker_stopped();

        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get().uri("/metrics").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        assert!(std::str::from_utf8(&body)
            .unwrap()
            .contains("cdc_producer_workers_running"));
    }
}
