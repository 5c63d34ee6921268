use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProducerError>;

#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

impl ProducerError {
    /// Short label used for the `kind` dimension of error metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProducerError::Config(_) => "config",
            ProducerError::Publish(_) | ProducerError::Kafka(_) => "publish",
            ProducerError::Synthesis(_) => "synthesis",
            ProducerError::Serialization(_) => "serialization",
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ResponseError for ProducerError {
    fn error_response(&self) -> HttpResponse {
        let code = self.status_code();

        HttpResponse::build(code).json(ErrorResponse {
            error: self.to_string(),
            code: code.as_u16(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ProducerError::Config(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
