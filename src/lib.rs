pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod protocol;
pub mod services;
pub mod startup;
pub mod use_cases;
pub mod utils;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::config::PaymeSettings;
use crate::error::ErrorCatalog;
use crate::middleware::Authenticator;
use crate::ports::TransactionRepository;
use crate::protocol::ResponseEncoder;
use crate::services::TransactionProcessor;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn TransactionRepository>,
    pub processor: TransactionProcessor,
    pub authenticator: Arc<Authenticator>,
    pub encoder: ResponseEncoder,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn TransactionRepository>,
        settings: &PaymeSettings,
        catalog: ErrorCatalog,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            processor: TransactionProcessor::new(repository.clone()),
            repository,
            authenticator: Arc::new(Authenticator::new(&settings.key)?),
            encoder: ResponseEncoder::new(Arc::new(catalog)),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/payme", post(handlers::webhook::payme_webhook))
        .layer(axum::middleware::from_fn(
            middleware::request_logger_middleware,
        ))
        .with_state(state)
}
