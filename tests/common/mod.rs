#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use payme_merchant::adapters::InMemoryTransactionRepository;
use payme_merchant::config::PaymeSettings;
use payme_merchant::domain::{Transaction, TransactionState};
use payme_merchant::error::ErrorCatalog;
use payme_merchant::ports::{
    RepositoryError, RepositoryResult, TransactionKey, TransactionRepository,
};
use payme_merchant::{create_app, AppState};

pub const PAYME_KEY: &str = "test-merchant-key";

pub fn settings() -> PaymeSettings {
    PaymeSettings {
        key: PAYME_KEY.to_string(),
        merchant_id: "merchant-1".to_string(),
        base_url: "https://test.paycom.uz".to_string(),
    }
}

/// Internal error text a broken database would report.
pub const STORAGE_FAILURE: &str = "connection reset by peer";

/// Wraps the in-memory adapter, counts updates that were applied and can
/// simulate a broken database on reads or writes.
#[derive(Default, Clone)]
pub struct CountingRepository {
    pub inner: InMemoryTransactionRepository,
    applied_updates: Arc<AtomicUsize>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl CountingRepository {
    pub fn applied_updates(&self) -> usize {
        self.applied_updates.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> RepositoryResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(STORAGE_FAILURE.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionRepository for CountingRepository {
    async fn exists_payable(&self, order_id: &str, amount: i64) -> RepositoryResult<bool> {
        Self::check(&self.fail_reads)?;
        self.inner.exists_payable(order_id, amount).await
    }

    async fn get(&self, key: &TransactionKey) -> RepositoryResult<Transaction> {
        Self::check(&self.fail_reads)?;
        self.inner.get(key).await
    }

    async fn update(&self, tx: &Transaction, expected: TransactionState) -> RepositoryResult<()> {
        Self::check(&self.fail_writes)?;
        self.inner.update(tx, expected).await?;
        self.applied_updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn insert(&self, tx: &Transaction) -> RepositoryResult<Transaction> {
        self.inner.insert(tx).await
    }

    async fn ping(&self) -> RepositoryResult<()> {
        self.inner.ping().await
    }
}

pub struct TestApp {
    pub router: Router,
    pub repository: CountingRepository,
}

impl TestApp {
    pub fn new() -> Self {
        let repository = CountingRepository::default();
        let state = AppState::new(
            Arc::new(repository.clone()),
            &settings(),
            ErrorCatalog::default(),
        )
        .unwrap();
        Self {
            router: create_app(state),
            repository,
        }
    }

    pub async fn seed_order(&self, order_id: &str, amount: i64) -> Transaction {
        self.seed_order_at(order_id, amount, Utc::now()).await
    }

    pub async fn seed_order_at(
        &self,
        order_id: &str,
        amount: i64,
        create_time: DateTime<Utc>,
    ) -> Transaction {
        let tx = Transaction::new(order_id.to_string(), 42, amount, create_time);
        self.repository.insert(&tx).await.unwrap()
    }

    pub async fn stored(&self, order_id: &str) -> Transaction {
        self.repository
            .inner
            .get(&TransactionKey::Order(order_id.to_string()))
            .await
            .unwrap()
    }

    /// Sends an authenticated webhook call and returns the decoded envelope.
    pub async fn call(&self, body: Value) -> Value {
        self.call_with_auth(body, Some(&basic_auth("Paycom", PAYME_KEY)))
            .await
    }

    pub async fn call_with_auth(&self, body: Value, authorization: Option<&str>) -> Value {
        self.call_raw(body.to_string(), authorization).await
    }

    pub async fn call_raw(&self, body: String, authorization: Option<&str>) -> Value {
        let mut request = Request::builder()
            .method("POST")
            .uri("/payme")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(authorization) = authorization {
            request = request.header(header::AUTHORIZATION, authorization);
        }

        let response = self
            .router
            .clone()
            .oneshot(request.body(Body::from(body)).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}

pub fn basic_auth(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{}:{}", username, password))
    )
}

pub fn error_code(envelope: &Value) -> i64 {
    envelope["error"]["code"]
        .as_i64()
        .unwrap_or_else(|| panic!("expected error envelope, got {}", envelope))
}
