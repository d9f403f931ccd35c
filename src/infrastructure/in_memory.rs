use crate::domain::config::PaymentItemConfig;
use crate::domain::payment::{Payment, PaymentDraft, PaymentId, PaymentNotification};
use crate::domain::ports::{
    InsertOutcome, ItemCatalog, NotificationStore, PaymentGateway, PaymentStore,
};
use crate::domain::transaction::{GatewayTransaction, TransactionStatus};
use crate::error::{CaptureError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A canned gateway holding authorized transactions by capture token.
///
/// Used by tests and the CLI scenario runner in place of the real gateway
/// API. `capture_transaction` flips the stored transaction to `paid`, the
/// way the gateway reports a finalized capture.
#[derive(Default, Clone)]
pub struct InMemoryGateway {
    transactions: Arc<RwLock<HashMap<String, GatewayTransaction>>>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an authorized transaction under `token`.
    pub async fn authorize(&self, token: impl Into<String>, transaction: GatewayTransaction) {
        let mut transactions = self.transactions.write().await;
        transactions.insert(token.into(), transaction);
    }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn fetch_transaction(&self, token: &str) -> Result<GatewayTransaction> {
        let transactions = self.transactions.read().await;
        transactions
            .get(token)
            .cloned()
            .ok_or_else(|| CaptureError::not_found(format!("no transaction for token {token}")))
    }

    async fn capture_transaction(&self, token: &str) -> Result<GatewayTransaction> {
        let mut transactions = self.transactions.write().await;
        let transaction = transactions
            .get_mut(token)
            .ok_or_else(|| CaptureError::not_found(format!("no transaction for token {token}")))?;
        transaction.status = TransactionStatus::Paid;
        transaction.paid_amount = transaction.authorized_amount;
        Ok(transaction.clone())
    }
}

/// In-memory item catalog keyed by capture token.
#[derive(Default, Clone)]
pub struct InMemoryItemCatalog {
    items: Arc<RwLock<HashMap<String, PaymentItemConfig>>>,
}

impl InMemoryItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, token: impl Into<String>, item: PaymentItemConfig) {
        let mut items = self.items.write().await;
        items.insert(token.into(), item);
    }
}

#[async_trait]
impl ItemCatalog for InMemoryItemCatalog {
    async fn resolve_by_token(&self, token: &str) -> Result<PaymentItemConfig> {
        let items = self.items.read().await;
        items
            .get(token)
            .cloned()
            .ok_or_else(|| CaptureError::not_found(format!("no payment item for token {token}")))
    }
}

#[derive(Default)]
struct PaymentStoreInner {
    by_transaction: HashMap<String, Payment>,
    next_id: u64,
}

/// Thread-safe in-memory payment store.
///
/// The write lock makes `insert_if_absent` atomic: concurrent captures of
/// the same transaction serialize here and exactly one inserts.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    inner: Arc<RwLock<PaymentStoreInner>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.by_transaction.len()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert_if_absent(&self, draft: PaymentDraft) -> Result<InsertOutcome> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.by_transaction.get(&draft.transaction_id) {
            return Ok(InsertOutcome::AlreadyExists(existing.clone()));
        }
        inner.next_id += 1;
        let payment = draft.into_payment(PaymentId(inner.next_id));
        inner
            .by_transaction
            .insert(payment.transaction_id.clone(), payment.clone());
        Ok(InsertOutcome::Inserted(payment))
    }

    async fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<Payment>> {
        let inner = self.inner.read().await;
        Ok(inner.by_transaction.get(transaction_id).cloned())
    }
}

/// Thread-safe in-memory notification store, append-only.
#[derive(Default, Clone)]
pub struct InMemoryNotificationStore {
    notifications: Arc<RwLock<Vec<PaymentNotification>>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<PaymentNotification> {
        self.notifications.read().await.clone()
    }

    pub async fn for_payment(&self, payment_id: PaymentId) -> Vec<PaymentNotification> {
        self.notifications
            .read()
            .await
            .iter()
            .filter(|notification| notification.payment_id == payment_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn append(&self, notification: PaymentNotification) -> Result<()> {
        let mut notifications = self.notifications.write().await;
        notifications.push(notification);
        Ok(())
    }
}
