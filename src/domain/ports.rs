use crate::domain::config::PaymentItemConfig;
use crate::domain::payment::{Payment, PaymentDraft, PaymentNotification};
use crate::domain::transaction::GatewayTransaction;
use crate::error::Result;
use async_trait::async_trait;

/// Outcome of an atomic insert keyed on `transaction_id`.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(Payment),
    AlreadyExists(Payment),
}

/// The gateway's transaction API, as consumed by the reconciler.
///
/// `capture_transaction` is idempotent on the gateway side. Both calls fail
/// with `NotFound` for unknown tokens or `TransientGateway` for network/5xx
/// conditions; retrying the latter belongs to the caller, not the engine.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn fetch_transaction(&self, token: &str) -> Result<GatewayTransaction>;
    async fn capture_transaction(&self, token: &str) -> Result<GatewayTransaction>;
}

/// Resolves the item a capture token refers to.
#[async_trait]
pub trait ItemCatalog: Send + Sync {
    async fn resolve_by_token(&self, token: &str) -> Result<PaymentItemConfig>;
}

/// Durable record of captured payments, unique per transaction id.
///
/// `insert_if_absent` is the sole cross-request synchronization point:
/// concurrent captures of the same transaction race to it and exactly one
/// observes `Inserted`.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert_if_absent(&self, draft: PaymentDraft) -> Result<InsertOutcome>;
    async fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<Payment>>;
}

/// Append-only audit trail of payment status transitions.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn append(&self, notification: PaymentNotification) -> Result<()>;
}

pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
pub type ItemCatalogBox = Box<dyn ItemCatalog>;
pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type NotificationStoreBox = Box<dyn NotificationStore>;
