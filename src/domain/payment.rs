use crate::domain::config::PaymentItemConfig;
use crate::domain::transaction::GatewayTransaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identifier of a captured payment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PaymentId(pub u64);

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Merchant-side view of a payment's status history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Processing,
    Authorized,
    Paid,
    Refused,
    WaitingPayment,
    PendingRefund,
    Refunded,
}

/// A verified, captured payment.
///
/// Created exactly once per successful capture and immutable afterwards;
/// later status changes live in its notifications. `transaction_id` is the
/// uniqueness key enforced by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub transaction_id: String,
    pub card_id: Option<String>,
    pub card_last_digits: Option<String>,
    pub installments: u32,
    pub item_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Payment data extracted from a validated transaction, before the store
/// has assigned an id.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDraft {
    pub transaction_id: String,
    pub card_id: Option<String>,
    pub card_last_digits: Option<String>,
    pub installments: u32,
    pub item_ids: Vec<String>,
}

impl PaymentDraft {
    /// Builds a draft from the captured transaction and the item the capture
    /// token referred to. Only called after all checks have passed.
    pub fn from_transaction(
        transaction: &GatewayTransaction,
        item: &PaymentItemConfig,
    ) -> Self {
        Self {
            transaction_id: transaction.transaction_id(),
            card_id: transaction.card.as_ref().map(|card| card.id.clone()),
            card_last_digits: transaction.card_last_digits.clone(),
            installments: transaction.installments,
            item_ids: vec![item.id().to_owned()],
        }
    }

    pub fn into_payment(self, id: PaymentId) -> Payment {
        Payment {
            id,
            transaction_id: self.transaction_id,
            card_id: self.card_id,
            card_last_digits: self.card_last_digits,
            installments: self.installments,
            item_ids: self.item_ids,
            created_at: Utc::now(),
        }
    }
}

/// Append-only audit record of a payment status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentNotification {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl PaymentNotification {
    pub fn new(payment_id: PaymentId, status: PaymentStatus) -> Self {
        Self {
            payment_id,
            status,
            created_at: Utc::now(),
        }
    }

    pub fn paid(payment_id: PaymentId) -> Self {
        Self::new(payment_id, PaymentStatus::Paid)
    }
}
