use crate::application::notify::{StatusChangedBus, StatusChangedListener, SubscriptionId};
use crate::domain::config::PaymentItemConfig;
use crate::domain::payment::{Payment, PaymentDraft, PaymentNotification};
use crate::domain::ports::{
    InsertOutcome, ItemCatalogBox, NotificationStoreBox, PaymentGatewayBox, PaymentStoreBox,
};
use crate::domain::transaction::GatewayTransaction;
use crate::error::{CaptureError, Result, ValidationError};
use std::sync::Arc;

/// Progress of a single capture run. One pass, terminal in `Accepted` or
/// `Rejected`; retries belong to the transport layer above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Received,
    Validating,
    Accepted,
    Rejected,
}

/// Reconciles a gateway capture against the merchant's own expectation of
/// what was charged.
///
/// The reconciler owns its collaborator ports and awaits every external call,
/// so a run is sequentially consistent: nothing is persisted until all four
/// integrity checks pass, and the status fan-out happens only after payment
/// and notification are committed.
pub struct CaptureReconciler {
    gateway: PaymentGatewayBox,
    catalog: ItemCatalogBox,
    payments: PaymentStoreBox,
    notifications: NotificationStoreBox,
    status_bus: Arc<StatusChangedBus>,
}

impl CaptureReconciler {
    pub fn new(
        gateway: PaymentGatewayBox,
        catalog: ItemCatalogBox,
        payments: PaymentStoreBox,
        notifications: NotificationStoreBox,
        status_bus: Arc<StatusChangedBus>,
    ) -> Self {
        Self {
            gateway,
            catalog,
            payments,
            notifications,
            status_bus,
        }
    }

    /// Registers a listener for successful status transitions.
    pub fn subscribe_status_changed(&self, listener: StatusChangedListener) -> SubscriptionId {
        self.status_bus.subscribe(listener)
    }

    pub fn unsubscribe_status_changed(&self, id: SubscriptionId) -> bool {
        self.status_bus.unsubscribe(id)
    }

    /// Runs one capture reconciliation for `token`.
    ///
    /// Fetches the gateway transaction, recomputes the expected values from
    /// the item's pricing config, and rejects on the first failing check.
    /// On success the gateway capture is finalized, a `Payment` and its PAID
    /// notification are persisted, and every status subscriber is invoked
    /// with the new payment id.
    ///
    /// A transaction that already produced a payment is rejected with
    /// [`CaptureError::AlreadyProcessed`]; under concurrent requests for the
    /// same token the store's atomic insert guarantees exactly one winner.
    pub async fn reconcile_capture(&self, token: &str) -> Result<Payment> {
        tracing::debug!(token, phase = ?CapturePhase::Received, "capture request received");

        let item = self.catalog.resolve_by_token(token).await?;
        let transaction = self.gateway.fetch_transaction(token).await?;
        let transaction_id = transaction.transaction_id();

        if let Some(existing) = self.payments.find_by_transaction(&transaction_id).await? {
            tracing::warn!(token, %transaction_id, "duplicate capture request");
            return Err(CaptureError::AlreadyProcessed {
                transaction_id: existing.transaction_id,
            });
        }

        tracing::debug!(token, %transaction_id, phase = ?CapturePhase::Validating, "running integrity checks");
        if let Err(err) = transaction
            .ensure_well_formed()
            .and_then(|()| run_checks(&item, &transaction))
        {
            tracing::warn!(
                token,
                %transaction_id,
                phase = ?CapturePhase::Rejected,
                error = %err,
                "capture rejected"
            );
            return Err(err);
        }

        let captured = self.gateway.capture_transaction(token).await?;
        let draft = PaymentDraft::from_transaction(&captured, &item);
        let payment = match self.payments.insert_if_absent(draft).await? {
            InsertOutcome::Inserted(payment) => payment,
            InsertOutcome::AlreadyExists(payment) => {
                tracing::warn!(token, %transaction_id, "lost the duplicate-capture race");
                return Err(CaptureError::AlreadyProcessed {
                    transaction_id: payment.transaction_id,
                });
            }
        };

        self.notifications
            .append(PaymentNotification::paid(payment.id))
            .await?;

        tracing::info!(
            token,
            payment_id = %payment.id,
            %transaction_id,
            installments = payment.installments,
            phase = ?CapturePhase::Accepted,
            "capture accepted"
        );

        // Payment and notification are committed at this point; a failing
        // listener surfaces as an error but rolls nothing back.
        self.status_bus.publish(payment.id)?;

        Ok(payment)
    }
}

/// The four integrity checks, in fixed order, stopping at the first failure.
///
/// 1. item price: a payload entry for the expected item priced below the
///    merchant's price means the customer paid less than listed.
/// 2. authorized amount below the item price.
/// 3. installment count above the configured maximum.
/// 4. authorized amount differs from the recomputed interest-adjusted total
///    (exact equality; the strictest check, and the only one that catches a
///    tampered interest rate).
fn run_checks(item: &PaymentItemConfig, transaction: &GatewayTransaction) -> Result<()> {
    let config = item.effective_config();
    let expected_price = item.expected_unit_price();

    let mut item_seen = false;
    for payload_item in transaction.items.iter().filter(|entry| entry.id == item.id()) {
        item_seen = true;
        if payload_item.unit_price < expected_price {
            return Err(ValidationError::PriceMismatch {
                expected: expected_price,
                actual: payload_item.unit_price,
            }
            .into());
        }
    }
    if !item_seen {
        return Err(CaptureError::not_found(format!(
            "transaction {} carries no entry for item {}",
            transaction.id,
            item.id()
        )));
    }

    if transaction.authorized_amount < expected_price {
        return Err(ValidationError::AmountMismatch {
            expected: expected_price,
            actual: transaction.authorized_amount,
        }
        .into());
    }

    if transaction.installments > config.max_installments() {
        return Err(ValidationError::InstallmentsExceeded {
            max: config.max_installments(),
            actual: transaction.installments,
        }
        .into());
    }

    let expected_total = config.calculate_amount(expected_price, transaction.installments)?;
    if transaction.authorized_amount != expected_total {
        return Err(ValidationError::InterestMismatch {
            installments: transaction.installments,
            rate: config.interest_rate(),
            expected: expected_total,
            actual: transaction.authorized_amount,
        }
        .into());
    }

    Ok(())
}
