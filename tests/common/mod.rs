use capguard::application::notify::{StatusChangedBus, StatusChangedListener};
use capguard::application::reconciler::CaptureReconciler;
use capguard::domain::config::{PaymentFormConfig, PaymentItemConfig, PaymentMethod};
use capguard::domain::payment::PaymentId;
use capguard::domain::transaction::GatewayTransaction;
use capguard::infrastructure::in_memory::{
    InMemoryGateway, InMemoryItemCatalog, InMemoryNotificationStore, InMemoryPaymentStore,
};
use capguard::interfaces::json::payload;
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};

pub const TOKEN: &str = "test_transaction_aJx9ibUmRqYcQrrUaNtQ3arTO4tF1z";
pub const TRANSACTION_ID: u64 = 7656690;
pub const ITEM_ID: &str = "curso-python";
pub const PRICE: i64 = 9999;

pub fn form_config() -> PaymentFormConfig {
    PaymentFormConfig::new(12, 1, dec!(1.66), vec![PaymentMethod::CreditCard]).unwrap()
}

pub fn payment_item() -> PaymentItemConfig {
    PaymentItemConfig::new(ITEM_ID, "Curso Python", PRICE, false, Arc::new(form_config()))
        .unwrap()
}

/// A trimmed-down copy of the gateway's transaction JSON, with the fields
/// the engine reads plus a sample of the noise it must ignore.
pub fn transaction_json() -> serde_json::Value {
    serde_json::json!({
        "object": "transaction",
        "status": "authorized",
        "refuse_reason": null,
        "status_reason": "antifraud",
        "acquirer_name": "stone",
        "authorization_code": "727706",
        "tid": TRANSACTION_ID,
        "nsu": TRANSACTION_ID,
        "amount": PRICE,
        "authorized_amount": PRICE,
        "paid_amount": 0,
        "refunded_amount": 0,
        "installments": 1,
        "id": TRANSACTION_ID,
        "cost": 70,
        "card_holder_name": "Bar Baz",
        "card_last_digits": "1111",
        "card_first_digits": "411111",
        "card_brand": "visa",
        "payment_method": "credit_card",
        "capture_method": "ecommerce",
        "items": [{
            "object": "item",
            "id": ITEM_ID,
            "title": "Curso Python",
            "unit_price": PRICE,
            "quantity": 1,
            "category": null,
            "tangible": false
        }],
        "card": {
            "object": "card",
            "id": "card_ck5n7vtbi010or36dojq96sb1",
            "brand": "visa",
            "last_digits": "1111",
            "valid": true
        }
    })
}

pub fn transaction() -> GatewayTransaction {
    payload::transaction_from_value(transaction_json()).unwrap()
}

pub struct Harness {
    pub reconciler: CaptureReconciler,
    pub gateway: InMemoryGateway,
    pub catalog: InMemoryItemCatalog,
    pub payments: InMemoryPaymentStore,
    pub notifications: InMemoryNotificationStore,
    pub status_bus: Arc<StatusChangedBus>,
}

/// Wires a reconciler over in-memory collaborators with the fixture item
/// registered under [`TOKEN`] and `transaction` authorized at the gateway.
pub async fn harness_with(transaction: GatewayTransaction) -> Harness {
    let gateway = InMemoryGateway::new();
    gateway.authorize(TOKEN, transaction).await;

    let catalog = InMemoryItemCatalog::new();
    catalog.register(TOKEN, payment_item()).await;

    let payments = InMemoryPaymentStore::new();
    let notifications = InMemoryNotificationStore::new();
    let status_bus = Arc::new(StatusChangedBus::new());

    let reconciler = CaptureReconciler::new(
        Box::new(gateway.clone()),
        Box::new(catalog.clone()),
        Box::new(payments.clone()),
        Box::new(notifications.clone()),
        status_bus.clone(),
    );

    Harness {
        reconciler,
        gateway,
        catalog,
        payments,
        notifications,
        status_bus,
    }
}

pub async fn harness() -> Harness {
    harness_with(transaction()).await
}

/// A listener that records every payment id it is invoked with.
pub fn recording_listener() -> (StatusChangedListener, Arc<Mutex<Vec<PaymentId>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let captured = calls.clone();
    let listener: StatusChangedListener = Box::new(move |payment_id| {
        captured.lock().unwrap().push(payment_id);
        Ok(())
    });
    (listener, calls)
}
