use crate::domain::config::PaymentMethod;
use crate::error::{CaptureError, Result};
use serde::Deserialize;

/// Lifecycle states reported by the gateway for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Processing,
    Authorized,
    Paid,
    Refused,
    WaitingPayment,
    PendingRefund,
    Refunded,
    #[serde(other)]
    Unknown,
}

/// One line item as reported in the gateway payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionItem {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub unit_price: i64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub tangible: bool,
}

fn default_quantity() -> u32 {
    1
}

/// Card summary embedded in the gateway payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CardSummary {
    pub id: String,
    #[serde(default)]
    pub last_digits: Option<String>,
}

/// Read-only view of a gateway transaction.
///
/// This is untrusted input: it arrives from an external payload that a
/// client or a compromised gateway may have tampered with. Nothing here is
/// believed until the reconciler has recomputed the expected values. Field
/// names mirror the gateway's transaction JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GatewayTransaction {
    pub id: u64,
    pub status: TransactionStatus,
    pub installments: u32,
    pub authorized_amount: i64,
    #[serde(default)]
    pub paid_amount: i64,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub card_last_digits: Option<String>,
    #[serde(default)]
    pub items: Vec<TransactionItem>,
    #[serde(default)]
    pub card: Option<CardSummary>,
}

impl GatewayTransaction {
    /// The transaction id in the string form used for payment uniqueness.
    pub fn transaction_id(&self) -> String {
        self.id.to_string()
    }

    /// Structural sanity of the payload, checked before any reconciliation
    /// check runs. A document that fails here never reaches the integrity
    /// checks; it is rejected as unusable.
    pub fn ensure_well_formed(&self) -> Result<()> {
        if self.installments == 0 {
            return Err(CaptureError::not_found(format!(
                "unusable gateway transaction {}: installments must be at least 1",
                self.id
            )));
        }
        if self.authorized_amount < 0 || self.paid_amount < 0 {
            return Err(CaptureError::not_found(format!(
                "unusable gateway transaction {}: negative amount",
                self.id
            )));
        }
        if self.items.is_empty() {
            return Err(CaptureError::not_found(format!(
                "unusable gateway transaction {}: no items",
                self.id
            )));
        }
        if let Some(item) = self.items.iter().find(|item| item.unit_price < 0) {
            return Err(CaptureError::not_found(format!(
                "unusable gateway transaction {}: negative unit price for item {}",
                self.id, item.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GatewayTransaction {
        GatewayTransaction {
            id: 7656690,
            status: TransactionStatus::Authorized,
            installments: 1,
            authorized_amount: 9999,
            paid_amount: 0,
            payment_method: Some(PaymentMethod::CreditCard),
            card_last_digits: Some("1111".into()),
            items: vec![TransactionItem {
                id: "curso-python".into(),
                title: Some("Curso Python".into()),
                unit_price: 9999,
                quantity: 1,
                tangible: false,
            }],
            card: Some(CardSummary {
                id: "card_ck5n7vtbi010or36dojq96sb1".into(),
                last_digits: Some("1111".into()),
            }),
        }
    }

    #[test]
    fn deserializes_the_gateway_wire_names() {
        let raw = r#"{
            "object": "transaction",
            "id": 7656690,
            "status": "authorized",
            "installments": 1,
            "amount": 9999,
            "authorized_amount": 9999,
            "paid_amount": 0,
            "payment_method": "credit_card",
            "card_last_digits": "1111",
            "items": [{
                "object": "item",
                "id": "curso-python",
                "title": "Curso Python",
                "unit_price": 9999,
                "quantity": 1,
                "tangible": false
            }],
            "card": {
                "object": "card",
                "id": "card_ck5n7vtbi010or36dojq96sb1",
                "last_digits": "1111"
            }
        }"#;

        let tx: GatewayTransaction = serde_json::from_str(raw).unwrap();
        assert_eq!(tx, sample());
    }

    #[test]
    fn unrecognized_statuses_fall_back_to_unknown() {
        let status: TransactionStatus = serde_json::from_str("\"chargedback\"").unwrap();
        assert_eq!(status, TransactionStatus::Unknown);
    }

    #[test]
    fn well_formed_sample_passes() {
        assert!(sample().ensure_well_formed().is_ok());
    }

    #[test]
    fn zero_installments_are_rejected() {
        let mut tx = sample();
        tx.installments = 0;
        assert!(matches!(
            tx.ensure_well_formed(),
            Err(CaptureError::NotFound(_))
        ));
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let mut tx = sample();
        tx.authorized_amount = -1;
        assert!(matches!(
            tx.ensure_well_formed(),
            Err(CaptureError::NotFound(_))
        ));
    }

    #[test]
    fn missing_items_are_rejected() {
        let mut tx = sample();
        tx.items.clear();
        assert!(matches!(
            tx.ensure_well_formed(),
            Err(CaptureError::NotFound(_))
        ));
    }

    #[test]
    fn negative_unit_prices_are_rejected() {
        let mut tx = sample();
        tx.items[0].unit_price = -1;
        assert!(matches!(
            tx.ensure_well_formed(),
            Err(CaptureError::NotFound(_))
        ));
    }
}
