use crate::domain::money::{self, PaymentPlanEntry};
use crate::error::{CaptureError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Payment methods accepted by the modeled gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    Boleto,
}

/// Merchant-configured checkout defaults shared by many items.
///
/// Invariants are enforced at construction: at least one installment, a free
/// band of `1..=max_installments`, and a non-negative interest rate.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentFormConfig {
    max_installments: u32,
    free_installment: u32,
    interest_rate: Decimal,
    payment_methods: Vec<PaymentMethod>,
}

impl PaymentFormConfig {
    pub fn new(
        max_installments: u32,
        free_installment: u32,
        interest_rate: Decimal,
        payment_methods: Vec<PaymentMethod>,
    ) -> Result<Self> {
        if max_installments == 0 {
            return Err(CaptureError::config("max_installments must be at least 1"));
        }
        if free_installment == 0 || free_installment > max_installments {
            return Err(CaptureError::config(format!(
                "free_installment must be within 1..={max_installments}, got {free_installment}"
            )));
        }
        if interest_rate.is_sign_negative() {
            return Err(CaptureError::config(format!(
                "interest_rate must be non-negative, got {interest_rate}"
            )));
        }
        Ok(Self {
            max_installments,
            free_installment,
            interest_rate,
            payment_methods,
        })
    }

    pub fn max_installments(&self) -> u32 {
        self.max_installments
    }

    pub fn free_installment(&self) -> u32 {
        self.free_installment
    }

    pub fn interest_rate(&self) -> Decimal {
        self.interest_rate
    }

    pub fn payment_methods(&self) -> &[PaymentMethod] {
        &self.payment_methods
    }

    pub fn allows(&self, method: PaymentMethod) -> bool {
        self.payment_methods.contains(&method)
    }

    /// Interest-adjusted total for `amount` paid in `installments` parts
    /// under this config. See [`money::calculate_amount`].
    pub fn calculate_amount(&self, amount: i64, installments: u32) -> Result<i64> {
        money::calculate_amount(
            amount,
            installments,
            self.free_installment,
            self.interest_rate,
        )
    }

    /// Full installment table for `price` under this config.
    pub fn payment_plans(&self, price: i64) -> Result<Vec<PaymentPlanEntry>> {
        money::payment_plans(self, price)
    }
}

/// A sellable item with its expected unit price and checkout configuration.
///
/// The effective config falls back from the item-level override to the
/// linked form defaults; resolution is explicit, no dynamic lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentItemConfig {
    id: String,
    name: String,
    price: i64,
    tangible: bool,
    default_config: Arc<PaymentFormConfig>,
    config_override: Option<PaymentFormConfig>,
}

impl PaymentItemConfig {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: i64,
        tangible: bool,
        default_config: Arc<PaymentFormConfig>,
    ) -> Result<Self> {
        if price < 0 {
            return Err(CaptureError::config(format!(
                "item price must be non-negative, got {price}"
            )));
        }
        Ok(Self {
            id: id.into(),
            name: name.into(),
            price,
            tangible,
            default_config,
            config_override: None,
        })
    }

    /// Replaces the linked defaults with an item-level config.
    pub fn with_config_override(mut self, config: PaymentFormConfig) -> Self {
        self.config_override = Some(config);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tangible(&self) -> bool {
        self.tangible
    }

    /// The merchant's authoritative unit price in minor units.
    pub fn expected_unit_price(&self) -> i64 {
        self.price
    }

    pub fn effective_config(&self) -> &PaymentFormConfig {
        self.config_override.as_ref().unwrap_or(&self.default_config)
    }

    /// Installment table for this item under its effective config.
    pub fn payment_plans(&self) -> Result<Vec<PaymentPlanEntry>> {
        self.effective_config().payment_plans(self.price)
    }
}
