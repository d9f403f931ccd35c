use crate::domain::config::PaymentFormConfig;
use crate::error::{CaptureError, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

/// One row of an installment table, derived from config and price.
///
/// `total` is authoritative: it is what the gateway must authorize for that
/// installment count. `per_installment` is the informational floor share
/// shown to the customer; for counts that do not divide evenly the last
/// installment absorbs the remainder on the gateway side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentPlanEntry {
    pub installments: u32,
    pub total: i64,
    pub per_installment: i64,
}

/// Computes the interest-adjusted total for `amount` minor units paid in
/// `installments` parts.
///
/// A single installment is always free, as is any count inside the free
/// band. Above the band the gateway charges simple interest per
/// installment: `ceil(amount * (1 + rate * n / 100))`. All arithmetic is
/// exact decimal; the only rounding is the final ceiling to whole minor
/// units.
pub fn calculate_amount(
    amount: i64,
    installments: u32,
    free_installment: u32,
    interest_rate: Decimal,
) -> Result<i64> {
    if amount < 0 {
        return Err(CaptureError::config("amount must be non-negative"));
    }
    if installments <= 1 || installments <= free_installment {
        return Ok(amount);
    }

    let factor =
        Decimal::ONE + interest_rate * Decimal::from(installments) / Decimal::ONE_HUNDRED;
    (Decimal::from(amount) * factor)
        .ceil()
        .to_i64()
        .ok_or(CaptureError::Overflow {
            amount,
            installments,
        })
}

/// Builds the full installment table for `price` under `config`, one entry
/// per count from 1 to the configured maximum.
pub fn payment_plans(config: &PaymentFormConfig, price: i64) -> Result<Vec<PaymentPlanEntry>> {
    (1..=config.max_installments())
        .map(|n| {
            let total = config.calculate_amount(price, n)?;
            Ok(PaymentPlanEntry {
                installments: n,
                total,
                per_installment: total / i64::from(n),
            })
        })
        .collect()
}
