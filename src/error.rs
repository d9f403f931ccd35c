use crate::domain::payment::PaymentId;
use miette::Diagnostic;
use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CaptureError>;

/// One of the four reconciliation checks failed.
///
/// Every variant carries the expected and actual values so the rejection is
/// independently auditable from logs alone. The rendered messages are meant
/// for server-side logging, never for echoing back to the paying customer.
#[derive(Debug, Error, Diagnostic)]
pub enum ValidationError {
    #[error("item price {actual} is lower than the expected {expected}")]
    #[diagnostic(code(capguard::price_mismatch))]
    PriceMismatch { expected: i64, actual: i64 },

    #[error("authorized amount {actual} is lower than the expected {expected}")]
    #[diagnostic(code(capguard::amount_mismatch))]
    AmountMismatch { expected: i64, actual: i64 },

    #[error("{actual} installment(s) is more than the configured maximum of {max}")]
    #[diagnostic(code(capguard::installments_exceeded))]
    InstallmentsExceeded { max: u32, actual: u32 },

    #[error(
        "{installments} installment(s) at {rate}% interest should total {expected} \
         but the gateway authorized {actual}"
    )]
    #[diagnostic(code(capguard::interest_mismatch))]
    InterestMismatch {
        installments: u32,
        rate: Decimal,
        expected: i64,
        actual: i64,
    },
}

#[derive(Debug, Error, Diagnostic)]
pub enum CaptureError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    /// A payment already exists for this transaction id. Duplicate captures
    /// are rejected, never silently absorbed.
    #[error("transaction {transaction_id} has already been captured")]
    #[diagnostic(code(capguard::already_processed))]
    AlreadyProcessed { transaction_id: String },

    #[error("{0}")]
    #[diagnostic(code(capguard::not_found))]
    NotFound(String),

    /// Network failure or 5xx from the gateway. Eligible for caller-level
    /// retry; the engine itself never retries.
    #[error("gateway unavailable: {0}")]
    #[diagnostic(code(capguard::transient_gateway))]
    TransientGateway(String),

    /// A status-changed subscriber failed. The payment and its notification
    /// stay committed; this only reports the fan-out problem.
    #[error("status listener failed for payment {payment_id}")]
    #[diagnostic(code(capguard::listener))]
    Listener {
        payment_id: PaymentId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid payment configuration: {0}")]
    #[diagnostic(code(capguard::config))]
    Config(String),

    #[error("amount overflow computing {installments} installment(s) over {amount}")]
    #[diagnostic(code(capguard::overflow))]
    Overflow { amount: i64, installments: u32 },

    #[error("storage backend error: {0}")]
    #[diagnostic(code(capguard::storage))]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

impl CaptureError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn storage(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(source))
    }

    /// True for the four reconciliation checks, i.e. tamper- or user-caused
    /// rejections that must map to a client error upstream.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
