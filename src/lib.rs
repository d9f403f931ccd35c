//! Capture validation & installment-pricing engine.
//!
//! Reconciles a payment gateway's capture callback against the merchant's
//! own pricing configuration: recomputes the expected item price, authorized
//! amount and interest-adjusted installment total, rejects the capture on
//! the first discrepancy, and otherwise records the payment and fans out a
//! status-changed notification.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;

pub use error::{CaptureError, Result, ValidationError};
