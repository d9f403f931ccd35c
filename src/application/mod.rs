//! Application layer orchestrating the capture flow.
//!
//! `CaptureReconciler` is the primary entry point: it drives one capture
//! reconciliation over the collaborator ports and fans out status changes
//! through the `StatusChangedBus`.

pub mod notify;
pub mod reconciler;
