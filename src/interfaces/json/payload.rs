use crate::domain::transaction::GatewayTransaction;
use crate::error::{CaptureError, Result};
use std::io::Read;

/// Parses a raw gateway transaction document.
///
/// This is the trust boundary: the payload is decoded into the strongly
/// typed [`GatewayTransaction`] and checked for structural sanity before
/// anything downstream looks at it. Unknown fields are ignored (the gateway
/// ships dozens the engine does not care about); a document that cannot be
/// decoded or fails the structural checks is unusable and reported as
/// `NotFound`.
pub fn parse_transaction(raw: &str) -> Result<GatewayTransaction> {
    let transaction: GatewayTransaction = serde_json::from_str(raw)
        .map_err(|err| CaptureError::not_found(format!("malformed gateway payload: {err}")))?;
    transaction.ensure_well_formed()?;
    Ok(transaction)
}

/// Streaming variant of [`parse_transaction`] for file or network sources.
pub fn read_transaction<R: Read>(source: R) -> Result<GatewayTransaction> {
    let transaction: GatewayTransaction = serde_json::from_reader(source)
        .map_err(|err| CaptureError::not_found(format!("malformed gateway payload: {err}")))?;
    transaction.ensure_well_formed()?;
    Ok(transaction)
}

/// Variant of [`parse_transaction`] for payloads already decoded into a
/// generic JSON value (e.g. embedded in a larger document).
pub fn transaction_from_value(value: serde_json::Value) -> Result<GatewayTransaction> {
    let transaction: GatewayTransaction = serde_json::from_value(value)
        .map_err(|err| CaptureError::not_found(format!("malformed gateway payload: {err}")))?;
    transaction.ensure_well_formed()?;
    Ok(transaction)
}
