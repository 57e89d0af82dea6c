//! Composite transaction ids of the form `{gateway_id}_{native_id}`.
//!
//! The prefix is the only way to route a bare transaction id back to the
//! gateway that issued it.

pub const SEPARATOR: char = '_';

/// Prefixes `native_id` with `gateway_id`, unless it already carries that prefix.
pub fn compose(gateway_id: &str, native_id: &str) -> String {
    match strip(gateway_id, native_id) {
        Some(_) => native_id.to_string(),
        None => format!("{}{}{}", gateway_id, SEPARATOR, native_id),
    }
}

/// Splits on the first separator. Returns `None` when there is no usable prefix.
pub fn split(transaction_id: &str) -> Option<(&str, &str)> {
    transaction_id
        .split_once(SEPARATOR)
        .filter(|(gateway, _)| !gateway.is_empty())
}

/// Returns the native part of `transaction_id` if it belongs to `gateway_id`.
pub fn strip<'a>(gateway_id: &str, transaction_id: &'a str) -> Option<&'a str> {
    transaction_id
        .strip_prefix(gateway_id)
        .and_then(|rest| rest.strip_prefix(SEPARATOR))
}
