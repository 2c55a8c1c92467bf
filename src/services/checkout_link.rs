//! Outbound checkout link construction.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Builds the gateway checkout URL for an order.
///
/// The merchant id, order id, amount (minor units) and return URL are packed
/// as `m=..;ac.order_id=..;a=..;c=..` and base64-encoded into a single path
/// segment after `base_url`.
pub fn build_checkout_link(
    base_url: &str,
    merchant_id: &str,
    order_id: &str,
    amount: i64,
    return_url: &str,
) -> String {
    let params = format!(
        "m={};ac.order_id={};a={};c={}",
        merchant_id, order_id, amount, return_url
    );
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        STANDARD.encode(params.as_bytes())
    )
}
