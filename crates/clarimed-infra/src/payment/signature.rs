//! Payment callback signature verification with HMAC-SHA256.
//!
//! The gateway signs `orderReference|paymentReference` with the shared
//! merchant secret and sends the hex digest alongside the callback.
//! Verification uses constant-time comparison to prevent timing attacks.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use clarimed_types::error::PaymentError;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// The string both sides sign: `orderReference|paymentReference`.
fn signing_payload(order_reference: &str, payment_reference: &str) -> String {
    format!("{order_reference}|{payment_reference}")
}

/// Compute the hex-encoded HMAC-SHA256 signature for a callback.
///
/// Useful for generating test vectors and gateway simulators.
pub fn compute_callback_signature(
    secret: &[u8],
    order_reference: &str,
    payment_reference: &str,
) -> Result<String, PaymentError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| PaymentError::Malformed(format!("invalid merchant secret: {e}")))?;
    mac.update(signing_payload(order_reference, payment_reference).as_bytes());
    let result = mac.finalize();
    Ok(hex_encode(&result.into_bytes()))
}

/// Verify an HMAC-SHA256 callback signature.
///
/// Constant-time verification (via the hmac crate's `verify_slice`).
/// Malformed hex fails the same way as a wrong digest; callers cannot
/// distinguish the two.
///
/// # Errors
///
/// Returns [`PaymentError::InvalidSignature`] on any mismatch.
pub fn verify_callback_signature(
    secret: &[u8],
    order_reference: &str,
    payment_reference: &str,
    signature_hex: &str,
) -> Result<(), PaymentError> {
    let expected_bytes = hex_decode(signature_hex).map_err(|_| PaymentError::InvalidSignature)?;

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| PaymentError::Malformed(format!("invalid merchant secret: {e}")))?;
    mac.update(signing_payload(order_reference, payment_reference).as_bytes());

    mac.verify_slice(&expected_bytes)
        .map_err(|_| PaymentError::InvalidSignature)
}

/// Decode a hex string to bytes.
///
/// Rejects non-ASCII input up front; the gateway sends untrusted strings
/// and byte-offset slicing must never land inside a multi-byte char.
fn hex_decode(hex: &str) -> Result<Vec<u8>, ()> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return Err(());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ()))
        .collect()
}

/// Encode bytes to a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
