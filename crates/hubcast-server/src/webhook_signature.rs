//! HMAC-SHA256 verification of webhook payload signatures.

use anyhow::{anyhow, bail, Context, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Verifies a `sha256=<hex>` signature header against the raw request body.
///
/// The digest must be computed over the exact bytes received on the wire;
/// verifying a re-serialized payload breaks on field order, whitespace, and
/// escaping differences. Comparison is constant-time via `Mac::verify_slice`.
pub fn verify_webhook_signature(
    raw_body: &[u8],
    signature_header: &str,
    secret: &str,
) -> Result<()> {
    let digest_hex = signature_header
        .strip_prefix("sha256=")
        .ok_or_else(|| anyhow!("signature header must use sha256=<hex> format"))?;
    let signature_bytes = decode_hex_digest(digest_hex)?;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .context("failed to initialize hmac verifier")?;
    mac.update(raw_body);
    mac.verify_slice(&signature_bytes)
        .map_err(|_| anyhow!("signature verification failed"))
}

fn decode_hex_digest(raw: &str) -> Result<Vec<u8>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("signature digest cannot be empty");
    }
    if !trimmed.is_ascii() {
        bail!("signature digest must be ascii hex");
    }
    if trimmed.len() % 2 != 0 {
        bail!("signature digest must have an even number of hex characters");
    }
    let mut bytes = Vec::with_capacity(trimmed.len() / 2);
    let mut index = 0usize;
    while index < trimmed.len() {
        let chunk = &trimmed[index..index + 2];
        let byte = u8::from_str_radix(chunk, 16)
            .with_context(|| format!("invalid hex byte '{chunk}' in signature digest"))?;
        bytes.push(byte);
        index += 2;
    }
    Ok(bytes)
}

/// Computes the `sha256=<hex>` header value for a payload and secret.
///
/// Used by tests and by operators debugging webhook deliveries.
pub fn compute_webhook_signature(raw_body: &[u8], secret: &str) -> Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .context("failed to initialize hmac signer")?;
    mac.update(raw_body);
    let digest = mac.finalize().into_bytes();
    let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    Ok(format!("sha256={hex}"))
}
