use serde_json::Value;
use sha2::{Digest, Sha256};

use tibet_signing_core::PortError;

/// 32 random bytes as lowercase hex, the shape of relay topics and symmetric keys.
pub(crate) fn random_hex32() -> Result<String, PortError> {
    let mut buf = [0u8; 32];
    getrandom::getrandom(&mut buf)
        .map_err(|e| PortError::Transport(format!("entropy source unavailable: {e}")))?;
    Ok(hex::encode(buf))
}

/// Stable stand-in for a signed offer: the same request params always yield the same text.
pub(crate) fn deterministic_offer(label: &str, params: &Value) -> Result<String, PortError> {
    let encoded = serde_json::to_vec(params)
        .map_err(|e| PortError::Validation(format!("offer params not serializable: {e}")))?;
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    hasher.update(&encoded);
    Ok(format!("offer1{}", hex::encode(hasher.finalize())))
}
