/// Cache fingerprint derivation for generation requests
use crate::strategy::StrategyInput;
use sha2::{Digest, Sha256};

/// Derive the cache fingerprint for a request.
///
/// SHA-256 hex digest over the ordered '|'-joined field values. The cache is
/// content-addressed, not user-scoped: identical field values always produce
/// the same fingerprint no matter who asks. Casing and whitespace are
/// deliberately not normalized.
pub fn derive(input: &StrategyInput) -> String {
    let material = format!(
        "{}|{}|{}|{}|{}",
        input.goal, input.audience, input.industry, input.platform, input.content_type
    );

    let mut hasher = Sha256::new();
    hasher.update(material.as_bytes());
    hex::encode(hasher.finalize())
}
