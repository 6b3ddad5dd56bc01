//! Utility functions for identifiers, file locations and digests

use bech32::Bech32m;
use uuid7::Uuid;

// encode a uuid using bech32 under the given human readable prefix
pub fn uuid_to_bech32(hrp: &str, uuid: &Uuid) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid.as_bytes())?;
    Ok(encode)
}

/// Resolves a stored acta path against `base`. Absolute URLs pass through unchanged.
pub fn resolve_file_url(base: &str, path: &str) -> String {
    let path = path.trim();
    let lower = path.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Normalises a hex digest for comparison: optional `0x` prefix, any case.
pub fn normalize_digest(digest: &str) -> Option<Vec<u8>> {
    let digest = digest.trim();
    let digest = digest
        .strip_prefix("0x")
        .or_else(|| digest.strip_prefix("0X"))
        .unwrap_or(digest);
    hex::decode(digest).ok()
}
