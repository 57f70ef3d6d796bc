//! Finding fingerprint computation.
//!
//! A deterministic hash of the fields that identify "the same issue"
//! within one tool's view of one target. The merge step uses it to drop
//! exact duplicates when a tool reports the same alert more than once.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::policy::ToolKind;

/// Compute a finding fingerprint over tool, target, title, and location.
pub fn compute(tool: ToolKind, target_id: Uuid, title: &str, location: &str) -> String {
    hash(&format!("{tool}:{target_id}:{title}:{location}"))
}

/// SHA-256 hash a string and return hex-encoded digest.
fn hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_same_fingerprint() {
        let target = Uuid::new_v4();
        let fp1 = compute(ToolKind::WebScan, target, "SQL Injection", "https://x/search");
        let fp2 = compute(ToolKind::WebScan, target, "SQL Injection", "https://x/search");
        assert_eq!(fp1, fp2);
    }

    #[test]
    fn different_location_different_fingerprint() {
        let target = Uuid::new_v4();
        let fp1 = compute(ToolKind::WebScan, target, "SQL Injection", "https://x/a");
        let fp2 = compute(ToolKind::WebScan, target, "SQL Injection", "https://x/b");
        assert_ne!(fp1, fp2);
    }

    #[test]
    fn different_tool_different_fingerprint() {
        let target = Uuid::new_v4();
        let fp1 = compute(ToolKind::WebScan, target, "title", "loc");
        let fp2 = compute(ToolKind::Dependency, target, "title", "loc");
        assert_ne!(fp1, fp2);
    }

    #[test]
    fn fingerprint_is_hex_sha256() {
        let fp = compute(ToolKind::Container, Uuid::new_v4(), "t", "l");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
