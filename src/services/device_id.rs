//! Stable identifier for this device, used when requesting a pairing token.

use sha2::{Digest, Sha256};
use std::env;

/// Derive a device identifier from the local environment.
///
/// The result is stable for a given user, home and working directory on
/// the same platform.
pub fn local_device_id() -> String {
    let user = env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_default();
    let home = env::var("HOME").unwrap_or_default();
    let cwd = env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    derive(&[&user, &home, &cwd, env::consts::OS, env::consts::ARCH])
}

fn derive(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_id_is_stable() {
        assert_eq!(local_device_id(), local_device_id());
        assert_eq!(local_device_id().len(), 64);
    }

    #[test]
    fn test_parts_are_separated() {
        assert_ne!(derive(&["ab", "c"]), derive(&["a", "bc"]));
    }
}
