//! Stable device fingerprint.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Files that hold a per-installation machine identifier.
const MACHINE_ID_PATHS: [&str; 2] = ["/etc/machine-id", "/var/lib/dbus/machine-id"];

/// Produces the identifier sent as `client_fingerprint` at session creation.
///
/// The value is opaque to the service; it only needs to be stable for a
/// device so repeated sessions map to the same device record.
pub trait FingerprintSource: Send + Sync {
    fn fingerprint(&self) -> String;
}

/// Fingerprint derived from host characteristics.
///
/// Hashes the machine id, host name, user name, OS and architecture. When
/// neither a machine id nor a host name can be found, a random identifier is
/// returned instead; [`TokenStore`](crate::TokenStore) persists whatever is
/// produced, so the device stays stable across restarts either way.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceFingerprint;

impl DeviceFingerprint {
    fn machine_id() -> Option<String> {
        MACHINE_ID_PATHS
            .iter()
            .filter_map(|path| std::fs::read_to_string(path).ok())
            .map(|id| id.trim().to_string())
            .find(|id| !id.is_empty())
    }

    fn host_name() -> Option<String> {
        std::env::var("HOSTNAME")
            .or_else(|_| std::env::var("COMPUTERNAME"))
            .ok()
            .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }

    fn user_name() -> String {
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_default()
    }

    /// Hash device characteristics into a hex digest.
    pub fn digest(machine_id: &str, host_name: &str, user_name: &str) -> String {
        let mut hasher = Sha256::new();
        for part in [
            machine_id,
            host_name,
            user_name,
            std::env::consts::OS,
            std::env::consts::ARCH,
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }
}

impl FingerprintSource for DeviceFingerprint {
    fn fingerprint(&self) -> String {
        let machine_id = Self::machine_id();
        let host_name = Self::host_name();
        if machine_id.is_none() && host_name.is_none() {
            return Uuid::new_v4().simple().to_string();
        }
        Self::digest(
            machine_id.as_deref().unwrap_or_default(),
            host_name.as_deref().unwrap_or_default(),
            &Self::user_name(),
        )
    }
}
