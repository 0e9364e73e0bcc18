//! Auth client domain type.
//!
//! A client is a calling application (web frontend, mobile app) that is
//! allowed to use the token endpoint. Client registrations are immutable
//! once issued and owned by the repository collaborator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered API client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Unique identifier for this registration row.
    pub id: Uuid,

    /// Public client identifier presented in grant requests.
    pub client_id: String,

    /// Shared secret presented in grant requests.
    pub client_secret: String,
}

impl Client {
    /// Validates a candidate secret against the registered one.
    ///
    /// The comparison runs in time independent of where the first
    /// mismatching byte sits, so a caller cannot narrow the secret down
    /// byte by byte from response timing.
    #[must_use]
    pub fn validate_secret(&self, candidate: &str) -> bool {
        constant_time_eq(self.client_secret.as_bytes(), candidate.as_bytes())
    }
}

/// Byte-wise comparison without an early exit on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let mut diff = a.len() ^ b.len();
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= usize::from(x ^ y);
    }

    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(secret: &str) -> Client {
        Client {
            id: Uuid::new_v4(),
            client_id: "test-client".to_string(),
            client_secret: secret.to_string(),
        }
    }

    #[test]
    fn test_validate_secret_match() {
        assert!(client("SecretSuper").validate_secret("SecretSuper"));
    }

    #[test]
    fn test_validate_secret_mismatch() {
        let c = client("SecretSuper");
        assert!(!c.validate_secret("secretsuper"));
        assert!(!c.validate_secret("SecretSupe"));
        assert!(!c.validate_secret("SecretSuperX"));
        assert!(!c.validate_secret(""));
    }

    #[test]
    fn test_validate_secret_empty_registration() {
        let c = client("");
        assert!(c.validate_secret(""));
        assert!(!c.validate_secret("anything"));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
        assert!(!constant_time_eq(b"", b"a"));
        assert!(constant_time_eq(b"", b""));
    }
}
