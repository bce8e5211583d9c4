use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Who made a commit or tag, and when.
///
/// `time` is seconds since the UNIX epoch. Ancestry walks order commits by
/// this value, newest first.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub time: i64,
}

impl Signature {
    /// Create a signature with an explicit timestamp.
    pub fn new(name: impl Into<String>, email: impl Into<String>, time: i64) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            time,
        }
    }

    /// Create a signature stamped with the current wall-clock time.
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Self {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        Self::new(name, email, time)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({} <{}> @{})", self.name, self.email, self.time)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {}", self.name, self.email, self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_produces_reasonable_timestamp() {
        let sig = Signature::now("a", "a@example.com");
        // Should be after 2020-01-01.
        assert!(sig.time > 1_577_836_800);
    }

    #[test]
    fn display_format() {
        let sig = Signature::new("Ada", "ada@example.com", 1000);
        assert_eq!(format!("{sig}"), "Ada <ada@example.com> 1000");
    }

    #[test]
    fn serde_roundtrip() {
        let sig = Signature::new("Ada", "ada@example.com", 42);
        let json = serde_json::to_string(&sig).unwrap();
        let parsed: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(sig, parsed);
    }
}
