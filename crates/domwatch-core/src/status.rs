//! Status and result model
//!
//! A registrar answers every question about a domain with exactly one
//! [`Status`]. Passes wrap those answers in [`CheckResult`]s so callers know
//! which registrar said what.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Availability of a domain name as seen by one registrar
///
/// Values are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Not available to us in any feasible way
    #[default]
    Unavailable,
    /// Already in our possession
    Owned,
    /// Free to be claimed
    Available,
    /// A registration is already underway
    Processing,
}

impl Status {
    /// Whether this status means the domain is ours or about to be
    pub fn is_claimed(self) -> bool {
        matches!(self, Status::Owned | Status::Processing)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Unavailable => "unavailable",
            Status::Owned => "owned",
            Status::Available => "available",
            Status::Processing => "processing",
        };
        f.write_str(s)
    }
}

/// One registrar's answer for one domain during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Name of the registrar that answered
    pub registrar: String,
    /// The status it reported
    pub status: Status,
    /// The domain that was asked about
    pub domain: String,
}

impl CheckResult {
    /// Create a new result
    pub fn new(registrar: impl Into<String>, status: Status, domain: impl Into<String>) -> Self {
        Self {
            registrar: registrar.into(),
            status,
            domain: domain.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claimed_statuses() {
        assert!(Status::Owned.is_claimed());
        assert!(Status::Processing.is_claimed());
        assert!(!Status::Available.is_claimed());
        assert!(!Status::Unavailable.is_claimed());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&Status::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        assert_eq!(Status::default(), Status::Unavailable);
        assert_eq!(Status::Available.to_string(), "available");
    }
}
