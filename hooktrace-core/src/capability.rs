use serde::{Deserialize, Serialize};

/// Major version of the running host, e.g. 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HostVersion(pub u32);

/// Hosts speak the two-argument executor-run signature from this version on.
pub const EXECUTE_ONCE_SINCE: HostVersion = HostVersion(10);
/// Hosts pass a read-only-tree flag to process-utility from this version on.
pub const READ_ONLY_TREE_SINCE: HostVersion = HostVersion(14);
/// The index-name point exists from this version on.
pub const INDEX_NAME_SINCE: HostVersion = HostVersion(12);

/// What the running host supports, discovered once before the registry is
/// built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCapabilities {
    pub version: HostVersion,
}

impl HostCapabilities {
    pub fn new(version: u32) -> Self {
        Self {
            version: HostVersion(version),
        }
    }
}

/// Predicate deciding whether a point exists for a given host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityGate {
    Always,
    MinVersion(HostVersion),
}

impl CapabilityGate {
    pub fn admits(&self, caps: &HostCapabilities) -> bool {
        match self {
            Self::Always => true,
            Self::MinVersion(min) => caps.version >= *min,
        }
    }
}

/// Signature revision of a version-split point, resolved exactly once when
/// the registry is built; per-call code never branches on host version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureRev {
    V1,
    V2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_admits_any_version() {
        assert!(CapabilityGate::Always.admits(&HostCapabilities::new(1)));
        assert!(CapabilityGate::Always.admits(&HostCapabilities::new(99)));
    }

    #[test]
    fn test_min_version_is_inclusive() {
        let gate = CapabilityGate::MinVersion(HostVersion(12));
        assert!(!gate.admits(&HostCapabilities::new(11)));
        assert!(gate.admits(&HostCapabilities::new(12)));
        assert!(gate.admits(&HostCapabilities::new(13)));
    }

    #[test]
    fn test_version_ordering() {
        assert!(HostVersion(9) < EXECUTE_ONCE_SINCE);
        assert!(READ_ONLY_TREE_SINCE > INDEX_NAME_SINCE);
    }
}
