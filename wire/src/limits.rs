//! Configurable limits for bounded decoding.

/// Wire-level limits for datagram decoding.
///
/// These limits are enforced during decoding to prevent resource exhaustion
/// and ensure bounded memory usage. Parameter-level limits belong to the
/// codec layer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Limits {
    /// Maximum datagram size in bytes.
    pub max_datagram_bytes: usize,

    /// Maximum approval payload carried by a connect request.
    pub max_approval_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // Largest UDP payload over IPv4.
            max_datagram_bytes: 65_507,
            max_approval_bytes: 1024,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_datagram_bytes: 1200,
            max_approval_bytes: 64,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_datagram_bytes: usize::MAX,
            max_approval_bytes: usize::MAX,
        }
    }
}
