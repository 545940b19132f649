/// Transport tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TransportConfig {
    /// Ports tried, starting at the requested one, before giving up.
    pub max_bind_attempts: u16,
    /// Size of the receive buffer; longer datagrams are truncated by the OS.
    pub recv_buffer_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_bind_attempts: 32,
            recv_buffer_bytes: 65_536,
        }
    }
}

impl TransportConfig {
    /// Creates a config suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_bind_attempts: 4,
            recv_buffer_bytes: 2048,
        }
    }
}
