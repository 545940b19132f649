use codec::CodecLimits;
use wire::Limits;

/// Node configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NodeConfig {
    /// Whether this node assigns RPC ids.
    pub protocol_authority: bool,
    /// Established connections at which inbound attempts are refused.
    pub max_connections: usize,
    /// Resends of an unanswered connect request before giving up.
    pub connect_retries: u32,
    /// Wait before resending an unanswered connect request.
    pub connect_timeout_ms: u64,
    /// Silence after which an established connection is dropped.
    pub liveness_timeout_ms: u64,
    /// Idle time after which a heartbeat is sent.
    pub heartbeat_interval_ms: u64,
    /// Wait before resending an unacknowledged reliable message.
    pub resend_interval_ms: u64,
    /// Resends before a reliable message is given up.
    pub max_resends: u32,
    /// First id handed out for locally spawned objects.
    pub object_id_base: u32,
    pub wire_limits: Limits,
    pub codec_limits: CodecLimits,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            protocol_authority: false,
            max_connections: 64,
            connect_retries: 4,
            connect_timeout_ms: 2000,
            liveness_timeout_ms: 10_000,
            heartbeat_interval_ms: 1000,
            resend_interval_ms: 200,
            max_resends: 20,
            object_id_base: 1,
            wire_limits: Limits::default(),
            codec_limits: CodecLimits::default(),
        }
    }
}

impl NodeConfig {
    /// Creates a config suitable for testing with smaller values.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            protocol_authority: false,
            max_connections: 8,
            connect_retries: 4,
            connect_timeout_ms: 100,
            liveness_timeout_ms: 1000,
            heartbeat_interval_ms: 50,
            resend_interval_ms: 20,
            max_resends: 5,
            object_id_base: 1,
            wire_limits: Limits::for_testing(),
            codec_limits: CodecLimits::for_testing(),
        }
    }

    /// Same config with the protocol authority flag set.
    #[must_use]
    pub fn authority(mut self) -> Self {
        self.protocol_authority = true;
        self
    }
}
