//! Error types for wire format operations.

use std::fmt;

use bitstream::BitError;

/// Result type for wire format operations.
pub type WireResult<T> = Result<T, DecodeError>;

/// High-level decode errors for datagram framing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// Datagram carried no bytes at all.
    EmptyDatagram,

    /// First byte is not a known control tag.
    UnknownControlTag { tag: u8 },

    /// A bodiless control datagram carried trailing bytes.
    UnexpectedPayload { tag: u8, len: usize },

    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// Message header could not be read.
    Header(BitError),
}

/// Specific wire limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    DatagramBytes,
    ApprovalPayloadBytes,
}

/// Errors that can occur during encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// Header field could not be written.
    Header(BitError),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDatagram => write!(f, "empty datagram"),
            Self::UnknownControlTag { tag } => write!(f, "unknown control tag: {tag}"),
            Self::UnexpectedPayload { tag, len } => {
                write!(f, "control tag {tag} carries unexpected {len}-byte payload")
            }
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
            Self::Header(err) => write!(f, "message header: {err}"),
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DatagramBytes => "datagram bytes",
            Self::ApprovalPayloadBytes => "approval payload bytes",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
            Self::Header(err) => write!(f, "message header: {err}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Header(err) => Some(err),
            _ => None,
        }
    }
}

impl std::error::Error for EncodeError {}

impl From<BitError> for DecodeError {
    fn from(err: BitError) -> Self {
        Self::Header(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_display_unknown_tag() {
        let err = DecodeError::UnknownControlTag { tag: 0xEE };
        assert!(err.to_string().contains("238"));
    }

    #[test]
    fn decode_error_display_limits_exceeded() {
        let err = DecodeError::LimitsExceeded {
            kind: LimitKind::DatagramBytes,
            limit: 1200,
            actual: 4000,
        };
        let msg = err.to_string();
        assert!(msg.contains("datagram bytes"));
        assert!(msg.contains("4000"));
    }

    #[test]
    fn header_error_has_source() {
        use std::error::Error;
        let err = DecodeError::from(BitError::InvalidVarint);
        assert!(err.source().is_some());
    }

    #[test]
    fn encode_error_display() {
        let err = EncodeError::LimitsExceeded {
            kind: LimitKind::ApprovalPayloadBytes,
            limit: 4,
            actual: 10,
        };
        assert!(err.to_string().contains("approval payload"));
    }
}
