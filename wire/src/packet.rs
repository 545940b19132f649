//! Datagram control tags and framing.

use crate::error::{DecodeError, EncodeError, LimitKind, WireResult};
use crate::limits::Limits;

/// First byte of every datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
#[repr(u8)]
pub enum ControlTag {
    Connect = 1,
    ConnectToPeer = 2,
    RefuseConnection = 3,
    Disconnect = 4,
    ConnectAccepted = 5,
    Message = 6,
}

impl ControlTag {
    /// Parses a control tag from a raw byte.
    pub fn parse(tag: u8) -> Result<Self, DecodeError> {
        match tag {
            1 => Ok(Self::Connect),
            2 => Ok(Self::ConnectToPeer),
            3 => Ok(Self::RefuseConnection),
            4 => Ok(Self::Disconnect),
            5 => Ok(Self::ConnectAccepted),
            6 => Ok(Self::Message),
            _ => Err(DecodeError::UnknownControlTag { tag }),
        }
    }
}

/// A decoded datagram, borrowing its body from the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datagram<'a> {
    /// Client connection request with its approval payload.
    Connect { payload: &'a [u8] },
    /// Server-to-server connection request with its approval payload.
    ConnectToPeer { payload: &'a [u8] },
    /// The responder refused the connection.
    Refuse,
    /// The sender tears the connection down.
    Disconnect,
    /// The responder accepted the connection.
    Accepted,
    /// One framed message on an established connection.
    Message { body: &'a [u8] },
}

impl Datagram<'_> {
    /// Returns the control tag this datagram is framed with.
    #[must_use]
    pub const fn tag(&self) -> ControlTag {
        match self {
            Self::Connect { .. } => ControlTag::Connect,
            Self::ConnectToPeer { .. } => ControlTag::ConnectToPeer,
            Self::Refuse => ControlTag::RefuseConnection,
            Self::Disconnect => ControlTag::Disconnect,
            Self::Accepted => ControlTag::ConnectAccepted,
            Self::Message { .. } => ControlTag::Message,
        }
    }
}

/// Decodes a datagram into its control tag and body.
pub fn decode_datagram<'a>(buf: &'a [u8], limits: &Limits) -> WireResult<Datagram<'a>> {
    let Some((&tag, body)) = buf.split_first() else {
        return Err(DecodeError::EmptyDatagram);
    };
    if buf.len() > limits.max_datagram_bytes {
        return Err(DecodeError::LimitsExceeded {
            kind: LimitKind::DatagramBytes,
            limit: limits.max_datagram_bytes,
            actual: buf.len(),
        });
    }

    match ControlTag::parse(tag)? {
        ControlTag::Connect => Ok(Datagram::Connect {
            payload: approval_payload(body, limits)?,
        }),
        ControlTag::ConnectToPeer => Ok(Datagram::ConnectToPeer {
            payload: approval_payload(body, limits)?,
        }),
        ControlTag::RefuseConnection => bodiless(tag, body, Datagram::Refuse),
        ControlTag::Disconnect => bodiless(tag, body, Datagram::Disconnect),
        ControlTag::ConnectAccepted => bodiless(tag, body, Datagram::Accepted),
        ControlTag::Message => Ok(Datagram::Message { body }),
    }
}

/// Encodes a datagram into a fresh buffer.
pub fn encode_datagram(datagram: &Datagram<'_>, limits: &Limits) -> Result<Vec<u8>, EncodeError> {
    let body: &[u8] = match datagram {
        Datagram::Connect { payload } | Datagram::ConnectToPeer { payload } => {
            if payload.len() > limits.max_approval_bytes {
                return Err(EncodeError::LimitsExceeded {
                    kind: LimitKind::ApprovalPayloadBytes,
                    limit: limits.max_approval_bytes,
                    actual: payload.len(),
                });
            }
            payload
        }
        Datagram::Message { body } => body,
        Datagram::Refuse | Datagram::Disconnect | Datagram::Accepted => &[],
    };
    let total = 1 + body.len();
    if total > limits.max_datagram_bytes {
        return Err(EncodeError::LimitsExceeded {
            kind: LimitKind::DatagramBytes,
            limit: limits.max_datagram_bytes,
            actual: total,
        });
    }

    let mut out = Vec::with_capacity(total);
    out.push(datagram.tag() as u8);
    out.extend_from_slice(body);
    Ok(out)
}

fn approval_payload<'a>(body: &'a [u8], limits: &Limits) -> WireResult<&'a [u8]> {
    if body.len() > limits.max_approval_bytes {
        return Err(DecodeError::LimitsExceeded {
            kind: LimitKind::ApprovalPayloadBytes,
            limit: limits.max_approval_bytes,
            actual: body.len(),
        });
    }
    Ok(body)
}

fn bodiless<'a>(tag: u8, body: &[u8], datagram: Datagram<'a>) -> WireResult<Datagram<'a>> {
    if body.is_empty() {
        Ok(datagram)
    } else {
        Err(DecodeError::UnexpectedPayload {
            tag,
            len: body.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuse_is_single_byte() {
        let bytes = encode_datagram(&Datagram::Refuse, &Limits::default()).unwrap();
        assert_eq!(bytes, vec![ControlTag::RefuseConnection as u8]);
    }

    #[test]
    fn connect_carries_payload() {
        let limits = Limits::for_testing();
        let bytes = encode_datagram(&Datagram::Connect { payload: b"token" }, &limits).unwrap();
        assert_eq!(bytes[0], ControlTag::Connect as u8);
        assert_eq!(
            decode_datagram(&bytes, &limits).unwrap(),
            Datagram::Connect { payload: b"token" }
        );
    }

    #[test]
    fn decode_rejects_empty() {
        assert_eq!(
            decode_datagram(&[], &Limits::default()).unwrap_err(),
            DecodeError::EmptyDatagram
        );
    }

    #[test]
    fn decode_rejects_unknown_tag() {
        assert_eq!(
            decode_datagram(&[0xEE, 1, 2], &Limits::default()).unwrap_err(),
            DecodeError::UnknownControlTag { tag: 0xEE }
        );
    }

    #[test]
    fn decode_rejects_trailing_bytes_on_bodiless_tag() {
        let err = decode_datagram(&[ControlTag::Disconnect as u8, 9], &Limits::default())
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedPayload { len: 1, .. }));
    }

    #[test]
    fn decode_enforces_datagram_limit() {
        let limits = Limits::for_testing();
        let mut buf = vec![ControlTag::Message as u8];
        buf.resize(limits.max_datagram_bytes + 1, 0);
        let err = decode_datagram(&buf, &limits).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::LimitsExceeded {
                kind: LimitKind::DatagramBytes,
                ..
            }
        ));
    }

    #[test]
    fn encode_enforces_approval_limit() {
        let limits = Limits::for_testing();
        let payload = vec![0u8; limits.max_approval_bytes + 1];
        let err = encode_datagram(&Datagram::ConnectToPeer { payload: &payload }, &limits)
            .unwrap_err();
        assert!(matches!(
            err,
            EncodeError::LimitsExceeded {
                kind: LimitKind::ApprovalPayloadBytes,
                ..
            }
        ));
    }

    #[test]
    fn message_body_passes_through() {
        let limits = Limits::default();
        let bytes = encode_datagram(&Datagram::Message { body: &[1, 2, 3] }, &limits).unwrap();
        assert_eq!(
            decode_datagram(&bytes, &limits).unwrap(),
            Datagram::Message { body: &[1, 2, 3] }
        );
    }
}
