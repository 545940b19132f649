//! The closed table of internal control commands.

use codec::{MessageId, Signature, TypeTag, Value};
use wire::COMMAND_BASE;

use crate::error::{RpcError, RpcResult};

/// Kinds of control commands, each with a fixed id and signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    ConnectionRequirements,
    RemoteAssignment,
    AssignmentRequest,
    AssignmentResponse,
    Ack,
    Heartbeat,
}

impl CommandKind {
    const ALL: [Self; 6] = [
        Self::ConnectionRequirements,
        Self::RemoteAssignment,
        Self::AssignmentRequest,
        Self::AssignmentResponse,
        Self::Ack,
        Self::Heartbeat,
    ];

    #[must_use]
    pub const fn id(self) -> MessageId {
        let offset = match self {
            Self::ConnectionRequirements => 0,
            Self::RemoteAssignment => 1,
            Self::AssignmentRequest => 2,
            Self::AssignmentResponse => 3,
            Self::Ack => 4,
            Self::Heartbeat => 5,
        };
        MessageId::new(COMMAND_BASE + offset)
    }

    #[must_use]
    pub fn from_id(id: MessageId) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    /// Expected wire parameters.
    #[must_use]
    pub fn signature(self) -> Signature {
        let tags: &[TypeTag] = match self {
            Self::ConnectionRequirements => &[TypeTag::U32, TypeTag::U64],
            Self::RemoteAssignment | Self::AssignmentResponse => &[TypeTag::U16, TypeTag::String],
            Self::AssignmentRequest => &[TypeTag::String],
            Self::Ack => &[TypeTag::U32],
            Self::Heartbeat => &[],
        };
        Signature::new(tags.to_vec())
    }
}

/// A decoded control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sent by the protocol authority: how many assignments follow.
    ConnectionRequirements { count: u32, registry_hash: u64 },
    /// One `(id, name)` pushed by the authority.
    RemoteAssignment { id: MessageId, name: String },
    /// Non-authority asks for an id for a name it lacks.
    AssignmentRequest { name: String },
    /// Authority's answer to an [`Command::AssignmentRequest`].
    AssignmentResponse { id: MessageId, name: String },
    /// Acknowledges a reliable message by sequence.
    Ack { sequence: u32 },
    /// Keeps an idle connection alive.
    Heartbeat,
}

impl Command {
    #[must_use]
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::ConnectionRequirements { .. } => CommandKind::ConnectionRequirements,
            Self::RemoteAssignment { .. } => CommandKind::RemoteAssignment,
            Self::AssignmentRequest { .. } => CommandKind::AssignmentRequest,
            Self::AssignmentResponse { .. } => CommandKind::AssignmentResponse,
            Self::Ack { .. } => CommandKind::Ack,
            Self::Heartbeat => CommandKind::Heartbeat,
        }
    }

    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.kind().id()
    }

    /// Acks and heartbeats are fire-and-forget; negotiation is reliable.
    #[must_use]
    pub const fn is_reliable(&self) -> bool {
        !matches!(self, Self::Ack { .. } | Self::Heartbeat)
    }

    /// Wire parameters for this command.
    #[must_use]
    pub fn params(&self) -> Vec<Value> {
        match self {
            Self::ConnectionRequirements {
                count,
                registry_hash,
            } => vec![Value::U32(*count), Value::U64(*registry_hash)],
            Self::RemoteAssignment { id, name } | Self::AssignmentResponse { id, name } => {
                vec![Value::U16(id.raw()), Value::String(name.clone())]
            }
            Self::AssignmentRequest { name } => vec![Value::String(name.clone())],
            Self::Ack { sequence } => vec![Value::U32(*sequence)],
            Self::Heartbeat => Vec::new(),
        }
    }

    /// Parses a command from its id and decoded parameters.
    pub fn parse(id: MessageId, params: &[Value]) -> RpcResult<Self> {
        let kind = CommandKind::from_id(id).ok_or(RpcError::UnknownCommand { id })?;
        kind.signature().check_wire(params)?;
        let command = match (kind, params) {
            (CommandKind::ConnectionRequirements, [Value::U32(count), Value::U64(hash)]) => {
                Self::ConnectionRequirements {
                    count: *count,
                    registry_hash: *hash,
                }
            }
            (CommandKind::RemoteAssignment, [Value::U16(raw), Value::String(name)]) => {
                Self::RemoteAssignment {
                    id: MessageId::new(*raw),
                    name: name.clone(),
                }
            }
            (CommandKind::AssignmentResponse, [Value::U16(raw), Value::String(name)]) => {
                Self::AssignmentResponse {
                    id: MessageId::new(*raw),
                    name: name.clone(),
                }
            }
            (CommandKind::AssignmentRequest, [Value::String(name)]) => Self::AssignmentRequest {
                name: name.clone(),
            },
            (CommandKind::Ack, [Value::U32(sequence)]) => Self::Ack {
                sequence: *sequence,
            },
            (CommandKind::Heartbeat, []) => Self::Heartbeat,
            _ => return Err(RpcError::UnknownCommand { id }),
        };
        Ok(command)
    }
}
