//! Resolving incoming RPC messages and outgoing calls against a connection's ids.

use std::net::SocketAddr;

use codec::{Message, MessageId, Value};

use crate::error::{RpcError, RpcResult};
use crate::ids::IdTable;
use crate::registry::{MethodRegistry, RpcCall};

/// Turns a decoded RPC message into a call.
///
/// Connection-typed slots are filled with `source`.
pub fn resolve_call(
    registry: &MethodRegistry,
    ids: &IdTable,
    source: SocketAddr,
    message: Message,
) -> RpcResult<RpcCall> {
    let id = message.header.id;
    let name = ids.name(id).ok_or(RpcError::UnknownId { id })?;
    let signature = registry.signature(name)?;
    let params = signature.bind(message.params, source)?;
    Ok(RpcCall {
        source,
        method: name.to_owned(),
        object: message.header.object,
        params,
    })
}

/// Looks up the id for an outgoing call and checks its wire parameters.
pub fn prepare_call(
    registry: &MethodRegistry,
    ids: &IdTable,
    method: &str,
    params: &[Value],
) -> RpcResult<MessageId> {
    let signature = registry.signature(method)?;
    let id = ids.id(method).ok_or_else(|| RpcError::Unresolved {
        name: method.to_owned(),
    })?;
    signature.check_wire(params)?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use codec::{CodecError, MessageHeader, Signature, TypeTag};

    use super::*;

    fn setup() -> (MethodRegistry, IdTable) {
        let mut registry = MethodRegistry::new();
        registry
            .register(
                "spawn",
                Signature::new([TypeTag::Connection, TypeTag::String]),
            )
            .unwrap();
        let mut ids = IdTable::new();
        ids.insert(MessageId::new(1), "spawn");
        (registry, ids)
    }

    fn source() -> SocketAddr {
        "10.1.1.1:5000".parse().unwrap()
    }

    #[test]
    fn resolve_fills_connection() {
        let (registry, ids) = setup();
        let message = Message::new(
            MessageHeader::new(MessageId::new(1)),
            vec![Value::String("knight".into())],
        );
        let call = resolve_call(&registry, &ids, source(), message).unwrap();
        assert_eq!(call.method, "spawn");
        assert_eq!(
            call.params,
            vec![Value::Connection(source()), Value::String("knight".into())]
        );
    }

    #[test]
    fn resolve_unknown_id() {
        let (registry, ids) = setup();
        let message = Message::new(MessageHeader::new(MessageId::new(7)), vec![]);
        assert_eq!(
            resolve_call(&registry, &ids, source(), message).unwrap_err(),
            RpcError::UnknownId {
                id: MessageId::new(7)
            }
        );
    }

    #[test]
    fn resolve_type_mismatch_is_codec_error() {
        let (registry, ids) = setup();
        let message = Message::new(MessageHeader::new(MessageId::new(1)), vec![Value::U8(1)]);
        assert!(matches!(
            resolve_call(&registry, &ids, source(), message).unwrap_err(),
            RpcError::Codec(CodecError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn prepare_requires_negotiated_id() {
        let (registry, _) = setup();
        let err = prepare_call(&registry, &IdTable::new(), "spawn", &[Value::from("x")])
            .unwrap_err();
        assert_eq!(
            err,
            RpcError::Unresolved {
                name: "spawn".into()
            }
        );
    }

    #[test]
    fn prepare_checks_wire_params() {
        let (registry, ids) = setup();
        assert_eq!(
            prepare_call(&registry, &ids, "spawn", &[Value::from("x")]).unwrap(),
            MessageId::new(1)
        );
        assert!(prepare_call(&registry, &ids, "spawn", &[]).is_err());
    }
}
