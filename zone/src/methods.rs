//! Zone RPC names, signatures and parameter layouts.

use std::net::SocketAddr;

use codec::{ObjectId, Signature, TypeTag, Value, Vec3};
use rpc::{Args, MethodRegistry, RpcResult};
use transport::{format_address, parse_address};

use crate::error::ZoneResult;
use crate::zone::Zone;

/// Authority to server: the zone the receiver simulates from now on.
pub const ASSIGN: &str = "Zone.Assign";
/// Authority to server: another server's zone and address.
pub const NEIGHBOR: &str = "Zone.Neighbor";
/// Authority to server: a zone lost its server.
pub const RELEASE: &str = "Zone.Release";
/// Old server to new server: take over an object.
pub const HANDOFF_REQUEST: &str = "Zone.HandoffRequest";
/// New server to old server: the object is claimed.
pub const HANDOFF_ACK: &str = "Zone.HandoffAck";
/// Server to client: talk to another server about an object.
pub const ADD_TARGET: &str = "Zone.AddTarget";
/// Old server to new server: the ack did not match a live handoff, drop the claim.
pub const HANDOFF_CANCEL: &str = "Zone.HandoffCancel";

/// Registers every zone method. All nodes of a deployment must call this at
/// the same point of their registration sequence.
pub fn register_methods(methods: &mut MethodRegistry) -> RpcResult<()> {
    let zone = [TypeTag::U32, TypeTag::Vec3, TypeTag::Vec3, TypeTag::F32];
    let mut neighbor = zone.to_vec();
    neighbor.push(TypeTag::String);

    methods.register(ASSIGN, Signature::new(zone))?;
    methods.register(NEIGHBOR, Signature::new(neighbor))?;
    methods.register(RELEASE, Signature::new([TypeTag::U32]))?;
    methods.register(
        HANDOFF_REQUEST,
        Signature::new([
            TypeTag::U32,
            TypeTag::Vec3,
            TypeTag::String,
            TypeTag::String,
        ]),
    )?;
    methods.register(HANDOFF_ACK, Signature::new([TypeTag::U32]))?;
    methods.register(ADD_TARGET, Signature::new([TypeTag::U32, TypeTag::String]))?;
    methods.register(HANDOFF_CANCEL, Signature::new([TypeTag::U32]))?;
    Ok(())
}

pub(crate) fn zone_params(zone: &Zone) -> Vec<Value> {
    vec![
        Value::U32(zone.index),
        Value::Vec3(zone.center),
        Value::Vec3(zone.half_extents),
        Value::F32(zone.margin),
    ]
}

pub(crate) fn read_zone(args: &mut Args<'_>) -> ZoneResult<Zone> {
    Ok(Zone::new(args.u32()?, args.vec3()?, args.vec3()?, args.f32()?))
}

pub(crate) fn neighbor_params(zone: &Zone, server: SocketAddr) -> Vec<Value> {
    let mut params = zone_params(zone);
    params.push(Value::String(format_address(server)));
    params
}

/// Handoff payload: the object's last position and who drives it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Handoff {
    pub object: ObjectId,
    pub position: Vec3,
    pub controller: Option<SocketAddr>,
    pub creator: Option<SocketAddr>,
}

impl Handoff {
    pub(crate) fn params(&self) -> Vec<Value> {
        vec![
            Value::U32(self.object.raw()),
            Value::Vec3(self.position),
            Value::String(self.controller.map(format_address).unwrap_or_default()),
            Value::String(self.creator.map(format_address).unwrap_or_default()),
        ]
    }

    pub(crate) fn read(args: &mut Args<'_>) -> ZoneResult<Self> {
        Ok(Self {
            object: ObjectId::new(args.u32()?),
            position: args.vec3()?,
            controller: optional_address(args.str()?)?,
            creator: optional_address(args.str()?)?,
        })
    }
}

pub(crate) fn read_address(args: &mut Args<'_>) -> ZoneResult<SocketAddr> {
    Ok(parse_address(args.str()?)?)
}

fn optional_address(text: &str) -> ZoneResult<Option<SocketAddr>> {
    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(parse_address(text)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_all_methods() {
        let mut methods = MethodRegistry::new();
        register_methods(&mut methods).unwrap();
        assert_eq!(methods.len(), 7);
        assert!(register_methods(&mut methods).is_err());
    }

    #[test]
    fn handoff_params_match_signature() {
        let mut methods = MethodRegistry::new();
        register_methods(&mut methods).unwrap();
        let handoff = Handoff {
            object: ObjectId::new(4),
            position: Vec3::new(1.0, 2.0, 3.0),
            controller: Some("127.0.0.1:4000".parse().unwrap()),
            creator: None,
        };
        let params = handoff.params();
        methods
            .signature(HANDOFF_REQUEST)
            .unwrap()
            .check_wire(&params)
            .unwrap();

        let mut args = Args::new(HANDOFF_REQUEST, &params);
        assert_eq!(Handoff::read(&mut args).unwrap(), handoff);
    }

    #[test]
    fn zone_params_read_back() {
        let zone = Zone::new(3, Vec3::new(20.0, 0.0, 0.0), Vec3::new(10.0, 5.0, 5.0), 1.5);
        let params = zone_params(&zone);
        assert_eq!(read_zone(&mut Args::new(ASSIGN, &params)).unwrap(), zone);
    }
}
