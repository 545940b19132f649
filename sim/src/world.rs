//! The simulated game: named walkers pacing along the x axis.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use anyhow::Result;
use bitstream::{BitReader, BitResult, BitWriter};
use codec::{ObjectId, Signature, TypeTag, Vec3};
use net::{NodeEvent, ObjectRecord};
use rpc::{MethodRegistry, RpcCall, RpcResult};
use scope::{ViewReader, ViewWriter, WorldQuery};
use serde::Serialize;

/// Client request for a new walker: owner, start position, name.
pub const SPAWN: &str = "Game.Spawn";

const MAX_NAME: usize = 32;

/// Methods shared by every node of the simulation, in registration order.
pub fn methods() -> Result<MethodRegistry> {
    let mut methods = MethodRegistry::new();
    zone::register_methods(&mut methods)?;
    scope::register_methods(&mut methods)?;
    methods.register(
        SPAWN,
        Signature::new([TypeTag::Connection, TypeTag::Vec3, TypeTag::String]),
    )?;
    Ok(methods)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Walker {
    pub name: String,
    pub position: Vec3,
    /// Units per second along x.
    pub speed: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Walkers {
    walkers: BTreeMap<ObjectId, Walker>,
    speed: f32,
}

impl Walkers {
    pub fn new(speed: f32) -> Self {
        Self {
            walkers: BTreeMap::new(),
            speed,
        }
    }

    pub fn get(&self, object: ObjectId) -> Option<&Walker> {
        self.walkers.get(&object)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Walker)> {
        self.walkers.iter().map(|(object, walker)| (*object, walker))
    }

    /// Starts tracking an object that arrived without a walker, such as one
    /// claimed from a server in another process.
    pub fn adopt(&mut self, object: ObjectId, position: Vec3) {
        let speed = self.speed;
        self.walkers.entry(object).or_insert_with(|| Walker {
            name: String::new(),
            position,
            speed,
        });
    }

    /// Moves every walker `moves` accepts, turning around at the bounds.
    pub fn advance(
        &mut self,
        dt_ms: u64,
        bounds: (f32, f32),
        moves: impl Fn(ObjectId) -> bool,
    ) {
        let dt = dt_ms as f32 / 1000.0;
        for (object, walker) in &mut self.walkers {
            if !moves(*object) {
                continue;
            }
            walker.position.x += walker.speed * dt;
            if walker.position.x <= bounds.0 || walker.position.x >= bounds.1 {
                walker.position.x = walker.position.x.clamp(bounds.0, bounds.1);
                walker.speed = -walker.speed;
            }
        }
    }

    /// Handles a spawn request: creates the object on `node` with the
    /// requester as controller and creator.
    pub fn handle_spawn<T: transport::Transport>(
        &mut self,
        node: &mut net::Node<T>,
        event: &NodeEvent,
    ) -> Option<ObjectId> {
        let NodeEvent::Rpc(call) = event else {
            return None;
        };
        if call.method != SPAWN {
            return None;
        }
        let (owner, position, name) = match spawn_args(call) {
            Ok(spawned) => spawned,
            Err(err) => {
                log::warn!("bad spawn from {}: {err}", call.source);
                return None;
            }
        };
        let object = node.objects_mut().spawn(position, Some(owner), Some(owner));
        log::info!("spawned {object} '{name}' at {position} for {owner}");
        self.walkers.insert(
            object,
            Walker {
                name,
                position,
                speed: self.speed,
            },
        );
        Some(object)
    }
}

fn spawn_args(call: &RpcCall) -> RpcResult<(SocketAddr, Vec3, String)> {
    let mut args = call.args();
    Ok((args.connection()?, args.vec3()?, args.str()?.to_owned()))
}

impl WorldQuery for Walkers {
    fn position(&self, object: ObjectId) -> Option<Vec3> {
        self.walkers.get(&object).map(|walker| walker.position)
    }
}

/// Writes walker views: the name on instantiation, the speed on sync.
pub struct WalkerWriter<'a>(pub &'a Walkers);

impl ViewWriter for WalkerWriter<'_> {
    fn write_proxy(&mut self, record: &ObjectRecord, out: &mut BitWriter) -> BitResult<()> {
        let name = self.0.get(record.id).map_or("", |walker| walker.name.as_str());
        out.write_str(name)
    }

    fn write_creator(&mut self, record: &ObjectRecord, out: &mut BitWriter) -> BitResult<()> {
        self.write_proxy(record, out)?;
        out.write_bool(true);
        Ok(())
    }

    fn write_sync(&mut self, record: &ObjectRecord, out: &mut BitWriter) -> BitResult<()> {
        let speed = self.0.get(record.id).map_or(0.0, |walker| walker.speed);
        out.write_f32(speed);
        Ok(())
    }
}

/// What a client currently sees.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Sightings {
    pub visible: BTreeMap<u32, Sighting>,
    pub syncs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sighting {
    pub name: String,
    pub position: Vec3,
    pub speed: f32,
    pub mine: bool,
}

impl Sightings {
    fn see(
        &mut self,
        object: ObjectId,
        position: Vec3,
        data: &mut BitReader<'_>,
        mine: bool,
    ) -> BitResult<()> {
        let name = data.read_string(MAX_NAME)?;
        if mine {
            data.read_bool()?;
        }
        self.visible.insert(
            object.raw(),
            Sighting {
                name,
                position,
                speed: 0.0,
                mine,
            },
        );
        Ok(())
    }
}

impl ViewReader for Sightings {
    fn read_proxy(
        &mut self,
        object: ObjectId,
        position: Vec3,
        data: &mut BitReader<'_>,
    ) -> BitResult<()> {
        self.see(object, position, data, false)
    }

    fn read_creator(
        &mut self,
        object: ObjectId,
        position: Vec3,
        data: &mut BitReader<'_>,
    ) -> BitResult<()> {
        self.see(object, position, data, true)
    }

    fn sync(
        &mut self,
        object: ObjectId,
        position: Vec3,
        data: &mut BitReader<'_>,
    ) -> BitResult<()> {
        let speed = data.read_f32()?;
        if let Some(sighting) = self.visible.get_mut(&object.raw()) {
            sighting.position = position;
            sighting.speed = speed;
        }
        self.syncs += 1;
        Ok(())
    }

    fn destroy(&mut self, object: ObjectId) {
        self.visible.remove(&object.raw());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walkers_turn_at_the_bounds() {
        let mut walkers = Walkers::new(10.0);
        walkers.adopt(ObjectId::new(1), Vec3::new(9.0, 0.0, 0.0));
        walkers.advance(200, (-10.0, 10.0), |_| true);
        let walker = walkers.get(ObjectId::new(1)).unwrap();
        assert_eq!(walker.position.x, 10.0);
        assert_eq!(walker.speed, -10.0);
    }

    #[test]
    fn filtered_walkers_stay_put() {
        let mut walkers = Walkers::new(10.0);
        walkers.adopt(ObjectId::new(1), Vec3::ZERO);
        walkers.advance(1000, (-100.0, 100.0), |_| false);
        assert_eq!(walkers.position(ObjectId::new(1)), Some(Vec3::ZERO));
    }

    #[test]
    fn creator_view_round_trips_through_the_hooks() {
        let mut walkers = Walkers::new(1.0);
        let object = ObjectId::new(7);
        walkers.adopt(object, Vec3::ZERO);
        let record = ObjectRecord::new(object, Vec3::ZERO, net::Authority::Local);
        let mut out = BitWriter::new();
        WalkerWriter(&walkers).write_creator(&record, &mut out).unwrap();
        let bytes = out.finish();

        let mut sightings = Sightings::default();
        sightings
            .read_creator(object, Vec3::ZERO, &mut BitReader::new(&bytes))
            .unwrap();
        assert!(sightings.visible[&7].mine);
    }
}
