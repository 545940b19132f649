//! Network objects known to a node and who may act on them.

use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;

use codec::{ObjectId, Vec3};

use crate::connection::ConnectionRole;

/// Which node is the authoritative writer of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// This node simulates the object.
    Local,
    /// The given server simulates the object.
    Remote(SocketAddr),
    /// Handoff to `to` started at `since`; nobody authors until it resolves.
    Transferring { to: SocketAddr, since: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub id: ObjectId,
    pub position: Vec3,
    /// Client allowed to drive the object.
    pub controller: Option<SocketAddr>,
    /// Node that asked for the object to exist.
    pub creator: Option<SocketAddr>,
    pub authority: Authority,
    /// Connections currently holding a view of the object.
    pub observers: BTreeSet<SocketAddr>,
}

impl ObjectRecord {
    #[must_use]
    pub fn new(id: ObjectId, position: Vec3, authority: Authority) -> Self {
        Self {
            id,
            position,
            controller: None,
            creator: None,
            authority,
            observers: BTreeSet::new(),
        }
    }

    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self.authority, Authority::Local)
    }

    /// The server owning this object, if it is not this node.
    #[must_use]
    pub const fn owner(&self) -> Option<SocketAddr> {
        match self.authority {
            Authority::Remote(addr) => Some(addr),
            Authority::Local | Authority::Transferring { .. } => None,
        }
    }

    /// Whether `source` may invoke RPCs targeting this object: its
    /// controller, its owning server, or any peer server.
    #[must_use]
    pub fn authorizes(&self, source: SocketAddr, role: ConnectionRole) -> bool {
        role == ConnectionRole::Peer
            || self.controller == Some(source)
            || self.owner() == Some(source)
    }
}

/// All objects this node knows about.
#[derive(Debug, Clone)]
pub struct ObjectTable {
    records: BTreeMap<ObjectId, ObjectRecord>,
    next_id: u32,
}

impl ObjectTable {
    #[must_use]
    pub fn new(id_base: u32) -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: id_base.max(1),
        }
    }

    /// Creates a locally authoritative object with a fresh id.
    pub fn spawn(
        &mut self,
        position: Vec3,
        controller: Option<SocketAddr>,
        creator: Option<SocketAddr>,
    ) -> ObjectId {
        let id = self.allocate();
        let mut record = ObjectRecord::new(id, position, Authority::Local);
        record.controller = controller;
        record.creator = creator;
        self.records.insert(id, record);
        id
    }

    fn allocate(&mut self) -> ObjectId {
        loop {
            let id = ObjectId::new(self.next_id);
            self.next_id = self.next_id.checked_add(1).unwrap_or(1);
            if !id.is_none() && !self.records.contains_key(&id) {
                return id;
            }
        }
    }

    /// Inserts or replaces a record, e.g. one received in a handoff.
    pub fn insert(&mut self, record: ObjectRecord) -> Option<ObjectRecord> {
        self.records.insert(record.id, record)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<ObjectRecord> {
        self.records.remove(&id)
    }

    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&ObjectRecord> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ObjectRecord> {
        self.records.get_mut(&id)
    }

    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectRecord> {
        self.records.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ObjectRecord> {
        self.records.values_mut()
    }

    /// Ids of objects this node is authoritative for.
    #[must_use]
    pub fn local_ids(&self) -> Vec<ObjectId> {
        self.records
            .values()
            .filter(|record| record.is_local())
            .map(|record| record.id)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops every reference to a closed connection.
    pub(crate) fn forget_connection(&mut self, addr: SocketAddr) {
        for record in self.records.values_mut() {
            record.observers.remove(&addr);
            if record.controller == Some(addr) {
                record.controller = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn spawn_allocates_from_base() {
        let mut table = ObjectTable::new(100);
        let a = table.spawn(Vec3::ZERO, None, None);
        let b = table.spawn(Vec3::ZERO, None, None);
        assert_eq!(a.raw(), 100);
        assert_eq!(b.raw(), 101);
        assert_eq!(table.local_ids(), vec![a, b]);
    }

    #[test]
    fn spawn_skips_taken_ids() {
        let mut table = ObjectTable::new(1);
        table.insert(ObjectRecord::new(
            ObjectId::new(1),
            Vec3::ZERO,
            Authority::Remote(addr(9)),
        ));
        assert_eq!(table.spawn(Vec3::ZERO, None, None).raw(), 2);
        assert_eq!(table.local_ids().len(), 1);
    }

    #[test]
    fn authorization_rules() {
        let mut record =
            ObjectRecord::new(ObjectId::new(1), Vec3::ZERO, Authority::Remote(addr(2)));
        record.controller = Some(addr(1));

        assert!(record.authorizes(addr(1), ConnectionRole::Client));
        assert!(record.authorizes(addr(2), ConnectionRole::Server));
        assert!(record.authorizes(addr(3), ConnectionRole::Peer));
        assert!(!record.authorizes(addr(4), ConnectionRole::Client));
        assert!(!record.authorizes(addr(4), ConnectionRole::Server));
    }

    #[test]
    fn transferring_has_no_owner() {
        let record = ObjectRecord::new(
            ObjectId::new(1),
            Vec3::ZERO,
            Authority::Transferring {
                to: addr(5),
                since: 10,
            },
        );
        assert_eq!(record.owner(), None);
        assert!(!record.is_local());
    }

    #[test]
    fn forget_connection_clears_references() {
        let mut table = ObjectTable::new(1);
        let id = table.spawn(Vec3::ZERO, Some(addr(1)), Some(addr(1)));
        table.get_mut(id).unwrap().observers.insert(addr(1));
        table.forget_connection(addr(1));
        let record = table.get(id).unwrap();
        assert!(record.observers.is_empty());
        assert_eq!(record.controller, None);
        assert_eq!(record.creator, Some(addr(1)));
    }
}
