use std::collections::{BTreeMap, HashMap};

use codec::{ObjectId, Vec3};

/// Engine-side position lookup for objects under evaluation.
///
/// `None` keeps the position already stored in the object table.
pub trait WorldQuery {
    fn position(&self, object: ObjectId) -> Option<Vec3>;
}

/// Uses the positions stored in the node's object table as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedPositions;

impl WorldQuery for RecordedPositions {
    fn position(&self, _object: ObjectId) -> Option<Vec3> {
        None
    }
}

impl WorldQuery for BTreeMap<ObjectId, Vec3> {
    fn position(&self, object: ObjectId) -> Option<Vec3> {
        self.get(&object).copied()
    }
}

impl<S: std::hash::BuildHasher> WorldQuery for HashMap<ObjectId, Vec3, S> {
    fn position(&self, object: ObjectId) -> Option<Vec3> {
        self.get(&object).copied()
    }
}
