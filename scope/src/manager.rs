//! Per-(viewer, object) scope entries and their send cadence.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;

use codec::{ObjectId, Vec3};

use crate::config::ScopeConfig;
use crate::tier::ScopeTier;

/// Scope state of one object for one viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeEntry {
    pub tier: ScopeTier,
    /// Sync ticks seen since the entry was created.
    counter: u32,
}

impl ScopeEntry {
    const fn new(tier: ScopeTier) -> Self {
        Self { tier, counter: 0 }
    }

    /// Whether the current sync tick transmits, then advances the counter.
    fn advance(&mut self) -> bool {
        let due = self
            .tier
            .period()
            .is_some_and(|period| self.counter % period == 0);
        self.counter = self.counter.wrapping_add(1);
        due
    }
}

/// Result of re-evaluating one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The object became visible: instantiate it for the viewer.
    Entered(ScopeTier),
    /// Still visible, at a different cadence.
    Retiered { from: ScopeTier, to: ScopeTier },
    /// The object is gone for the viewer: destroy its view.
    Left,
    Unchanged,
}

/// Distance-tiered interest management.
///
/// The manager is pure bookkeeping: callers feed it distances with
/// [`update`](Self::update), act on the returned [`Transition`], and call
/// [`sync_tick`](Self::sync_tick) once per sync interval to learn which
/// entries transmit. Every entry keeps its own counter, so two viewers at
/// different distances from one object see independent cadences.
#[derive(Debug, Clone)]
pub struct ScopeManager {
    config: ScopeConfig,
    entries: BTreeMap<(SocketAddr, ObjectId), ScopeEntry>,
    viewpoints: HashMap<SocketAddr, Vec3>,
}

impl ScopeManager {
    #[must_use]
    pub fn new(config: ScopeConfig) -> Self {
        Self {
            config,
            entries: BTreeMap::new(),
            viewpoints: HashMap::new(),
        }
    }

    pub const fn config(&self) -> &ScopeConfig {
        &self.config
    }

    /// Pins where `viewer` looks from, overriding the position of the objects
    /// it controls.
    pub fn set_viewpoint(&mut self, viewer: SocketAddr, position: Vec3) {
        self.viewpoints.insert(viewer, position);
    }

    pub fn clear_viewpoint(&mut self, viewer: SocketAddr) {
        self.viewpoints.remove(&viewer);
    }

    #[must_use]
    pub fn viewpoint(&self, viewer: SocketAddr) -> Option<Vec3> {
        self.viewpoints.get(&viewer).copied()
    }

    #[must_use]
    pub fn tier(&self, viewer: SocketAddr, object: ObjectId) -> ScopeTier {
        self.entries
            .get(&(viewer, object))
            .map_or(ScopeTier::Out, |entry| entry.tier)
    }

    #[must_use]
    pub fn entry(&self, viewer: SocketAddr, object: ObjectId) -> Option<&ScopeEntry> {
        self.entries.get(&(viewer, object))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-tiers one pair. `distance` is `None` when the viewer has no
    /// viewpoint; `pinned` keeps the object at `Level1` regardless.
    pub fn update(
        &mut self,
        viewer: SocketAddr,
        object: ObjectId,
        distance: Option<f32>,
        pinned: bool,
    ) -> Transition {
        let key = (viewer, object);
        let current = self.tier(viewer, object);
        let next = if pinned {
            ScopeTier::Level1
        } else {
            distance.map_or(ScopeTier::Out, |distance| {
                ScopeTier::classify(distance, &self.config, current)
            })
        };
        match (current.is_in_scope(), next.is_in_scope()) {
            (false, false) => Transition::Unchanged,
            (false, true) => {
                self.entries.insert(key, ScopeEntry::new(next));
                Transition::Entered(next)
            }
            (true, false) => {
                self.entries.remove(&key);
                Transition::Left
            }
            (true, true) if current == next => Transition::Unchanged,
            (true, true) => {
                if let Some(entry) = self.entries.get_mut(&key) {
                    entry.tier = next;
                }
                Transition::Retiered {
                    from: current,
                    to: next,
                }
            }
        }
    }

    /// Advances every entry by one sync tick and returns the pairs that
    /// transmit on it.
    pub fn sync_tick(&mut self) -> Vec<(SocketAddr, ObjectId)> {
        self.entries
            .iter_mut()
            .filter_map(|(key, entry)| entry.advance().then_some(*key))
            .collect()
    }

    /// Objects with an entry for any viewer.
    pub fn objects(&self) -> Vec<ObjectId> {
        let mut objects: Vec<ObjectId> = self.entries.keys().map(|(_, object)| *object).collect();
        objects.sort_unstable();
        objects.dedup();
        objects
    }

    /// Drops a viewer's entries and viewpoint; returns the objects it saw.
    pub fn remove_viewer(&mut self, viewer: SocketAddr) -> Vec<ObjectId> {
        self.viewpoints.remove(&viewer);
        let mut removed = Vec::new();
        self.entries.retain(|(entry_viewer, object), _| {
            if *entry_viewer == viewer {
                removed.push(*object);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Drops an object's entries; returns the viewers that saw it.
    pub fn remove_object(&mut self, object: ObjectId) -> Vec<SocketAddr> {
        let mut removed = Vec::new();
        self.entries.retain(|(viewer, entry_object), _| {
            if *entry_object == object {
                removed.push(*viewer);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Viewers with at least one entry.
    pub fn viewers(&self) -> Vec<SocketAddr> {
        let mut viewers: Vec<SocketAddr> = self.entries.keys().map(|(viewer, _)| *viewer).collect();
        viewers.dedup();
        viewers
    }
}
