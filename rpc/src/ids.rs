//! Name ↔ id tables and sequential id assignment.

use std::collections::HashMap;

use codec::MessageId;

use crate::error::{RpcError, RpcResult};
use crate::registry::MethodRegistry;

/// Outcome of inserting an assignment into an [`IdTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insert {
    Added,
    /// The exact pair was already present.
    Known,
    /// The name or the id is already bound differently; the table is unchanged.
    Conflict {
        existing_id: Option<MessageId>,
        existing_name: Option<String>,
    },
}

/// A bijective mapping between method names and RPC ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdTable {
    by_name: HashMap<String, MessageId>,
    by_id: HashMap<MessageId, String>,
}

impl IdTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `(id, name)` unless it would break the bijection.
    pub fn insert(&mut self, id: MessageId, name: &str) -> Insert {
        let existing_id = self.by_name.get(name).copied();
        let existing_name = self.by_id.get(&id).cloned();
        match (existing_id, existing_name) {
            (None, None) => {
                self.by_name.insert(name.to_owned(), id);
                self.by_id.insert(id, name.to_owned());
                Insert::Added
            }
            (Some(known), Some(_)) if known == id => Insert::Known,
            (existing_id, existing_name) => Insert::Conflict {
                existing_id,
                existing_name,
            },
        }
    }

    #[must_use]
    pub fn id(&self, name: &str) -> Option<MessageId> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn name(&self, id: MessageId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Pairs sorted by id.
    #[must_use]
    pub fn entries(&self) -> Vec<(MessageId, &str)> {
        let mut entries: Vec<_> = self
            .by_id
            .iter()
            .map(|(id, name)| (*id, name.as_str()))
            .collect();
        entries.sort_unstable_by_key(|(id, _)| *id);
        entries
    }
}

/// The protocol authority's process-wide id assignments.
#[derive(Debug, Clone)]
pub struct GlobalIds {
    table: IdTable,
    /// Assignment order, which is id order.
    order: Vec<String>,
    next: Option<MessageId>,
}

impl GlobalIds {
    /// Assigns ids from 1 upward to every registered method, in order.
    pub fn from_registry(registry: &MethodRegistry) -> RpcResult<Self> {
        let mut ids = Self {
            table: IdTable::new(),
            order: Vec::with_capacity(registry.len()),
            next: Some(MessageId::FIRST_RPC),
        };
        for name in registry.names() {
            ids.assign(name)?;
        }
        Ok(ids)
    }

    /// Returns the id of `name`, assigning the next free one if needed.
    pub fn assign(&mut self, name: &str) -> RpcResult<MessageId> {
        if let Some(id) = self.table.id(name) {
            return Ok(id);
        }
        let id = self.next.ok_or(RpcError::IdSpaceExhausted)?;
        self.next = id.next_rpc();
        self.table.insert(id, name);
        self.order.push(name.to_owned());
        Ok(id)
    }

    #[must_use]
    pub fn table(&self) -> &IdTable {
        &self.table
    }

    /// `(id, name)` pairs in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (MessageId, &str)> {
        self.order.iter().filter_map(|name| {
            self.table.id(name).map(|id| (id, name.as_str()))
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use codec::Signature;
    use wire::COMMAND_BASE;

    use super::*;

    #[test]
    fn insert_keeps_bijection() {
        let mut table = IdTable::new();
        assert_eq!(table.insert(MessageId::new(1), "a"), Insert::Added);
        assert_eq!(table.insert(MessageId::new(1), "a"), Insert::Known);
        assert!(matches!(
            table.insert(MessageId::new(2), "a"),
            Insert::Conflict { .. }
        ));
        assert!(matches!(
            table.insert(MessageId::new(1), "b"),
            Insert::Conflict { .. }
        ));
        assert_eq!(table.len(), 1);
        assert_eq!(table.name(MessageId::new(1)), Some("a"));
        assert_eq!(table.id("a"), Some(MessageId::new(1)));
    }

    #[test]
    fn sequential_from_one() {
        let mut registry = MethodRegistry::new();
        for name in ["spawn", "move", "fire"] {
            registry.register(name, Signature::empty()).unwrap();
        }
        let ids = GlobalIds::from_registry(&registry).unwrap();
        let pairs: Vec<_> = ids.iter().map(|(id, name)| (id.raw(), name)).collect();
        assert_eq!(pairs, vec![(1, "spawn"), (2, "move"), (3, "fire")]);
    }

    #[test]
    fn assign_is_idempotent() {
        let mut ids = GlobalIds::from_registry(&MethodRegistry::new()).unwrap();
        let first = ids.assign("extra").unwrap();
        assert_eq!(ids.assign("extra").unwrap(), first);
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn never_assigns_into_command_range() {
        let mut ids = GlobalIds::from_registry(&MethodRegistry::new()).unwrap();
        let mut last = MessageId::new(0);
        for n in 1..COMMAND_BASE {
            last = ids.assign(&n.to_string()).unwrap();
        }
        assert_eq!(last.raw(), COMMAND_BASE - 1);
        assert_eq!(ids.assign("overflow").unwrap_err(), RpcError::IdSpaceExhausted);
    }
}
