//! After negotiation both ends hold the same bijective id table.

use std::collections::BTreeSet;

use codec::Signature;
use proptest::prelude::*;
use rpc::{Command, GlobalIds, MethodRegistry, Negotiation};

fn registry(names: &[String]) -> MethodRegistry {
    let mut registry = MethodRegistry::new();
    for name in names {
        registry.register(name.clone(), Signature::empty()).unwrap();
    }
    registry
}

/// Runs negotiation to quiescence, delivering commands in order.
fn negotiate(
    authority_reg: &MethodRegistry,
    other_reg: &MethodRegistry,
) -> (Negotiation, Negotiation) {
    let mut global = GlobalIds::from_registry(authority_reg).unwrap();
    let mut authority = Negotiation::new();
    let mut other = Negotiation::new();

    let mut to_other: Vec<Command> = authority.start(authority_reg, Some(&global));
    let mut to_authority: Vec<Command> = other.start(other_reg, None);
    while !to_other.is_empty() || !to_authority.is_empty() {
        for command in std::mem::take(&mut to_other) {
            to_authority.extend(other.handle(command, other_reg, None));
        }
        for command in std::mem::take(&mut to_authority) {
            to_other.extend(authority.handle(command, authority_reg, Some(&mut global)));
        }
    }
    (authority, other)
}

fn names_strategy() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set("[a-z_]{1,12}", 0..24)
        .prop_map(|set: BTreeSet<String>| set.into_iter().collect())
}

proptest! {
    #[test]
    fn tables_are_identical_and_bijective(
        shared in names_strategy(),
        authority_only in names_strategy(),
        other_only in names_strategy(),
    ) {
        let mut authority_names = shared.clone();
        authority_names.extend(authority_only.iter().filter(|n| !shared.contains(n)).cloned());
        let mut other_names = shared.clone();
        other_names.extend(
            other_only
                .iter()
                .filter(|n| !authority_names.contains(n) && !shared.contains(n))
                .cloned(),
        );

        let authority_reg = registry(&authority_names);
        let other_reg = registry(&other_names);
        let (authority, other) = negotiate(&authority_reg, &other_reg);

        prop_assert!(authority.is_ready());
        prop_assert!(other.is_ready());
        prop_assert_eq!(authority.ids(), other.ids());

        let ids = other.ids();
        for name in authority_names.iter().chain(other_names.iter()) {
            let id = ids.id(name);
            prop_assert!(id.is_some());
            prop_assert_eq!(ids.name(id.unwrap()), Some(name.as_str()));
        }
        let mut seen = BTreeSet::new();
        for (id, _) in ids.entries() {
            prop_assert!(id.is_rpc());
            prop_assert!(seen.insert(id));
        }
    }
}

#[test]
fn two_authorities_agree_with_same_registry() {
    let names: Vec<String> = ["spawn", "move", "fire"]
        .iter()
        .map(|s| (*s).to_owned())
        .collect();
    let reg = registry(&names);
    let global_a = GlobalIds::from_registry(&reg).unwrap();
    let mut global_b = GlobalIds::from_registry(&reg).unwrap();

    let mut a = Negotiation::new();
    let mut b = Negotiation::new();
    let to_b = a.start(&reg, Some(&global_a));
    let to_a = b.start(&reg, Some(&global_b));
    for command in to_b {
        b.handle(command, &reg, Some(&mut global_b));
    }
    let mut global_a = global_a;
    for command in to_a {
        a.handle(command, &reg, Some(&mut global_a));
    }

    assert!(a.is_ready() && b.is_ready());
    assert_eq!(a.ids(), b.ids());
    assert_eq!(a.ids().len(), 3);
}
