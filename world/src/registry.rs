//! Entity registries that own live entities and allocate their identifiers.

use std::collections::{BTreeMap, BTreeSet};

use tank_defence_core::{BulletId, EnemyId, ObstacleId, WeaponId};

/// Identifier types that a [`Registry`] can allocate.
pub(crate) trait EntityKey: Copy + Ord {
    /// Wraps a raw counter value into the identifier type.
    fn from_raw(value: u32) -> Self;
}

impl EntityKey for EnemyId {
    fn from_raw(value: u32) -> Self {
        Self::new(value)
    }
}

impl EntityKey for WeaponId {
    fn from_raw(value: u32) -> Self {
        Self::new(value)
    }
}

impl EntityKey for BulletId {
    fn from_raw(value: u32) -> Self {
        Self::new(value)
    }
}

impl EntityKey for ObstacleId {
    fn from_raw(value: u32) -> Self {
        Self::new(value)
    }
}

/// Insertion-ordered entity storage with deferred removal.
///
/// Identifiers are allocated monotonically, so iterating the underlying
/// `BTreeMap` visits entities in registration order. Removal only marks an
/// entry; marked entries are hidden from every live accessor and dropped by
/// [`Registry::reap`] at the start of the following tick.
#[derive(Debug)]
pub(crate) struct Registry<K, T> {
    entries: BTreeMap<K, T>,
    doomed: BTreeSet<K>,
    next_id: u32,
}

impl<K: EntityKey, T> Registry<K, T> {
    /// Creates an empty registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            doomed: BTreeSet::new(),
            next_id: 0,
        }
    }

    /// Allocates an identifier and stores the entity under it.
    pub(crate) fn insert(&mut self, value: T) -> K {
        let id = K::from_raw(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let _ = self.entries.insert(id, value);
        id
    }

    /// Live entity stored under the identifier.
    pub(crate) fn get(&self, id: K) -> Option<&T> {
        if self.doomed.contains(&id) {
            return None;
        }
        self.entries.get(&id)
    }

    /// Mutable access to a live entity.
    pub(crate) fn get_mut(&mut self, id: K) -> Option<&mut T> {
        if self.doomed.contains(&id) {
            return None;
        }
        self.entries.get_mut(&id)
    }

    /// Iterates over live entities in registration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (K, &T)> + '_ {
        self.entries
            .iter()
            .filter(|(id, _)| !self.doomed.contains(*id))
            .map(|(id, entry)| (*id, entry))
    }

    /// Identifiers of live entities in registration order.
    pub(crate) fn live_ids(&self) -> Vec<K> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Number of live entities.
    pub(crate) fn live_count(&self) -> usize {
        self.entries
            .keys()
            .filter(|id| !self.doomed.contains(*id))
            .count()
    }

    /// Marks a live entity for removal at the next reap.
    ///
    /// Returns `false` when the entity is unknown or already marked.
    pub(crate) fn mark_for_removal(&mut self, id: K) -> bool {
        if !self.entries.contains_key(&id) {
            return false;
        }
        self.doomed.insert(id)
    }

    /// Drops every marked entity, returning how many were removed.
    pub(crate) fn reap(&mut self) -> usize {
        let doomed = std::mem::take(&mut self.doomed);
        let count = doomed.len();
        for id in doomed {
            let _ = self.entries.remove(&id);
        }
        count
    }

    /// Number of stored entries including those awaiting removal.
    #[cfg(test)]
    pub(crate) fn stored_count(&self) -> usize {
        self.entries.len()
    }
}
