//! Identifier renumbering across the two id spaces.
//!
//! Before upload every element gets a unique negative placeholder id; after
//! each upload the server's diff result maps placeholders to real ids. Both
//! steps are expressed as an [`IdMap`] applied over a working set, rewriting
//! element ids and every cross-reference in one pass.

use std::collections::HashMap;

use crate::element::{Element, ElementKey, ElementKind};

/// A remapping table from old `(kind, id)` keys to new ids.
///
/// Maps are applied cumulatively across sequential batches: each application
/// rewrites only the keys it covers and leaves other references untouched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IdMap {
    inner: HashMap<ElementKey, i64>,
}

impl IdMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn insert(&mut self, old: ElementKey, new_id: i64) {
        self.inner.insert(old, new_id);
    }

    #[must_use]
    pub fn get(&self, old: ElementKey) -> Option<i64> {
        self.inner.get(&old).copied()
    }

    /// Rewrite ids and references across the whole working set.
    ///
    /// Every element whose `(kind, id)` the map covers gets the new id, and
    /// every way node reference and relation member covered by the map is
    /// rewritten to match. References the map does not cover stay as they
    /// are; they belong to elements already known to the server.
    pub fn apply(&self, elements: &mut [Element]) {
        for element in elements {
            if let Some(new_id) = self.get(element.key()) {
                element.id = new_id;
            }
            for node_ref in &mut element.node_refs {
                if let Some(new_id) = self.get(ElementKey::new(ElementKind::Node, *node_ref)) {
                    *node_ref = new_id;
                }
            }
            for member in &mut element.members {
                if let Some(new_id) = self.get(ElementKey::new(member.kind, member.id)) {
                    member.id = new_id;
                }
            }
        }
    }
}

impl FromIterator<(ElementKey, i64)> for IdMap {
    fn from_iter<I: IntoIterator<Item = (ElementKey, i64)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

/// Assign negative placeholder ids for creation, in slice order, starting at
/// -1 and decrementing.
///
/// The whole map is built first and applied atomically, so a way's node
/// references and a relation's member references resolve correctly within
/// the same upload batch regardless of where their referents sit in the
/// slice. Returns the applied map.
pub fn assign_placeholders(elements: &mut [Element]) -> IdMap {
    let map: IdMap = elements
        .iter()
        .zip(1..)
        .map(|(element, n)| (element.key(), -n))
        .collect();
    map.apply(elements);
    map
}
