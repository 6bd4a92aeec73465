//! Keyed element collection.

use std::collections::HashMap;

use crate::element::{Element, ElementKey};

/// A set of elements keyed by `(kind, id)`, unique per key.
///
/// Iteration order is unspecified; upload ordering is always taken from the
/// explicit sort key via [`ElementSet::into_create_order`] and
/// [`ElementSet::into_delete_order`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ElementSet {
    inner: HashMap<ElementKey, Element>,
}

impl ElementSet {
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

    #[must_use]
    pub fn contains(&self, key: ElementKey) -> bool {
        self.inner.contains_key(&key)
    }

    #[must_use]
    pub fn get(&self, key: ElementKey) -> Option<&Element> {
        self.inner.get(&key)
    }

    /// Insert an element under its own key, replacing any previous entry.
    pub fn insert(&mut self, element: Element) {
        self.inner.insert(element.key(), element);
    }

    pub fn remove(&mut self, key: ElementKey) -> Option<Element> {
        self.inner.remove(&key)
    }

    /// Keep only elements matching the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&Element) -> bool) {
        self.inner.retain(|_, element| keep(element));
    }

    /// Merge another set into this one, keeping existing entries on key
    /// collisions. A collision on `(kind, id)` means the identical element,
    /// as happens on shared quadrant boundaries.
    pub fn merge(&mut self, other: Self) {
        for (key, element) in other.inner {
            self.inner.entry(key).or_insert(element);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.inner.values()
    }

    /// Consume the set in creation order: ascending `(kind rank, id)`, so
    /// referenced elements are created before the elements referencing them.
    #[must_use]
    pub fn into_create_order(self) -> Vec<Element> {
        let mut values: Vec<Element> = self.inner.into_values().collect();
        values.sort_by_key(Element::sort_key);
        values
    }

    /// Consume the set in deletion order: the exact reverse of creation
    /// order, so referencing elements are deleted before their referents.
    #[must_use]
    pub fn into_delete_order(self) -> Vec<Element> {
        let mut values = self.into_create_order();
        values.reverse();
        values
    }
}

impl FromIterator<Element> for ElementSet {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        let mut set = Self::new();
        for element in iter {
            set.insert(element);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;
    use rstest::rstest;

    fn sample() -> ElementSet {
        [
            Element::new(ElementKind::Relation, 7, 1),
            Element::new(ElementKind::Node, 2, 1),
            Element::new(ElementKind::Way, 4, 1),
            Element::new(ElementKind::Node, 9, 1),
        ]
        .into_iter()
        .collect()
    }

    #[rstest]
    fn create_order_sorts_by_kind_then_id() {
        let keys: Vec<ElementKey> = sample()
            .into_create_order()
            .iter()
            .map(Element::key)
            .collect();
        assert_eq!(
            keys,
            vec![
                ElementKey::new(ElementKind::Node, 2),
                ElementKey::new(ElementKind::Node, 9),
                ElementKey::new(ElementKind::Way, 4),
                ElementKey::new(ElementKind::Relation, 7),
            ]
        );
    }

    #[rstest]
    fn delete_order_is_reverse_of_create_order() {
        let mut create = sample().into_create_order();
        create.reverse();
        assert_eq!(sample().into_delete_order(), create);
    }

    #[rstest]
    fn merge_keeps_the_first_entry_on_collision() {
        let mut first = ElementSet::new();
        let mut tagged = Element::new(ElementKind::Node, 1, 1);
        tagged.tags.insert("name".into(), "kept".into());
        first.insert(tagged);

        let mut second = ElementSet::new();
        second.insert(Element::new(ElementKind::Node, 1, 2));
        second.insert(Element::new(ElementKind::Node, 2, 1));

        first.merge(second);

        assert_eq!(first.len(), 2);
        let kept = first
            .get(ElementKey::new(ElementKind::Node, 1))
            .expect("node 1 present");
        assert_eq!(kept.tags.get("name").map(String::as_str), Some("kept"));
    }

    #[rstest]
    fn ids_are_unique_only_within_a_kind() {
        let mut set = ElementSet::new();
        set.insert(Element::new(ElementKind::Node, 1, 1));
        set.insert(Element::new(ElementKind::Way, 1, 1));
        assert_eq!(set.len(), 2);
    }
}
