//! Optional post-download filter stages.
//!
//! Each stage is an independently invocable pass over an [`ElementSet`].
//! None of them run unless selected through [`FilterConfig`]; the default
//! pipeline downloads and uploads the set untouched.

use std::collections::HashSet;

use log::info;

use crate::bbox::BoundingBox;
use crate::collection::ElementSet;
use crate::element::ElementKind;

/// Which filter stages to run, in the order they are listed here.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    /// Drop nodes outside the box and relations nested in relations.
    pub clip_to_bbox: bool,
    /// Drop ways and relations with missing referents.
    pub drop_dangling: bool,
    /// Drop untagged nodes nothing references.
    pub drop_orphan_nodes: bool,
}

impl FilterConfig {
    /// Run the selected stages over the set.
    pub fn apply(&self, elements: &mut ElementSet, bbox: &BoundingBox) {
        let before = elements.len();
        if self.clip_to_bbox {
            restrict_to_bbox(elements, bbox);
        }
        if self.drop_dangling {
            drop_dangling_references(elements);
        }
        if self.drop_orphan_nodes {
            drop_untagged_orphan_nodes(elements);
        }
        if elements.len() != before {
            info!("Filters removed {} of {before} elements.", before - elements.len());
        }
    }
}

/// Drop nodes whose coordinates fall outside the closed box, and relations
/// that themselves have a relation member. Partially-clipped nested
/// structures are worse than absent ones.
pub fn restrict_to_bbox(elements: &mut ElementSet, bbox: &BoundingBox) {
    elements.retain(|el| {
        el.is_inside(bbox) && !el.members.iter().any(|m| m.kind == ElementKind::Relation)
    });
}

/// Drop ways referencing a missing node, then relations referencing a
/// missing node or way.
///
/// A single pass, not a fixpoint: the node set is snapshotted before any
/// removal, so an element removed here does not retroactively invalidate the
/// elements that reference it within the same pass.
pub fn drop_dangling_references(elements: &mut ElementSet) {
    let node_ids: HashSet<i64> = elements
        .iter()
        .filter(|el| el.kind == ElementKind::Node)
        .map(|el| el.id)
        .collect();
    elements.retain(|el| el.node_refs.iter().all(|r| node_ids.contains(r)));

    let way_ids: HashSet<i64> = elements
        .iter()
        .filter(|el| el.kind == ElementKind::Way)
        .map(|el| el.id)
        .collect();
    elements.retain(|el| {
        el.members.iter().all(|m| match m.kind {
            ElementKind::Node => node_ids.contains(&m.id),
            ElementKind::Way => way_ids.contains(&m.id),
            ElementKind::Relation => true,
        })
    });
}

/// Drop nodes that carry no tags and are referenced by no way or relation.
///
/// Untagged orphan vertices are noise; tagged nodes stay even when
/// unreferenced, since they may be meaningful standalone points.
pub fn drop_untagged_orphan_nodes(elements: &mut ElementSet) {
    let mut referenced: HashSet<i64> = HashSet::new();
    for el in elements.iter() {
        referenced.extend(el.node_refs.iter().copied());
        referenced.extend(
            el.members
                .iter()
                .filter(|m| m.kind == ElementKind::Node)
                .map(|m| m.id),
        );
    }
    elements.retain(|el| {
        el.kind != ElementKind::Node || referenced.contains(&el.id) || !el.tags.is_empty()
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementKey, Member};
    use geo::Coord;
    use rstest::rstest;

    fn node_at(id: i64, lon: f64, lat: f64) -> Element {
        let mut el = Element::new(ElementKind::Node, id, 1);
        el.coords = Some(Coord { x: lon, y: lat });
        el
    }

    fn way(id: i64, node_refs: &[i64]) -> Element {
        let mut el = Element::new(ElementKind::Way, id, 1);
        el.node_refs = node_refs.to_vec();
        el
    }

    fn relation(id: i64, members: Vec<Member>) -> Element {
        let mut el = Element::new(ElementKind::Relation, id, 1);
        el.members = members;
        el
    }

    #[rstest]
    fn restrict_drops_outside_nodes_and_nested_relations() {
        let bbox: BoundingBox = "0,0,1,1".parse().expect("valid bbox");
        let mut elements: ElementSet = [
            node_at(1, 0.5, 0.5),
            node_at(2, 1.5, 0.5),
            relation(10, vec![Member::new(ElementKind::Way, 4, "outer")]),
            relation(11, vec![Member::new(ElementKind::Relation, 10, "subarea")]),
        ]
        .into_iter()
        .collect();

        restrict_to_bbox(&mut elements, &bbox);

        assert!(elements.contains(ElementKey::new(ElementKind::Node, 1)));
        assert!(!elements.contains(ElementKey::new(ElementKind::Node, 2)));
        assert!(elements.contains(ElementKey::new(ElementKind::Relation, 10)));
        assert!(!elements.contains(ElementKey::new(ElementKind::Relation, 11)));
    }

    #[rstest]
    fn dangling_ways_and_relations_are_dropped() {
        let mut elements: ElementSet = [
            node_at(1, 0.0, 0.0),
            way(10, &[1]),
            way(11, &[1, 99]),
            relation(20, vec![Member::new(ElementKind::Way, 10, "outer")]),
            relation(21, vec![Member::new(ElementKind::Way, 11, "outer")]),
            relation(22, vec![Member::new(ElementKind::Node, 99, "stop")]),
        ]
        .into_iter()
        .collect();

        drop_dangling_references(&mut elements);

        assert!(elements.contains(ElementKey::new(ElementKind::Way, 10)));
        assert!(!elements.contains(ElementKey::new(ElementKind::Way, 11)));
        assert!(elements.contains(ElementKey::new(ElementKind::Relation, 20)));
        // Way 11 was removed within this pass, so relation 21 goes too: the
        // way set is snapshotted after way removal.
        assert!(!elements.contains(ElementKey::new(ElementKind::Relation, 21)));
        assert!(!elements.contains(ElementKey::new(ElementKind::Relation, 22)));
    }

    #[rstest]
    fn orphan_filter_keeps_tagged_and_referenced_nodes() {
        let mut tagged = node_at(3, 0.0, 0.0);
        tagged.tags.insert("amenity".into(), "bench".into());
        let mut elements: ElementSet = [
            node_at(1, 0.0, 0.0),
            node_at(2, 0.0, 0.0),
            tagged,
            way(10, &[1]),
        ]
        .into_iter()
        .collect();

        drop_untagged_orphan_nodes(&mut elements);

        assert!(elements.contains(ElementKey::new(ElementKind::Node, 1)));
        assert!(!elements.contains(ElementKey::new(ElementKind::Node, 2)));
        assert!(elements.contains(ElementKey::new(ElementKind::Node, 3)));
    }

    #[rstest]
    fn orphan_filter_is_idempotent() {
        let mut elements: ElementSet = [
            node_at(1, 0.0, 0.0),
            node_at(2, 0.0, 0.0),
            way(10, &[1]),
        ]
        .into_iter()
        .collect();

        drop_untagged_orphan_nodes(&mut elements);
        let once = elements.clone();
        drop_untagged_orphan_nodes(&mut elements);

        assert_eq!(elements, once);
    }

    #[rstest]
    fn default_config_runs_no_stage() {
        let bbox: BoundingBox = "0,0,1,1".parse().expect("valid bbox");
        let mut elements: ElementSet = [node_at(1, 5.0, 5.0)].into_iter().collect();
        FilterConfig::default().apply(&mut elements, &bbox);
        assert_eq!(elements.len(), 1);
    }
}
