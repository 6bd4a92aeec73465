//! Behavioural tests for the ordering and renumbering protocol as the
//! upload pipeline uses it: sort, assign placeholders, then apply server
//! maps cumulatively batch by batch.

use rstest::rstest;

use sandmirror_core::{
    BoundingBox, Element, ElementKey, ElementKind, ElementSet, IdMap, Member, assign_placeholders,
    drop_untagged_orphan_nodes,
};

fn node(id: i64) -> Element {
    let mut el = Element::new(ElementKind::Node, id, 1);
    el.coords = Some(geo::Coord { x: 10.01, y: 50.01 });
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

fn sample_set() -> ElementSet {
    vec![
        node(3),
        node(1),
        node(2),
        way(10, &[1, 2]),
        way(11, &[2, 3]),
        relation(
            20,
            vec![
                Member::new(ElementKind::Way, 10, "outer"),
                Member::new(ElementKind::Way, 11, "inner"),
                Member::new(ElementKind::Node, 1, "admin_centre"),
            ],
        ),
    ]
    .into_iter()
    .collect()
}

#[rstest]
fn delete_order_exactly_reverses_create_order() {
    let mut reversed_create = sample_set().into_create_order();
    reversed_create.reverse();
    assert_eq!(sample_set().into_delete_order(), reversed_create);
}

#[rstest]
fn placeholder_assignment_keeps_every_reference_resolvable() {
    let mut values = sample_set().into_create_order();
    let map = assign_placeholders(&mut values);

    assert_eq!(map.len(), values.len());
    let keys: Vec<ElementKey> = values.iter().map(Element::key).collect();

    for element in &values {
        for node_ref in &element.node_refs {
            assert!(keys.contains(&ElementKey::new(ElementKind::Node, *node_ref)));
        }
        for member in &element.members {
            assert!(keys.contains(&ElementKey::new(member.kind, member.id)));
        }
    }
}

#[rstest]
fn cumulative_maps_clear_every_covered_placeholder() {
    let mut values = sample_set().into_create_order();
    assign_placeholders(&mut values);

    // The server answers batch by batch: nodes first, then ways, then the
    // relation. Apply each map to the whole remaining working set.
    let node_map: IdMap = values
        .iter()
        .filter(|el| el.kind == ElementKind::Node)
        .enumerate()
        .map(|(i, el)| (el.key(), 9000 + i as i64))
        .collect();
    node_map.apply(&mut values);

    // No way or relation may still reference a placeholder the map covered.
    for element in &values {
        for node_ref in &element.node_refs {
            assert!(*node_ref >= 9000, "stale placeholder {node_ref}");
        }
        for member in &element.members {
            if member.kind == ElementKind::Node {
                assert!(member.id >= 9000);
            }
        }
    }

    let way_map: IdMap = values
        .iter()
        .filter(|el| el.kind == ElementKind::Way)
        .enumerate()
        .map(|(i, el)| (el.key(), 400 + i as i64))
        .collect();
    way_map.apply(&mut values);

    let rel = values.last().expect("relation is last in create order");
    assert_eq!(rel.kind, ElementKind::Relation);
    assert!(rel.members.iter().all(|m| m.id > 0));
}

#[rstest]
fn orphan_node_filter_is_idempotent_over_a_mixed_set() {
    let bbox: BoundingBox = "10.0,50.0,10.05,50.05".parse().expect("valid bbox");
    let mut elements = sample_set();
    elements.insert(node(99));

    drop_untagged_orphan_nodes(&mut elements);
    let once = elements.clone();
    drop_untagged_orphan_nodes(&mut elements);

    assert_eq!(elements, once);
    assert!(!elements.contains(ElementKey::new(ElementKind::Node, 99)));
    assert!(elements.iter().all(|el| el.is_inside(&bbox)));
}
