//! The OpenStreetMap element model.
//!
//! Coordinates are WGS84 with `x = longitude` and `y = latitude`. Tags mirror
//! OpenStreetMap's free-form key/value structure. Ways keep their node
//! references apart from relation-style members because the wire format
//! renders them differently (`<nd ref=…>` versus `<member …>`).

use std::collections::HashMap;

use geo::Coord;

use crate::bbox::BoundingBox;

/// The three element kinds of the OpenStreetMap data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    /// Upload ordering rank: nodes before ways before relations.
    ///
    /// Creation uses this rank ascending so referenced elements exist before
    /// the elements that reference them; deletion uses the exact reverse.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Node => 0,
            Self::Way => 1,
            Self::Relation => 2,
        }
    }

    /// Wire-format name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }

    /// Parse a wire-format kind name.
    #[must_use]
    pub fn from_str_opt(name: &str) -> Option<Self> {
        match name {
            "node" => Some(Self::Node),
            "way" => Some(Self::Way),
            "relation" => Some(Self::Relation),
            _ => None,
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite key identifying an element: ids are only unique per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementKey {
    pub kind: ElementKind,
    pub id: i64,
}

impl ElementKey {
    #[must_use]
    pub const fn new(kind: ElementKind, id: i64) -> Self {
        Self { kind, id }
    }
}

impl std::fmt::Display for ElementKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// One entry of a relation's ordered member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub kind: ElementKind,
    pub id: i64,
    pub role: String,
}

impl Member {
    #[must_use]
    pub fn new(kind: ElementKind, id: i64, role: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            role: role.into(),
        }
    }
}

/// A single map element: a node, way or relation.
///
/// Positive ids are server-assigned. During the create-upload protocol the id
/// is rewritten to a negative placeholder and later to the real id returned
/// by the server; see [`crate::IdMap`].
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    pub id: i64,
    /// Revision counter owned by whichever server last stored the element.
    /// Required on delete to prevent stale-version conflicts.
    pub version: u64,
    /// Present for nodes, absent for ways and relations.
    pub coords: Option<Coord<f64>>,
    pub tags: HashMap<String, String>,
    /// Ordered node references of a way.
    pub node_refs: Vec<i64>,
    /// Ordered members of a relation.
    pub members: Vec<Member>,
}

impl Element {
    /// Construct a bare element with no geometry, tags or references.
    #[must_use]
    pub fn new(kind: ElementKind, id: i64, version: u64) -> Self {
        Self {
            kind,
            id,
            version,
            coords: None,
            tags: HashMap::new(),
            node_refs: Vec::new(),
            members: Vec::new(),
        }
    }

    #[must_use]
    pub const fn key(&self) -> ElementKey {
        ElementKey::new(self.kind, self.id)
    }

    /// Explicit upload sort key: `(kind rank, id)`.
    #[must_use]
    pub const fn sort_key(&self) -> (u8, i64) {
        (self.kind.rank(), self.id)
    }

    /// Whether the element lies inside the closed rectangle.
    ///
    /// Ways and relations are never filtered by geometry directly, so they
    /// always report `true`; filtering defers to their members.
    #[must_use]
    pub fn is_inside(&self, bbox: &BoundingBox) -> bool {
        match self.coords {
            Some(coords) => bbox.contains(coords),
            None => true,
        }
    }
}
