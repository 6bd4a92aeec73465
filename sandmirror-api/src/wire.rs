//! XML wire format for the editing API.
//!
//! Covers everything the pipeline reads and writes on the wire: map and
//! Overpass documents, changeset creation payloads, osmChange upload
//! payloads, diff results and the capabilities document. All of it is
//! streamed through `quick-xml` events; no DOM is built.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use thiserror::Error;

use sandmirror_core::{Element, ElementKey, ElementKind, ElementSet, IdMap, Member};

use crate::GENERATOR;

/// Errors produced while encoding or decoding wire payloads.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WireError {
    /// The document is not well-formed XML.
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    /// An attribute could not be read.
    #[error("malformed attribute on <{element}>: {message}")]
    Attribute { element: String, message: String },
    /// A required attribute is absent.
    #[error("missing attribute {attribute} on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    /// A numeric attribute did not parse.
    #[error("attribute {attribute}={value:?} on <{element}> is not a number")]
    InvalidNumber {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },
}

/// One homogeneous batch of changes.
///
/// A payload carries either creations or deletions, never both.
#[derive(Debug, Clone, Copy)]
pub enum ChangeBatch<'a> {
    /// Elements to create, visible, with full geometry, tags and members.
    Create(&'a [Element]),
    /// Elements to delete as id/version stubs, guarded by `if-unused`.
    Delete(&'a [Element]),
}

impl ChangeBatch<'_> {
    #[must_use]
    pub const fn elements(&self) -> &[Element] {
        match *self {
            Self::Create(elements) | Self::Delete(elements) => elements,
        }
    }

    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Delete(_) => "delete",
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.elements().len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.elements().is_empty()
    }
}

/// Parse every node, way and relation out of an `<osm>` document.
///
/// Unknown siblings such as `<bounds>`, `<note>`, `<meta>` or `<remark>`
/// are skipped.
pub fn parse_elements(xml: &str) -> Result<ElementSet, WireError> {
    let mut reader = Reader::from_str(xml);
    let mut set = ElementSet::new();
    let mut current: Option<Element> = None;
    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if let Some(kind) = kind_of(&start) {
                    current = Some(element_from(kind, &start)?);
                } else {
                    attach_child(&start, current.as_mut())?;
                }
            }
            Event::Empty(start) => {
                if let Some(kind) = kind_of(&start) {
                    set.insert(element_from(kind, &start)?);
                } else {
                    attach_child(&start, current.as_mut())?;
                }
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                if ElementKind::from_str_opt(&name).is_some() {
                    if let Some(done) = current.take() {
                        set.insert(done);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(set)
}

/// Render the `<osm><changeset>` payload that opens a changeset.
pub fn changeset_document(comment: &str) -> Result<String, WireError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Start(BytesStart::new("osm")))?;
    writer.write_event(Event::Start(BytesStart::new("changeset")))?;
    write_tag(&mut writer, "comment", comment)?;
    write_tag(&mut writer, "created_by", GENERATOR)?;
    writer.write_event(Event::End(BytesEnd::new("changeset")))?;
    writer.write_event(Event::End(BytesEnd::new("osm")))?;
    Ok(into_string(writer))
}

/// Render an `<osmChange>` document for one batch.
pub fn change_document(batch: &ChangeBatch<'_>, changeset: i64) -> Result<String, WireError> {
    let mut writer = Writer::new(Vec::new());
    let mut root = BytesStart::new("osmChange");
    root.push_attribute(("version", "0.6"));
    root.push_attribute(("generator", GENERATOR));
    writer.write_event(Event::Start(root))?;
    match batch {
        ChangeBatch::Create(elements) => {
            writer.write_event(Event::Start(BytesStart::new("create")))?;
            for element in *elements {
                write_create_element(&mut writer, element, changeset)?;
            }
            writer.write_event(Event::End(BytesEnd::new("create")))?;
        }
        ChangeBatch::Delete(elements) => {
            let mut delete = BytesStart::new("delete");
            delete.push_attribute(("if-unused", "true"));
            writer.write_event(Event::Start(delete))?;
            for element in *elements {
                writer.write_event(Event::Empty(element_start(element, changeset, false)))?;
            }
            writer.write_event(Event::End(BytesEnd::new("delete")))?;
        }
    }
    writer.write_event(Event::End(BytesEnd::new("osmChange")))?;
    Ok(into_string(writer))
}

/// Parse an upload diff result into an old-to-new id map.
///
/// Entries without a `new_id` are deletions and carry no mapping.
pub fn parse_diff_result(xml: &str) -> Result<IdMap, WireError> {
    let mut reader = Reader::from_str(xml);
    let mut map = IdMap::new();
    loop {
        match reader.read_event()? {
            Event::Start(start) | Event::Empty(start) => {
                let Some(kind) = kind_of(&start) else {
                    continue;
                };
                let attrs = attributes(&start)?;
                let name = kind_element_name(kind);
                let old_id = parse_number(&attrs, name, "old_id")?;
                if attrs.contains_key("new_id") {
                    let new_id = parse_number(&attrs, name, "new_id")?;
                    map.insert(ElementKey::new(kind, old_id), new_id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(map)
}

/// Extract the per-changeset element limit from a capabilities document.
///
/// Absent or unparsable limits yield `None`; the caller falls back to a
/// default.
pub fn parse_max_changeset_elements(xml: &str) -> Result<Option<u64>, WireError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(start) | Event::Empty(start) => {
                if start.name().as_ref() == b"changesets" {
                    let attrs = attributes(&start)?;
                    return Ok(attrs
                        .get("maximum_elements")
                        .and_then(|value| value.parse().ok()));
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn kind_of(start: &BytesStart<'_>) -> Option<ElementKind> {
    match start.name().as_ref() {
        b"node" => Some(ElementKind::Node),
        b"way" => Some(ElementKind::Way),
        b"relation" => Some(ElementKind::Relation),
        _ => None,
    }
}

const fn kind_element_name(kind: ElementKind) -> &'static str {
    kind.as_str()
}

fn attributes(start: &BytesStart<'_>) -> Result<HashMap<String, String>, WireError> {
    let element = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut out = HashMap::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|source| WireError::Attribute {
            element: element.clone(),
            message: source.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|source| WireError::Attribute {
                element: element.clone(),
                message: source.to_string(),
            })?
            .into_owned();
        out.insert(key, value);
    }
    Ok(out)
}

fn require<'a>(
    attrs: &'a HashMap<String, String>,
    element: &'static str,
    attribute: &'static str,
) -> Result<&'a str, WireError> {
    attrs
        .get(attribute)
        .map(String::as_str)
        .ok_or(WireError::MissingAttribute { element, attribute })
}

fn parse_number<T: std::str::FromStr>(
    attrs: &HashMap<String, String>,
    element: &'static str,
    attribute: &'static str,
) -> Result<T, WireError> {
    let value = require(attrs, element, attribute)?;
    value.parse().map_err(|_| WireError::InvalidNumber {
        element,
        attribute,
        value: value.to_owned(),
    })
}

fn element_from(kind: ElementKind, start: &BytesStart<'_>) -> Result<Element, WireError> {
    let name = kind_element_name(kind);
    let attrs = attributes(start)?;
    let id = parse_number(&attrs, name, "id")?;
    let version = parse_number(&attrs, name, "version")?;
    let mut element = Element::new(kind, id, version);
    if let (Some(lon), Some(lat)) = (attrs.get("lon"), attrs.get("lat")) {
        let x = lon.parse().map_err(|_| WireError::InvalidNumber {
            element: name,
            attribute: "lon",
            value: lon.clone(),
        })?;
        let y = lat.parse().map_err(|_| WireError::InvalidNumber {
            element: name,
            attribute: "lat",
            value: lat.clone(),
        })?;
        element.coords = Some(geo::Coord { x, y });
    }
    Ok(element)
}

fn attach_child(start: &BytesStart<'_>, current: Option<&mut Element>) -> Result<(), WireError> {
    let Some(element) = current else {
        // Siblings outside an open element, e.g. <bounds> or <note>.
        return Ok(());
    };
    match start.name().as_ref() {
        b"tag" => {
            let attrs = attributes(start)?;
            let key = require(&attrs, "tag", "k")?.to_owned();
            let value = require(&attrs, "tag", "v")?.to_owned();
            element.tags.insert(key, value);
        }
        b"nd" => {
            let attrs = attributes(start)?;
            element.node_refs.push(parse_number(&attrs, "nd", "ref")?);
        }
        b"member" => {
            let attrs = attributes(start)?;
            let kind_name = require(&attrs, "member", "type")?;
            let Some(kind) = ElementKind::from_str_opt(kind_name) else {
                return Err(WireError::Attribute {
                    element: "member".to_owned(),
                    message: format!("unknown member type {kind_name:?}"),
                });
            };
            let id = parse_number(&attrs, "member", "ref")?;
            let role = attrs.get("role").cloned().unwrap_or_default();
            element.members.push(Member::new(kind, id, role));
        }
        _ => {}
    }
    Ok(())
}

fn element_start(element: &Element, changeset: i64, visible: bool) -> BytesStart<'static> {
    let mut start = BytesStart::new(element.kind.as_str().to_owned());
    start.push_attribute(("id", element.id.to_string().as_str()));
    start.push_attribute(("version", element.version.to_string().as_str()));
    start.push_attribute(("changeset", changeset.to_string().as_str()));
    start.push_attribute(("visible", if visible { "true" } else { "false" }));
    start
}

fn write_create_element(
    writer: &mut Writer<Vec<u8>>,
    element: &Element,
    changeset: i64,
) -> Result<(), WireError> {
    let mut start = element_start(element, changeset, true);
    if let Some(coords) = element.coords {
        start.push_attribute(("lon", coords.x.to_string().as_str()));
        start.push_attribute(("lat", coords.y.to_string().as_str()));
    }
    let childless =
        element.tags.is_empty() && element.node_refs.is_empty() && element.members.is_empty();
    if childless {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for (key, value) in &element.tags {
        write_tag(writer, key, value)?;
    }
    for node_ref in &element.node_refs {
        let mut nd = BytesStart::new("nd");
        nd.push_attribute(("ref", node_ref.to_string().as_str()));
        writer.write_event(Event::Empty(nd))?;
    }
    for member in &element.members {
        let mut entry = BytesStart::new("member");
        entry.push_attribute(("type", member.kind.as_str()));
        entry.push_attribute(("ref", member.id.to_string().as_str()));
        entry.push_attribute(("role", member.role.as_str()));
        writer.write_event(Event::Empty(entry))?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.kind.as_str())))?;
    Ok(())
}

fn write_tag(writer: &mut Writer<Vec<u8>>, key: &str, value: &str) -> Result<(), WireError> {
    let mut tag = BytesStart::new("tag");
    tag.push_attribute(("k", key));
    tag.push_attribute(("v", value));
    writer.write_event(Event::Empty(tag))?;
    Ok(())
}

fn into_string(writer: Writer<Vec<u8>>) -> String {
    String::from_utf8_lossy(&writer.into_inner()).into_owned()
}
