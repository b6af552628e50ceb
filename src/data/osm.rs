use std::collections::BTreeMap;

use serde::Deserialize;

pub type OsmId = i64;

pub type Tags = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: OsmId,
    pub lon: f64,
    pub lat: f64,
    pub tags: Tags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: OsmId,
    pub nodes: Vec<OsmId>,
    pub tags: Tags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Node,
    Way,
    Relation,
}

impl MemberKind {
    pub fn parse(value: &str) -> Option<MemberKind> {
        match value {
            "node" => Some(MemberKind::Node),
            "way" => Some(MemberKind::Way),
            "relation" => Some(MemberKind::Relation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub kind: MemberKind,
    pub reference: OsmId,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: OsmId,
    pub members: Vec<Member>,
    pub tags: Tags,
}

/// Borrowed view over any of the three OSM element kinds.
#[derive(Debug, Clone, Copy)]
pub enum Element<'a> {
    Node(&'a Node),
    Way(&'a Way),
    Relation(&'a Relation),
}

impl<'a> Element<'a> {
    pub fn id(&self) -> OsmId {
        match self {
            Element::Node(node) => node.id,
            Element::Way(way) => way.id,
            Element::Relation(relation) => relation.id,
        }
    }

    pub fn tags(&self) -> &'a Tags {
        match self {
            Element::Node(node) => &node.tags,
            Element::Way(way) => &way.tags,
            Element::Relation(relation) => &relation.tags,
        }
    }

    pub fn tag(&self, key: &str) -> Option<&'a str> {
        self.tags().get(key).map(String::as_str)
    }
}

impl<'a> From<&'a Node> for Element<'a> {
    fn from(value: &'a Node) -> Self {
        Element::Node(value)
    }
}

impl<'a> From<&'a Way> for Element<'a> {
    fn from(value: &'a Way) -> Self {
        Element::Way(value)
    }
}

impl<'a> From<&'a Relation> for Element<'a> {
    fn from(value: &'a Relation) -> Self {
        Element::Relation(value)
    }
}
