use self::osm::{Node, Relation, Way};

pub mod layer;
pub mod osm;

/// Map data as returned by an element source. The three sequences keep the order the
/// source delivered them in.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OsmData {
    pub nodes: Vec<Node>,
    pub ways: Vec<Way>,
    pub relations: Vec<Relation>,
}

impl OsmData {
    pub fn len(&self) -> usize {
        self.nodes.len() + self.ways.len() + self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
