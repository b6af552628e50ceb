use std::fs;
use std::path::PathBuf;

use log::debug;
use serde::Deserialize;

use crate::data::osm::{Member, MemberKind, Node, OsmId, Relation, Tags, Way};
use crate::data::OsmData;
use crate::errors::{Context, Result};

use super::ElementSource;

const SOURCE_NAME: &str = "overpass_json";

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum OverpassElement {
    Node {
        id: OsmId,
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: Tags,
    },
    Way {
        id: OsmId,
        #[serde(default)]
        nodes: Vec<OsmId>,
        #[serde(default)]
        tags: Tags,
    },
    Relation {
        id: OsmId,
        #[serde(default)]
        members: Vec<OverpassMember>,
        #[serde(default)]
        tags: Tags,
    },
}

#[derive(Debug, Deserialize)]
struct OverpassMember {
    #[serde(rename = "type")]
    kind: MemberKind,
    #[serde(rename = "ref")]
    reference: OsmId,
    #[serde(default)]
    role: String,
}

/// Reads the body of an Overpass `[out:json]` response. Only `id`, coordinates, node lists,
/// members and tags are kept; `out geom` extras are ignored.
pub fn read_overpass_json(body: &str) -> Result<OsmData> {
    let response: OverpassResponse = serde_json::from_str(body)?;
    let mut data = OsmData::default();
    for element in response.elements {
        match element {
            OverpassElement::Node { id, lat, lon, tags } => {
                data.nodes.push(Node { id, lon, lat, tags });
            }
            OverpassElement::Way { id, nodes, tags } => {
                data.ways.push(Way { id, nodes, tags });
            }
            OverpassElement::Relation { id, members, tags } => {
                let members = members
                    .into_iter()
                    .map(|member| Member {
                        kind: member.kind,
                        reference: member.reference,
                        role: member.role,
                    })
                    .collect();
                data.relations.push(Relation { id, members, tags });
            }
        }
    }
    debug!(
        nodes = data.nodes.len(),
        ways = data.ways.len(),
        relations = data.relations.len();
        "Read Overpass JSON"
    );
    Ok(data)
}

pub struct OverpassJsonSource {
    path: PathBuf,
}

impl OverpassJsonSource {
    pub fn new(path: PathBuf) -> Self {
        OverpassJsonSource { path }
    }
}

impl ElementSource for OverpassJsonSource {
    fn source_name(&self) -> String {
        SOURCE_NAME.to_string()
    }

    fn fetch(&mut self) -> Result<OsmData> {
        let body = fs::read_to_string(&self.path)
            .context(format!("Could not read {}", self.path.display()))?;
        read_overpass_json(&body)
    }
}
