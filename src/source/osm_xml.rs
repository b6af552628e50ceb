use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::data::osm::{Member, MemberKind, Node, OsmId, Relation, Tags, Way};
use crate::data::OsmData;
use crate::errors::{Context, Error, Result};

use super::ElementSource;

const SOURCE_NAME: &str = "osm_xml";

/// The element currently being read, collecting its child tags.
enum ParserState {
    Top,
    Node(Node),
    Way(Way),
    Relation(Relation),
}

type Attributes = Vec<(Vec<u8>, String)>;

fn attributes(el: &BytesStart) -> Result<Attributes> {
    let mut out = Vec::new();
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        out.push((attribute.key.as_ref().to_vec(), attribute.unescape_value()?.into_owned()));
    }
    Ok(out)
}

fn optional<'a>(attrs: &'a Attributes, key: &[u8]) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

fn required<'a>(attrs: &'a Attributes, key: &[u8], element: &str) -> Result<&'a str> {
    optional(attrs, key).ok_or_else(|| {
        Error::from(format!(
            "<{}> is missing attribute {}",
            element,
            String::from_utf8_lossy(key)
        ))
    })
}

fn parse_id(attrs: &Attributes, key: &[u8], element: &str) -> Result<OsmId> {
    Ok(required(attrs, key, element)?.parse()?)
}

struct OsmXmlParser {
    state: ParserState,
    data: OsmData,
}

impl OsmXmlParser {
    fn new() -> Self {
        OsmXmlParser {
            state: ParserState::Top,
            data: OsmData::default(),
        }
    }

    fn current_tags(&mut self) -> Option<&mut Tags> {
        match &mut self.state {
            ParserState::Top => None,
            ParserState::Node(node) => Some(&mut node.tags),
            ParserState::Way(way) => Some(&mut way.tags),
            ParserState::Relation(relation) => Some(&mut relation.tags),
        }
    }

    fn open(&mut self, el: &BytesStart) -> Result<()> {
        match el.name().as_ref() {
            b"node" => {
                let attrs = attributes(el)?;
                self.state = ParserState::Node(Node {
                    id: parse_id(&attrs, b"id", "node")?,
                    lat: required(&attrs, b"lat", "node")?.parse()?,
                    lon: required(&attrs, b"lon", "node")?.parse()?,
                    tags: Tags::new(),
                });
            }
            b"way" => {
                let attrs = attributes(el)?;
                self.state = ParserState::Way(Way {
                    id: parse_id(&attrs, b"id", "way")?,
                    nodes: Vec::new(),
                    tags: Tags::new(),
                });
            }
            b"relation" => {
                let attrs = attributes(el)?;
                self.state = ParserState::Relation(Relation {
                    id: parse_id(&attrs, b"id", "relation")?,
                    members: Vec::new(),
                    tags: Tags::new(),
                });
            }
            b"tag" => {
                let attrs = attributes(el)?;
                let key = required(&attrs, b"k", "tag")?.to_string();
                let value = required(&attrs, b"v", "tag")?.to_string();
                if let Some(tags) = self.current_tags() {
                    tags.insert(key, value);
                }
            }
            b"nd" => {
                let attrs = attributes(el)?;
                let reference = parse_id(&attrs, b"ref", "nd")?;
                if let ParserState::Way(way) = &mut self.state {
                    way.nodes.push(reference);
                }
            }
            b"member" => {
                let attrs = attributes(el)?;
                let kind_name = required(&attrs, b"type", "member")?;
                let Some(kind) = MemberKind::parse(kind_name) else {
                    return Err(format!("Unknown member type {}", kind_name).into());
                };
                let member = Member {
                    kind,
                    reference: parse_id(&attrs, b"ref", "member")?,
                    role: optional(&attrs, b"role").unwrap_or_default().to_string(),
                };
                if let ParserState::Relation(relation) = &mut self.state {
                    relation.members.push(member);
                }
            }
            // <osm>, <bounds>, <note>, <meta> and friends carry nothing we keep.
            _ => (),
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        if !matches!(name, b"node" | b"way" | b"relation") {
            return;
        }
        match std::mem::replace(&mut self.state, ParserState::Top) {
            ParserState::Top => (),
            ParserState::Node(node) => self.data.nodes.push(node),
            ParserState::Way(way) => self.data.ways.push(way),
            ParserState::Relation(relation) => self.data.relations.push(relation),
        }
    }
}

/// Reads an OSM XML document into its three element sequences, in document order.
pub fn read_osm_xml<R: BufRead>(source: R) -> Result<OsmData> {
    let mut reader = Reader::from_reader(source);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut parser = OsmXmlParser::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => parser.open(&e)?,
            Event::Empty(e) => {
                parser.open(&e)?;
                parser.close(e.name().as_ref());
            }
            Event::End(e) => parser.close(e.name().as_ref()),
            // Declarations, comments, note text and the like.
            _ => (),
        }
        // if we don't keep a borrow elsewhere, we can clear the buffer to keep memory usage low
        buf.clear();
    }

    debug!(
        nodes = parser.data.nodes.len(),
        ways = parser.data.ways.len(),
        relations = parser.data.relations.len();
        "Read OSM XML"
    );
    Ok(parser.data)
}

pub struct OsmXmlSource {
    path: PathBuf,
}

impl OsmXmlSource {
    pub fn new(path: PathBuf) -> Self {
        OsmXmlSource { path }
    }

    fn create_osm_reader(&self) -> Result<Box<dyn BufRead>> {
        let file = fs::File::open(&self.path)
            .context(format!("Could not open {}", self.path.display()))?;
        let file_reader = BufReader::new(file);
        if self.path.extension().is_some_and(|extension| extension == "xz") {
            let xz_reader = XzDecoder::new(file_reader);
            Ok(Box::new(BufReader::new(xz_reader)))
        } else {
            Ok(Box::new(file_reader))
        }
    }
}

impl ElementSource for OsmXmlSource {
    fn source_name(&self) -> String {
        SOURCE_NAME.to_string()
    }

    fn fetch(&mut self) -> Result<OsmData> {
        read_osm_xml(self.create_osm_reader()?)
    }
}
