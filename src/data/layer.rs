use std::{collections::BTreeMap, fmt, sync::LazyLock};

use geo::{coord, BoundingRect, Geometry, Rect};
use regex::Regex;
use serde::Deserialize;

use super::osm::{MemberKind, OsmId};

/// Geometry family a layer is declared with. Multi-geometries belong to the family of
/// their parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
}

impl GeometryKind {
    pub fn of(geometry: &Geometry) -> Option<GeometryKind> {
        match geometry {
            Geometry::Point(_) | Geometry::MultiPoint(_) => Some(GeometryKind::Point),
            Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => {
                Some(GeometryKind::Line)
            }
            Geometry::Polygon(_)
            | Geometry::MultiPolygon(_)
            | Geometry::Rect(_)
            | Geometry::Triangle(_) => Some(GeometryKind::Polygon),
            Geometry::GeometryCollection(_) => None,
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryKind::Point => "point",
            GeometryKind::Line => "line",
            GeometryKind::Polygon => "polygon",
        };
        f.write_str(name)
    }
}

/// Which member bucket of a polygon relation a ring was assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingRole {
    Outer,
    Inner,
    Solo,
}

impl RingRole {
    pub fn from_member_role(role: &str) -> RingRole {
        match role {
            "outer" => RingRole::Outer,
            "inner" => RingRole::Inner,
            _ => RingRole::Solo,
        }
    }
}

/// Malformed topology met while building a record's geometry. The record is still
/// produced, with whatever geometry could be salvaged.
#[derive(Debug, Clone, PartialEq)]
pub enum TopologyWarning {
    MissingNode(OsmId),
    MissingWay(OsmId),
    DegenerateWay(OsmId),
    UnclosedRing(RingRole),
    IgnoredMembers { kind: MemberKind, count: usize },
    EmptyGeometry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub osm_id: OsmId,
    pub geometry: Geometry,
    pub attributes: BTreeMap<String, String>,
    pub warnings: Vec<TopologyWarning>,
}

impl Record {
    pub fn new(osm_id: OsmId, geometry: Geometry, attributes: BTreeMap<String, String>) -> Self {
        Record {
            osm_id,
            geometry,
            attributes,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<TopologyWarning>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn kind(&self) -> Option<GeometryKind> {
        GeometryKind::of(&self.geometry)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// A record turned away by a layer because its geometry is of the wrong family.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub osm_id: OsmId,
    pub layer: String,
    pub expected: GeometryKind,
    pub found: Option<GeometryKind>,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.found {
            Some(found) => write!(
                f,
                "element {} has {} geometry but layer {} holds {} geometries",
                self.osm_id, found, self.layer, self.expected
            ),
            None => write!(
                f,
                "element {} has a mixed geometry collection but layer {} holds {} geometries",
                self.osm_id, self.layer, self.expected
            ),
        }
    }
}

/// Typed output layer for one configured feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    feature: String,
    name: String,
    group: String,
    kind: GeometryKind,
    fields: Vec<String>,
    records: Vec<Record>,
    extent: Option<Rect>,
}

pub type LayerSet = BTreeMap<String, Layer>;

static CAMEL_CASE_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^A-Z]+|[A-Z][^A-Z]*").expect("static regex is valid")
});

fn split_camel_case(value: &str) -> Vec<&str> {
    CAMEL_CASE_WORD
        .find_iter(value)
        .map(|word| word.as_str())
        .collect()
}

impl Layer {
    pub fn new(feature: &str, kind: GeometryKind, fields: Vec<String>) -> Self {
        // "voidGreyAreas" lives in group "void" as layer "grey_areas".
        let words = split_camel_case(feature);
        let (group, name) = match words.split_first() {
            Some((first, rest)) if !rest.is_empty() => (
                first.to_lowercase(),
                rest.iter()
                    .map(|word| word.to_lowercase())
                    .collect::<Vec<_>>()
                    .join("_"),
            ),
            _ => (feature.to_lowercase(), feature.to_lowercase()),
        };

        Layer {
            feature: feature.to_string(),
            name,
            group,
            kind,
            fields,
            records: Vec::new(),
            extent: None,
        }
    }

    /// Empty layer with the same feature and fields but a different geometry kind.
    pub fn derived(&self, kind: GeometryKind) -> Self {
        Layer {
            feature: self.feature.clone(),
            name: self.name.clone(),
            group: self.group.clone(),
            kind,
            fields: self.fields.clone(),
            records: Vec::new(),
            extent: None,
        }
    }

    pub fn feature(&self) -> &str {
        &self.feature
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn extent(&self) -> Option<Rect> {
        self.extent
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn append(&mut self, record: Record) -> std::result::Result<(), Rejection> {
        let found = record.kind();
        if found != Some(self.kind) {
            return Err(Rejection {
                osm_id: record.osm_id,
                layer: self.feature.clone(),
                expected: self.kind,
                found,
            });
        }

        if let Some(bounds) = record.geometry.bounding_rect() {
            self.extent = Some(match self.extent {
                Some(extent) => Rect::new(
                    coord! {
                        x: extent.min().x.min(bounds.min().x),
                        y: extent.min().y.min(bounds.min().y),
                    },
                    coord! {
                        x: extent.max().x.max(bounds.max().x),
                        y: extent.max().y.max(bounds.max().y),
                    },
                ),
                None => bounds,
            });
        }
        self.records.push(record);
        Ok(())
    }
}
