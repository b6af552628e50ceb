//! Turns OSM topology into planar geometry: points for nodes, lines or polygons for
//! ways, and merged multi-geometries for relations.

use std::{collections::HashMap, hash::Hash};

use geo::{
    BooleanOps, Centroid, Contains, Coord, Geometry, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon,
};
use serde::Deserialize;

use crate::{
    config::{PolygonMode, PolygonRule},
    data::{
        layer::{GeometryKind, RingRole, TopologyWarning},
        osm::{MemberKind, Node, OsmId, Relation, Tags, Way},
    },
};

/// How inner rings of a polygon relation are matched to its outer rings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InnerRingPolicy {
    /// Every inner ring is subtracted from every outer ring.
    #[default]
    SubtractAll,
    /// An inner ring is subtracted only from the outer rings that contain it.
    ContainingOuter,
}

/// Coordinate usable as a hash key, comparing the exact bit patterns of x and y.
#[derive(Debug, Clone, Copy)]
struct CoordKey(Coord);

impl Hash for CoordKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.x.to_bits().hash(state);
        self.0.y.to_bits().hash(state);
    }
}

impl Eq for CoordKey {}

impl PartialEq for CoordKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.x.to_bits() == other.0.x.to_bits() && self.0.y.to_bits() == other.0.y.to_bits()
    }
}

/// Node coordinates and way lines resolved so far in a run. Ways are resolved against
/// nodes and relations against both, so nodes have to be fed in before ways and ways
/// before relations.
#[derive(Debug, Default)]
pub struct ResolvedElements {
    nodes: HashMap<OsmId, Coord>,
    ways: HashMap<OsmId, LineString>,
}

impl ResolvedElements {
    pub fn insert_node(&mut self, node: &Node) {
        self.nodes.insert(node.id, Coord { x: node.lon, y: node.lat });
    }

    pub fn insert_way(&mut self, id: OsmId, line: LineString) {
        self.ways.insert(id, line);
    }

    pub fn node(&self, id: OsmId) -> Option<Coord> {
        self.nodes.get(&id).copied()
    }

    pub fn way(&self, id: OsmId) -> Option<&LineString> {
        self.ways.get(&id)
    }
}

pub fn node_point(node: &Node) -> Point {
    Point::new(node.lon, node.lat)
}

/// Line through the way's nodes in order. Unresolvable node references are left out.
pub fn way_line(way: &Way, resolved: &ResolvedElements) -> (LineString, Vec<TopologyWarning>) {
    let mut warnings = Vec::new();
    let mut coords = Vec::with_capacity(way.nodes.len());
    for node_id in &way.nodes {
        match resolved.node(*node_id) {
            Some(coord) => coords.push(coord),
            None => warnings.push(TopologyWarning::MissingNode(*node_id)),
        }
    }
    if coords.len() < 2 {
        warnings.push(TopologyWarning::DegenerateWay(way.id));
    }
    (LineString::new(coords), warnings)
}

fn is_closed(coords: &[Coord]) -> bool {
    coords.len() > 1 && coords.first() == coords.last()
}

/// Smallest coordinate sequence that can bound an area: three corners plus the closing
/// repeat of the first.
fn is_ring(coords: &[Coord]) -> bool {
    coords.len() >= 4 && is_closed(coords)
}

/// Decides whether a way should become an area, following the OSM polygon-features
/// convention used by Overpass Turbo.
pub fn is_closed_polygon_candidate(
    tags: &Tags,
    line: &LineString,
    rules: &[PolygonRule],
) -> bool {
    if !is_closed(&line.0) {
        return false;
    }
    if tags.get("area").map(String::as_str) == Some("no") {
        return false;
    }

    for rule in rules {
        let Some(value) = tags.get(&rule.key) else {
            continue;
        };
        return match rule.mode {
            PolygonMode::All => true,
            PolygonMode::Whitelist => rule.values.contains(value),
            PolygonMode::Blacklist => !rule.values.contains(value),
        };
    }
    false
}

/// Geometry of a way for a feature declared with `kind`.
pub fn way_geometry(
    tags: &Tags,
    line: LineString,
    kind: GeometryKind,
    rules: &[PolygonRule],
) -> (Geometry, Vec<TopologyWarning>) {
    let geometry: Geometry = if is_closed_polygon_candidate(tags, &line, rules) {
        Polygon::new(line, Vec::new()).into()
    } else {
        line.into()
    };

    if kind != GeometryKind::Point {
        return (geometry, Vec::new());
    }
    match geometry.centroid() {
        Some(centroid) => (centroid.into(), Vec::new()),
        None => (geometry, vec![TopologyWarning::EmptyGeometry]),
    }
}

/// Geometry of a relation for a feature declared with `kind`.
pub fn relation_geometry(
    relation: &Relation,
    kind: GeometryKind,
    resolved: &ResolvedElements,
    policy: InnerRingPolicy,
) -> (Geometry, Vec<TopologyWarning>) {
    match kind {
        GeometryKind::Point => {
            let (points, warnings) = relation_points(relation, resolved);
            (points.into(), warnings)
        }
        GeometryKind::Line => relation_lines(relation, resolved),
        GeometryKind::Polygon => {
            let (polygons, warnings) = relation_polygons(relation, resolved, policy);
            (polygons.into(), warnings)
        }
    }
}

fn ignored_members(relation: &Relation, used: MemberKind, warnings: &mut Vec<TopologyWarning>) {
    for kind in [MemberKind::Node, MemberKind::Way, MemberKind::Relation] {
        if kind == used {
            continue;
        }
        let count = relation.members.iter().filter(|member| member.kind == kind).count();
        if count > 0 {
            warnings.push(TopologyWarning::IgnoredMembers { kind, count });
        }
    }
}

/// Coordinates of every node member in member order. Duplicates are kept.
pub fn relation_points(
    relation: &Relation,
    resolved: &ResolvedElements,
) -> (MultiPoint, Vec<TopologyWarning>) {
    let mut warnings = Vec::new();
    let mut points = Vec::new();
    for member in relation.members.iter().filter(|member| member.kind == MemberKind::Node) {
        match resolved.node(member.reference) {
            Some(coord) => points.push(Point::from(coord)),
            None => warnings.push(TopologyWarning::MissingNode(member.reference)),
        }
    }
    ignored_members(relation, MemberKind::Node, &mut warnings);
    if points.is_empty() {
        warnings.push(TopologyWarning::EmptyGeometry);
    }
    (MultiPoint::new(points), warnings)
}

fn member_lines(
    relation: &Relation,
    resolved: &ResolvedElements,
    warnings: &mut Vec<TopologyWarning>,
) -> Vec<(RingRole, LineString)> {
    let mut lines = Vec::new();
    for member in relation.members.iter().filter(|member| member.kind == MemberKind::Way) {
        match resolved.way(member.reference) {
            Some(line) => lines.push((RingRole::from_member_role(&member.role), line.clone())),
            None => warnings.push(TopologyWarning::MissingWay(member.reference)),
        }
    }
    ignored_members(relation, MemberKind::Way, warnings);
    lines
}

/// Way members merged into as few continuous lines as possible. Roles are ignored.
pub fn relation_lines(
    relation: &Relation,
    resolved: &ResolvedElements,
) -> (Geometry, Vec<TopologyWarning>) {
    let mut warnings = Vec::new();
    let lines = member_lines(relation, resolved, &mut warnings)
        .into_iter()
        .map(|(_, line)| line)
        .collect();

    let mut merged = merge_lines(lines);
    let geometry = if merged.len() == 1 {
        merged.remove(0).into()
    } else {
        if merged.is_empty() {
            warnings.push(TopologyWarning::EmptyGeometry);
        }
        MultiLineString::new(merged).into()
    };
    (geometry, warnings)
}

/// Area of a relation: solo rings as they are, plus outer rings with inner rings cut out.
pub fn relation_polygons(
    relation: &Relation,
    resolved: &ResolvedElements,
    policy: InnerRingPolicy,
) -> (MultiPolygon, Vec<TopologyWarning>) {
    let mut warnings = Vec::new();
    let mut outer = Vec::new();
    let mut inner = Vec::new();
    let mut solo = Vec::new();
    for (role, line) in member_lines(relation, resolved, &mut warnings) {
        match role {
            RingRole::Outer => outer.push(line),
            RingRole::Inner => inner.push(line),
            RingRole::Solo => solo.push(line),
        }
    }

    let solo = ring_polygons(assemble_rings(solo, RingRole::Solo, &mut warnings));
    let outer = ring_polygons(assemble_rings(outer, RingRole::Outer, &mut warnings));
    let inner = ring_polygons(assemble_rings(inner, RingRole::Inner, &mut warnings));

    let mut polygons = solo;
    polygons.extend(subtract_inner_rings(outer, inner, policy));
    if polygons.is_empty() {
        warnings.push(TopologyWarning::EmptyGeometry);
    }
    (MultiPolygon::new(polygons), warnings)
}

fn ring_polygons(rings: Vec<LineString>) -> Vec<Polygon> {
    rings
        .into_iter()
        .map(|ring| Polygon::new(ring, Vec::new()))
        .collect()
}

pub fn subtract_inner_rings(
    outer: Vec<Polygon>,
    inner: Vec<Polygon>,
    policy: InnerRingPolicy,
) -> Vec<Polygon> {
    if inner.is_empty() {
        return outer;
    }

    let mut result = Vec::new();
    for outer_polygon in outer {
        let holes: Vec<Polygon> = match policy {
            InnerRingPolicy::SubtractAll => inner.clone(),
            InnerRingPolicy::ContainingOuter => inner
                .iter()
                .filter(|hole| outer_polygon.contains(*hole))
                .cloned()
                .collect(),
        };
        if holes.is_empty() {
            result.push(outer_polygon);
            continue;
        }
        let difference =
            MultiPolygon::new(vec![outer_polygon]).difference(&MultiPolygon::new(holes));
        result.extend(difference.0);
    }
    result
}

/// Standard line merge: lines are joined end to end through every endpoint shared by
/// exactly two lines. Lines with fewer than two coordinates are dropped.
pub fn merge_lines(lines: Vec<LineString>) -> Vec<LineString> {
    let lines: Vec<Vec<Coord>> = lines
        .into_iter()
        .map(|line| line.0)
        .filter(|coords| coords.len() >= 2)
        .collect();

    let mut by_end: HashMap<CoordKey, Vec<usize>> = HashMap::new();
    for (idx, coords) in lines.iter().enumerate() {
        by_end.entry(CoordKey(coords[0])).or_default().push(idx);
        by_end.entry(CoordKey(coords[coords.len() - 1])).or_default().push(idx);
    }

    let mut used = vec![false; lines.len()];
    let mut merged = Vec::new();
    for start in 0..lines.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let mut chain = lines[start].clone();
        extend_through_degree_two(&mut chain, &lines, &by_end, &mut used);
        chain.reverse();
        extend_through_degree_two(&mut chain, &lines, &by_end, &mut used);
        chain.reverse();
        merged.push(LineString::new(chain));
    }
    merged
}

fn extend_through_degree_two(
    chain: &mut Vec<Coord>,
    lines: &[Vec<Coord>],
    by_end: &HashMap<CoordKey, Vec<usize>>,
    used: &mut [bool],
) {
    while let Some(&end) = chain.last() {
        let Some(touching) = by_end.get(&CoordKey(end)) else {
            return;
        };
        if touching.len() != 2 {
            return;
        }
        let Some(&next) = touching.iter().find(|idx| !used[**idx]) else {
            return;
        };
        used[next] = true;
        let mut append = lines[next].clone();
        if append[0] != end {
            append.reverse();
        }
        chain.pop();
        chain.extend(append);
    }
}

/// Glues line segments into closed rings. Ways that already close are rings on their
/// own; the rest are chained through shared endpoints, reversing as needed. Chains that
/// never close are dropped with an `UnclosedRing` warning.
pub fn assemble_rings(
    lines: Vec<LineString>,
    role: RingRole,
    warnings: &mut Vec<TopologyWarning>,
) -> Vec<LineString> {
    let mut rings = Vec::new();
    let mut pending: Vec<Vec<Coord>> = Vec::new();
    for line in lines {
        if is_ring(&line.0) {
            rings.push(line);
        } else if line.0.len() >= 2 {
            pending.push(line.0);
        } else {
            warnings.push(TopologyWarning::UnclosedRing(role));
        }
    }

    // Glue from the end of the list so that member order is kept for the common case
    // of a ring split into consecutive members.
    pending.reverse();
    while let Some(mut chain) = pending.pop() {
        loop {
            if is_ring(&chain) {
                rings.push(LineString::new(chain));
                break;
            }

            let end = chain[chain.len() - 1];
            let touching_end = pending
                .iter()
                .rposition(|pts| pts[0] == end || pts[pts.len() - 1] == end);
            if let Some(idx) = touching_end {
                let mut append = pending.remove(idx);
                if append[0] != end {
                    append.reverse();
                }
                chain.pop();
                chain.extend(append);
                continue;
            }

            let start = chain[0];
            let touching_start = pending
                .iter()
                .rposition(|pts| pts[0] == start || pts[pts.len() - 1] == start);
            if let Some(idx) = touching_start {
                let mut prepend = pending.remove(idx);
                if prepend[prepend.len() - 1] != start {
                    prepend.reverse();
                }
                prepend.pop();
                prepend.extend(chain);
                chain = prepend;
                continue;
            }

            warnings.push(TopologyWarning::UnclosedRing(role));
            break;
        }
    }
    rings
}

#[cfg(test)]
mod tests {
    use geo::{line_string, Area};

    use crate::data::osm::Member;

    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn square(x0: f64, y0: f64, size: f64) -> LineString {
        line_string![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
            (x: x0, y: y0),
        ]
    }

    fn member(kind: MemberKind, reference: OsmId, role: &str) -> Member {
        Member {
            kind,
            reference,
            role: role.to_string(),
        }
    }

    fn relation(members: Vec<Member>) -> Relation {
        Relation {
            id: 100,
            members,
            tags: tags(&[("type", "multipolygon")]),
        }
    }

    fn water_rules() -> Vec<PolygonRule> {
        vec![PolygonRule::all("natural")]
    }

    #[test]
    fn closed_water_way_is_a_polygon_unless_area_no() {
        let ring = square(0.0, 0.0, 1.0);
        let water = tags(&[("natural", "water")]);
        assert!(is_closed_polygon_candidate(&water, &ring, &water_rules()));
        assert!(!is_closed_polygon_candidate(
            &tags(&[("natural", "water"), ("area", "no")]),
            &ring,
            &water_rules()
        ));

        let (geometry, _) = way_geometry(
            &tags(&[("natural", "water"), ("area", "no")]),
            ring,
            GeometryKind::Polygon,
            &water_rules(),
        );
        assert_eq!(GeometryKind::of(&geometry), Some(GeometryKind::Line));
    }

    #[test]
    fn open_way_is_never_a_polygon() {
        let open = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let water = tags(&[("natural", "water")]);
        assert!(!is_closed_polygon_candidate(&water, &open, &water_rules()));
    }

    #[test]
    fn way_without_a_matching_rule_stays_a_line() {
        let ring = square(0.0, 0.0, 1.0);
        let footway = tags(&[("highway", "footway")]);
        assert!(!is_closed_polygon_candidate(&footway, &ring, &water_rules()));
    }

    #[test]
    fn first_matching_rule_in_table_order_wins() {
        let ring = square(0.0, 0.0, 1.0);
        let pier = tags(&[("man_made", "pier")]);
        let whitelist = PolygonRule::whitelist("man_made", &["bridge"]);
        let blacklist = PolygonRule::blacklist("man_made", &["cutline"]);

        let whitelist_first = vec![whitelist.clone(), blacklist.clone()];
        let blacklist_first = vec![blacklist, whitelist];
        assert!(!is_closed_polygon_candidate(&pier, &ring, &whitelist_first));
        assert!(is_closed_polygon_candidate(&pier, &ring, &blacklist_first));
    }

    #[test]
    fn blacklisted_value_stays_a_line() {
        let ring = square(0.0, 0.0, 1.0);
        let rules = vec![PolygonRule::blacklist("natural", &["coastline", "ridge"])];
        assert!(!is_closed_polygon_candidate(&tags(&[("natural", "ridge")]), &ring, &rules));
        assert!(is_closed_polygon_candidate(&tags(&[("natural", "wood")]), &ring, &rules));
    }

    #[test]
    fn point_feature_reduces_way_to_centroid() {
        let (geometry, warnings) = way_geometry(
            &tags(&[("building", "yes")]),
            square(0.0, 0.0, 2.0),
            GeometryKind::Point,
            &[PolygonRule::all("building")],
        );
        assert!(warnings.is_empty());
        let Geometry::Point(centroid) = geometry else {
            panic!("expected a Point, got {:?}", geometry);
        };
        assert!((centroid.x() - 1.0).abs() < 1e-9);
        assert!((centroid.y() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn way_line_reports_missing_nodes() {
        let mut resolved = ResolvedElements::default();
        resolved.insert_node(&Node { id: 1, lon: 0.0, lat: 0.0, tags: Tags::new() });
        let way = Way { id: 5, nodes: vec![1, 2], tags: Tags::new() };

        let (line, warnings) = way_line(&way, &resolved);
        assert_eq!(line.0.len(), 1);
        assert_eq!(
            warnings,
            vec![TopologyWarning::MissingNode(2), TopologyWarning::DegenerateWay(5)]
        );
    }

    #[test]
    fn merge_joins_lines_sharing_endpoints() {
        let a = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)];
        let b = line_string![(x: 2.0, y: 0.0), (x: 1.0, y: 0.0)];
        let c = line_string![(x: 2.0, y: 0.0), (x: 3.0, y: 1.0)];
        let merged = merge_lines(vec![b, a, c]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].0.len(), 4);
        let ends = [merged[0].0[0], merged[0].0[3]];
        assert!(ends.contains(&Coord { x: 0.0, y: 0.0 }));
        assert!(ends.contains(&Coord { x: 3.0, y: 1.0 }));
    }

    #[test]
    fn merge_stops_at_junctions() {
        let trunk = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)];
        let left = line_string![(x: 1.0, y: 0.0), (x: 2.0, y: 1.0)];
        let right = line_string![(x: 1.0, y: 0.0), (x: 2.0, y: -1.0)];
        assert_eq!(merge_lines(vec![trunk, left, right]).len(), 3);
    }

    #[test]
    fn disjoint_way_members_give_a_multi_line_string() {
        let mut resolved = ResolvedElements::default();
        resolved.insert_way(1, line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]);
        resolved.insert_way(2, line_string![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0)]);
        resolved.insert_way(3, line_string![(x: 5.0, y: 5.0), (x: 6.0, y: 5.0)]);

        let bus_route = relation(vec![
            member(MemberKind::Way, 1, "forward"),
            member(MemberKind::Way, 2, ""),
            member(MemberKind::Way, 3, "backward"),
            member(MemberKind::Node, 9, "stop"),
        ]);
        let (geometry, warnings) = relation_lines(&bus_route, &resolved);
        match geometry {
            Geometry::MultiLineString(lines) => assert_eq!(lines.0.len(), 2),
            other => panic!("expected a MultiLineString, got {:?}", other),
        }
        assert_eq!(
            warnings,
            vec![TopologyWarning::IgnoredMembers { kind: MemberKind::Node, count: 1 }]
        );
    }

    #[test]
    fn connected_way_members_give_a_single_line_string() {
        let mut resolved = ResolvedElements::default();
        resolved.insert_way(1, line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)]);
        resolved.insert_way(2, line_string![(x: 2.0, y: 0.0), (x: 1.0, y: 0.0)]);

        let route = relation(vec![
            member(MemberKind::Way, 1, ""),
            member(MemberKind::Way, 2, ""),
        ]);
        let (geometry, warnings) = relation_lines(&route, &resolved);
        assert!(warnings.is_empty());
        let Geometry::LineString(line) = geometry else {
            panic!("expected a LineString, got {:?}", geometry);
        };
        assert_eq!(line.0.len(), 3);
        assert_eq!(line.0[1], Coord { x: 1.0, y: 0.0 });
    }

    #[test]
    fn relation_points_keep_member_order_and_duplicates() {
        let mut resolved = ResolvedElements::default();
        for (id, lon) in [(1, 1.0), (2, 2.0)] {
            resolved.insert_node(&Node { id, lon, lat: 0.0, tags: Tags::new() });
        }
        let stop_area = relation(vec![
            member(MemberKind::Node, 2, "stop"),
            member(MemberKind::Node, 1, "platform"),
            member(MemberKind::Node, 2, "stop"),
        ]);
        let (points, warnings) = relation_points(&stop_area, &resolved);
        assert!(warnings.is_empty());
        let xs: Vec<f64> = points.0.iter().map(|point| point.x()).collect();
        assert_eq!(xs, vec![2.0, 1.0, 2.0]);
    }

    #[test]
    fn rings_are_assembled_from_split_members() {
        let mut warnings = Vec::new();
        let top = line_string![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0)];
        let bottom = line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 4.0), (x: 4.0, y: 4.0)];
        let stray = line_string![(x: 9.0, y: 9.0), (x: 10.0, y: 9.0)];

        let rings = assemble_rings(vec![top, bottom, stray], RingRole::Outer, &mut warnings);
        assert_eq!(rings.len(), 1);
        assert_eq!(Polygon::new(rings[0].clone(), vec![]).unsigned_area(), 16.0);
        assert_eq!(warnings, vec![TopologyWarning::UnclosedRing(RingRole::Outer)]);
    }

    fn resolved_rings(rings: &[(OsmId, LineString)]) -> ResolvedElements {
        let mut resolved = ResolvedElements::default();
        for (id, ring) in rings {
            resolved.insert_way(*id, ring.clone());
        }
        resolved
    }

    #[test]
    fn inner_ring_becomes_a_hole() {
        let resolved =
            resolved_rings(&[(1, square(0.0, 0.0, 10.0)), (2, square(2.0, 2.0, 2.0))]);
        let with_hole = relation(vec![
            member(MemberKind::Way, 1, "outer"),
            member(MemberKind::Way, 2, "inner"),
        ]);
        let (polygons, warnings) =
            relation_polygons(&with_hole, &resolved, InnerRingPolicy::SubtractAll);
        assert!(warnings.is_empty());
        assert_eq!(polygons.0.len(), 1);
        assert_eq!(polygons.0[0].interiors().len(), 1);
        assert!((polygons.unsigned_area() - 96.0).abs() < 1e-9);

        let without_hole = relation(vec![member(MemberKind::Way, 1, "outer")]);
        let (polygons, _) =
            relation_polygons(&without_hole, &resolved, InnerRingPolicy::SubtractAll);
        assert_eq!(polygons.0.len(), 1);
        assert!(polygons.0[0].interiors().is_empty());
        assert_eq!(polygons.0[0].exterior(), &square(0.0, 0.0, 10.0));
    }

    #[test]
    fn solo_rings_join_the_outer_polygons() {
        let resolved =
            resolved_rings(&[(1, square(0.0, 0.0, 1.0)), (2, square(5.0, 5.0, 1.0))]);
        let building = relation(vec![
            member(MemberKind::Way, 1, ""),
            member(MemberKind::Way, 2, "outer"),
        ]);
        let (polygons, _) = relation_polygons(&building, &resolved, InnerRingPolicy::SubtractAll);
        assert_eq!(polygons.0.len(), 2);
    }

    #[test]
    fn inner_rings_without_outer_rings_give_nothing() {
        let resolved = resolved_rings(&[(2, square(2.0, 2.0, 2.0))]);
        let orphan = relation(vec![member(MemberKind::Way, 2, "inner")]);
        let (polygons, warnings) =
            relation_polygons(&orphan, &resolved, InnerRingPolicy::SubtractAll);
        assert!(polygons.0.is_empty());
        assert_eq!(warnings, vec![TopologyWarning::EmptyGeometry]);
    }

    #[test]
    fn missing_way_members_are_reported() {
        let resolved = resolved_rings(&[(1, square(0.0, 0.0, 1.0))]);
        let partial = relation(vec![
            member(MemberKind::Way, 1, "outer"),
            member(MemberKind::Way, 404, "outer"),
        ]);
        let (polygons, warnings) =
            relation_polygons(&partial, &resolved, InnerRingPolicy::SubtractAll);
        assert_eq!(polygons.0.len(), 1);
        assert_eq!(warnings, vec![TopologyWarning::MissingWay(404)]);
    }

    fn two_outers_one_inner() -> (Relation, ResolvedElements) {
        let resolved = resolved_rings(&[
            (1, square(0.0, 0.0, 10.0)),
            (2, square(20.0, 0.0, 10.0)),
            (3, square(2.0, 2.0, 2.0)),
        ]);
        let relation = relation(vec![
            member(MemberKind::Way, 1, "outer"),
            member(MemberKind::Way, 2, "outer"),
            member(MemberKind::Way, 3, "inner"),
        ]);
        (relation, resolved)
    }

    #[test]
    fn subtract_all_policy_cuts_every_inner_from_every_outer() {
        let (relation, resolved) = two_outers_one_inner();
        let (polygons, _) = relation_polygons(&relation, &resolved, InnerRingPolicy::SubtractAll);
        assert_eq!(polygons.0.len(), 2);
        // The inner ring lies outside the second outer, so cutting it there is a no-op.
        assert!((polygons.unsigned_area() - 196.0).abs() < 1e-9);
    }

    #[test]
    fn containing_outer_policy_leaves_unrelated_outers_untouched() {
        let (relation, resolved) = two_outers_one_inner();
        let (polygons, _) =
            relation_polygons(&relation, &resolved, InnerRingPolicy::ContainingOuter);
        assert_eq!(polygons.0.len(), 2);
        let holes: Vec<usize> =
            polygons.0.iter().map(|polygon| polygon.interiors().len()).collect();
        assert_eq!(holes, vec![1, 0]);
        assert_eq!(polygons.0[1].exterior(), &square(20.0, 0.0, 10.0));
    }
}
