//! Planar dilation of a layer's geometries by radii looked up from a buffer scheme.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use geo::orient::Direction;
use geo::{
    unary_union, BoundingRect, Coord, Geometry, LineString, MapCoords, MultiPolygon, Orient,
    Polygon,
};
use log::{info, warn};

use crate::{
    config::BufferScheme,
    data::{
        layer::{GeometryKind, Layer},
        osm::OsmId,
    },
    projection::{Equirectangular, Projection},
};

/// Segments used to approximate a quarter circle.
pub const DEFAULT_QUARTER_SEGMENTS: usize = 5;

fn circle(center: Coord, radius: f64, quarter_segments: usize) -> Polygon {
    let segments = 4 * quarter_segments.max(1);
    let ring: Vec<Coord> = (0..=segments)
        .map(|step| {
            let angle = 2.0 * PI * (step % segments) as f64 / segments as f64;
            Coord {
                x: center.x + radius * angle.cos(),
                y: center.y + radius * angle.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::new(ring), Vec::new())
}

fn segment_band(start: Coord, end: Coord, radius: f64) -> Option<Polygon> {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length = dx.hypot(dy);
    if length == 0.0 {
        return None;
    }
    let offset = Coord {
        x: -dy / length * radius,
        y: dx / length * radius,
    };
    Some(Polygon::new(
        LineString::new(vec![
            start + offset,
            end + offset,
            end - offset,
            start - offset,
            start + offset,
        ]),
        Vec::new(),
    ))
}

fn collect_parts(
    geometry: &Geometry,
    areas: &mut Vec<Polygon>,
    lines: &mut Vec<LineString>,
    points: &mut Vec<Coord>,
) {
    match geometry {
        Geometry::Point(point) => points.push(point.0),
        Geometry::MultiPoint(multi) => points.extend(multi.0.iter().map(|point| point.0)),
        Geometry::Line(line) => lines.push(LineString::new(vec![line.start, line.end])),
        Geometry::LineString(line) => lines.push(line.clone()),
        Geometry::MultiLineString(multi) => lines.extend(multi.0.iter().cloned()),
        Geometry::Polygon(polygon) => areas.push(polygon.clone()),
        Geometry::MultiPolygon(multi) => areas.extend(multi.0.iter().cloned()),
        Geometry::Rect(rect) => areas.push(rect.to_polygon()),
        Geometry::Triangle(triangle) => areas.push(triangle.to_polygon()),
        Geometry::GeometryCollection(collection) => {
            for inner in collection {
                collect_parts(inner, areas, lines, points);
            }
        }
    }
}

/// Minkowski sum of `geometry` with a disc of `radius`: the union of the geometry's own
/// area, a band around every segment and a circle around every vertex. A radius of zero
/// or less keeps only the areal part.
pub fn dilate(geometry: &Geometry, radius: f64, quarter_segments: usize) -> MultiPolygon {
    let mut areas = Vec::new();
    let mut lines = Vec::new();
    let mut points = Vec::new();
    collect_parts(geometry, &mut areas, &mut lines, &mut points);

    let mut pieces = areas.clone();
    if radius > 0.0 {
        for polygon in &areas {
            lines.push(polygon.exterior().clone());
            lines.extend(polygon.interiors().iter().cloned());
        }
        for line in &lines {
            for segment in line.lines() {
                pieces.extend(segment_band(segment.start, segment.end, radius));
            }
            points.extend(line.0.iter().copied());
        }
        pieces.extend(points.iter().map(|point| circle(*point, radius, quarter_segments)));
    }
    if pieces.is_empty() {
        return MultiPolygon::new(Vec::new());
    }

    // Bands flip winding with the direction of their segment.
    let pieces: Vec<Polygon> = pieces
        .into_iter()
        .map(|piece| piece.orient(Direction::Default))
        .collect();
    unary_union(&pieces)
}

/// Runs every pass of `scheme` over one geometry, in key order. A pass dilates by the
/// radius found for the value `tags` carries under the pass key; a tag without a radius
/// is logged and skipped. Returns `None` when no pass applied.
pub fn dilate_by_scheme(
    feature: &str,
    osm_id: OsmId,
    geometry: &Geometry,
    tags: &BTreeMap<String, String>,
    scheme: &BufferScheme,
    quarter_segments: usize,
) -> Option<Geometry> {
    let mut dilated: Option<Geometry> = None;
    for (key, radii) in scheme {
        let Some(value) = tags.get(key) else {
            continue;
        };
        let Some(radius) = radii.get(value) else {
            warn!(
                feature = feature,
                osm_id = osm_id,
                key = key.as_str(),
                value = value.as_str();
                "No buffer setting recorded for value"
            );
            continue;
        };
        let current = dilated.as_ref().unwrap_or(geometry);
        dilated = Some(dilate(current, *radius, quarter_segments).into());
    }
    dilated
}

/// Dilates a lon/lat geometry by radii in metres, projecting around its own extent.
pub fn dilate_geographic(
    feature: &str,
    osm_id: OsmId,
    geometry: &Geometry,
    tags: &BTreeMap<String, String>,
    scheme: &BufferScheme,
    quarter_segments: usize,
) -> Option<Geometry> {
    let projection = Equirectangular::centered_on(geometry.bounding_rect()?);
    let planar = geometry.map_coords(|coord| projection.project(coord));
    let dilated = dilate_by_scheme(feature, osm_id, &planar, tags, scheme, quarter_segments)?;
    Some(dilated.map_coords(|coord| projection.unproject(coord)))
}

/// Buffers every record of `layer` into a new polygon layer with the same schema.
///
/// Each key of `scheme` is one pass over the records, in key order. A pass touches only
/// records carrying that attribute; when the attribute's value has no radius the record
/// is left alone by that pass. Records no pass dilated are left out of the result.
pub fn buffer_layer(layer: &Layer, scheme: &BufferScheme, quarter_segments: usize) -> Layer {
    let mut buffered = layer.derived(GeometryKind::Polygon);
    for record in layer.records() {
        let Some(geometry) = dilate_by_scheme(
            layer.feature(),
            record.osm_id,
            &record.geometry,
            &record.attributes,
            scheme,
            quarter_segments,
        ) else {
            continue;
        };
        let mut record = record.clone();
        record.geometry = geometry;
        if let Err(rejection) = buffered.append(record) {
            warn!(feature = layer.feature(); "{}", rejection);
        }
    }
    info!(
        feature = layer.feature(),
        passes = scheme.len(),
        before = layer.len(),
        after = buffered.len();
        "Buffered layer"
    );
    buffered
}
