use geo::{Coord, MapCoords, Rect};

use crate::data::layer::Layer;

const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Maps geographic coordinates (lon/lat degrees) to a planar system and back.
pub trait Projection {
    fn project(&self, coord: Coord) -> Coord;
    fn unproject(&self, coord: Coord) -> Coord;
}

/// Equirectangular projection in metres around a reference point. Good enough for
/// buffering within a city-sized extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equirectangular {
    origin: Coord,
    cos_lat: f64,
}

impl Equirectangular {
    pub fn new(origin: Coord) -> Self {
        Equirectangular {
            origin,
            cos_lat: origin.y.to_radians().cos(),
        }
    }

    pub fn centered_on(extent: Rect) -> Self {
        Self::new(extent.center())
    }
}

impl Projection for Equirectangular {
    fn project(&self, coord: Coord) -> Coord {
        Coord {
            x: (coord.x - self.origin.x).to_radians() * self.cos_lat * EARTH_RADIUS_M,
            y: (coord.y - self.origin.y).to_radians() * EARTH_RADIUS_M,
        }
    }

    fn unproject(&self, coord: Coord) -> Coord {
        Coord {
            x: self.origin.x + (coord.x / (EARTH_RADIUS_M * self.cos_lat)).to_degrees(),
            y: self.origin.y + (coord.y / EARTH_RADIUS_M).to_degrees(),
        }
    }
}

/// Copy of `layer` with every coordinate passed through `transform`.
pub fn reproject(layer: &Layer, transform: impl Fn(Coord) -> Coord + Copy) -> Layer {
    let mut reprojected = layer.derived(layer.kind());
    for record in layer.records() {
        let mut record = record.clone();
        record.geometry = record.geometry.map_coords(transform);
        // Same geometry family as before, so the layer cannot refuse it.
        let _ = reprojected.append(record);
    }
    reprojected
}

#[cfg(test)]
mod tests {
    use geo::{coord, point, Geometry};

    use crate::data::layer::{GeometryKind, Record};

    use super::*;

    #[test]
    fn projection_round_trips() {
        let projection = Equirectangular::new(coord! { x: 9.19, y: 45.46 });
        let milan_duomo = coord! { x: 9.1919, y: 45.4641 };
        let back = projection.unproject(projection.project(milan_duomo));
        assert!((back.x - milan_duomo.x).abs() < 1e-9);
        assert!((back.y - milan_duomo.y).abs() < 1e-9);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let projection = Equirectangular::new(coord! { x: 0.0, y: 0.0 });
        let north = projection.project(coord! { x: 0.0, y: 1.0 });
        assert!((north.y - 111_195.0).abs() < 10.0);
        assert_eq!(projection.project(coord! { x: 0.0, y: 0.0 }), coord! { x: 0.0, y: 0.0 });
    }

    #[test]
    fn reproject_moves_records_and_extent() {
        let mut layer = Layer::new("usesServices", GeometryKind::Point, vec![]);
        layer
            .append(Record::new(1, point!(x: 1.0, y: 2.0).into(), Default::default()))
            .unwrap();

        let shifted = reproject(&layer, |c| coord! { x: c.x * 10.0, y: c.y * 10.0 });
        assert_eq!(shifted.records()[0].geometry, Geometry::Point(point!(x: 10.0, y: 20.0)));
        assert_eq!(shifted.extent().unwrap().min(), coord! { x: 10.0, y: 20.0 });
        assert_eq!(shifted.feature(), "usesServices");
    }
}
