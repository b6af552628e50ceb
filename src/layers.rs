use geo::Geometry;
use log::{debug, info};

use crate::{
    buffer::{dilate_geographic, DEFAULT_QUARTER_SEGMENTS},
    classify::{output_attributes, FeatureClassifier},
    config::Config,
    data::{
        layer::{GeometryKind, Layer, LayerSet, Record},
        osm::{Element, Way},
        OsmData,
    },
    geometry::{
        node_point, relation_geometry, way_geometry, way_line, InnerRingPolicy,
        ResolvedElements,
    },
};

/// One empty layer per configured feature, typed and with the field list from its schema.
pub fn create_layers(config: &Config) -> LayerSet {
    config
        .features()
        .iter()
        .map(|(name, schema)| {
            (
                name.clone(),
                Layer::new(name, schema.output_geom, schema.output_tags.clone()),
            )
        })
        .collect()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CategoryStats {
    pub processed: usize,
    pub accepted: usize,
    pub rejected: usize,
}

/// Run-level outcome of a parse, per element category.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseReport {
    pub nodes: CategoryStats,
    pub ways: CategoryStats,
    pub relations: CategoryStats,
    pub warnings: usize,
}

impl ParseReport {
    pub fn accepted(&self) -> usize {
        self.nodes.accepted + self.ways.accepted + self.relations.accepted
    }

    pub fn rejected(&self) -> usize {
        self.nodes.rejected + self.ways.rejected + self.relations.rejected
    }
}

pub struct LayerAssembler<'a> {
    config: &'a Config,
    classifier: FeatureClassifier<'a>,
    inner_ring_policy: InnerRingPolicy,
}

impl<'a> LayerAssembler<'a> {
    pub fn new(config: &'a Config) -> Self {
        LayerAssembler {
            config,
            classifier: FeatureClassifier::new(config),
            inner_ring_policy: InnerRingPolicy::default(),
        }
    }

    pub fn with_inner_ring_policy(mut self, policy: InnerRingPolicy) -> Self {
        self.inner_ring_policy = policy;
        self
    }

    fn append(
        layers: &mut LayerSet,
        feature: &str,
        record: Record,
        stats: &mut CategoryStats,
        warnings: &mut usize,
    ) {
        let Some(layer) = layers.get_mut(feature) else {
            return;
        };
        *warnings += record.warnings.len();
        if !record.warnings.is_empty() {
            debug!(
                feature = feature,
                osm_id = record.osm_id,
                warnings = record.warnings.len();
                "Degraded geometry"
            );
        }
        match layer.append(record) {
            Ok(()) => stats.accepted += 1,
            Err(rejection) => {
                debug!(feature = feature, osm_id = rejection.osm_id; "{}", rejection);
                stats.rejected += 1;
            }
        }
    }

    /// An open way declared for a polygon feature is widened into an area with the
    /// feature's buffer settings, radii in metres. Without a matching setting it stays a
    /// line and the layer will refuse it.
    fn widen_open_way(&self, feature: &str, way: &Way, geometry: Geometry) -> Geometry {
        if !matches!(geometry, Geometry::LineString(_)) {
            return geometry;
        }
        let Some(scheme) = self.config.buffer_scheme(feature) else {
            return geometry;
        };
        dilate_geographic(feature, way.id, &geometry, &way.tags, scheme, DEFAULT_QUARTER_SEGMENTS)
            .unwrap_or(geometry)
    }

    /// Builds the layer set for one batch of OSM data. Nodes are handled first, then
    /// ways, then relations, since each stage resolves geometry against the previous.
    pub fn parse(&self, data: &OsmData) -> (LayerSet, ParseReport) {
        let mut layers = create_layers(self.config);
        let mut report = ParseReport::default();
        let mut resolved = ResolvedElements::default();
        let rules = self.config.polygon_rules();

        info!(nodes = data.nodes.len(); "Parsing nodes");
        for node in &data.nodes {
            resolved.insert_node(node);
            report.nodes.processed += 1;

            let element = Element::from(node);
            for (feature, schema) in self.classifier.classify(&element) {
                let record = Record::new(
                    element.id(),
                    node_point(node).into(),
                    output_attributes(&element, schema),
                );
                Self::append(&mut layers, feature, record, &mut report.nodes, &mut report.warnings);
            }
        }

        info!(ways = data.ways.len(); "Parsing ways");
        for way in &data.ways {
            let (line, line_warnings) = way_line(way, &resolved);
            report.ways.processed += 1;

            let element = Element::from(way);
            for (feature, schema) in self.classifier.classify(&element) {
                let (mut geometry, mut warnings) =
                    way_geometry(&way.tags, line.clone(), schema.output_geom, rules);
                if schema.output_geom == GeometryKind::Polygon {
                    geometry = self.widen_open_way(feature, way, geometry);
                }
                warnings.extend(line_warnings.iter().cloned());
                let attributes = output_attributes(&element, schema);
                let record =
                    Record::new(element.id(), geometry, attributes).with_warnings(warnings);
                Self::append(&mut layers, feature, record, &mut report.ways, &mut report.warnings);
            }
            resolved.insert_way(way.id, line);
        }

        info!(relations = data.relations.len(); "Parsing relations");
        for relation in &data.relations {
            report.relations.processed += 1;

            let element = Element::from(relation);
            for (feature, schema) in self.classifier.classify(&element) {
                let (geometry, warnings) = relation_geometry(
                    relation,
                    schema.output_geom,
                    &resolved,
                    self.inner_ring_policy,
                );
                let attributes = output_attributes(&element, schema);
                let record =
                    Record::new(element.id(), geometry, attributes).with_warnings(warnings);
                Self::append(
                    &mut layers,
                    feature,
                    record,
                    &mut report.relations,
                    &mut report.warnings,
                );
            }
        }

        info!(
            nodes_accepted = report.nodes.accepted,
            nodes_rejected = report.nodes.rejected,
            ways_accepted = report.ways.accepted,
            ways_rejected = report.ways.rejected,
            relations_accepted = report.relations.accepted,
            relations_rejected = report.relations.rejected,
            warnings = report.warnings;
            "Parsing finished"
        );
        (layers, report)
    }
}
