use log::{info, warn};

use crate::buffer::{buffer_layer, DEFAULT_QUARTER_SEGMENTS};
use crate::config::Config;
use crate::data::layer::LayerSet;
use crate::data::OsmData;
use crate::errors::Result;
use crate::etl::Etl;
use crate::geometry::InnerRingPolicy;
use crate::layers::{LayerAssembler, ParseReport};
use crate::projection::{reproject, Equirectangular, Projection};
use crate::sink::LayerSink;
use crate::source::ElementSource;

const ETL_NAME: &str = "parse_osm";

pub struct Output {
    layers: LayerSet,
    report: ParseReport,
}

/// Reads OSM elements from a source, sorts them into the configured layers, optionally
/// buffers one of them, and hands the result to a sink.
pub struct ParseOsmEtl<'a, S: ElementSource, K: LayerSink> {
    config: &'a Config,
    source: S,
    sink: K,
    inner_ring_policy: InnerRingPolicy,
    buffered_feature: Option<String>,
}

impl<'a, S: ElementSource, K: LayerSink> ParseOsmEtl<'a, S, K> {
    pub fn new(config: &'a Config, source: S, sink: K) -> Self {
        ParseOsmEtl {
            config,
            source,
            sink,
            inner_ring_policy: InnerRingPolicy::default(),
            buffered_feature: None,
        }
    }

    pub fn with_inner_ring_policy(mut self, policy: InnerRingPolicy) -> Self {
        self.inner_ring_policy = policy;
        self
    }

    /// Replaces the layer of `feature` by its buffered version, dilated in metres.
    pub fn with_buffered_feature(mut self, feature: &str) -> Self {
        self.buffered_feature = Some(feature.to_string());
        self
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    fn buffer(&self, layers: &mut LayerSet, feature: &str) {
        let Some(scheme) = self.config.buffer_scheme(feature) else {
            warn!(feature = feature; "No buffer settings for feature, skipping buffering");
            return;
        };
        let Some(layer) = layers.get_mut(feature) else {
            warn!(feature = feature; "Buffered feature is not configured");
            return;
        };
        let Some(extent) = layer.extent() else {
            info!(feature = feature; "Nothing to buffer");
            return;
        };

        let projection = Equirectangular::centered_on(extent);
        let planar = reproject(layer, |coord| projection.project(coord));
        let buffered = buffer_layer(&planar, scheme, DEFAULT_QUARTER_SEGMENTS);
        *layer = reproject(&buffered, |coord| projection.unproject(coord));
    }
}

impl<S: ElementSource, K: LayerSink> Etl for ParseOsmEtl<'_, S, K> {
    type Input = OsmData;
    type Output = Output;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn extract(&mut self) -> Result<OsmData> {
        let source_name = self.source.source_name();
        info!(etl_name = ETL_NAME, source = source_name.as_str(); "Fetching elements");
        let data = self.source.fetch()?;
        info!(etl_name = ETL_NAME, elements = data.len(); "Elements fetched");
        Ok(data)
    }

    fn transform(&mut self, input: OsmData) -> Result<Output> {
        let assembler =
            LayerAssembler::new(self.config).with_inner_ring_policy(self.inner_ring_policy);
        let (mut layers, report) = assembler.parse(&input);
        if let Some(feature) = &self.buffered_feature {
            self.buffer(&mut layers, feature);
        }
        Ok(Output { layers, report })
    }

    fn load(&mut self, output: Output) -> Result<()> {
        self.sink.accept(output.layers, &output.report)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use geo::{Area, Geometry};

    use crate::config::{FeatureSchema, PolygonRule};
    use crate::data::layer::GeometryKind;
    use crate::data::osm::{Node, Tags, Way};
    use crate::sink::MemorySink;
    use crate::source::InMemorySource;

    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn grey_areas_config() -> Config {
        let features = BTreeMap::from([(
            "voidGreyAreas".to_string(),
            FeatureSchema {
                input_tags: BTreeMap::from([("landuse".to_string(), vec!["grass".to_string()])]),
                output_tags: vec!["landuse".to_string()],
                output_geom: GeometryKind::Polygon,
            },
        )]);
        let scheme = BTreeMap::from([(
            "landuse".to_string(),
            BTreeMap::from([("grass".to_string(), 10.0)]),
        )]);
        Config::new(
            features,
            vec![PolygonRule::all("landuse")],
            BTreeMap::from([("voidGreyAreas".to_string(), scheme)]),
        )
    }

    // A square of grass roughly 100 m on a side near Milan.
    fn grass() -> OsmData {
        let corners = [(9.19, 45.46), (9.1913, 45.46), (9.1913, 45.4609), (9.19, 45.4609)];
        let nodes = corners
            .iter()
            .enumerate()
            .map(|(idx, (lon, lat))| Node {
                id: idx as i64 + 1,
                lon: *lon,
                lat: *lat,
                tags: Tags::new(),
            })
            .collect();
        OsmData {
            nodes,
            ways: vec![Way {
                id: 100,
                nodes: vec![1, 2, 3, 4, 1],
                tags: tags(&[("landuse", "grass")]),
            }],
            relations: vec![],
        }
    }

    #[test]
    fn parses_into_the_sink() {
        let config = grey_areas_config();
        let mut etl = ParseOsmEtl::new(&config, InMemorySource::new(grass()), MemorySink::new());
        etl.process().unwrap();

        let sink = etl.into_sink();
        assert_eq!(sink.report().ways.accepted, 1);
        let layer = &sink.layers()["voidGreyAreas"];
        assert_eq!(layer.len(), 1);
        assert!(matches!(layer.records()[0].geometry, Geometry::Polygon(_)));
    }

    #[test]
    fn buffered_feature_grows_in_geographic_coordinates() {
        let config = grey_areas_config();
        let mut plain = ParseOsmEtl::new(&config, InMemorySource::new(grass()), MemorySink::new());
        plain.process().unwrap();
        let mut buffered =
            ParseOsmEtl::new(&config, InMemorySource::new(grass()), MemorySink::new())
                .with_buffered_feature("voidGreyAreas");
        buffered.process().unwrap();

        let plain_layers = plain.into_sink().into_layers();
        let buffered_layers = buffered.into_sink().into_layers();
        let before = &plain_layers["voidGreyAreas"];
        let after = &buffered_layers["voidGreyAreas"];
        assert_eq!(after.len(), 1);
        assert_eq!(after.kind(), GeometryKind::Polygon);

        let before_area = before.records()[0].geometry.unsigned_area();
        let after_area = after.records()[0].geometry.unsigned_area();
        assert!(after_area > before_area);
        // Still in degrees: a 10 m buffer cannot double a 100 m square.
        assert!(after_area < before_area * 2.0);
        let before_extent = before.extent().unwrap();
        let after_extent = after.extent().unwrap();
        assert!(after_extent.min().x < before_extent.min().x);
        assert!(after_extent.max().y > before_extent.max().y);
    }

    #[test]
    fn failing_source_fails_the_process() {
        let config = grey_areas_config();
        let mut source = InMemorySource::new(OsmData::default());
        source.fetch().unwrap();
        let mut etl = ParseOsmEtl::new(&config, source, MemorySink::new());
        assert!(etl.process().is_err());
    }
}
