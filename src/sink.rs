use log::info;

use crate::{data::layer::LayerSet, errors::Result, layers::ParseReport};

/// Receives the finished layer set of a run.
pub trait LayerSink {
    fn accept(&mut self, layers: LayerSet, report: &ParseReport) -> Result<()>;
}

/// Keeps the layers around for the caller.
#[derive(Debug, Default)]
pub struct MemorySink {
    layers: LayerSet,
    report: ParseReport,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    pub fn report(&self) -> &ParseReport {
        &self.report
    }

    pub fn into_layers(self) -> LayerSet {
        self.layers
    }
}

impl LayerSink for MemorySink {
    fn accept(&mut self, layers: LayerSet, report: &ParseReport) -> Result<()> {
        self.layers = layers;
        self.report = *report;
        Ok(())
    }
}

/// Logs one line per layer and one for the run, then drops the data.
#[derive(Debug, Default)]
pub struct SummarySink;

impl LayerSink for SummarySink {
    fn accept(&mut self, layers: LayerSet, report: &ParseReport) -> Result<()> {
        for layer in layers.values() {
            info!(
                feature = layer.feature(),
                group = layer.group(),
                name = layer.name(),
                records = layer.len();
                "Layer {} has {} records", layer.kind(), layer.len()
            );
        }
        info!(
            nodes = report.nodes.processed,
            ways = report.ways.processed,
            relations = report.relations.processed,
            accepted = report.accepted(),
            rejected = report.rejected(),
            warnings = report.warnings;
            "Run summary"
        );
        Ok(())
    }
}
