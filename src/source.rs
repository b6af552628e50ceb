pub mod osm_xml;
pub mod overpass;

use std::path::{Path, PathBuf};

use crate::{data::OsmData, errors::Result};

pub use self::osm_xml::OsmXmlSource;
pub use self::overpass::OverpassJsonSource;

/// Whatever delivers the raw OSM elements of one run.
pub trait ElementSource {
    fn source_name(&self) -> String;
    fn fetch(&mut self) -> Result<OsmData>;
}

impl<S: ElementSource + ?Sized> ElementSource for Box<S> {
    fn source_name(&self) -> String {
        (**self).source_name()
    }

    fn fetch(&mut self) -> Result<OsmData> {
        (**self).fetch()
    }
}

/// Picks a source from the file name: `.json` is read as an Overpass response, anything
/// else as OSM XML (`.xz` compressed or not).
pub fn source_for_path(path: &Path) -> Box<dyn ElementSource> {
    let path = PathBuf::from(path);
    if path.extension().is_some_and(|extension| extension == "json") {
        Box::new(OverpassJsonSource::new(path))
    } else {
        Box::new(OsmXmlSource::new(path))
    }
}

/// Elements already in memory, e.g. handed over by a caller that did its own fetching.
pub struct InMemorySource {
    data: Option<OsmData>,
}

impl InMemorySource {
    pub fn new(data: OsmData) -> Self {
        InMemorySource { data: Some(data) }
    }
}

impl ElementSource for InMemorySource {
    fn source_name(&self) -> String {
        "in_memory".to_string()
    }

    fn fetch(&mut self) -> Result<OsmData> {
        self.data.take().ok_or_else(|| "In-memory elements were already fetched".into())
    }
}
