use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use osm_layers::config::Config;
use osm_layers::errors::{Context, Result};
use osm_layers::etl::parse_osm::ParseOsmEtl;
use osm_layers::etl::Etl;
use osm_layers::geometry::InnerRingPolicy;
use osm_layers::sink::SummarySink;
use osm_layers::source::source_for_path;

const DEFAULT_RUN_CONFIG: &str = "config/run.json";

#[derive(Deserialize)]
pub struct RunConfig {
    pub data_path: PathBuf,
    pub config_dir: PathBuf,
    #[serde(default)]
    pub buffered_feature: Option<String>,
    #[serde(default)]
    pub inner_ring_policy: InnerRingPolicy,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn load_run_config(path: &Path) -> Result<RunConfig> {
    let file = File::open(path)
        .context(format!("Could not open run config {}", path.display()))?;
    let config = serde_json::from_reader(BufReader::new(file))
        .context(format!("Could not parse run config {}", path.display()))?;
    Ok(config)
}

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn main() -> Result<()> {
    let run_config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RUN_CONFIG));
    let run_config = load_run_config(&run_config_path)?;
    setup_logging(&run_config.log_level);

    let config = Config::load(&run_config.config_dir)?;
    info!(
        features = config.features().len(),
        indexed_keys = config.reverse_index().keys().count(),
        polygon_rules = config.polygon_rules().len();
        "Configuration loaded"
    );

    let source = source_for_path(&run_config.data_path);
    let mut etl = ParseOsmEtl::new(&config, source, SummarySink)
        .with_inner_ring_policy(run_config.inner_ring_policy);
    if let Some(feature) = &run_config.buffered_feature {
        etl = etl.with_buffered_feature(feature);
    }
    etl.process()?;

    Ok(())
}
