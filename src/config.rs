use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::BufReader,
    path::Path,
};

use log::debug;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    data::layer::GeometryKind,
    errors::{Context, Result},
};

pub const CONFIGURATION_FILE_NAME: &str = "configuration.json";
pub const POLYGON_FEATURES_FILE_NAME: &str = "polygon-features.json";
pub const BUFFERING_SETTINGS_FILE_NAME: &str = "bufferingSettings.json";

/// What one configured feature consumes and produces.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSchema {
    pub input_tags: BTreeMap<String, Vec<String>>,
    pub output_tags: Vec<String>,
    pub output_geom: GeometryKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolygonMode {
    All,
    Whitelist,
    Blacklist,
}

/// One entry of the polygon-features table, in the format of
/// <https://github.com/tyrasd/osm-polygon-features>.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolygonRule {
    pub key: String,
    #[serde(rename = "polygon")]
    pub mode: PolygonMode,
    #[serde(default)]
    pub values: Vec<String>,
}

impl PolygonRule {
    pub fn all(key: &str) -> Self {
        PolygonRule {
            key: key.to_string(),
            mode: PolygonMode::All,
            values: Vec::new(),
        }
    }

    pub fn whitelist(key: &str, values: &[&str]) -> Self {
        PolygonRule {
            key: key.to_string(),
            mode: PolygonMode::Whitelist,
            values: values.iter().map(|value| value.to_string()).collect(),
        }
    }

    pub fn blacklist(key: &str, values: &[&str]) -> Self {
        PolygonRule {
            key: key.to_string(),
            mode: PolygonMode::Blacklist,
            values: values.iter().map(|value| value.to_string()).collect(),
        }
    }
}

/// Attribute key -> attribute value -> buffer radius.
pub type BufferScheme = BTreeMap<String, BTreeMap<String, f64>>;

/// Tag key -> names of the features whose input tags mention that key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReverseTagIndex {
    features_by_key: BTreeMap<String, BTreeSet<String>>,
}

impl ReverseTagIndex {
    pub fn build(features: &BTreeMap<String, FeatureSchema>) -> Self {
        let mut features_by_key: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (name, schema) in features {
            for key in schema.input_tags.keys() {
                features_by_key
                    .entry(key.clone())
                    .or_default()
                    .insert(name.clone());
            }
        }
        ReverseTagIndex { features_by_key }
    }

    pub fn features_for(&self, key: &str) -> Option<&BTreeSet<String>> {
        self.features_by_key.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.features_by_key.keys().map(String::as_str)
    }
}

/// Immutable configuration for a run: feature schemas, the reverse tag index built from
/// them, the polygon rule table and per-feature buffer schemes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    features: BTreeMap<String, FeatureSchema>,
    reverse_index: ReverseTagIndex,
    polygon_rules: Vec<PolygonRule>,
    buffer_settings: BTreeMap<String, BufferScheme>,
}

impl Config {
    pub fn new(
        features: BTreeMap<String, FeatureSchema>,
        polygon_rules: Vec<PolygonRule>,
        buffer_settings: BTreeMap<String, BufferScheme>,
    ) -> Self {
        let reverse_index = ReverseTagIndex::build(&features);
        Config {
            features,
            reverse_index,
            polygon_rules,
            buffer_settings,
        }
    }

    /// Picks the feature entries out of a raw `configuration.json` document. Entries
    /// without `inputTags` (crs, bbox, ...) are not features and are skipped; a feature
    /// entry missing any other field is an error.
    pub fn features_from_json(
        document: BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, FeatureSchema>> {
        let mut features = BTreeMap::new();
        for (name, entry) in document {
            let is_feature = entry
                .as_object()
                .is_some_and(|fields| fields.contains_key("inputTags"));
            if !is_feature {
                debug!(entry = name.as_str(); "Skipping non-feature configuration entry");
                continue;
            }
            let schema: FeatureSchema = serde_json::from_value(entry)
                .context(format!("Invalid feature {}", name))?;
            features.insert(name, schema);
        }
        Ok(features)
    }

    pub fn from_json_str(
        configuration: &str,
        polygon_features: &str,
        buffering_settings: &str,
    ) -> Result<Self> {
        let document: BTreeMap<String, Value> = serde_json::from_str(configuration)?;
        let features = Self::features_from_json(document)?;
        let polygon_rules: Vec<PolygonRule> = serde_json::from_str(polygon_features)?;
        let buffer_settings: BTreeMap<String, BufferScheme> =
            serde_json::from_str(buffering_settings)?;
        Ok(Config::new(features, polygon_rules, buffer_settings))
    }

    /// Loads the three configuration files from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let document: BTreeMap<String, Value> = read_json(&dir.join(CONFIGURATION_FILE_NAME))?;
        let features = Self::features_from_json(document)?;
        let polygon_rules: Vec<PolygonRule> = read_json(&dir.join(POLYGON_FEATURES_FILE_NAME))?;
        let buffer_settings: BTreeMap<String, BufferScheme> =
            read_json(&dir.join(BUFFERING_SETTINGS_FILE_NAME))?;
        Ok(Config::new(features, polygon_rules, buffer_settings))
    }

    pub fn features(&self) -> &BTreeMap<String, FeatureSchema> {
        &self.features
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureSchema> {
        self.features.get(name)
    }

    pub fn reverse_index(&self) -> &ReverseTagIndex {
        &self.reverse_index
    }

    pub fn polygon_rules(&self) -> &[PolygonRule] {
        &self.polygon_rules
    }

    pub fn buffer_scheme(&self, feature: &str) -> Option<&BufferScheme> {
        self.buffer_settings.get(feature)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path)
        .context(format!("Could not open {}", path.display()))?;
    let value = serde_json::from_reader(BufReader::new(file))
        .context(format!("Could not parse {}", path.display()))?;
    Ok(value)
}
