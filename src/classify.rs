use std::collections::{BTreeMap, BTreeSet};

use crate::{
    config::{Config, FeatureSchema, ReverseTagIndex},
    data::osm::Element,
};

/// Features that could claim `element`: the union of the reverse index entries of
/// every tag key it carries.
pub fn matching_features<'c>(element: &Element, index: &'c ReverseTagIndex) -> BTreeSet<&'c str> {
    element
        .tags()
        .keys()
        .filter_map(|key| index.features_for(key))
        .flatten()
        .map(String::as_str)
        .collect()
}

/// True when at least one of the feature's input keys is on the element with one of the
/// allowed values.
pub fn is_relevant(element: &Element, schema: &FeatureSchema) -> bool {
    schema.input_tags.iter().any(|(key, allowed)| {
        element
            .tag(key)
            .is_some_and(|value| allowed.iter().any(|candidate| candidate == value))
    })
}

/// The element's tags that the feature keeps as attributes.
pub fn output_attributes(element: &Element, schema: &FeatureSchema) -> BTreeMap<String, String> {
    element
        .tags()
        .iter()
        .filter(|(key, _)| schema.output_tags.contains(*key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

pub struct FeatureClassifier<'a> {
    config: &'a Config,
}

impl<'a> FeatureClassifier<'a> {
    pub fn new(config: &'a Config) -> Self {
        FeatureClassifier { config }
    }

    /// Features the element both matches and is relevant for, with their schemas.
    pub fn classify(&self, element: &Element) -> Vec<(&'a str, &'a FeatureSchema)> {
        matching_features(element, self.config.reverse_index())
            .into_iter()
            .filter_map(|name| {
                self.config
                    .feature(name)
                    .filter(|schema| is_relevant(element, schema))
                    .map(|schema| (name, schema))
            })
            .collect()
    }
}
