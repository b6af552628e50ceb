//! Sorts OpenStreetMap elements into typed, feature-specific vector layers.
//!
//! A run reads nodes, ways and relations from an [`source::ElementSource`], matches them
//! against the configured feature schemas, resolves their geometry and appends them to
//! one [`data::layer::Layer`] per feature. Layers can then be buffered and handed to a
//! [`sink::LayerSink`].

pub mod buffer;
pub mod classify;
pub mod config;
pub mod data;
pub mod errors;
pub mod etl;
pub mod geometry;
pub mod layers;
pub mod projection;
pub mod sink;
pub mod source;
