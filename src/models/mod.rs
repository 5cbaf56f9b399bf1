//! Core data models for the analysis engine.

pub mod feature;
pub mod value;

pub use feature::{
    DatasetKind, Feature, FeatureCollectionExport, GeoBounds, GeoPoint, MatchSet, Properties,
};
pub use value::{AttrValue, ValueKey};
