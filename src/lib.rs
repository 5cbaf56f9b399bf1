//! geoimob - in-memory radius analysis over parcel and property datasets
//!
//! This library provides the feature store, query engine and HTTP router used
//! by the server binary.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod models;
pub mod store;

pub use engine::SpatialEngine;
pub use models::{AttrValue, DatasetKind, Feature, GeoBounds, GeoPoint, MatchSet};
