//! Attribute equality filters.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::models::AttrValue;
use crate::store::FeatureCollection;

/// Conjunction of `attribute == value` tests
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct AttributeFilter(BTreeMap<String, AttrValue>);

impl AttributeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality test
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolve keys against a collection's columns.
    ///
    /// Keys the collection does not have are dropped for that collection.
    pub fn bind<'a>(&'a self, collection: &'a FeatureCollection) -> BoundFilter<'a> {
        let tests = self
            .0
            .iter()
            .filter_map(|(key, expected)| {
                collection
                    .column_index(key)
                    .map(|column| (column, expected))
            })
            .collect();
        BoundFilter { collection, tests }
    }
}

/// A filter resolved to column positions of one collection
pub struct BoundFilter<'a> {
    collection: &'a FeatureCollection,
    tests: Vec<(usize, &'a AttrValue)>,
}

impl BoundFilter<'_> {
    /// True when every test passes for `row`
    pub fn accepts(&self, row: usize) -> bool {
        self.tests
            .iter()
            .all(|(column, expected)| self.collection.value(row, *column).matches(expected))
    }
}
