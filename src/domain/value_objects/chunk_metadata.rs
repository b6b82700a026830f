use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const FILENAME_KEY: &str = "filename";
pub const SOURCE_KEY: &str = "source";
pub const SEQUENCE_INDEX_KEY: &str = "sequence_index";
pub const PAGE_NUMBER_KEY: &str = "page_number";
pub const MIME_TYPE_KEY: &str = "mime_type";

/// String-to-string metadata carried by a chunk into the vector index.
///
/// Ordered so serialized payloads are byte-stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkMetadata {
    properties: BTreeMap<String, String>,
}

impl ChunkMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn filename(&self) -> Option<&str> {
        self.get(FILENAME_KEY)
    }

    pub fn source(&self) -> Option<&str> {
        self.get(SOURCE_KEY)
    }

    pub fn page_number(&self) -> Option<u32> {
        self.get(PAGE_NUMBER_KEY).and_then(|v| v.parse().ok())
    }
}

impl From<BTreeMap<String, String>> for ChunkMetadata {
    fn from(properties: BTreeMap<String, String>) -> Self {
        Self { properties }
    }
}
