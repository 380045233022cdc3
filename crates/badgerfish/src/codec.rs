//! Content-type codec registry.
//!
//! A [`CodecRegistry`] is an explicit value: build it once, register codecs
//! on it, and pass it to whatever needs lookup. There is no global registry.
//!
//! ```rust
//! use helios_badgerfish::{BadgerFishConfig, CodecRegistry};
//!
//! let registry = CodecRegistry::with_defaults(BadgerFishConfig::default());
//! let xml = registry.lookup("application/atom+xml; charset=utf-8").unwrap();
//! let tree = xml.decode(b"<feed><title>t</title></feed>").unwrap();
//! let json = registry.lookup("json").unwrap();
//! assert_eq!(json.encode(&tree).unwrap(), br#"{"feed":{"title":{"$":"t"}}}"#);
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::config::BadgerFishConfig;
use crate::error::Result;
use crate::tree::TreeValue;

/// Converts between bytes of one format and a tree.
pub trait Codec: Send + Sync {
    /// Short alias, for example `xml`.
    fn name(&self) -> &str;

    /// Media types handled by this codec, lowercase.
    fn media_types(&self) -> &[&'static str];

    fn decode(&self, input: &[u8]) -> Result<TreeValue>;

    fn encode(&self, tree: &TreeValue) -> Result<Vec<u8>>;

    /// Checks a normalized (lowercase, parameter-free) media type.
    fn matches(&self, media_type: &str) -> bool {
        media_type == self.name() || self.media_types().iter().any(|known| *known == media_type)
    }
}

/// BadgerFish XML codec.
#[derive(Debug, Clone, Default)]
pub struct XmlCodec {
    config: BadgerFishConfig,
}

impl XmlCodec {
    pub fn new(config: BadgerFishConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BadgerFishConfig {
        &self.config
    }
}

impl Codec for XmlCodec {
    fn name(&self) -> &str {
        "xml"
    }

    fn media_types(&self) -> &[&'static str] {
        &["application/xml", "text/xml"]
    }

    fn decode(&self, input: &[u8]) -> Result<TreeValue> {
        crate::decode_slice(input, &self.config)
    }

    fn encode(&self, tree: &TreeValue) -> Result<Vec<u8>> {
        crate::encode_vec(tree, &self.config)
    }

    fn matches(&self, media_type: &str) -> bool {
        media_type == self.name()
            || self.media_types().iter().any(|known| *known == media_type)
            || media_type.ends_with("+xml")
    }
}

/// Plain JSON codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl Codec for JsonCodec {
    fn name(&self) -> &str {
        "json"
    }

    fn media_types(&self) -> &[&'static str] {
        &["application/json", "text/json"]
    }

    fn decode(&self, input: &[u8]) -> Result<TreeValue> {
        crate::json::from_json_slice(input)
    }

    fn encode(&self, tree: &TreeValue) -> Result<Vec<u8>> {
        crate::json::to_json_vec(tree, self.pretty)
    }

    fn matches(&self, media_type: &str) -> bool {
        media_type == self.name()
            || self.media_types().iter().any(|known| *known == media_type)
            || media_type.ends_with("+json")
    }
}

/// Ordered set of codecs; later registrations take precedence.
#[derive(Clone, Default)]
pub struct CodecRegistry {
    codecs: Vec<Arc<dyn Codec>>,
}

impl CodecRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the XML and compact JSON codecs.
    pub fn with_defaults(config: BadgerFishConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(XmlCodec::new(config)));
        registry.register(Arc::new(JsonCodec::default()));
        registry
    }

    pub fn register(&mut self, codec: Arc<dyn Codec>) {
        debug!(codec = codec.name(), "Registered codec");
        self.codecs.push(codec);
    }

    /// Finds the codec for a content type or alias.
    ///
    /// Parameters after `;` are ignored and matching is case-insensitive.
    pub fn lookup(&self, content_type: &str) -> Option<Arc<dyn Codec>> {
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.codecs
            .iter()
            .rev()
            .find(|codec| codec.matches(&media_type))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.codecs.iter().map(|codec| codec.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_media_type_and_alias() {
        let registry = CodecRegistry::with_defaults(BadgerFishConfig::default());
        assert_eq!(registry.lookup("application/xml").unwrap().name(), "xml");
        assert_eq!(registry.lookup("TEXT/XML").unwrap().name(), "xml");
        assert_eq!(registry.lookup("application/fhir+xml; fhirVersion=4.0").unwrap().name(), "xml");
        assert_eq!(registry.lookup("json").unwrap().name(), "json");
        assert_eq!(registry.lookup("application/ld+json").unwrap().name(), "json");
        assert!(registry.lookup("text/csv").is_none());
    }

    #[test]
    fn test_empty_registry() {
        let registry = CodecRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.lookup("xml").is_none());
    }

    #[test]
    fn test_later_registration_wins() {
        let mut registry = CodecRegistry::with_defaults(BadgerFishConfig::default());
        registry.register(Arc::new(JsonCodec::new(true)));
        assert_eq!(registry.len(), 3);
        let tree = serde_json::json!({"a": 1});
        let encoded = registry.lookup("json").unwrap().encode(&tree).unwrap();
        assert_eq!(String::from_utf8(encoded).unwrap(), "{\n  \"a\": 1\n}");
    }
}
