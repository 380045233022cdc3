//! # Helios BadgerFish
//!
//! Streaming conversion between XML documents and JSON-like trees using the
//! BadgerFish convention.
//!
//! ## Convention
//!
//! | XML | Tree |
//! |-----|------|
//! | `<a/>` | `{"a": {}}` |
//! | `<a>text</a>` | `{"a": {"$": "text"}}` |
//! | `<a><![CDATA[x]]></a>` | `{"a": {"#": "x"}}` |
//! | `<a id="1"/>` | `{"a": {"@id": "1"}}` |
//! | `<a><b/><b/></a>` | `{"a": {"b": [{}, {}]}}` |
//! | `<p:a xmlns:p="urn:p"/>` | `{"p:a": {"@xmlns": {"p": "urn:p"}}}` |
//!
//! Every key character is configurable through [`BadgerFishConfig`].
//!
//! ## Architecture
//!
//! Neither direction builds an intermediate document. Each conversion pairs
//! a tree adapter with a quick-xml adapter and drives them with [`pipe()`]:
//!
//! - **Decode**: [`XmlTextReader`] → [`pipe()`] → [`TreeWriter`]
//! - **Encode**: [`TreeReader`] → [`pipe()`] → [`XmlTextWriter`]
//!
//! The adapters meet at the [`XmlStreamReader`] and [`XmlStreamWriter`]
//! traits, so any other XML library can take the place of quick-xml.
//!
//! ## Examples
//!
//! ```rust
//! use helios_badgerfish::{BadgerFishConfig, decode, encode};
//! use serde_json::json;
//!
//! let config = BadgerFishConfig::default();
//! let tree = json!({"root": {"@id": "1", "child": [{"$": "a"}, {"$": "b"}]}});
//!
//! let xml = encode(&tree, &config).unwrap();
//! assert!(xml.contains(r#"<root id="1"><child>a</child><child>b</child></root>"#));
//! assert_eq!(decode(&xml, &config).unwrap(), tree);
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod json;
pub mod namespace;
mod pipe;
pub mod stream;
pub mod tree;
pub mod xml;

use std::io::{BufRead, Write};

use tracing::debug;

pub use codec::{Codec, CodecRegistry, JsonCodec, XmlCodec};
pub use config::{BadgerFishConfig, BadgerFishConfigBuilder, KeyRole, NullPolicy};
pub use error::{BadgerFishError, Result};
pub use namespace::{NamespaceContext, NamespaceScope, PrefixResolver};
pub use pipe::pipe;
pub use stream::{QName, XmlEvent, XmlStreamReader, XmlStreamWriter};
pub use tree::{TreeReader, TreeValue, TreeWriter};
pub use xml::{XmlTextReader, XmlTextWriter};

/// Decodes an XML string into a tree.
pub fn decode(xml: &str, config: &BadgerFishConfig) -> Result<TreeValue> {
    decode_reader(xml.as_bytes(), config)
}

/// Decodes XML bytes into a tree.
pub fn decode_slice(xml: &[u8], config: &BadgerFishConfig) -> Result<TreeValue> {
    decode_reader(xml, config)
}

/// Decodes XML from a buffered reader into a tree.
pub fn decode_reader<R: BufRead>(input: R, config: &BadgerFishConfig) -> Result<TreeValue> {
    config.validate()?;
    debug!("Decoding XML to tree");

    let mut reader = XmlTextReader::new(input)?;
    let mut writer = TreeWriter::new(config);
    pipe(&mut reader, &mut writer)?;
    let tree = writer.finish()?;

    debug!(version = ?reader.version(), "Decoded XML document");
    Ok(tree)
}

/// Encodes a tree as an XML string.
pub fn encode(tree: &TreeValue, config: &BadgerFishConfig) -> Result<String> {
    let bytes = encode_vec(tree, config)?;
    String::from_utf8(bytes)
        .map_err(|e| BadgerFishError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Encodes a tree as XML bytes.
pub fn encode_vec(tree: &TreeValue, config: &BadgerFishConfig) -> Result<Vec<u8>> {
    encode_writer(tree, config, Vec::new())
}

/// Encodes a tree into `output`, returning it once the document is complete.
pub fn encode_writer<W: Write>(tree: &TreeValue, config: &BadgerFishConfig, output: W) -> Result<W> {
    config.validate()?;
    debug!(root = ?config.root_element, "Encoding tree to XML");

    let mut reader = TreeReader::new(tree, config);
    let mut writer = XmlTextWriter::new(output, config);
    pipe(&mut reader, &mut writer)?;

    debug!("Encoded XML document");
    Ok(writer.into_inner())
}
