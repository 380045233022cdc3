//! Convention configuration shared by both conversion directions.
//!
//! The configuration decides how tree keys map to XML names. Both the
//! tree reader (encode) and the tree writer (decode) consult the same
//! [`BadgerFishConfig`], so a document encoded with one configuration
//! decodes back under the same configuration.
//!
//! # Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `namespaces` | none | Prefix to URI bindings |
//! | `namespaceSeparator` | `:` | Separates prefix and local name in keys |
//! | `attributePrefix` | `@` | Marks attribute keys |
//! | `textKey` | `$` | Key holding character data |
//! | `cdataKey` | `#` | Key holding CDATA sections |
//! | `nullPolicy` | `ignore` | `ignore` or `treat-as-empty-element` |
//! | `encoding` | `UTF-8` | Declared output encoding |
//! | `xmlVersion` | `1.0` | Declared XML version |
//! | `omitXmlDeclaration` | `false` | Skip the `<?xml ...?>` declaration |
//! | `autoEmptyElements` | `false` | Write `<a/>` for elements without content |
//! | `rootElement` | none | Wrap the whole tree in this element |
//! | `indent` | none | Indent output by this many spaces |
//!
//! # Example
//!
//! ```rust
//! use helios_badgerfish::{BadgerFishConfig, NullPolicy};
//!
//! let config = BadgerFishConfig::builder()
//!     .namespace("atom", "http://www.w3.org/2005/Atom")
//!     .null_policy(NullPolicy::EmptyElement)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.resolve_uri("atom"), Some("http://www.w3.org/2005/Atom"));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{BadgerFishError, Result};
use crate::namespace::{XML_NAMESPACE, XML_PREFIX, XMLNS_PREFIX};

/// How `null` values under element keys are encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NullPolicy {
    /// Skip the key; no element is written.
    #[default]
    Ignore,
    /// Write an empty element. Decoding maps empty elements back to `null`.
    #[serde(rename = "treat-as-empty-element")]
    EmptyElement,
}

/// The role a mapping key plays in the convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// An attribute of the current element.
    Attribute,
    /// The namespace declaration block (`@xmlns`).
    Namespace,
    /// Character data.
    Text,
    /// A CDATA section.
    Cdata,
    /// A child element, or repeated children when the value is a sequence.
    Element,
}

/// Naming convention and output options for one conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BadgerFishConfig {
    /// Namespace bindings, prefix to URI.
    pub namespaces: BTreeMap<String, String>,
    pub namespace_separator: String,
    pub attribute_prefix: String,
    pub text_key: String,
    pub cdata_key: String,
    pub null_policy: NullPolicy,
    pub encoding: String,
    pub xml_version: String,
    pub omit_xml_declaration: bool,
    pub auto_empty_elements: bool,
    pub root_element: Option<String>,
    pub indent: Option<usize>,
}

impl Default for BadgerFishConfig {
    fn default() -> Self {
        Self {
            namespaces: BTreeMap::new(),
            namespace_separator: ":".to_string(),
            attribute_prefix: "@".to_string(),
            text_key: "$".to_string(),
            cdata_key: "#".to_string(),
            null_policy: NullPolicy::Ignore,
            encoding: "UTF-8".to_string(),
            xml_version: "1.0".to_string(),
            omit_xml_declaration: false,
            auto_empty_elements: false,
            root_element: None,
            indent: None,
        }
    }
}

impl BadgerFishConfig {
    /// Starts a builder from the defaults.
    pub fn builder() -> BadgerFishConfigBuilder {
        BadgerFishConfigBuilder {
            config: Self::default(),
        }
    }

    /// Parses configuration from a JSON object of named options.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| BadgerFishError::configuration(format!("invalid options: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the options for emptiness and collisions.
    ///
    /// Every conversion entry point calls this before producing any event.
    pub fn validate(&self) -> Result<()> {
        if self.namespace_separator.is_empty() {
            return Err(BadgerFishError::configuration(
                "namespace separator must not be empty",
            ));
        }
        if self.attribute_prefix.is_empty() {
            return Err(BadgerFishError::configuration(
                "attribute prefix must not be empty",
            ));
        }
        for (option, key) in [("text key", &self.text_key), ("CDATA key", &self.cdata_key)] {
            if key.is_empty() {
                return Err(BadgerFishError::configuration(format!(
                    "{} must not be empty",
                    option
                )));
            }
            if key.starts_with(self.attribute_prefix.as_str()) {
                return Err(BadgerFishError::configuration(format!(
                    "{} '{}' collides with attribute prefix '{}'",
                    option, key, self.attribute_prefix
                )));
            }
            if key.contains(self.namespace_separator.as_str()) {
                return Err(BadgerFishError::configuration(format!(
                    "{} '{}' contains the namespace separator '{}'",
                    option, key, self.namespace_separator
                )));
            }
        }
        if self.text_key == self.cdata_key {
            return Err(BadgerFishError::configuration(format!(
                "text key and CDATA key are both '{}'",
                self.text_key
            )));
        }
        for (prefix, uri) in &self.namespaces {
            if prefix.is_empty() || uri.is_empty() {
                return Err(BadgerFishError::configuration(format!(
                    "namespace binding '{}' = '{}' must have a prefix and a URI",
                    prefix, uri
                )));
            }
            if prefix == XMLNS_PREFIX || (prefix == XML_PREFIX && uri != XML_NAMESPACE) {
                return Err(BadgerFishError::configuration(format!(
                    "prefix '{}' is reserved",
                    prefix
                )));
            }
            if prefix.contains(self.namespace_separator.as_str()) {
                return Err(BadgerFishError::configuration(format!(
                    "prefix '{}' contains the namespace separator",
                    prefix
                )));
            }
        }
        if !is_utf8_label(&self.encoding) {
            return Err(BadgerFishError::configuration(format!(
                "unsupported encoding '{}': only UTF-8 output is produced",
                self.encoding
            )));
        }
        if self.xml_version != "1.0" && self.xml_version != "1.1" {
            return Err(BadgerFishError::configuration(format!(
                "unsupported XML version '{}'",
                self.xml_version
            )));
        }
        if let Some(root) = &self.root_element {
            if root.is_empty() {
                return Err(BadgerFishError::configuration(
                    "root element name must not be empty",
                ));
            }
        }
        Ok(())
    }

    /// Classifies a mapping key.
    pub fn classify_key(&self, key: &str) -> Result<KeyRole> {
        if key.is_empty() {
            return Err(BadgerFishError::structural(
                "<key>",
                "empty keys cannot be mapped to XML",
            ));
        }
        if let Some(name) = key.strip_prefix(self.attribute_prefix.as_str()) {
            if name == XMLNS_PREFIX {
                return Ok(KeyRole::Namespace);
            }
            return Ok(KeyRole::Attribute);
        }
        if key == self.text_key {
            return Ok(KeyRole::Text);
        }
        if key == self.cdata_key {
            return Ok(KeyRole::Cdata);
        }
        Ok(KeyRole::Element)
    }

    /// Returns the namespace declaration key, `@xmlns` by default.
    pub fn namespace_key(&self) -> String {
        format!("{}{}", self.attribute_prefix, XMLNS_PREFIX)
    }

    /// Returns the configured prefix bound to `uri`.
    pub fn resolve_prefix(&self, uri: &str) -> Option<&str> {
        self.namespaces
            .iter()
            .find(|(_, bound)| bound.as_str() == uri)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// Returns the configured URI bound to `prefix`.
    pub fn resolve_uri(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    /// Splits a key into `(prefix, local)` at the first separator.
    pub fn split_name<'k>(&self, key: &'k str) -> (&'k str, &'k str) {
        match key.split_once(self.namespace_separator.as_str()) {
            Some((prefix, local)) => (prefix, local),
            None => ("", key),
        }
    }
}

fn is_utf8_label(encoding: &str) -> bool {
    encoding.eq_ignore_ascii_case("UTF-8") || encoding.eq_ignore_ascii_case("UTF8")
}

/// Fluent builder for [`BadgerFishConfig`].
#[derive(Debug, Clone)]
pub struct BadgerFishConfigBuilder {
    config: BadgerFishConfig,
}

impl BadgerFishConfigBuilder {
    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.config.namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn namespace_separator(mut self, separator: impl Into<String>) -> Self {
        self.config.namespace_separator = separator.into();
        self
    }

    pub fn attribute_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.attribute_prefix = prefix.into();
        self
    }

    pub fn text_key(mut self, key: impl Into<String>) -> Self {
        self.config.text_key = key.into();
        self
    }

    pub fn cdata_key(mut self, key: impl Into<String>) -> Self {
        self.config.cdata_key = key.into();
        self
    }

    pub fn null_policy(mut self, policy: NullPolicy) -> Self {
        self.config.null_policy = policy;
        self
    }

    /// Shorthand for choosing between the two null policies.
    pub fn null_as_empty_element(self, enabled: bool) -> Self {
        self.null_policy(if enabled {
            NullPolicy::EmptyElement
        } else {
            NullPolicy::Ignore
        })
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.config.encoding = encoding.into();
        self
    }

    pub fn xml_version(mut self, version: impl Into<String>) -> Self {
        self.config.xml_version = version.into();
        self
    }

    pub fn omit_xml_declaration(mut self, omit: bool) -> Self {
        self.config.omit_xml_declaration = omit;
        self
    }

    pub fn auto_empty_elements(mut self, enabled: bool) -> Self {
        self.config.auto_empty_elements = enabled;
        self
    }

    pub fn root_element(mut self, name: impl Into<String>) -> Self {
        self.config.root_element = Some(name.into());
        self
    }

    pub fn indent(mut self, width: usize) -> Self {
        self.config.indent = Some(width);
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<BadgerFishConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
