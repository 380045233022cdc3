//! The streaming XML capability boundary.
//!
//! Any XML library can take part in a conversion by implementing
//! [`XmlStreamReader`] (a positionable pull source of events) or
//! [`XmlStreamWriter`] (a push sink of events). The tree adapters in
//! [`crate::tree`] implement the same traits, so the event pipe never knows
//! which side holds the tree.

use crate::error::Result;

/// The kind of event a reader is currently positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEvent {
    /// Initial position, before the root element has been reached.
    StartDocument,
    StartElement,
    Characters,
    CData,
    EndElement,
    /// Terminal position; `has_next` is false from here on.
    EndDocument,
}

/// A namespace-qualified XML name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI, empty when the name is in no namespace.
    pub namespace_uri: String,
    /// Prefix, empty for unprefixed names.
    pub prefix: String,
    pub local_name: String,
}

impl QName {
    /// Creates a name with no prefix and no namespace.
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace_uri: String::new(),
            prefix: String::new(),
            local_name: local_name.into(),
        }
    }

    pub fn new(
        namespace_uri: impl Into<String>,
        prefix: impl Into<String>,
        local_name: impl Into<String>,
    ) -> Self {
        Self {
            namespace_uri: namespace_uri.into(),
            prefix: prefix.into(),
            local_name: local_name.into(),
        }
    }

    /// Returns the lexical form, `prefix:local` or `local`.
    pub fn qualified(&self) -> String {
        self.qualified_with(":")
    }

    /// Returns the name joined with a custom separator.
    pub fn qualified_with(&self, separator: &str) -> String {
        if self.prefix.is_empty() {
            self.local_name.clone()
        } else {
            format!("{}{}{}", self.prefix, separator, self.local_name)
        }
    }
}

/// A positionable source of XML events.
///
/// A reader starts on [`XmlEvent::StartDocument`]. Each call to `next`
/// advances exactly one event. `has_next` reports whether a further event
/// exists, so it runs one step behind the current event: it is false only
/// once the reader sits on `EndDocument`.
pub trait XmlStreamReader {
    /// The event the reader is positioned on.
    fn event(&self) -> XmlEvent;

    fn has_next(&self) -> bool;

    /// Advances to the next event and returns its kind.
    fn next(&mut self) -> Result<XmlEvent>;

    /// Element name, valid on `StartElement` and `EndElement`.
    fn name(&self) -> Result<&QName>;

    /// Number of (non namespace-declaration) attributes, valid on `StartElement`.
    fn attribute_count(&self) -> Result<usize>;

    fn attribute_name(&self, index: usize) -> Result<&QName>;

    fn attribute_value(&self, index: usize) -> Result<&str>;

    /// Number of namespace declarations made on the current element.
    fn namespace_count(&self) -> Result<usize>;

    /// Declared prefix, empty for the default namespace.
    fn namespace_prefix(&self, index: usize) -> Result<&str>;

    fn namespace_uri(&self, index: usize) -> Result<&str>;

    /// Character data, valid on `Characters` and `CData`.
    fn text(&self) -> Result<&str>;

    /// XML version reported by the source, if it has one.
    fn version(&self) -> Option<&str>;

    /// Encoding reported by the source, if it has one.
    fn encoding(&self) -> Option<&str>;
}

/// A sink of XML events.
///
/// Namespace declarations and attributes belong to the most recent
/// `write_start_element` and must be written before any content.
pub trait XmlStreamWriter {
    /// Starts the document. `None` for `encoding` selects the writer's own default.
    fn write_start_document(&mut self, encoding: Option<&str>, version: Option<&str>)
    -> Result<()>;

    fn write_end_document(&mut self) -> Result<()>;

    fn write_start_element(&mut self, name: &QName) -> Result<()>;

    fn write_end_element(&mut self) -> Result<()>;

    fn write_namespace(&mut self, prefix: &str, uri: &str) -> Result<()>;

    fn write_attribute(&mut self, name: &QName, value: &str) -> Result<()>;

    fn write_characters(&mut self, text: &str) -> Result<()>;

    fn write_cdata(&mut self, text: &str) -> Result<()>;

    /// Copies the event `reader` is positioned on into this writer.
    ///
    /// The declaration is written with the writer's default encoding and the
    /// reader's version: encoding belongs to the output, not to the source.
    fn copy_event(&mut self, reader: &dyn XmlStreamReader) -> Result<()> {
        match reader.event() {
            XmlEvent::StartDocument => self.write_start_document(None, reader.version()),
            XmlEvent::StartElement => {
                self.write_start_element(reader.name()?)?;
                for i in 0..reader.namespace_count()? {
                    self.write_namespace(reader.namespace_prefix(i)?, reader.namespace_uri(i)?)?;
                }
                for i in 0..reader.attribute_count()? {
                    self.write_attribute(reader.attribute_name(i)?, reader.attribute_value(i)?)?;
                }
                Ok(())
            }
            XmlEvent::Characters => self.write_characters(reader.text()?),
            XmlEvent::CData => self.write_cdata(reader.text()?),
            XmlEvent::EndElement => self.write_end_element(),
            XmlEvent::EndDocument => self.write_end_document(),
        }
    }
}
