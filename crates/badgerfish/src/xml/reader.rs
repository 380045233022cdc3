//! quick-xml backed [`XmlStreamReader`].
//!
//! Reads events from a quick-xml [`NsReader`], keeping a small queue of
//! pending events for one-event lookahead and for the synthesized end of
//! `<a/>` elements. Prefixes are resolved by the `NsReader`, so the queue
//! never runs more than one event ahead of a start tag.

use std::collections::VecDeque;
use std::io::BufRead;

use quick_xml::NsReader;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::name::ResolveResult;
use tracing::trace;

use super::utils::{is_whitespace_text, split_qname};
use crate::error::{BadgerFishError, Result};
use crate::namespace::XMLNS_PREFIX;
use crate::stream::{QName, XmlEvent, XmlStreamReader};

/// Pull reader over XML text.
///
/// Comments, processing instructions and the DOCTYPE are skipped.
/// Whitespace-only text between tags is formatting and is dropped, unless
/// it is the whole content of an element. Entity references are folded
/// into the surrounding character data.
pub struct XmlTextReader<R: BufRead> {
    reader: NsReader<R>,
    buf: Vec<u8>,
    buffered: VecDeque<Event<'static>>,
    event: XmlEvent,
    name: QName,
    attributes: Vec<(QName, String)>,
    namespaces: Vec<(String, String)>,
    text: String,
    open: Vec<QName>,
    version: Option<String>,
    encoding: Option<String>,
    root_seen: bool,
}

impl<'a> XmlTextReader<&'a [u8]> {
    /// Creates a reader over an XML string.
    pub fn from_xml_str(xml: &'a str) -> Result<Self> {
        Self::new(xml.as_bytes())
    }
}

impl<R: BufRead> XmlTextReader<R> {
    /// Creates a reader positioned on `StartDocument`.
    ///
    /// The prolog is read eagerly so the declared version and encoding are
    /// available before the first call to `next`.
    pub fn new(input: R) -> Result<Self> {
        let mut reader = NsReader::from_reader(input);
        reader.config_mut().trim_text(false);

        let mut this = Self {
            reader,
            buf: Vec::new(),
            buffered: VecDeque::new(),
            event: XmlEvent::StartDocument,
            name: QName::default(),
            attributes: Vec::new(),
            namespaces: Vec::new(),
            text: String::new(),
            open: Vec::new(),
            version: None,
            encoding: None,
            root_seen: false,
        };
        this.read_prolog()?;
        Ok(this)
    }

    fn read_prolog(&mut self) -> Result<()> {
        loop {
            match self.read_raw()? {
                Event::Decl(decl) => {
                    let version = decl
                        .version()
                        .map_err(|e| BadgerFishError::malformed(e.to_string()))?;
                    self.version = Some(String::from_utf8_lossy(&version).into_owned());
                    if let Some(encoding) = decl.encoding() {
                        let encoding =
                            encoding.map_err(|e| BadgerFishError::malformed(e.to_string()))?;
                        self.encoding = Some(String::from_utf8_lossy(&encoding).into_owned());
                    }
                }
                Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
                Event::Text(text) => {
                    if !is_whitespace_text(std::str::from_utf8(&text)?) {
                        self.buffered.push_front(Event::Text(text));
                        return Ok(());
                    }
                }
                other => {
                    self.buffered.push_front(other);
                    return Ok(());
                }
            }
        }
    }

    fn read_raw(&mut self) -> Result<Event<'static>> {
        if let Some(event) = self.buffered.pop_front() {
            return Ok(event);
        }
        self.buf.clear();
        let event = self.reader.read_event_into(&mut self.buf)?.into_owned();
        Ok(event)
    }

    fn peek_raw(&mut self) -> Result<Option<&Event<'static>>> {
        if self.buffered.is_empty() {
            let event = self.read_raw()?;
            self.buffered.push_back(event);
        }
        Ok(self.buffered.front())
    }

    /// Reads the attributes of the start tag that was read last.
    ///
    /// Prefixes are resolved against the `NsReader` scope, which already
    /// includes the declarations made on this tag.
    fn start_element(&mut self, start: &BytesStart<'_>) -> Result<()> {
        if self.open.is_empty() && self.root_seen {
            return Err(BadgerFishError::malformed(
                "document has more than one root element",
            ));
        }
        self.root_seen = true;

        for attr in start.attributes() {
            let attr = attr.map_err(|e| BadgerFishError::malformed(e.to_string()))?;
            let key = std::str::from_utf8(attr.key.as_ref())?;
            let value = attr
                .unescape_value()
                .map_err(|e| BadgerFishError::malformed(e.to_string()))?
                .into_owned();
            match split_qname(key) {
                ("", XMLNS_PREFIX) => self.namespaces.push((String::new(), value)),
                (XMLNS_PREFIX, prefix) => self.namespaces.push((prefix.to_string(), value)),
                (prefix, local) => {
                    let uri = if prefix.is_empty() {
                        String::new()
                    } else {
                        resolved_uri(self.reader.resolve_attribute(attr.key).0)?
                    };
                    self.attributes.push((QName::new(uri, prefix, local), value));
                }
            }
        }

        let qname = start.name();
        let raw_name = std::str::from_utf8(qname.as_ref())?;
        let (prefix, local) = split_qname(raw_name);
        let uri = resolved_uri(self.reader.resolve_element(start.name()).0)?;
        self.name = QName::new(uri, prefix, local);
        self.open.push(self.name.clone());
        Ok(())
    }

    /// Collects a run of text and entity references starting with `text`.
    ///
    /// Comments and processing instructions inside the run are dropped, so
    /// `a<!-- c -->b` reads as `ab`.
    fn character_data(&mut self, mut text: String) -> Result<Option<XmlEvent>> {
        loop {
            let continues = matches!(
                self.peek_raw()?,
                Some(Event::Text(_) | Event::GeneralRef(_) | Event::Comment(_) | Event::PI(_))
            );
            if !continues {
                break;
            }
            match self.read_raw()? {
                Event::Text(more) => text.push_str(std::str::from_utf8(&more)?),
                Event::GeneralRef(reference) => text.push_str(&resolve_reference(&reference)?),
                _ => {}
            }
        }

        if is_whitespace_text(&text) && self.is_formatting()? {
            trace!(len = text.len(), "Skipping whitespace-only text");
            return Ok(None);
        }
        if self.open.is_empty() {
            return Err(BadgerFishError::malformed(
                "character data outside the root element",
            ));
        }
        self.text = text;
        Ok(Some(XmlEvent::Characters))
    }

    /// Checks if a whitespace-only run just read sits between tags.
    ///
    /// A run directly enclosed by an element's own start and end tags is
    /// that element's content and is kept.
    fn is_formatting(&mut self) -> Result<bool> {
        if self.open.is_empty() {
            return Ok(true);
        }
        let previous = self.event;
        let next = self.peek_raw()?;
        let before_tag = matches!(
            next,
            Some(Event::Start(_) | Event::Empty(_) | Event::End(_) | Event::Eof)
        );
        let only_content =
            previous == XmlEvent::StartElement && matches!(next, Some(Event::End(_)));
        let after_tag = matches!(previous, XmlEvent::StartElement | XmlEvent::EndElement);
        Ok(after_tag && before_tag && !only_content)
    }

    fn advance(&mut self) -> Result<XmlEvent> {
        loop {
            match self.read_raw()? {
                Event::Start(start) => {
                    self.start_element(&start)?;
                    return Ok(XmlEvent::StartElement);
                }
                Event::Empty(start) => {
                    self.start_element(&start)?;
                    self.buffered
                        .push_front(Event::End(start.to_end().into_owned()));
                    return Ok(XmlEvent::StartElement);
                }
                Event::End(_) => {
                    self.name = self
                        .open
                        .pop()
                        .ok_or_else(|| BadgerFishError::malformed("unexpected end tag"))?;
                    return Ok(XmlEvent::EndElement);
                }
                Event::Text(text) => {
                    let text = std::str::from_utf8(&text)?.to_string();
                    if let Some(event) = self.character_data(text)? {
                        return Ok(event);
                    }
                }
                Event::GeneralRef(reference) => {
                    let resolved = resolve_reference(&reference)?;
                    if let Some(event) = self.character_data(resolved)? {
                        return Ok(event);
                    }
                }
                Event::CData(cdata) => {
                    if self.open.is_empty() {
                        return Err(BadgerFishError::malformed(
                            "CDATA section outside the root element",
                        ));
                    }
                    self.text = std::str::from_utf8(&cdata)?.to_string();
                    return Ok(XmlEvent::CData);
                }
                Event::Eof => {
                    if let Some(open) = self.open.last() {
                        return Err(BadgerFishError::malformed(format!(
                            "unexpected end of document inside <{}>",
                            open.qualified()
                        )));
                    }
                    if !self.root_seen {
                        return Err(BadgerFishError::malformed("document has no root element"));
                    }
                    return Ok(XmlEvent::EndDocument);
                }
                other => trace!(event = ?other, "Skipping XML event"),
            }
        }
    }
}

/// Returns the namespace URI of a resolved name.
///
/// Undeclared prefixes pass through with no namespace.
fn resolved_uri(resolved: ResolveResult<'_>) -> Result<String> {
    match resolved {
        ResolveResult::Bound(namespace) => Ok(std::str::from_utf8(namespace.as_ref())?.to_string()),
        ResolveResult::Unbound => Ok(String::new()),
        ResolveResult::Unknown(prefix) => {
            trace!(prefix = %String::from_utf8_lossy(&prefix), "Undeclared namespace prefix");
            Ok(String::new())
        }
    }
}

/// Resolves a character reference or one of the predefined entities.
fn resolve_reference(reference: &BytesRef<'_>) -> Result<String> {
    if let Some(ch) = reference.resolve_char_ref()? {
        return Ok(ch.to_string());
    }
    let name = std::str::from_utf8(reference)?;
    resolve_xml_entity(name)
        .map(str::to_string)
        .ok_or_else(|| BadgerFishError::malformed(format!("undeclared entity '&{};'", name)))
}

impl<R: BufRead> XmlStreamReader for XmlTextReader<R> {
    fn event(&self) -> XmlEvent {
        self.event
    }

    fn has_next(&self) -> bool {
        self.event != XmlEvent::EndDocument
    }

    fn next(&mut self) -> Result<XmlEvent> {
        if self.event == XmlEvent::EndDocument {
            return Err(BadgerFishError::usage("next", XmlEvent::EndDocument));
        }
        self.attributes.clear();
        self.namespaces.clear();
        self.text.clear();
        self.event = self.advance()?;
        Ok(self.event)
    }

    fn name(&self) -> Result<&QName> {
        match self.event {
            XmlEvent::StartElement | XmlEvent::EndElement => Ok(&self.name),
            other => Err(BadgerFishError::usage("name", other)),
        }
    }

    fn attribute_count(&self) -> Result<usize> {
        self.require_start("attribute_count")?;
        Ok(self.attributes.len())
    }

    fn attribute_name(&self, index: usize) -> Result<&QName> {
        self.require_start("attribute_name")?;
        self.attributes
            .get(index)
            .map(|(name, _)| name)
            .ok_or_else(|| BadgerFishError::usage("attribute_name", self.event))
    }

    fn attribute_value(&self, index: usize) -> Result<&str> {
        self.require_start("attribute_value")?;
        self.attributes
            .get(index)
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| BadgerFishError::usage("attribute_value", self.event))
    }

    fn namespace_count(&self) -> Result<usize> {
        self.require_start("namespace_count")?;
        Ok(self.namespaces.len())
    }

    fn namespace_prefix(&self, index: usize) -> Result<&str> {
        self.require_start("namespace_prefix")?;
        self.namespaces
            .get(index)
            .map(|(prefix, _)| prefix.as_str())
            .ok_or_else(|| BadgerFishError::usage("namespace_prefix", self.event))
    }

    fn namespace_uri(&self, index: usize) -> Result<&str> {
        self.require_start("namespace_uri")?;
        self.namespaces
            .get(index)
            .map(|(_, uri)| uri.as_str())
            .ok_or_else(|| BadgerFishError::usage("namespace_uri", self.event))
    }

    fn text(&self) -> Result<&str> {
        match self.event {
            XmlEvent::Characters | XmlEvent::CData => Ok(&self.text),
            other => Err(BadgerFishError::usage("text", other)),
        }
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }
}

impl<R: BufRead> XmlTextReader<R> {
    fn require_start(&self, operation: &'static str) -> Result<()> {
        if self.event == XmlEvent::StartElement {
            Ok(())
        } else {
            Err(BadgerFishError::usage(operation, self.event))
        }
    }
}
