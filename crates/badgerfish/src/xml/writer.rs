//! quick-xml backed [`XmlStreamWriter`].

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::utils::{cdata_sections, find_illegal_char};
use crate::config::BadgerFishConfig;
use crate::error::{BadgerFishError, Result};
use crate::namespace::XMLNS_PREFIX;
use crate::stream::{QName, XmlStreamWriter};

/// Push writer producing XML text.
///
/// A start tag is held back until the next content or end event, so
/// namespace declarations and attributes can still be added to it.
pub struct XmlTextWriter<W: Write> {
    writer: Writer<W>,
    encoding: String,
    omit_declaration: bool,
    auto_empty_elements: bool,
    pending: Option<BytesStart<'static>>,
    open: Vec<String>,
}

impl<W: Write> XmlTextWriter<W> {
    /// Creates a writer using the output options of `config`.
    pub fn new(inner: W, config: &BadgerFishConfig) -> Self {
        let writer = match config.indent {
            Some(width) => Writer::new_with_indent(inner, b' ', width),
            None => Writer::new(inner),
        };
        Self {
            writer,
            encoding: config.encoding.clone(),
            omit_declaration: config.omit_xml_declaration,
            auto_empty_elements: config.auto_empty_elements,
            pending: None,
            open: Vec::new(),
        }
    }

    /// Consumes the writer, returning the underlying output.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn flush_pending(&mut self) -> Result<()> {
        if let Some(start) = self.pending.take() {
            self.writer.write_event(Event::Start(start))?;
        }
        Ok(())
    }

    fn path(&self) -> String {
        if self.open.is_empty() {
            "/".to_string()
        } else {
            self.open.join("/")
        }
    }

    fn pending_tag(&mut self, operation: &str) -> Result<&mut BytesStart<'static>> {
        let path = self.path();
        self.pending.as_mut().ok_or_else(|| {
            BadgerFishError::structural(
                path,
                format!("{} must directly follow a start element", operation),
            )
        })
    }

    /// Rejects content that no XML parser would accept back.
    fn check_chars(&self, text: &str, what: &str) -> Result<()> {
        match find_illegal_char(text) {
            Some(c) => Err(BadgerFishError::structural(
                self.path(),
                format!("{} contains illegal XML character U+{:04X}", what, c as u32),
            )),
            None => Ok(()),
        }
    }
}

impl<W: Write> XmlStreamWriter for XmlTextWriter<W> {
    fn write_start_document(&mut self, encoding: Option<&str>, version: Option<&str>) -> Result<()> {
        if self.omit_declaration {
            return Ok(());
        }
        let encoding = encoding.unwrap_or(self.encoding.as_str());
        let version = version.unwrap_or("1.0");
        self.writer
            .write_event(Event::Decl(BytesDecl::new(version, Some(encoding), None)))?;
        Ok(())
    }

    fn write_end_document(&mut self) -> Result<()> {
        if let Some(open) = self.open.last() {
            return Err(BadgerFishError::structural(
                open.clone(),
                "document ended while elements are still open",
            ));
        }
        self.writer.get_mut().flush()?;
        Ok(())
    }

    fn write_start_element(&mut self, name: &QName) -> Result<()> {
        self.flush_pending()?;
        let qualified = name.qualified();
        self.pending = Some(BytesStart::new(qualified.clone()));
        self.open.push(qualified);
        Ok(())
    }

    fn write_end_element(&mut self) -> Result<()> {
        let Some(name) = self.open.pop() else {
            return Err(BadgerFishError::structural(
                "/",
                "end of element without a matching start",
            ));
        };
        match self.pending.take() {
            Some(start) if self.auto_empty_elements => {
                self.writer.write_event(Event::Empty(start))?;
            }
            Some(start) => {
                // The empty text keeps `<a></a>` on one line when indenting.
                self.writer.write_event(Event::Start(start))?;
                self.writer.write_event(Event::Text(BytesText::new("")))?;
                self.writer.write_event(Event::End(BytesEnd::new(name)))?;
            }
            None => {
                self.writer.write_event(Event::End(BytesEnd::new(name)))?;
            }
        }
        Ok(())
    }

    fn write_namespace(&mut self, prefix: &str, uri: &str) -> Result<()> {
        let key = if prefix.is_empty() {
            XMLNS_PREFIX.to_string()
        } else {
            format!("{}:{}", XMLNS_PREFIX, prefix)
        };
        self.pending_tag("namespace declaration")?
            .push_attribute((key.as_str(), uri));
        Ok(())
    }

    fn write_attribute(&mut self, name: &QName, value: &str) -> Result<()> {
        self.check_chars(value, "attribute value")?;
        let key = name.qualified();
        self.pending_tag("attribute")?
            .push_attribute((key.as_str(), value));
        Ok(())
    }

    fn write_characters(&mut self, text: &str) -> Result<()> {
        self.check_chars(text, "text")?;
        self.flush_pending()?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn write_cdata(&mut self, text: &str) -> Result<()> {
        self.check_chars(text, "CDATA")?;
        self.flush_pending()?;
        for section in cdata_sections(text) {
            self.writer
                .write_event(Event::CData(BytesCData::new(section)))?;
        }
        Ok(())
    }
}
