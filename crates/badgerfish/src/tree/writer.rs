//! XML events to tree.

use serde_json::{Map, Value};
use tracing::trace;

use crate::config::{BadgerFishConfig, NullPolicy};
use crate::error::{BadgerFishError, Result};
use crate::namespace::XMLNS_PREFIX;
use crate::stream::{QName, XmlStreamWriter};

/// Kind of the most recent content written into a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run {
    Text,
    Cdata,
    Child,
}

#[derive(Debug)]
struct OpenNode {
    key: String,
    content: Map<String, Value>,
    last: Option<Run>,
}

/// Push sink that accumulates XML events into a tree.
///
/// ```rust
/// use helios_badgerfish::{BadgerFishConfig, QName, TreeWriter, XmlStreamWriter};
/// use serde_json::json;
///
/// let config = BadgerFishConfig::default();
/// let mut writer = TreeWriter::new(&config);
/// writer.write_start_document(None, None).unwrap();
/// writer.write_start_element(&QName::local("root")).unwrap();
/// writer.write_characters("hi").unwrap();
/// writer.write_end_element().unwrap();
/// writer.write_end_document().unwrap();
/// assert_eq!(writer.finish().unwrap(), json!({"root": {"$": "hi"}}));
/// ```
#[derive(Debug)]
pub struct TreeWriter<'c> {
    config: &'c BadgerFishConfig,
    stack: Vec<OpenNode>,
    root: Option<(String, Value)>,
    ended: bool,
}

impl<'c> TreeWriter<'c> {
    pub fn new(config: &'c BadgerFishConfig) -> Self {
        Self {
            config,
            stack: Vec::new(),
            root: None,
            ended: false,
        }
    }

    /// Returns the finished tree.
    ///
    /// When the configuration names an explicit root element and the document
    /// root carries that name, the root's content is returned unwrapped, which
    /// mirrors how encoding wraps the tree.
    pub fn finish(self) -> Result<Value> {
        if !self.stack.is_empty() {
            return Err(BadgerFishError::structural(
                self.path(),
                format!("{} element(s) still open", self.stack.len()),
            ));
        }
        let Some((key, value)) = self.root else {
            return Err(BadgerFishError::structural(
                "/",
                "document has no root element",
            ));
        };
        if self.config.root_element.as_deref() == Some(key.as_str()) {
            return Ok(value);
        }
        let mut document = Map::new();
        document.insert(key, value);
        Ok(Value::Object(document))
    }

    fn path(&self) -> String {
        if self.stack.is_empty() {
            return "/".to_string();
        }
        self.stack
            .iter()
            .map(|node| node.key.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn open_node(&mut self, operation: &str) -> Result<&mut OpenNode> {
        if self.ended {
            return Err(BadgerFishError::structural(
                "/",
                format!("{} after the document ended", operation),
            ));
        }
        let path = self.path();
        self.stack.last_mut().ok_or_else(|| {
            BadgerFishError::structural(path, format!("{} outside any element", operation))
        })
    }

    fn append_text(&mut self, text: &str, run: Run) -> Result<()> {
        let key = match run {
            Run::Cdata => self.config.cdata_key.clone(),
            _ => self.config.text_key.clone(),
        };
        let operation = if run == Run::Cdata {
            "CDATA"
        } else {
            "character data"
        };
        let node = self.open_node(operation)?;
        if text.is_empty() {
            return Ok(());
        }
        let continues = node.last == Some(run);
        node.last = Some(run);

        match node.content.get_mut(&key) {
            None => {
                node.content.insert(key, Value::String(text.to_string()));
            }
            Some(Value::String(existing)) if continues => existing.push_str(text),
            Some(Value::Array(segments)) if continues => match segments.last_mut() {
                Some(Value::String(last)) => last.push_str(text),
                _ => segments.push(Value::String(text.to_string())),
            },
            Some(Value::Array(segments)) => segments.push(Value::String(text.to_string())),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(text.to_string())]);
            }
        }
        Ok(())
    }
}

/// Attaches `value` under `key` by the sibling merge rule.
fn merge(content: &mut Map<String, Value>, key: String, value: Value) {
    match content.get_mut(&key) {
        None => {
            content.insert(key, value);
        }
        Some(Value::Array(siblings)) => siblings.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

impl XmlStreamWriter for TreeWriter<'_> {
    fn write_start_document(&mut self, _encoding: Option<&str>, _version: Option<&str>) -> Result<()> {
        Ok(())
    }

    fn write_end_document(&mut self) -> Result<()> {
        if !self.stack.is_empty() {
            return Err(BadgerFishError::structural(
                self.path(),
                "document ended while elements are still open",
            ));
        }
        if self.root.is_none() {
            return Err(BadgerFishError::structural(
                "/",
                "document has no root element",
            ));
        }
        self.ended = true;
        Ok(())
    }

    fn write_start_element(&mut self, name: &QName) -> Result<()> {
        let key = name.qualified_with(&self.config.namespace_separator);
        if self.ended || (self.stack.is_empty() && self.root.is_some()) {
            return Err(BadgerFishError::structural(
                key,
                "a document can only have one root element",
            ));
        }
        self.stack.push(OpenNode {
            key,
            content: Map::new(),
            last: None,
        });
        Ok(())
    }

    fn write_end_element(&mut self) -> Result<()> {
        let Some(node) = self.stack.pop() else {
            return Err(BadgerFishError::structural(
                "/",
                "end of element without a matching start",
            ));
        };
        let value = if node.content.is_empty() {
            match self.config.null_policy {
                NullPolicy::EmptyElement => Value::Null,
                NullPolicy::Ignore => Value::Object(Map::new()),
            }
        } else {
            Value::Object(node.content)
        };

        match self.stack.last_mut() {
            Some(parent) => {
                parent.last = Some(Run::Child);
                merge(&mut parent.content, node.key, value);
            }
            None => self.root = Some((node.key, value)),
        }
        Ok(())
    }

    fn write_namespace(&mut self, prefix: &str, uri: &str) -> Result<()> {
        let namespace_key = self.config.namespace_key();
        let binding = if prefix.is_empty() {
            self.config.text_key.clone()
        } else {
            prefix.to_string()
        };
        let node = self.open_node("namespace declaration")?;
        let declarations = node
            .content
            .entry(namespace_key)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(declarations) = declarations {
            declarations.insert(binding, Value::String(uri.to_string()));
        }
        Ok(())
    }

    fn write_attribute(&mut self, name: &QName, value: &str) -> Result<()> {
        if name.prefix == XMLNS_PREFIX {
            trace!(name = %name.local_name, "Treating xmlns attribute as a declaration");
            return self.write_namespace(&name.local_name, value);
        }
        let key = format!(
            "{}{}",
            self.config.attribute_prefix,
            name.qualified_with(&self.config.namespace_separator)
        );
        let node = self.open_node("attribute")?;
        node.content.insert(key, Value::String(value.to_string()));
        Ok(())
    }

    fn write_characters(&mut self, text: &str) -> Result<()> {
        self.append_text(text, Run::Text)
    }

    fn write_cdata(&mut self, text: &str) -> Result<()> {
        self.append_text(text, Run::Cdata)
    }
}
