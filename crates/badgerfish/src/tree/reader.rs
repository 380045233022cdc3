//! Tree to XML events.
//!
//! [`TreeReader`] walks a borrowed [`serde_json::Value`] one event at a time.
//! It keeps one frame per open element and nothing else: no event is
//! buffered ahead of the caller.
//!
//! Names are resolved lazily. The first query for an element's name,
//! attributes or namespaces resolves that element (and its ancestors)
//! through the conversion's [`PrefixResolver`] and caches the result on the
//! frame. The bindings emitted so far live in a [`NamespaceScope`] with one
//! frame per resolved element.

use std::borrow::Cow;
use std::cell::{OnceCell, RefCell};

use serde_json::{Map, Value};
use tracing::trace;

use crate::config::{BadgerFishConfig, KeyRole, NullPolicy};
use crate::error::{BadgerFishError, Result};
use crate::namespace::{
    NamespaceContext, NamespaceScope, PrefixResolver, XML_NAMESPACE, XML_PREFIX, XMLNS_PREFIX,
};
use crate::stream::{QName, XmlEvent, XmlStreamReader};
use crate::xml::utils::{find_illegal_char, is_ncname};

/// Remaining content of an open element.
enum Entries<'t> {
    Map(serde_json::map::Iter<'t>),
    /// A scalar element value, emitted as if it were `{text_key: value}`.
    Text(Option<&'t Value>),
    Empty,
}

/// Expansion state of a sequence of same-named siblings.
struct ArrayCursor<'t> {
    key: &'t str,
    items: std::slice::Iter<'t, Value>,
    index: usize,
}

#[derive(Debug)]
struct ResolvedElement {
    name: QName,
    attributes: Vec<QName>,
    namespaces: Vec<(String, String)>,
}

struct Frame<'t> {
    key: &'t str,
    path: String,
    entries: Entries<'t>,
    array: Option<ArrayCursor<'t>>,
    attributes: Vec<(&'t str, Cow<'t, str>)>,
    /// `(prefix, uri)` declarations taken from the node's namespace key.
    declarations: Vec<(&'t str, &'t str)>,
    resolved: OnceCell<ResolvedElement>,
}

/// Pull source of XML events over a tree.
///
/// ```rust
/// use helios_badgerfish::{BadgerFishConfig, TreeReader, XmlEvent, XmlStreamReader};
/// use serde_json::json;
///
/// let config = BadgerFishConfig::default();
/// let tree = json!({"root": {"$": "hello"}});
/// let mut reader = TreeReader::new(&tree, &config);
/// assert_eq!(reader.next().unwrap(), XmlEvent::StartElement);
/// assert_eq!(reader.name().unwrap().local_name, "root");
/// assert_eq!(reader.next().unwrap(), XmlEvent::Characters);
/// assert_eq!(reader.text().unwrap(), "hello");
/// ```
pub struct TreeReader<'t> {
    tree: &'t Value,
    config: &'t BadgerFishConfig,
    event: XmlEvent,
    stack: Vec<Frame<'t>>,
    /// The frame closed by the current `EndElement`.
    ended: Option<Frame<'t>>,
    text: Cow<'t, str>,
    resolver: RefCell<PrefixResolver<'t>>,
    /// Emitted bindings of the resolved frames, innermost last.
    emitted: RefCell<NamespaceScope>,
}

impl<'t> TreeReader<'t> {
    /// Creates a reader positioned on `StartDocument`.
    ///
    /// The configuration is assumed valid; conversion entry points validate it.
    pub fn new(tree: &'t Value, config: &'t BadgerFishConfig) -> Self {
        Self {
            tree,
            config,
            event: XmlEvent::StartDocument,
            stack: Vec::new(),
            ended: None,
            text: Cow::Borrowed(""),
            resolver: RefCell::new(PrefixResolver::new(config)),
            emitted: RefCell::new(NamespaceScope::new()),
        }
    }

    /// Current element nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn start_root(&mut self) -> Result<XmlEvent> {
        let (key, value) = match self.config.root_element.as_deref() {
            Some(name) => (name, self.tree),
            None => match self.tree {
                Value::Object(map) => {
                    let mut entries = map.iter();
                    match (entries.next(), entries.next()) {
                        (Some((key, value)), None) => (key.as_str(), value),
                        _ => {
                            return Err(BadgerFishError::structural(
                                "/",
                                format!(
                                    "expected exactly one root element key, found {}",
                                    map.len()
                                ),
                            ));
                        }
                    }
                }
                other => {
                    return Err(BadgerFishError::structural(
                        "/",
                        format!("root must be a mapping, found {}", value_kind(other)),
                    ));
                }
            },
        };

        if self.classify(key, "/")? != KeyRole::Element {
            return Err(BadgerFishError::structural(
                key,
                "root key is not an element name",
            ));
        }
        if value.is_array() {
            return Err(BadgerFishError::structural(
                key,
                "root element cannot be a sequence",
            ));
        }
        self.enter(key, value, key.to_string(), true)?;
        Ok(XmlEvent::StartElement)
    }

    fn advance(&mut self) -> Result<XmlEvent> {
        let config = self.config;
        loop {
            let Some(top) = self.stack.last_mut() else {
                return Ok(XmlEvent::EndDocument);
            };

            if let Some(cursor) = top.array.as_mut() {
                if let Some(item) = cursor.items.next() {
                    let key = cursor.key;
                    let path = format!("{}/{}[{}]", top.path, key, cursor.index);
                    cursor.index += 1;
                    if self.enter(key, item, path, false)? {
                        return Ok(XmlEvent::StartElement);
                    }
                    continue;
                }
                top.array = None;
            }

            let next = match &mut top.entries {
                Entries::Map(iter) => iter.next().map(|(key, value)| (key.as_str(), value)),
                Entries::Text(value) => value.take().map(|value| (config.text_key.as_str(), value)),
                Entries::Empty => None,
            };
            let Some((key, value)) = next else {
                return Ok(self.close());
            };
            let path = format!("{}/{}", top.path, key);

            match self.classify(key, &path)? {
                KeyRole::Attribute | KeyRole::Namespace => continue,
                role @ (KeyRole::Text | KeyRole::Cdata) => match character_data(value, &path)? {
                    Some(text) if !text.is_empty() => {
                        check_chars(&text, &path)?;
                        self.text = text;
                        return Ok(if role == KeyRole::Text {
                            XmlEvent::Characters
                        } else {
                            XmlEvent::CData
                        });
                    }
                    _ => {
                        trace!(path = %path, "Skipping empty character data");
                        continue;
                    }
                },
                KeyRole::Element => match value {
                    Value::Array(items) if items.is_empty() => {
                        trace!(path = %path, "Skipping empty sequence");
                        continue;
                    }
                    Value::Array(items) => {
                        if let Some(top) = self.stack.last_mut() {
                            top.array = Some(ArrayCursor {
                                key,
                                items: items.iter(),
                                index: 0,
                            });
                        }
                        continue;
                    }
                    _ => {
                        if self.enter(key, value, path, false)? {
                            return Ok(XmlEvent::StartElement);
                        }
                    }
                },
            }
        }
    }

    /// Pushes a frame for `key` holding `value`. Returns false when a null
    /// value is skipped under [`NullPolicy::Ignore`].
    fn enter(&mut self, key: &'t str, value: &'t Value, path: String, root: bool) -> Result<bool> {
        let entries = match value {
            Value::Object(map) => Entries::Map(map.iter()),
            Value::Array(_) => {
                return Err(BadgerFishError::structural(
                    path,
                    "a sequence cannot contain another sequence",
                ));
            }
            Value::Null if !root && self.config.null_policy == NullPolicy::Ignore => {
                trace!(path = %path, "Skipping null element");
                return Ok(false);
            }
            Value::Null => Entries::Empty,
            scalar => Entries::Text(Some(scalar)),
        };
        self.check_name(key, &path)?;

        let (attributes, declarations) = match value {
            Value::Object(map) => self.collect_attributes(map, &path)?,
            _ => (Vec::new(), Vec::new()),
        };

        self.stack.push(Frame {
            key,
            path,
            entries,
            array: None,
            attributes,
            declarations,
            resolved: OnceCell::new(),
        });
        Ok(true)
    }

    fn close(&mut self) -> XmlEvent {
        if let Some(index) = self.stack.len().checked_sub(1) {
            self.resolved(index);
            self.emitted.get_mut().pop_frame();
        }
        self.ended = self.stack.pop();
        XmlEvent::EndElement
    }

    #[allow(clippy::type_complexity)]
    fn collect_attributes(
        &self,
        map: &'t Map<String, Value>,
        path: &str,
    ) -> Result<(Vec<(&'t str, Cow<'t, str>)>, Vec<(&'t str, &'t str)>)> {
        let mut attributes = Vec::new();
        let mut declarations = Vec::new();

        for (key, value) in map {
            match self.classify(key, path)? {
                KeyRole::Attribute => {
                    let name = &key[self.config.attribute_prefix.len()..];
                    let attr_path = format!("{}/{}", path, key);
                    let (prefix, local) = self.config.split_name(name);
                    if prefix == XMLNS_PREFIX {
                        let uri = value.as_str().ok_or_else(|| {
                            BadgerFishError::structural(&attr_path, "namespace URI must be a string")
                        })?;
                        self.check_prefix(local, &attr_path)?;
                        declarations.push((local, uri));
                        continue;
                    }
                    self.check_name(name, &attr_path)?;
                    match value {
                        Value::Null => trace!(path = %attr_path, "Omitting null attribute"),
                        Value::Array(_) | Value::Object(_) => {
                            return Err(BadgerFishError::structural(
                                attr_path,
                                format!("attribute value must be a scalar, found {}", value_kind(value)),
                            ));
                        }
                        scalar => {
                            if let Some(text) = scalar_text(scalar) {
                                check_chars(&text, &attr_path)?;
                                attributes.push((name, text));
                            }
                        }
                    }
                }
                KeyRole::Namespace => {
                    let ns_path = format!("{}/{}", path, key);
                    self.collect_declarations(value, &ns_path, &mut declarations)?;
                }
                _ => {}
            }
        }
        Ok((attributes, declarations))
    }

    fn collect_declarations(
        &self,
        value: &'t Value,
        path: &str,
        declarations: &mut Vec<(&'t str, &'t str)>,
    ) -> Result<()> {
        match value {
            Value::Null => {}
            Value::String(uri) => declarations.push(("", uri.as_str())),
            Value::Object(bindings) => {
                for (prefix, uri) in bindings {
                    let uri = uri.as_str().ok_or_else(|| {
                        BadgerFishError::structural(
                            format!("{}/{}", path, prefix),
                            "namespace URI must be a string",
                        )
                    })?;
                    let prefix = if *prefix == self.config.text_key {
                        ""
                    } else {
                        prefix.as_str()
                    };
                    match prefix {
                        XML_PREFIX => {}
                        XMLNS_PREFIX => {
                            return Err(BadgerFishError::structural(
                                path,
                                "the xmlns prefix cannot be declared",
                            ));
                        }
                        _ => {
                            if !prefix.is_empty() {
                                self.check_prefix(prefix, &format!("{}/{}", path, prefix))?;
                            }
                            declarations.push((prefix, uri));
                        }
                    }
                }
            }
            other => {
                return Err(BadgerFishError::structural(
                    path,
                    format!(
                        "namespace declarations must be a mapping or a string, found {}",
                        value_kind(other)
                    ),
                ));
            }
        }
        Ok(())
    }

    fn classify(&self, key: &str, path: &str) -> Result<KeyRole> {
        if key.is_empty() {
            return Err(BadgerFishError::structural(
                path,
                "empty keys cannot be mapped to XML",
            ));
        }
        self.config.classify_key(key)
    }

    fn check_name(&self, name: &str, path: &str) -> Result<()> {
        let separator = self.config.namespace_separator.as_str();
        let (prefix, local) = self.config.split_name(name);
        let malformed = !is_ncname(local)
            || local.contains(separator)
            || (name.contains(separator) && !is_ncname(prefix))
            || prefix == XMLNS_PREFIX;
        if malformed {
            return Err(BadgerFishError::structural(
                path,
                format!("'{}' is not a valid qualified name", name),
            ));
        }
        Ok(())
    }

    fn check_prefix(&self, prefix: &str, path: &str) -> Result<()> {
        if is_ncname(prefix) && !prefix.contains(self.config.namespace_separator.as_str()) {
            Ok(())
        } else {
            Err(BadgerFishError::structural(
                path,
                format!("'{}' is not a valid namespace prefix", prefix),
            ))
        }
    }

    fn resolved(&self, index: usize) -> &ResolvedElement {
        self.stack[index]
            .resolved
            .get_or_init(|| self.resolve_frame(index))
    }

    /// Resolves frame `index`, whose ancestors must already be resolved.
    fn resolve_frame(&self, index: usize) -> ResolvedElement {
        if index > 0 {
            self.resolved(index - 1);
        }
        let frame = &self.stack[index];
        let source = SourceScope {
            frames: &self.stack[..=index],
            config: self.config,
        };
        let mut resolver = self.resolver.borrow_mut();
        let mut emitted = self.emitted.borrow_mut();
        emitted.push_frame();

        for (prefix, uri) in &frame.declarations {
            let name = resolver.resolve(prefix, uri, &*emitted);
            if !emitted.declares(&name, uri) {
                emitted.declare(name, *uri);
            }
        }

        let name = qualify(self.config, frame.key, true, &source, &mut emitted, &mut resolver);
        let mut attributes = Vec::with_capacity(frame.attributes.len());
        for (attribute, _) in &frame.attributes {
            attributes.push(qualify(
                self.config,
                attribute,
                false,
                &source,
                &mut emitted,
                &mut resolver,
            ));
        }

        ResolvedElement {
            name,
            attributes,
            namespaces: emitted.innermost().to_vec(),
        }
    }

    fn current(&self, operation: &'static str) -> Result<&ResolvedElement> {
        match (self.event, self.stack.len().checked_sub(1)) {
            (XmlEvent::StartElement, Some(index)) => Ok(self.resolved(index)),
            (event, _) => Err(BadgerFishError::usage(operation, event)),
        }
    }
}

/// Resolves one element or attribute name, declaring the emitted prefix in
/// the innermost frame of `emitted` when it is not yet in scope.
fn qualify(
    config: &BadgerFishConfig,
    key: &str,
    element: bool,
    source: &SourceScope<'_, '_>,
    emitted: &mut NamespaceScope,
    resolver: &mut PrefixResolver<'_>,
) -> QName {
    let (prefix, local) = config.split_name(key);
    if prefix.is_empty() && !element {
        return QName::local(local);
    }

    let uri = source.lookup(prefix).unwrap_or("");
    if uri.is_empty() {
        let inherited_default = emitted.lookup("").is_some_and(|bound| !bound.is_empty());
        if prefix.is_empty() && inherited_default {
            emitted.declare("", "");
        }
        return QName::new("", prefix, local);
    }

    let name = resolver.resolve(prefix, uri, &*emitted);
    if name != XML_PREFIX && emitted.lookup(&name) != Some(uri) {
        emitted.declare(name.clone(), uri);
    }
    QName::new(uri, name, local)
}

/// Bindings declared in the tree, falling back to configured bindings.
struct SourceScope<'a, 't> {
    frames: &'a [Frame<'t>],
    config: &'t BadgerFishConfig,
}

impl NamespaceContext for SourceScope<'_, '_> {
    fn lookup(&self, prefix: &str) -> Option<&str> {
        if prefix == XML_PREFIX {
            return Some(XML_NAMESPACE);
        }
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.declarations.iter().rev())
            .find(|(declared, _)| *declared == prefix)
            .map(|(_, uri)| *uri)
            .or_else(|| self.config.resolve_uri(prefix))
    }
}

fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

/// Stringifies a text or CDATA value. Sequences are concatenated in order
/// and null contributes nothing.
fn character_data<'t>(value: &'t Value, path: &str) -> Result<Option<Cow<'t, str>>> {
    match value {
        Value::Null => Ok(None),
        Value::Array(segments) => {
            let mut joined = String::new();
            for (index, segment) in segments.iter().enumerate() {
                match segment {
                    Value::Array(_) | Value::Object(_) => {
                        return Err(BadgerFishError::structural(
                            format!("{}[{}]", path, index),
                            "character data segments must be scalars",
                        ));
                    }
                    other => {
                        if let Some(text) = scalar_text(other) {
                            joined.push_str(&text);
                        }
                    }
                }
            }
            Ok(Some(Cow::Owned(joined)))
        }
        Value::Object(_) => Err(BadgerFishError::structural(
            path,
            "character data must be a scalar or a sequence of scalars",
        )),
        scalar => Ok(scalar_text(scalar)),
    }
}

/// Rejects characters that cannot appear in an XML document.
fn check_chars(text: &str, path: &str) -> Result<()> {
    match find_illegal_char(text) {
        Some(c) => Err(BadgerFishError::structural(
            path,
            format!("illegal XML character U+{:04X}", c as u32),
        )),
        None => Ok(()),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

impl XmlStreamReader for TreeReader<'_> {
    fn event(&self) -> XmlEvent {
        self.event
    }

    fn has_next(&self) -> bool {
        self.event != XmlEvent::EndDocument
    }

    fn next(&mut self) -> Result<XmlEvent> {
        self.ended = None;
        self.text = Cow::Borrowed("");
        self.event = match self.event {
            XmlEvent::EndDocument => {
                return Err(BadgerFishError::usage("next", XmlEvent::EndDocument));
            }
            XmlEvent::StartDocument => self.start_root()?,
            _ => self.advance()?,
        };
        Ok(self.event)
    }

    fn name(&self) -> Result<&QName> {
        match self.event {
            XmlEvent::StartElement => Ok(&self.current("name")?.name),
            XmlEvent::EndElement => self
                .ended
                .as_ref()
                .and_then(|frame| frame.resolved.get())
                .map(|resolved| &resolved.name)
                .ok_or_else(|| BadgerFishError::usage("name", XmlEvent::EndElement)),
            other => Err(BadgerFishError::usage("name", other)),
        }
    }

    fn attribute_count(&self) -> Result<usize> {
        Ok(self.current("attribute_count")?.attributes.len())
    }

    fn attribute_name(&self, index: usize) -> Result<&QName> {
        self.current("attribute_name")?
            .attributes
            .get(index)
            .ok_or_else(|| BadgerFishError::usage("attribute_name", self.event))
    }

    fn attribute_value(&self, index: usize) -> Result<&str> {
        self.current("attribute_value")?;
        self.stack
            .last()
            .and_then(|frame| frame.attributes.get(index))
            .map(|(_, value)| value.as_ref())
            .ok_or_else(|| BadgerFishError::usage("attribute_value", self.event))
    }

    fn namespace_count(&self) -> Result<usize> {
        Ok(self.current("namespace_count")?.namespaces.len())
    }

    fn namespace_prefix(&self, index: usize) -> Result<&str> {
        self.current("namespace_prefix")?
            .namespaces
            .get(index)
            .map(|(prefix, _)| prefix.as_str())
            .ok_or_else(|| BadgerFishError::usage("namespace_prefix", self.event))
    }

    fn namespace_uri(&self, index: usize) -> Result<&str> {
        self.current("namespace_uri")?
            .namespaces
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
        Some(self.config.xml_version.as_str())
    }

    fn encoding(&self) -> Option<&str> {
        Some(self.config.encoding.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn events(tree: &Value, config: &BadgerFishConfig) -> Result<Vec<String>> {
        let mut reader = TreeReader::new(tree, config);
        let mut out = Vec::new();
        while reader.has_next() {
            let event = reader.next()?;
            out.push(match event {
                XmlEvent::StartElement => {
                    let mut line = format!("<{}", reader.name()?.qualified());
                    for i in 0..reader.namespace_count()? {
                        line.push_str(&format!(
                            " ns({}={})",
                            reader.namespace_prefix(i)?,
                            reader.namespace_uri(i)?
                        ));
                    }
                    for i in 0..reader.attribute_count()? {
                        line.push_str(&format!(
                            " {}={}",
                            reader.attribute_name(i)?.qualified(),
                            reader.attribute_value(i)?
                        ));
                    }
                    line
                }
                XmlEvent::Characters => format!("text:{}", reader.text()?),
                XmlEvent::CData => format!("cdata:{}", reader.text()?),
                XmlEvent::EndElement => format!("</{}", reader.name()?.qualified()),
                XmlEvent::EndDocument => "end".to_string(),
                XmlEvent::StartDocument => "start".to_string(),
            });
        }
        Ok(out)
    }

    #[test]
    fn test_scenario_event_sequence() {
        let config = BadgerFishConfig::default();
        let tree = json!({"root": {"@id": "1", "child": [{"$": "a"}, {"$": "b"}]}});
        assert_eq!(
            events(&tree, &config).unwrap(),
            vec![
                "<root id=1",
                "<child",
                "text:a",
                "</child",
                "<child",
                "text:b",
                "</child",
                "</root",
                "end"
            ]
        );
    }

    #[test]
    fn test_starts_on_start_document() {
        let config = BadgerFishConfig::default();
        let tree = json!({"root": null});
        let mut reader = TreeReader::new(&tree, &config);
        assert_eq!(reader.event(), XmlEvent::StartDocument);
        assert!(reader.has_next());
        assert_eq!(reader.version(), Some("1.0"));
    }

    #[test]
    fn test_scalars_become_text_elements() {
        let config = BadgerFishConfig::default();
        let tree = json!({"r": {"n": 42, "b": true}});
        assert_eq!(
            events(&tree, &config).unwrap(),
            vec!["<r", "<n", "text:42", "</n", "<b", "text:true", "</b", "</r", "end"]
        );
    }

    #[test]
    fn test_null_policy() {
        let tree = json!({"r": {"a": null, "b": {}}});

        let ignore = BadgerFishConfig::default();
        assert_eq!(
            events(&tree, &ignore).unwrap(),
            vec!["<r", "<b", "</b", "</r", "end"]
        );

        let empty = BadgerFishConfig::builder()
            .null_as_empty_element(true)
            .build()
            .unwrap();
        assert_eq!(
            events(&tree, &empty).unwrap(),
            vec!["<r", "<a", "</a", "<b", "</b", "</r", "end"]
        );
    }

    #[test]
    fn test_text_and_cdata_keys() {
        let config = BadgerFishConfig::default();
        let tree = json!({"r": {"$": ["x", 1, null, "y"], "#": "<raw>"}});
        assert_eq!(
            events(&tree, &config).unwrap(),
            vec!["<r", "text:x1y", "cdata:<raw>", "</r", "end"]
        );
    }

    #[test]
    fn test_empty_sequence_is_skipped() {
        let config = BadgerFishConfig::default();
        let tree = json!({"r": {"a": [], "b": "x"}});
        assert_eq!(
            events(&tree, &config).unwrap(),
            vec!["<r", "<b", "text:x", "</b", "</r", "end"]
        );
    }

    #[test]
    fn test_sequence_of_sequences_is_rejected() {
        let config = BadgerFishConfig::default();
        let tree = json!({"r": {"a": [{"$": "ok"}, ["nested"]]}});
        let err = events(&tree, &config).unwrap_err();
        match err {
            BadgerFishError::Structural { path, .. } => assert_eq!(path, "r/a[1]"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_root_must_be_single_key() {
        let config = BadgerFishConfig::default();
        assert!(events(&json!({"a": {}, "b": {}}), &config).is_err());
        assert!(events(&json!({}), &config).is_err());
        assert!(events(&json!("text"), &config).is_err());
        assert!(events(&json!({"r": [1, 2]}), &config).is_err());
    }

    #[test]
    fn test_root_element_override_wraps_tree() {
        let config = BadgerFishConfig::builder().root_element("doc").build().unwrap();
        let tree = json!({"a": "1", "b": "2"});
        assert_eq!(
            events(&tree, &config).unwrap(),
            vec!["<doc", "<a", "text:1", "</a", "<b", "text:2", "</b", "</doc", "end"]
        );
    }

    #[test]
    fn test_attribute_value_must_be_scalar() {
        let config = BadgerFishConfig::default();
        let tree = json!({"r": {"@bad": {"x": 1}}});
        let err = events(&tree, &config).unwrap_err();
        assert!(err.to_string().contains("r/@bad"));
    }

    #[test]
    fn test_usage_errors() {
        let config = BadgerFishConfig::default();
        let tree = json!({"r": {"$": "x"}});
        let mut reader = TreeReader::new(&tree, &config);
        assert!(matches!(reader.name(), Err(BadgerFishError::Usage { .. })));
        reader.next().unwrap();
        assert!(matches!(reader.text(), Err(BadgerFishError::Usage { .. })));
        reader.next().unwrap();
        assert!(matches!(reader.attribute_count(), Err(BadgerFishError::Usage { .. })));
        reader.next().unwrap();
        reader.next().unwrap();
        assert_eq!(reader.event(), XmlEvent::EndDocument);
        assert!(!reader.has_next());
        assert!(matches!(reader.next(), Err(BadgerFishError::Usage { .. })));
    }

    #[test]
    fn test_declared_namespaces_are_emitted() {
        let config = BadgerFishConfig::default();
        let tree = json!({"a:r": {"@xmlns": {"a": "urn:a", "$": "urn:d"}, "c": {}}});
        assert_eq!(
            events(&tree, &config).unwrap(),
            vec!["<a:r ns(a=urn:a) ns(=urn:d)", "<c", "</c", "</a:r", "end"]
        );
    }

    #[test]
    fn test_shadowed_prefix_is_rewritten() {
        let config = BadgerFishConfig::default();
        let tree = json!({
            "a:r": {
                "@xmlns": {"a": "urn:x"},
                "a:c": {"@xmlns": {"a": "urn:y"}, "@a:id": "7"}
            }
        });
        assert_eq!(
            events(&tree, &config).unwrap(),
            vec![
                "<a:r ns(a=urn:x)",
                "<a1:c ns(a1=urn:y) a1:id=7",
                "</a1:c",
                "</a:r",
                "end"
            ]
        );
    }

    #[test]
    fn test_configured_prefix_is_declared_on_use() {
        let config = BadgerFishConfig::builder()
            .namespace("atom", "http://www.w3.org/2005/Atom")
            .build()
            .unwrap();
        let tree = json!({"atom:feed": {"atom:title": "t"}});
        assert_eq!(
            events(&tree, &config).unwrap(),
            vec![
                "<atom:feed ns(atom=http://www.w3.org/2005/Atom)",
                "<atom:title",
                "text:t",
                "</atom:title",
                "</atom:feed",
                "end"
            ]
        );
    }

    #[test]
    fn test_unbound_prefix_passes_through() {
        let config = BadgerFishConfig::default();
        let tree = json!({"u:r": {}});
        let mut reader = TreeReader::new(&tree, &config);
        reader.next().unwrap();
        let name = reader.name().unwrap();
        assert_eq!(name.prefix, "u");
        assert_eq!(name.namespace_uri, "");
        assert_eq!(reader.namespace_count().unwrap(), 0);
    }

    #[test]
    fn test_malformed_qualified_name() {
        let config = BadgerFishConfig::default();
        assert!(events(&json!({"r": {":x": {}}}), &config).is_err());
        assert!(events(&json!({"r": {"a:": {}}}), &config).is_err());
    }

    #[test]
    fn test_configured_prefix_clash_on_same_element() {
        let config = BadgerFishConfig::builder()
            .namespace("atom", "urn:X")
            .build()
            .unwrap();
        let tree = json!({
            "atom:feed": {"@xmlns": {"atom": "urn:Y", "a": "urn:X"}, "@a:attr": "1"}
        });
        assert_eq!(
            events(&tree, &config).unwrap(),
            vec![
                "<atom:feed ns(atom=urn:Y) ns(a=urn:X) a:attr=1",
                "</atom:feed",
                "end"
            ]
        );
    }

    #[test]
    fn test_invalid_xml_names_are_rejected() {
        let config = BadgerFishConfig::default();
        for key in ["a b", "1x", "x<y", "p:1x", "1p:x"] {
            let tree = json!({"r": {key: {}}});
            match events(&tree, &config).unwrap_err() {
                BadgerFishError::Structural { path, .. } => assert_eq!(path, format!("r/{}", key)),
                other => panic!("unexpected error for {key}: {other}"),
            }
        }
        let tree = json!({"r": {"@a b": "1"}});
        assert!(matches!(
            events(&tree, &config),
            Err(BadgerFishError::Structural { ref path, .. }) if path == "r/@a b"
        ));
        let tree = json!({"r": {"@xmlns": {"1p": "urn:a"}}});
        assert!(matches!(
            events(&tree, &config),
            Err(BadgerFishError::Structural { .. })
        ));
    }

    #[test]
    fn test_illegal_characters_are_rejected() {
        let config = BadgerFishConfig::default();
        let cases = [
            (json!({"r": {"$": "a\u{0}b"}}), "r/$"),
            (json!({"r": {"#": "\u{1}"}}), "r/#"),
            (json!({"r": {"@id": "a\u{0}b"}}), "r/@id"),
            (json!({"r": {"c": "\u{FFFF}"}}), "r/c/$"),
        ];
        for (tree, expected) in cases {
            match events(&tree, &config).unwrap_err() {
                BadgerFishError::Structural { path, .. } => assert_eq!(path, expected),
                other => panic!("unexpected error: {other}"),
            }
        }
        let tree = json!({"r": {"$": "tab\tand\nnewline"}});
        assert!(events(&tree, &config).is_ok());
    }

    #[test]
    fn test_depth_tracks_nesting() {
        let config = BadgerFishConfig::default();
        let tree = json!({"r": {"a": {"b": {}}}});
        let mut reader = TreeReader::new(&tree, &config);
        let mut max_depth = 0;
        while reader.has_next() {
            reader.next().unwrap();
            max_depth = max_depth.max(reader.depth());
        }
        assert_eq!(max_depth, 3);
        assert_eq!(reader.depth(), 0);
    }
}
