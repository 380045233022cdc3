//! Namespace scoping and prefix conflict resolution.
//!
//! [`NamespaceScope`] tracks in-scope declarations while a document is
//! streamed. [`PrefixResolver`] decides which prefix is emitted for a
//! `(prefix, uri)` pair when a tree is turned into XML, and remembers each
//! decision for the rest of the conversion.

use tracing::debug;

use crate::config::BadgerFishConfig;

/// The namespace permanently bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

pub const XML_PREFIX: &str = "xml";

/// Attribute name (and prefix) used for namespace declarations.
pub const XMLNS_PREFIX: &str = "xmlns";

/// Read access to a set of in-scope prefix bindings.
pub trait NamespaceContext {
    /// Returns the URI bound to `prefix`, innermost declaration first.
    ///
    /// The empty prefix denotes the default namespace.
    fn lookup(&self, prefix: &str) -> Option<&str>;
}

/// A stack of namespace declaration frames, one per open element.
#[derive(Debug, Default, Clone)]
pub struct NamespaceScope {
    frames: Vec<Vec<(String, String)>>,
}

impl NamespaceScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a frame for a new element.
    pub fn push_frame(&mut self) {
        self.frames.push(Vec::new());
    }

    /// Closes the innermost frame, dropping its declarations.
    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Declares `prefix` in the innermost frame.
    pub fn declare(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        if self.frames.is_empty() {
            self.frames.push(Vec::new());
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.push((prefix.into(), uri.into()));
        }
    }

    /// Checks if the innermost frame already declares `prefix` as `uri`.
    pub fn declares(&self, prefix: &str, uri: &str) -> bool {
        self.innermost()
            .iter()
            .any(|(declared, bound)| declared == prefix && bound == uri)
    }

    /// Declarations of the innermost frame, in declaration order.
    pub fn innermost(&self) -> &[(String, String)] {
        self.frames.last().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl NamespaceContext for NamespaceScope {
    fn lookup(&self, prefix: &str) -> Option<&str> {
        if prefix == XML_PREFIX {
            return Some(XML_NAMESPACE);
        }
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .find(|(declared, _)| declared == prefix)
            .map(|(_, uri)| uri.as_str())
    }
}

#[derive(Debug, Clone)]
struct Rewrite {
    prefix: String,
    uri: String,
    emitted: String,
}

/// Per-conversion memo of emitted prefixes.
///
/// Entries are kept in first-encounter order, so synthesized prefixes are
/// reproducible for the same input.
#[derive(Debug)]
pub struct PrefixResolver<'c> {
    config: &'c BadgerFishConfig,
    table: Vec<Rewrite>,
}

impl<'c> PrefixResolver<'c> {
    pub fn new(config: &'c BadgerFishConfig) -> Self {
        Self {
            config,
            table: Vec::new(),
        }
    }

    /// Returns the prefix to emit for `prefix` bound to `uri`.
    ///
    /// `ambient` holds the bindings already emitted by enclosing elements
    /// and by the element being resolved. A configured prefix bound there to
    /// another URI is not used.
    pub fn resolve(&mut self, prefix: &str, uri: &str, ambient: &dyn NamespaceContext) -> String {
        if prefix == XML_PREFIX || uri == XML_NAMESPACE || uri.is_empty() {
            return prefix.to_string();
        }

        if let Some(entry) = self
            .table
            .iter()
            .find(|entry| entry.prefix == prefix && entry.uri == uri)
        {
            return entry.emitted.clone();
        }

        if let Some(configured) = self.config.resolve_prefix(uri) {
            if configured != prefix && !self.conflicts(configured, uri, ambient) {
                debug!(prefix, uri, emitted = configured, "Using configured namespace prefix");
                return self.record(prefix, uri, configured.to_string());
            }
        }

        if !prefix.is_empty() && self.conflicts(prefix, uri, ambient) {
            let emitted = (1usize..)
                .map(|n| format!("{}{}", prefix, n))
                .find(|candidate| ambient.lookup(candidate).is_none() && !self.claimed(candidate))
                .unwrap_or_else(|| prefix.to_string());
            debug!(prefix, uri, emitted = %emitted, "Rewrote conflicting namespace prefix");
            return self.record(prefix, uri, emitted);
        }

        self.record(prefix, uri, prefix.to_string())
    }

    /// Number of recorded pairs.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn conflicts(&self, prefix: &str, uri: &str, ambient: &dyn NamespaceContext) -> bool {
        if ambient.lookup(prefix).is_some_and(|bound| bound != uri) {
            return true;
        }
        self.table
            .iter()
            .any(|entry| entry.emitted == prefix && entry.uri != uri)
    }

    fn claimed(&self, candidate: &str) -> bool {
        self.table.iter().any(|entry| entry.emitted == candidate)
    }

    fn record(&mut self, prefix: &str, uri: &str, emitted: String) -> String {
        self.table.push(Rewrite {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
            emitted: emitted.clone(),
        });
        emitted
    }
}
