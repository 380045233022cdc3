//! Tree adapters.
//!
//! [`TreeReader`] walks a tree as a pull source of XML events and
//! [`TreeWriter`] builds a tree from pushed XML events. Both follow the
//! naming rules of one [`crate::BadgerFishConfig`].

mod reader;
mod writer;

pub use reader::TreeReader;
pub use writer::TreeWriter;

/// The in-memory tree exchanged with callers.
pub type TreeValue = serde_json::Value;
