//! quick-xml adapters for the streaming capability traits.
//!
//! [`XmlTextReader`] parses XML text into [`crate::XmlEvent`]s and
//! [`XmlTextWriter`] serializes them back. Either side can be paired with a
//! tree adapter through [`crate::pipe()`]:
//!
//! - **Decode**: `XmlTextReader` → pipe → [`crate::TreeWriter`]
//! - **Encode**: [`crate::TreeReader`] → pipe → `XmlTextWriter`
//!
//! ## Mapping
//!
//! ```xml
//! <root id="1"><child>a</child><child>b</child></root>
//! ```
//!
//! corresponds to
//!
//! ```json
//! {"root": {"@id": "1", "child": [{"$": "a"}, {"$": "b"}]}}
//! ```

mod reader;
pub(crate) mod utils;
mod writer;

pub use reader::XmlTextReader;
pub use writer::XmlTextWriter;
