//! Generic event copy loop.

use tracing::trace;

use crate::error::Result;
use crate::stream::{XmlStreamReader, XmlStreamWriter};

/// Copies every event from `reader` into `writer`.
///
/// `has_next` runs one step behind the current event, so the final event
/// (`EndDocument`) is copied after the loop. The first error from either
/// side aborts the copy.
pub fn pipe<R, W>(reader: &mut R, writer: &mut W) -> Result<()>
where
    R: XmlStreamReader,
    W: XmlStreamWriter + ?Sized,
{
    let mut events = 0usize;
    while reader.has_next() {
        writer.copy_event(&*reader)?;
        reader.next()?;
        events += 1;
    }
    writer.copy_event(&*reader)?;
    trace!(events, "Piped XML events");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BadgerFishConfig;
    use crate::tree::{TreeReader, TreeWriter};
    use serde_json::json;

    #[test]
    fn test_tree_to_tree_pipe() {
        let config = BadgerFishConfig::default();
        let tree = json!({"r": {"@a": "1", "x": [{"$": "1"}, {"#": "2"}], "y": {}}});
        let mut reader = TreeReader::new(&tree, &config);
        let mut writer = TreeWriter::new(&config);
        pipe(&mut reader, &mut writer).unwrap();
        assert_eq!(writer.finish().unwrap(), tree);
    }

    #[test]
    fn test_pipe_aborts_on_reader_error() {
        let config = BadgerFishConfig::default();
        let tree = json!({"r": {"x": [[1]]}});
        let mut reader = TreeReader::new(&tree, &config);
        let mut writer = TreeWriter::new(&config);
        assert!(pipe(&mut reader, &mut writer).is_err());
    }
}
