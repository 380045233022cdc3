//! JSON wrapper functions for trees.
//!
//! Thin wrappers around `serde_json` so callers of the codec layer get the
//! crate's error type. Keys keep their document order (`preserve_order`).

use crate::error::Result;
use crate::tree::TreeValue;

/// Parses a tree from a JSON string.
///
/// # Examples
///
/// ```rust
/// use helios_badgerfish::json::from_json_str;
///
/// let tree = from_json_str(r#"{"root": {"$": "x"}}"#).unwrap();
/// assert_eq!(tree["root"]["$"], "x");
/// ```
pub fn from_json_str(s: &str) -> Result<TreeValue> {
    Ok(serde_json::from_str(s)?)
}

/// Parses a tree from a JSON byte slice.
pub fn from_json_slice(bytes: &[u8]) -> Result<TreeValue> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Serializes a tree to a compact JSON string.
pub fn to_json_string(tree: &TreeValue) -> Result<String> {
    Ok(serde_json::to_string(tree)?)
}

/// Serializes a tree to a pretty-printed JSON string.
pub fn to_json_string_pretty(tree: &TreeValue) -> Result<String> {
    Ok(serde_json::to_string_pretty(tree)?)
}

/// Serializes a tree to a JSON byte vector.
pub fn to_json_vec(tree: &TreeValue, pretty: bool) -> Result<Vec<u8>> {
    if pretty {
        Ok(serde_json::to_vec_pretty(tree)?)
    } else {
        Ok(serde_json::to_vec(tree)?)
    }
}
