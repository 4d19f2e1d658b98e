//! File reading and YAML/JSON document decoding.

use opcheck_common::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;
use walkdir::DirEntry;

/// Read `path` and decode its first document.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|e| Error::File {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    decode_first(&text).map_err(|e| Error::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Decode the first document of a YAML (or JSON) stream.
pub fn decode_first<T: DeserializeOwned>(text: &str) -> std::result::Result<T, serde_yaml::Error> {
    match serde_yaml::Deserializer::from_str(text).next() {
        Some(doc) => T::deserialize(doc),
        None => serde_yaml::from_str(text),
    }
}

/// `kind` of a generic document, empty when unset.
pub fn kind_of(doc: &Value) -> &str {
    doc.get("kind").and_then(Value::as_str).unwrap_or_default()
}

pub fn is_hidden_name(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Hidden entries below the walk root.
pub fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && is_hidden_name(entry.file_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_first_of_many() {
        let doc: Value = decode_first("kind: A\n---\nkind: B\n").unwrap();
        assert_eq!(kind_of(&doc), "A");
    }

    #[test]
    fn test_decode_json() {
        let doc: Value = decode_first(r#"{"kind": "ClusterServiceVersion"}"#).unwrap();
        assert_eq!(kind_of(&doc), "ClusterServiceVersion");
    }

    #[test]
    fn test_read_missing_file_is_io() {
        let err = read_document::<Value>(Path::new("/nonexistent/opcheck.yaml")).unwrap_err();
        assert!(err.is_io());
    }
}
