//! Typed decomposition of the composite identifiers carried by shard
//! results.
//!
//! Vector matches are keyed by a slash-delimited composite id in one of two
//! historical layouts, distinguished by segment count:
//!
//! ```text
//! rid/field_type/field/chunk_index/start-end            (no subfield)
//! rid/field_type/field/subfield/chunk_index/start-end   (with subfield)
//! ```
//!
//! Parsing validates the layout once and yields a structured key; the rest
//! of the merge path never counts delimiters again.

use std::fmt;

use serde::{Deserialize, Serialize};

use kestrel_common::error::{SearchError, SearchResult};

/// The `field_type`/`field` tail of a document or paragraph field path
/// such as `/t/title` (leading empty segment discarded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPath {
    pub field_type: String,
    pub field: String,
}

impl FieldPath {
    pub fn parse(raw: &str) -> SearchResult<Self> {
        let parts: Vec<&str> = raw.split('/').collect();
        match parts.as_slice() {
            ["", field_type, field] => Ok(Self {
                field_type: (*field_type).to_owned(),
                field: (*field).to_owned(),
            }),
            _ => Err(SearchError::InvalidKey(format!(
                "field path {raw:?} must have exactly 3 slash-delimited segments"
            ))),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.field_type, self.field)
    }
}

/// Validated composite identifier of a vector match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorKey {
    pub rid: String,
    pub field_type: String,
    pub field: String,
    pub subfield: Option<String>,
    pub chunk_index: u32,
    /// Character span within the chunk.
    pub start: u32,
    pub end: u32,
}

impl VectorKey {
    /// Parse a raw composite id, accepting both the 4-delimiter (no
    /// subfield) and 5-delimiter (subfield) layouts.
    pub fn parse(raw: &str) -> SearchResult<Self> {
        let parts: Vec<&str> = raw.split('/').collect();
        let (rid, field_type, field, subfield, index, span) = match parts.as_slice() {
            [rid, field_type, field, index, span] => {
                (*rid, *field_type, *field, None, *index, *span)
            }
            [rid, field_type, field, subfield, index, span] => (
                *rid,
                *field_type,
                *field,
                Some((*subfield).to_owned()),
                *index,
                *span,
            ),
            _ => {
                return Err(SearchError::InvalidKey(format!(
                    "vector key {raw:?} must have 4 or 5 slash delimiters"
                )))
            }
        };

        let chunk_index: u32 = index.parse().map_err(|_| {
            SearchError::InvalidKey(format!("vector key {raw:?}: bad chunk index {index:?}"))
        })?;
        let (start, end) = span.split_once('-').ok_or_else(|| {
            SearchError::InvalidKey(format!("vector key {raw:?}: bad span {span:?}"))
        })?;
        let start: u32 = start.parse().map_err(|_| {
            SearchError::InvalidKey(format!("vector key {raw:?}: bad span start {start:?}"))
        })?;
        let end: u32 = end.parse().map_err(|_| {
            SearchError::InvalidKey(format!("vector key {raw:?}: bad span end {end:?}"))
        })?;

        Ok(Self {
            rid: rid.to_owned(),
            field_type: field_type.to_owned(),
            field: field.to_owned(),
            subfield,
            chunk_index,
            start,
            end,
        })
    }
}

impl fmt::Display for VectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subfield {
            Some(subfield) => write!(
                f,
                "{}/{}/{}/{}/{}/{}-{}",
                self.rid, self.field_type, self.field, subfield, self.chunk_index, self.start, self.end
            ),
            None => write!(
                f,
                "{}/{}/{}/{}/{}-{}",
                self.rid, self.field_type, self.field, self.chunk_index, self.start, self.end
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path_parse() {
        let path = FieldPath::parse("/t/title").unwrap();
        assert_eq!(path.field_type, "t");
        assert_eq!(path.field, "title");
        assert_eq!(path.to_string(), "/t/title");
    }

    #[test]
    fn test_field_path_rejects_wrong_arity() {
        assert!(FieldPath::parse("t/title").is_err());
        assert!(FieldPath::parse("/t/title/extra").is_err());
        assert!(FieldPath::parse("").is_err());
    }

    #[test]
    fn test_vector_key_without_subfield() {
        let key = VectorKey::parse("r1/f/file/3/10-25").unwrap();
        assert_eq!(key.rid, "r1");
        assert_eq!(key.field_type, "f");
        assert_eq!(key.field, "file");
        assert_eq!(key.subfield, None);
        assert_eq!(key.chunk_index, 3);
        assert_eq!((key.start, key.end), (10, 25));
    }

    #[test]
    fn test_vector_key_with_subfield() {
        let key = VectorKey::parse("r1/f/file/page2/3/10-25").unwrap();
        assert_eq!(key.subfield.as_deref(), Some("page2"));
        assert_eq!(key.chunk_index, 3);
    }

    #[test]
    fn test_vector_key_roundtrips_through_display() {
        for raw in ["r1/f/file/3/10-25", "r1/f/file/page2/3/10-25"] {
            let key = VectorKey::parse(raw).unwrap();
            assert_eq!(key.to_string(), raw);
        }
    }

    #[test]
    fn test_vector_key_rejects_wrong_segment_count() {
        assert!(VectorKey::parse("r1/f/file").is_err());
        assert!(VectorKey::parse("r1/f/file/x/y/3/10-25").is_err());
    }

    #[test]
    fn test_vector_key_rejects_malformed_span() {
        assert!(VectorKey::parse("r1/f/file/3/1025").is_err());
        assert!(VectorKey::parse("r1/f/file/3/a-b").is_err());
        assert!(VectorKey::parse("r1/f/file/notanint/10-25").is_err());
    }
}
