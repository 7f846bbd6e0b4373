// ============================================================
// Layer 3 — Sentence Properties
// ============================================================
// Each sentence of a document comes with a list of properties
// that get attached to the segments cut from it:
//
//   ("relevance", 1)      sentence level → every segment
//   ("start", 7, 1)       token level    → only the segment
//                                           containing token 7
//
// In corpus files a property is a JSON array of 2 or 3 items.
// Anything else is rejected with PackError::Validation.

use serde_json::Value;

use crate::error::{PackError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    Sentence { name: String, value: i64 },
    Token { name: String, offset: usize, value: i64 },
}

impl Property {
    pub fn sentence(name: impl Into<String>, value: i64) -> Self {
        Property::Sentence { name: name.into(), value }
    }

    pub fn token(name: impl Into<String>, offset: usize, value: i64) -> Self {
        Property::Token { name: name.into(), offset, value }
    }

    pub fn name(&self) -> &str {
        match self {
            Property::Sentence { name, .. } | Property::Token { name, .. } => name,
        }
    }

    /// Parse a property from its JSON tuple form.
    pub fn from_json(raw: &Value) -> Result<Self> {
        let invalid = || PackError::Validation(format!("malformed property {raw}"));

        let items = raw.as_array().ok_or_else(invalid)?;
        match items.as_slice() {
            [name, value] => Ok(Property::Sentence {
                name:  name.as_str().ok_or_else(invalid)?.to_string(),
                value: value.as_i64().ok_or_else(invalid)?,
            }),
            [name, offset, value] => Ok(Property::Token {
                name:   name.as_str().ok_or_else(invalid)?.to_string(),
                offset: offset.as_u64().ok_or_else(invalid)? as usize,
                value:  value.as_i64().ok_or_else(invalid)?,
            }),
            _ => Err(invalid()),
        }
    }

    /// Parse one sentence's property list
    pub fn parse_list(raw: &[Value]) -> Result<Vec<Self>> {
        raw.iter().map(Property::from_json).collect()
    }
}
