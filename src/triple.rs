//! Core data model: `(subject, property, value)` triples extracted from
//! infobox dumps.
use serde::{Deserialize, Serialize};

/// An entity or property local name — underscored, no whitespace.
pub type Name = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// value is another entity name
    Instance,
    /// language-tagged literal (the tag itself is discarded)
    String,
    /// XML Schema datatype, e.g. `integer`, `date`
    Typed(String),
    /// unparsed / non-literal non-resource form
    Other,
}

impl ValueKind {
    /// the `format` tag written to shard CSVs
    pub fn tag(&self) -> String {
        match self {
            ValueKind::Instance => "instance".to_string(),
            ValueKind::String => "string".to_string(),
            ValueKind::Typed(t) => t.clone(),
            ValueKind::Other => "other".to_string(),
        }
    }

    /// parses a shard's `format` column back into a `ValueKind`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "instance" => ValueKind::Instance,
            "string" => ValueKind::String,
            "other" => ValueKind::Other,
            other => ValueKind::Typed(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub literal: String,
    pub kind: ValueKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub subject: Name,
    pub property: Name,
    pub value: Value,
}

/// normalizes an entity name the way the translation table and langlinks
/// matching require: spaces become underscores.
pub fn normalize_name(name: &str) -> String {
    name.replace(' ', "_")
}
