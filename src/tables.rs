//! Lookup tables consulted while splitting adposition nodes.
//!
//! The tables themselves are data maintained outside this crate; here we only
//! define how they are shaped and queried. Both load from JSON.

use serde::Deserialize;
use std::collections::HashMap;

use crate::error::TableError;
pub use crate::error::LookupError;

/// Maps an adposition (and its function label) to a fine-grained tag
pub trait AdpositionTags {
    fn lookup(&self, surface: &str, function: Option<&str>) -> Result<&str, LookupError>;
}

/// One entry of a [`TagTable`]: either a tag, or tags keyed by function label
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TagEntry {
    Tag(String),
    ByFunction(HashMap<String, String>),
}

/// Adposition-to-tag table.
///
/// ```json
/// { "에서": "jca", "와": { "ensemble": "jcj", "ancillary": "jct" } }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct TagTable {
    entries: HashMap<String, TagEntry>,
}

impl TagTable {
    pub fn new() -> Self {
        TagTable::default()
    }

    /// Parse a table from JSON
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Map a surface to a single tag
    pub fn insert(&mut self, surface: &str, tag: &str) {
        self.entries
            .insert(surface.to_string(), TagEntry::Tag(tag.to_string()));
    }

    /// Map a surface to a tag that depends on the function label
    pub fn insert_by_function(&mut self, surface: &str, function: &str, tag: &str) {
        let entry = self
            .entries
            .entry(surface.to_string())
            .or_insert_with(|| TagEntry::ByFunction(HashMap::new()));
        if matches!(entry, TagEntry::Tag(_)) {
            *entry = TagEntry::ByFunction(HashMap::new());
        }
        if let TagEntry::ByFunction(by_function) = entry {
            by_function.insert(function.to_string(), tag.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AdpositionTags for TagTable {
    fn lookup(&self, surface: &str, function: Option<&str>) -> Result<&str, LookupError> {
        match self.entries.get(surface) {
            Some(TagEntry::Tag(tag)) => Ok(tag.as_str()),
            Some(TagEntry::ByFunction(by_function)) => function
                .and_then(|f| by_function.get(f))
                .map(String::as_str)
                .ok_or_else(|| LookupError::UnknownFunction {
                    surface: surface.to_string(),
                    function: function.map(str::to_string),
                }),
            None => Err(LookupError::UnknownSurface(surface.to_string())),
        }
    }
}

/// Reviewed corrections for one surface form
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Correction {
    pub lemma: Option<String>,
    pub xpos: Option<String>,
    pub upos: Option<String>,
    pub deprel: Option<String>,
    /// `Some(false)` marks the tag-shape check as a known false positive
    pub xpos_error: Option<bool>,
}

impl Correction {
    /// Whether the tag-shape check should be skipped for this form
    pub fn suppresses_xpos_error(&self) -> bool {
        self.xpos_error == Some(false)
    }
}

/// Per-surface-form overrides for the parser's analysis
pub trait Corrections {
    fn correction(&self, surface: &str) -> Option<&Correction>;
}

/// Correction table keyed by a token's surface text
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct CorrectionTable {
    entries: HashMap<String, Correction>,
}

impl CorrectionTable {
    pub fn new() -> Self {
        CorrectionTable::default()
    }

    /// Parse a table from JSON
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, surface: &str, correction: Correction) {
        self.entries.insert(surface.to_string(), correction);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Corrections for CorrectionTable {
    fn correction(&self, surface: &str) -> Option<&Correction> {
        self.entries.get(surface)
    }
}
