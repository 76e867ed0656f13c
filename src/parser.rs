//! The dependency parser collaborator.
//!
//! The pipeline hands the parser one plain-text sentence at a time and gets
//! back its tokens. Parsing itself happens outside this crate; analyses can be
//! replayed from JSON dumps with [`PrecomputedParses`].

use std::collections::VecDeque;
use tracing::debug;

use crate::error::ParserError;
use crate::token::{ParsedToken, ReferenceToken};

/// A tokenizer plus dependency parser for one sentence of plain text
pub trait DependencyParser {
    /// Tokenize and parse `text` as a single sentence
    fn parse(&mut self, text: &str) -> Result<Vec<ParsedToken>, ParserError>;
}

impl<F> DependencyParser for F
where
    F: FnMut(&str) -> Result<Vec<ParsedToken>, ParserError>,
{
    fn parse(&mut self, text: &str) -> Result<Vec<ParsedToken>, ParserError> {
        self(text)
    }
}

/// Analyses produced earlier, handed out in order
#[derive(Debug, Clone, Default)]
pub struct PrecomputedParses {
    queue: VecDeque<Vec<ParsedToken>>,
}

impl PrecomputedParses {
    pub fn new(parses: Vec<Vec<ParsedToken>>) -> Self {
        PrecomputedParses {
            queue: parses.into(),
        }
    }

    /// Load a JSON array of sentences, each an array of parser tokens
    pub fn from_json(json: &str) -> Result<Self, ParserError> {
        let parses: Vec<Vec<ParsedToken>> = serde_json::from_str(json)?;
        Ok(Self::new(parses))
    }

    /// Number of analyses not yet handed out
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl DependencyParser for PrecomputedParses {
    fn parse(&mut self, text: &str) -> Result<Vec<ParsedToken>, ParserError> {
        let parsed = self
            .queue
            .pop_front()
            .ok_or_else(|| ParserError::Exhausted(text.to_string()))?;
        debug!(text, tokens = parsed.len(), "replayed analysis");
        Ok(parsed)
    }
}

/// Plain text of a reference sentence as given to the parser.
///
/// Stacked entries after the first repeat the same physical word and are left
/// out.
pub fn sentence_text(sentence: &[ReferenceToken]) -> String {
    sentence
        .iter()
        .filter(|token| !token.id.is_stack_continuation())
        .map(|token| token.form.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
