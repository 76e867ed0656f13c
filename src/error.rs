//! Error types for alignment, boundary adjustment and the surrounding pipeline.
//!
//! Alignment failures and head-remap misses are fatal: they mean the two
//! segmentations disagree in a way that has to be fixed in the source data.
//! Data-quality problems found while splitting nodes are not errors; they are
//! flagged on the nodes and counted in [`crate::splitter::QualityReport`].

use thiserror::Error;

use crate::token::{ParsedToken, ReferenceToken};

/// Errors raised while parsing token identities
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("invalid reference token id '{0}' (expected N or N-k)")]
    InvalidReferenceId(String),
}

/// Errors raised by the token stream aligner
#[derive(Debug, Error)]
pub enum AlignError {
    /// No alignment rule applies to the current pair of tokens
    #[error(
        "no alignment rule matched in document {document}, sentence {sentence}\n  reference: {reference}\n  derived:   {derived}"
    )]
    NoRuleMatched {
        document: usize,
        sentence: usize,
        reference: Box<ReferenceToken>,
        derived: Box<ParsedToken>,
    },

    /// The parser produced tokens after every reference token was consumed
    #[error(
        "reference tokens exhausted in document {document}, sentence {sentence} at derived token {derived}"
    )]
    ReferenceExhausted {
        document: usize,
        sentence: usize,
        derived: Box<ParsedToken>,
    },

    /// Reference tokens were left over once every derived token was consumed
    #[error("{remaining} reference token(s) left unaligned in document {document}, starting at {next}")]
    UnconsumedReference {
        document: usize,
        remaining: usize,
        next: Box<ReferenceToken>,
    },
}

/// Errors raised by the boundary adjuster
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdjustError {
    /// A head points at an id that was never seen in the sentence
    #[error("token {token} has head {head}, which is not a token of the sentence")]
    UnmappedHead { token: u32, head: u32 },
}

/// Errors raised by the dependency parser collaborator
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("parser returned no analysis for sentence: {0}")]
    Exhausted(String),

    #[error("parser failed: {0}")]
    Failed(String),

    #[error("invalid parser output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while loading lookup tables or configuration
#[derive(Debug, Error)]
pub enum TableError {
    #[error("invalid table JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid adposition tag pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Why an adposition could not be mapped to a fine tag
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The adposition surface form has no entry
    #[error("no tag entry for adposition '{0}'")]
    UnknownSurface(String),

    /// The entry is keyed by function label and this label is missing
    #[error("no tag for adposition '{surface}' with function {function:?}")]
    UnknownFunction {
        surface: String,
        function: Option<String>,
    },
}

/// Errors raised when parsing CoNLL-U-Lex columns
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("invalid token id '{0}'")]
    InvalidId(String),

    #[error("invalid MWE membership '{0}' (expected group:position)")]
    InvalidMembership(String),
}

/// Top-level pipeline error
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Align(#[from] AlignError),

    #[error("boundary adjustment failed in document {document}, sentence {sentence}: {source}")]
    Adjust {
        document: usize,
        sentence: usize,
        #[source]
        source: AdjustError,
    },

    #[error("parsing document {document}, sentence {sentence} failed: {source}")]
    Parser {
        document: usize,
        sentence: usize,
        #[source]
        source: ParserError,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
