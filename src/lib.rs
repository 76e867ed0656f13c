//! # snacs-align
//!
//! Projects hand-made adposition supersense annotation of Korean text onto the
//! segmentation of a dependency parser, and writes the result as CoNLL-U with
//! one abstract node per adposition.
//!
//! The work happens in three stages:
//!
//! 1. [`Aligner`] walks the reference tokens and the parser tokens together and
//!    merges them, splitting reference words where the parser split off
//!    punctuation.
//! 2. [`BoundaryAdjuster`] glues runs of periods back into ellipses and
//!    renumbers each sentence.
//! 3. [`NodeSplitter`] emits a host node plus an abstract `ADP` node for every
//!    adposition, flagging data-quality problems along the way.
//!
//! [`Pipeline`] runs the three stages over whole documents.
//!
//! ## Quick Start
//!
//! ```rust
//! use snacs_align::{
//!     Adposition, Head, ParsedToken, Pipeline, PrecomputedParses, ReferenceId,
//!     ReferenceToken, TagTable,
//! };
//!
//! let mut tags = TagTable::new();
//! tags.insert("에", "jca");
//!
//! let sentence = vec![
//!     ReferenceToken::new(ReferenceId::new(1), "집에", "집+에")
//!         .with_adposition(Adposition::new("에", Some("Goal"), Some("Goal"))),
//!     ReferenceToken::new(ReferenceId::new(2), "갔다", "가+았+다"),
//! ];
//!
//! let mut home = ParsedToken::with_text(1, "집에", 0, 2);
//! home.lemma = "집+에".to_string();
//! home.xpos = "ncn+jca".to_string();
//! home.head = Head::Id(2);
//! let went = ParsedToken::with_text(2, "갔다", 3, 5);
//! let mut parser = PrecomputedParses::new(vec![vec![home, went]]);
//!
//! let pipeline = Pipeline::new(&tags);
//! let book = pipeline.process_book(&mut parser, &[vec![sentence]]).unwrap();
//!
//! let mut conllu = String::new();
//! book.write_conllu(&mut conllu).unwrap();
//! assert!(conllu.contains("1.1\t에\t에\tADP\tjca"));
//! assert!(conllu.contains("Adp=에|Funct=Goal|Scene=Goal"));
//! ```
//!
//! ## MWE tags
//!
//! [`populate_lextags`] computes the LEXTAG column of CoNLL-U-Lex from the
//! strong and weak MWE membership columns.

pub mod aligner;
pub mod boundary;
pub mod conllu;
pub mod error;
pub mod hangul;
pub mod lextag;
pub mod mwe;
pub mod parser;
pub mod pipeline;
pub mod splitter;
pub mod tables;
pub mod token;

// Re-export main types for convenience
pub use aligner::{default_rules, Aligner, MatchKind, Rule};
pub use boundary::BoundaryAdjuster;
pub use error::{
    AdjustError, AlignError, LexError, LookupError, ParserError, PipelineError, Result, TableError,
    TokenError,
};
pub use lextag::{populate_lextags, read_sentences, LexToken, Membership};
pub use mwe::{sentence_tags, GroupIndex, MweTag, Strength};
pub use parser::{DependencyParser, PrecomputedParses};
pub use pipeline::{Book, Pipeline, PipelineConfig, ProcessedDocument};
pub use splitter::{NodeSplitter, QualityReport};
pub use tables::{AdpositionTags, Correction, CorrectionTable, Corrections, TagTable};
pub use token::{
    Adposition, Head, MergedToken, Node, NodeId, ParsedToken, ReferenceId, ReferenceToken, Span,
};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
