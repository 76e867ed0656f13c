//! Document-by-document orchestration of the three stages.
//!
//! For every reference sentence the pipeline rebuilds its plain text, has the
//! parser analyze it, aligns the analysis with the reference tokens, adjusts
//! token boundaries and splits adpositions into abstract nodes.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::aligner::{ensure_consumed, Aligner};
use crate::boundary::BoundaryAdjuster;
use crate::conllu::write_document;
use crate::error::{PipelineError, Result, TableError};
use crate::parser::{sentence_text, DependencyParser};
use crate::splitter::{
    NodeSplitter, QualityReport, DEFAULT_ADPOSITION_TAG_PATTERN, DEFAULT_ERROR_SENTINEL,
};
use crate::tables::{AdpositionTags, Corrections};
use crate::token::{MergedToken, Node, ReferenceToken};

/// Pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// NFC-normalize texts before comparing them during alignment
    pub normalize_unicode: bool,
    /// Expected shape of an adposition fine tag
    pub adposition_tag_pattern: String,
    /// Character whose runs are coalesced into one ellipsis token
    pub ellipsis_char: char,
    /// Tag written on adposition nodes whose lookup failed
    pub error_sentinel: String,
    /// Prefix of `# sent_id` values in CoNLL-U output
    pub sent_id_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            normalize_unicode: true,
            adposition_tag_pattern: DEFAULT_ADPOSITION_TAG_PATTERN.to_string(),
            ellipsis_char: '.',
            error_sentinel: DEFAULT_ERROR_SENTINEL.to_string(),
            sent_id_prefix: String::new(),
        }
    }
}

impl PipelineConfig {
    /// Load settings from JSON; missing keys take their default
    pub fn from_json(json: &str) -> std::result::Result<Self, TableError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Output of one document
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessedDocument {
    /// Boundary-adjusted merged tokens, per sentence
    pub merged: Vec<Vec<MergedToken>>,
    /// Split nodes, per sentence
    pub sentences: Vec<Vec<Node>>,
    pub report: QualityReport,
}

/// Output of a whole run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Book {
    pub documents: Vec<ProcessedDocument>,
    /// Prefix of the `# sent_id` values written by [`Book::write_conllu`]
    pub sent_id_prefix: String,
    /// Counts summed over every document
    pub report: QualityReport,
}

impl Book {
    /// Write every document as CoNLL-U
    pub fn write_conllu<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        for (index, document) in self.documents.iter().enumerate() {
            write_document(out, &self.sent_id_prefix, index, &document.sentences)?;
        }
        Ok(())
    }
}

/// Aligner, boundary adjuster and node splitter wired together
pub struct Pipeline<'t> {
    aligner: Aligner,
    adjuster: BoundaryAdjuster,
    splitter: NodeSplitter<'t>,
    sent_id_prefix: String,
}

impl<'t> Pipeline<'t> {
    /// Pipeline with default settings
    pub fn new(tags: &'t dyn AdpositionTags) -> Self {
        Pipeline {
            aligner: Aligner::new(),
            adjuster: BoundaryAdjuster::default(),
            splitter: NodeSplitter::new(tags),
            sent_id_prefix: String::new(),
        }
    }

    /// Pipeline built from `config`
    pub fn with_config(
        config: &PipelineConfig,
        tags: &'t dyn AdpositionTags,
    ) -> std::result::Result<Self, TableError> {
        let splitter = NodeSplitter::new(tags)
            .with_tag_pattern(&config.adposition_tag_pattern)?
            .with_error_sentinel(&config.error_sentinel);
        Ok(Pipeline {
            aligner: Aligner::new().normalize(config.normalize_unicode),
            adjuster: BoundaryAdjuster::new(config.ellipsis_char),
            splitter,
            sent_id_prefix: config.sent_id_prefix.clone(),
        })
    }

    /// Apply reviewed corrections to host nodes
    pub fn with_corrections(mut self, corrections: &'t dyn Corrections) -> Self {
        self.splitter = self.splitter.with_corrections(corrections);
        self
    }

    /// Run one document through every stage.
    ///
    /// `document` is the 0-based index used in error messages; every reference
    /// token of the document must be consumed by the parsed sentences.
    pub fn process_document<P: DependencyParser>(
        &self,
        parser: &mut P,
        document: usize,
        sentences: &[Vec<ReferenceToken>],
    ) -> Result<ProcessedDocument> {
        let reference: Vec<ReferenceToken> = sentences.iter().flatten().cloned().collect();
        let mut cursor = 0;
        let mut processed = ProcessedDocument::default();

        for (sentence, tokens) in sentences.iter().enumerate() {
            let text = sentence_text(tokens);
            let parsed = parser
                .parse(&text)
                .map_err(|source| PipelineError::Parser {
                    document,
                    sentence,
                    source,
                })?;

            let merged = self
                .aligner
                .align_sentence(&reference, &mut cursor, &parsed, document, sentence)?;
            let adjusted = self
                .adjuster
                .adjust(&merged)
                .map_err(|source| PipelineError::Adjust {
                    document,
                    sentence,
                    source,
                })?;
            let nodes = self.splitter.split(&adjusted, &mut processed.report);
            debug!(
                document,
                sentence,
                parsed = parsed.len(),
                merged = adjusted.len(),
                nodes = nodes.len(),
                "processed sentence"
            );

            processed.merged.push(adjusted);
            processed.sentences.push(nodes);
        }

        ensure_consumed(document, &reference, cursor)?;
        Ok(processed)
    }

    /// Run every document, then log the quality report once
    pub fn process_book<P: DependencyParser>(
        &self,
        parser: &mut P,
        documents: &[Vec<Vec<ReferenceToken>>],
    ) -> Result<Book> {
        let mut book = Book {
            sent_id_prefix: self.sent_id_prefix.clone(),
            ..Default::default()
        };
        for (index, sentences) in documents.iter().enumerate() {
            let document = self.process_document(parser, index, sentences)?;
            book.report.merge(&document.report);
            book.documents.push(document);
        }

        info!(
            documents = book.documents.len(),
            clean = book.report.is_clean(),
            report = %book.report,
            "run finished"
        );
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AlignError, ParserError};
    use crate::parser::PrecomputedParses;
    use crate::tables::TagTable;
    use crate::token::{Adposition, Head, NodeId, ParsedToken, ReferenceId};

    fn parsed(id: u32, text: &str, lemma: &str, xpos: &str, head: u32, start: usize) -> ParsedToken {
        let mut token = ParsedToken::with_text(id, text, start, start + text.chars().count());
        token.lemma = lemma.to_string();
        token.xpos = xpos.to_string();
        token.upos = if xpos == "sf" { "PUNCT" } else { "NOUN" }.to_string();
        token.head = Head::from(head);
        token.deprel = if head == 0 { "root" } else { "dep" }.to_string();
        token
    }

    fn tags() -> TagTable {
        let mut table = TagTable::new();
        table.insert("에", "jca");
        table.insert("는", "jxt");
        table
    }

    fn document() -> Vec<Vec<ReferenceToken>> {
        vec![
            vec![
                ReferenceToken::new(ReferenceId::new(1), "집에", "집+에")
                    .with_adposition(Adposition::new("에", Some("Goal"), Some("Goal"))),
                ReferenceToken::new(ReferenceId::new(2), "갔다.", "가+았+다+."),
            ],
            vec![ReferenceToken::new(ReferenceId::new(1), "응", "응")],
        ]
    }

    fn parses() -> PrecomputedParses {
        let dot = parsed(3, ".", ".", "sf", 2, 5);
        let mut went = parsed(2, "갔다", "가+았+다", "pvg+ep+ef", 0, 3);
        went.misc = Some("SpaceAfter=No".to_string());
        PrecomputedParses::new(vec![
            vec![parsed(1, "집에", "집+에", "ncn+jca", 2, 0), went, dot],
            vec![parsed(1, "응", "응", "ii", 0, 0)],
        ])
    }

    #[test]
    fn test_config_from_json() {
        let config = PipelineConfig::from_json(r#"{"ellipsis_char": "…", "sent_id_prefix": "lpp.ko"}"#)
            .unwrap();
        assert_eq!(config.ellipsis_char, '…');
        assert_eq!(config.sent_id_prefix, "lpp.ko");
        assert!(config.normalize_unicode);
        assert_eq!(config.error_sentinel, "ERROR");
    }

    #[test]
    fn test_bad_tag_pattern_in_config() {
        let table = tags();
        let config = PipelineConfig {
            adposition_tag_pattern: "[".to_string(),
            ..Default::default()
        };
        assert!(Pipeline::with_config(&config, &table).is_err());
    }

    #[test]
    fn test_process_document() {
        let table = tags();
        let pipeline = Pipeline::new(&table);
        let mut parser = parses();

        let processed = pipeline.process_document(&mut parser, 0, &document()).unwrap();
        assert_eq!(processed.sentences.len(), 2);

        let first = &processed.sentences[0];
        let ids: Vec<NodeId> = first.iter().map(|n| n.id).collect();
        assert_eq!(
            ids,
            vec![
                NodeId::Word(1),
                NodeId::Abstract { host: 1, ord: 1 },
                NodeId::Word(2),
                NodeId::Word(3)
            ]
        );
        assert_eq!(first[1].xpos, "jca");
        assert!(processed.report.is_clean());
    }

    #[test]
    fn test_process_book_writes_conllu() {
        let table = tags();
        let config = PipelineConfig::from_json(r#"{"sent_id_prefix": "lpp.ko"}"#).unwrap();
        let pipeline = Pipeline::with_config(&config, &table).unwrap();
        let mut parser = parses();

        let book = pipeline.process_book(&mut parser, &[document()]).unwrap();
        assert_eq!(book.sent_id_prefix, "lpp.ko");
        let mut out = String::new();
        book.write_conllu(&mut out).unwrap();

        assert!(out.starts_with("# sent_id = lpp.ko01-001\n# text = 집에 갔다.\n"));
        assert!(out.contains("# sent_id = lpp.ko01-002\n# text = 응\n"));
    }

    #[test]
    fn test_default_pipeline_has_empty_prefix() {
        let table = tags();
        let pipeline = Pipeline::new(&table);
        let mut parser = parses();

        let book = pipeline.process_book(&mut parser, &[document()]).unwrap();
        let mut out = String::new();
        book.write_conllu(&mut out).unwrap();
        assert!(out.starts_with("# sent_id = 01-001\n"));
    }

    #[test]
    fn test_parser_failure_carries_context() {
        let table = tags();
        let pipeline = Pipeline::new(&table);
        let mut parser = PrecomputedParses::new(vec![]);

        let err = pipeline
            .process_document(&mut parser, 4, &document())
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Parser {
                document: 4,
                sentence: 0,
                source: ParserError::Exhausted(_)
            }
        ));
    }

    #[test]
    fn test_unconsumed_reference_is_fatal() {
        let table = tags();
        let pipeline = Pipeline::new(&table);
        let mut sentences = document();
        sentences[1].push(ReferenceToken::new(ReferenceId::new(2), "그래", "그래"));
        let mut parser = parses();

        let err = pipeline
            .process_document(&mut parser, 0, &sentences)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Align(AlignError::UnconsumedReference { remaining: 1, .. })
        ));
    }
}
