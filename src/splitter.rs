//! Splitting adpositions into abstract nodes.
//!
//! A word carrying an adposition ("집에서") is emitted as its host node plus
//! one abstract `ADP` node per adposition (`3`, `3.1`). Words with stacked
//! adpositions come out of the aligner as several entries (`3-1`, `3-2`); the
//! first produces the host and its first adposition node, the others only
//! their adposition node, attached to the piece of the first entry that
//! spans the same text.
//!
//! Data-quality problems are flagged on the nodes and counted, never fatal.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::error::TableError;
use crate::tables::{AdpositionTags, Correction, Corrections};
use crate::token::{Adposition, MergedToken, Node, Span};

/// Default shape of a fine tag marking an adposition (case or auxiliary particle)
pub const DEFAULT_ADPOSITION_TAG_PATTERN: &str = "^j[cx][acjmorst]";

/// Tag written on adposition nodes when the tag table has no usable entry
pub const DEFAULT_ERROR_SENTINEL: &str = "ERROR";

/// Counters for recoverable data-quality problems
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    /// Hosts whose lemma and fine tag have different segment counts
    pub match_errors: usize,
    /// Hosts with no fine-tag segment shaped like an adposition tag
    pub xpos_errors: usize,
    /// Adposition nodes whose tag could not be looked up
    pub lookup_errors: usize,
}

impl QualityReport {
    /// Add the counts of `other` to this report
    pub fn merge(&mut self, other: &QualityReport) {
        self.match_errors += other.match_errors;
        self.xpos_errors += other.xpos_errors;
        self.lookup_errors += other.lookup_errors;
    }

    pub fn is_clean(&self) -> bool {
        self.match_errors == 0 && self.xpos_errors == 0 && self.lookup_errors == 0
    }
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} xpos_errors, {} match_errors, {} lookup_errors",
            self.xpos_errors, self.match_errors, self.lookup_errors
        )
    }
}

/// Splits host words and their adpositions into separate nodes
pub struct NodeSplitter<'t> {
    tags: &'t dyn AdpositionTags,
    corrections: Option<&'t dyn Corrections>,
    tag_shape: Regex,
    error_sentinel: String,
}

impl<'t> NodeSplitter<'t> {
    /// Splitter using `tags` for adposition node tags
    pub fn new(tags: &'t dyn AdpositionTags) -> Self {
        NodeSplitter {
            tags,
            corrections: None,
            tag_shape: Regex::new(DEFAULT_ADPOSITION_TAG_PATTERN).expect("valid default pattern"),
            error_sentinel: DEFAULT_ERROR_SENTINEL.to_string(),
        }
    }

    /// Apply reviewed per-form corrections to host nodes
    pub fn with_corrections(mut self, corrections: &'t dyn Corrections) -> Self {
        self.corrections = Some(corrections);
        self
    }

    /// Use a different adposition tag shape
    pub fn with_tag_pattern(mut self, pattern: &str) -> Result<Self, TableError> {
        self.tag_shape = Regex::new(pattern)?;
        Ok(self)
    }

    /// Use a different tag for failed lookups
    pub fn with_error_sentinel(mut self, sentinel: &str) -> Self {
        self.error_sentinel = sentinel.to_string();
        self
    }

    /// Split every adposition-bearing token of a boundary-adjusted sentence.
    pub fn split(&self, sentence: &[MergedToken], report: &mut QualityReport) -> Vec<Node> {
        let mut nodes: Vec<Node> = Vec::with_capacity(sentence.len() * 2);
        // (reference base, span, node id) of every word piece of a first stacked entry
        let mut stack_hosts: Vec<(u32, Span, u32)> = Vec::new();

        for token in sentence {
            let base = token.reference_id.base;
            match token.reference_id.stack {
                Some(ord) if ord > 1 => {
                    let host_id = stack_hosts
                        .iter()
                        .rev()
                        .find(|(host_base, span, _)| *host_base == base && *span == token.span)
                        .map(|&(_, _, id)| id)
                        // stacked entries are numbered one step ahead of their host
                        .unwrap_or_else(|| token.id.saturating_sub(1));
                    self.split_stacked(token, host_id, ord, &mut nodes, report)
                }
                Some(_) => {
                    if !token.is_punct() {
                        stack_hosts.push((base, token.span, token.id));
                    }
                    self.split_host(token, &mut nodes, report)
                }
                None => self.split_host(token, &mut nodes, report),
            }
        }

        nodes
    }

    fn split_host(&self, token: &MergedToken, nodes: &mut Vec<Node>, report: &mut QualityReport) {
        let mut host = Node::host(token);
        let correction = self.corrections.and_then(|c| c.correction(&token.text));
        if let Some(correction) = correction {
            apply_correction(&mut host, correction);
        }

        let adposition = match &token.adposition {
            Some(adp) if !token.is_punct() => adp,
            _ => {
                nodes.push(host);
                return;
            }
        };

        let (match_error, xpos_error) = self.check(&host.lemma, &host.xpos, correction);
        self.record(&token.text, match_error, xpos_error, report);
        host.match_error = match_error;
        host.xpos_error = xpos_error;

        let node = self.adposition_node(token, token.id, 1, adposition, report);
        nodes.push(host);
        nodes.push(node);
    }

    fn split_stacked(
        &self,
        token: &MergedToken,
        host_id: u32,
        ord: u32,
        nodes: &mut Vec<Node>,
        report: &mut QualityReport,
    ) {
        // pieces of a split word copied for a later entry carry no adposition
        let Some(adposition) = &token.adposition else {
            debug!(id = token.id, text = %token.text, "stacked piece without adposition");
            return;
        };

        let node = self.adposition_node(token, host_id, ord, adposition, report);
        nodes.push(node);
    }

    /// Lemma/tag segment count check and adposition tag shape check
    fn check(&self, lemma: &str, xpos: &str, correction: Option<&Correction>) -> (bool, bool) {
        let match_error = lemma.split('+').count() != xpos.split('+').count();
        let xpos_error = !xpos.split('+').any(|tag| self.tag_shape.is_match(tag))
            && !correction.map_or(false, Correction::suppresses_xpos_error);
        (match_error, xpos_error)
    }

    fn record(&self, text: &str, match_error: bool, xpos_error: bool, report: &mut QualityReport) {
        if match_error {
            report.match_errors += 1;
            warn!(text, "lemma and xpos segment counts differ");
        }
        if xpos_error {
            report.xpos_errors += 1;
            warn!(text, "no xpos segment looks like an adposition tag");
        }
    }

    fn adposition_node(
        &self,
        token: &MergedToken,
        host_id: u32,
        ord: u32,
        adposition: &Adposition,
        report: &mut QualityReport,
    ) -> Node {
        let (xpos, lookup_error) = match self
            .tags
            .lookup(&adposition.surface, adposition.function.as_deref())
        {
            Ok(tag) if tag != self.error_sentinel => (tag.to_string(), false),
            Ok(_) => (self.error_sentinel.clone(), true),
            Err(e) => {
                warn!(error = %e, "adposition tag lookup failed");
                (self.error_sentinel.clone(), true)
            }
        };
        if lookup_error {
            report.lookup_errors += 1;
        }

        let span = adposition_span(token, &adposition.surface);
        let mut node = Node::adposition(host_id, ord, adposition, xpos, span);
        node.lookup_error = lookup_error;
        node
    }
}

/// Character span of `surface` inside the host text, if written there.
///
/// Adpositions realized as a sound change of the host (난 = 나 + ㄴ) have no
/// span of their own.
fn adposition_span(token: &MergedToken, surface: &str) -> Option<Span> {
    let byte_offset = token.text.find(surface)?;
    let start = token.span.start + token.text[..byte_offset].chars().count();
    Some(Span::new(start, start + surface.chars().count()))
}

fn apply_correction(node: &mut Node, correction: &Correction) {
    if let Some(lemma) = &correction.lemma {
        node.lemma = lemma.clone();
    }
    if let Some(xpos) = &correction.xpos {
        node.xpos = xpos.clone();
    }
    if let Some(upos) = &correction.upos {
        node.upos = upos.clone();
    }
    if let Some(deprel) = &correction.deprel {
        node.deprel = Some(deprel.clone());
    }
}
