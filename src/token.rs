//! Token representations for the three stages of the pipeline.
//!
//! A [`ReferenceToken`] comes from the hand-annotated corpus, a [`ParsedToken`]
//! from the dependency parser, a [`MergedToken`] is the aligned union of the two,
//! and a [`Node`] is what the node splitter emits for serialization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TokenError;

/// Coarse category for punctuation
pub const UPOS_PUNCT: &str = "PUNCT";

/// Coarse category given to abstract adposition nodes
pub const UPOS_ADP: &str = "ADP";

/// Fine tag given to coalesced ellipses
pub const XPOS_FINAL_PUNCT: &str = "sf";

/// Placeholder used for empty fields in the corpus and in CoNLL-U
pub const EMPTY_FIELD: &str = "_";

/// Flag the parser puts in `misc` when no space follows a token
pub const NO_SPACE_AFTER: &str = "SpaceAfter=No";

/// Identity of a reference token: a sentence ordinal plus an optional stack
/// suffix (`4`, `4-1`, `4-2`, ...).
///
/// Entries sharing a base but carrying different suffixes describe one
/// physical word with stacked adpositions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceId {
    /// Position of the physical word
    pub base: u32,
    /// Stack index, starting at 1, for words with stacked adpositions
    pub stack: Option<u32>,
}

impl ReferenceId {
    /// A plain, unstacked id
    pub fn new(base: u32) -> Self {
        ReferenceId { base, stack: None }
    }

    /// An id carrying a stack suffix
    pub fn stacked(base: u32, stack: u32) -> Self {
        ReferenceId {
            base,
            stack: Some(stack),
        }
    }

    /// Whether this entry repeats an earlier entry of the same word
    /// (stack index 2 or higher).
    pub fn is_stack_continuation(&self) -> bool {
        self.stack.map_or(false, |k| k > 1)
    }

    /// Whether `other` is a different stacked entry of the same physical word
    pub fn is_stacked_sibling(&self, other: &ReferenceId) -> bool {
        self.stack.is_some() && other.stack.is_some() && self.base == other.base && self != other
    }
}

impl FromStr for ReferenceId {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TokenError::InvalidReferenceId(s.to_string());
        match s.split_once('-') {
            Some((base, stack)) => Ok(ReferenceId::stacked(
                base.trim().parse().map_err(|_| invalid())?,
                stack.trim().parse().map_err(|_| invalid())?,
            )),
            None => Ok(ReferenceId::new(s.trim().parse().map_err(|_| invalid())?)),
        }
    }
}

impl TryFrom<String> for ReferenceId {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReferenceId> for String {
    fn from(id: ReferenceId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stack {
            Some(k) => write!(f, "{}-{}", self.base, k),
            None => write!(f, "{}", self.base),
        }
    }
}

/// An adposition attached to a host word, with its two gold supersenses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adposition {
    /// Surface form of the adposition (e.g. "에서")
    pub surface: String,
    /// Scene role label
    pub scene: Option<String>,
    /// Function label
    pub function: Option<String>,
}

impl Adposition {
    /// Create an adposition annotation
    pub fn new(surface: &str, scene: Option<&str>, function: Option<&str>) -> Self {
        Adposition {
            surface: surface.to_string(),
            scene: scene.map(str::to_string),
            function: function.map(str::to_string),
        }
    }
}

/// A token of the hand-annotated reference segmentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceToken {
    /// Ordinal in the sentence, possibly with a stack suffix
    pub id: ReferenceId,
    /// Surface form, punctuation included
    pub form: String,
    /// Morphological segmentation
    pub morph: String,
    /// Attached adposition, if any
    pub adposition: Option<Adposition>,
}

impl ReferenceToken {
    /// Create a reference token without an adposition
    pub fn new(id: ReferenceId, form: &str, morph: &str) -> Self {
        ReferenceToken {
            id,
            form: form.to_string(),
            morph: morph.to_string(),
            adposition: None,
        }
    }

    /// Attach an adposition annotation
    pub fn with_adposition(mut self, adposition: Adposition) -> Self {
        self.adposition = Some(adposition);
        self
    }
}

impl fmt::Display for ReferenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (p, scene, function) = match &self.adposition {
            Some(adp) => (
                adp.surface.as_str(),
                adp.scene.as_deref().unwrap_or(EMPTY_FIELD),
                adp.function.as_deref().unwrap_or(EMPTY_FIELD),
            ),
            None => (EMPTY_FIELD, EMPTY_FIELD, EMPTY_FIELD),
        };
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.id, self.form, self.morph, p, scene, function
        )
    }
}

/// Governor of a token in the dependency structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum Head {
    /// The sentence root (serialized as 0)
    Root,
    /// Another token of the same sentence
    Id(u32),
}

impl From<u32> for Head {
    fn from(value: u32) -> Self {
        if value == 0 {
            Head::Root
        } else {
            Head::Id(value)
        }
    }
}

impl From<Head> for u32 {
    fn from(head: Head) -> Self {
        match head {
            Head::Root => 0,
            Head::Id(id) => id,
        }
    }
}

impl fmt::Display for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u32::from(*self))
    }
}

/// Character offsets of a token in its sentence text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    /// First character (inclusive)
    #[serde(rename = "start_char")]
    pub start: usize,
    /// Last character (exclusive)
    #[serde(rename = "end_char")]
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }
}

/// A token produced by the dependency parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedToken {
    /// 1-based position in the parsed sentence
    pub id: u32,
    /// Surface text
    pub text: String,
    /// Lemma, `+`-joined for multi-morpheme words
    #[serde(default)]
    pub lemma: String,
    /// Coarse part-of-speech
    #[serde(default)]
    pub upos: String,
    /// Fine-grained tag, `+`-joined for multi-morpheme words
    #[serde(default)]
    pub xpos: String,
    /// Morphological features
    #[serde(default)]
    pub feats: Option<String>,
    /// Structural head
    pub head: Head,
    /// Structural relation
    #[serde(default)]
    pub deprel: String,
    /// Character span
    #[serde(flatten)]
    pub span: Span,
    /// Auxiliary flags, `|`-joined
    #[serde(default)]
    pub misc: Option<String>,
}

impl ParsedToken {
    /// Create a parsed token with the given text and span; other fields empty
    pub fn with_text(id: u32, text: &str, start: usize, end: usize) -> Self {
        ParsedToken {
            id,
            text: text.to_string(),
            lemma: text.to_string(),
            upos: String::new(),
            xpos: String::new(),
            feats: None,
            head: Head::Root,
            deprel: String::new(),
            span: Span::new(start, end),
            misc: None,
        }
    }

    /// Whether the parser flagged this token as glued to the next one
    pub fn no_space_after(&self) -> bool {
        has_no_space_after(self.misc.as_deref())
    }

    /// Whether this token is punctuation
    pub fn is_punct(&self) -> bool {
        self.upos == UPOS_PUNCT
    }
}

impl fmt::Display for ParsedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}..{}\t{}",
            self.id,
            self.text,
            self.lemma,
            self.upos,
            self.xpos,
            self.head,
            self.deprel,
            self.span.start,
            self.span.end,
            self.misc.as_deref().unwrap_or(EMPTY_FIELD)
        )
    }
}

pub(crate) fn has_no_space_after(misc: Option<&str>) -> bool {
    misc.map_or(false, |m| m.split('|').any(|flag| flag == NO_SPACE_AFTER))
}

/// A parsed token enriched with the reference annotation it was aligned to.
///
/// Identity and structure come from the parser; form, segmentation and the
/// adposition come from the reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedToken {
    /// Logical id; the parser's id until boundary adjustment renumbers it
    pub id: u32,
    /// Id of the reference entry this token was aligned with
    pub reference_id: ReferenceId,
    /// Reference surface form (the whole physical word)
    pub form: String,
    /// Reference morphological segmentation
    pub morph: String,
    /// Reference adposition, kept only where it is realized in `text`
    pub adposition: Option<Adposition>,
    pub text: String,
    pub lemma: String,
    pub upos: String,
    pub xpos: String,
    pub feats: Option<String>,
    pub head: Head,
    pub deprel: String,
    pub span: Span,
    pub misc: Option<String>,
}

impl MergedToken {
    /// Merge a reference entry with the parsed token it covers
    pub fn merge(reference: &ReferenceToken, parsed: &ParsedToken) -> Self {
        MergedToken {
            id: parsed.id,
            reference_id: reference.id,
            form: reference.form.clone(),
            morph: reference.morph.clone(),
            adposition: reference.adposition.clone(),
            text: parsed.text.clone(),
            lemma: parsed.lemma.clone(),
            upos: parsed.upos.clone(),
            xpos: parsed.xpos.clone(),
            feats: parsed.feats.clone(),
            head: parsed.head,
            deprel: parsed.deprel.clone(),
            span: parsed.span,
            misc: parsed.misc.clone(),
        }
    }

    /// Merge, dropping the reference adposition and its supersenses
    pub fn merge_without_adposition(reference: &ReferenceToken, parsed: &ParsedToken) -> Self {
        MergedToken {
            adposition: None,
            ..MergedToken::merge(reference, parsed)
        }
    }

    /// Coalesce a run of tokens into one final punctuation token.
    ///
    /// Head and relation are taken from the first token of the run.
    /// `run` must not be empty.
    pub fn coalesce(run: &[MergedToken], id: u32) -> Self {
        let first = &run[0];
        let last = &run[run.len() - 1];
        MergedToken {
            id,
            reference_id: first.reference_id,
            form: first.form.clone(),
            morph: first.morph.clone(),
            adposition: None,
            text: run.iter().map(|t| t.text.as_str()).collect(),
            lemma: run.iter().map(|t| t.lemma.as_str()).collect(),
            upos: UPOS_PUNCT.to_string(),
            xpos: XPOS_FINAL_PUNCT.to_string(),
            feats: None,
            head: first.head,
            deprel: first.deprel.clone(),
            span: Span::new(first.span.start, last.span.end),
            misc: last.misc.clone(),
        }
    }

    /// Same token under a new logical id
    pub fn renumbered(&self, id: u32) -> Self {
        MergedToken { id, ..self.clone() }
    }

    pub fn is_punct(&self) -> bool {
        self.upos == UPOS_PUNCT
    }
}

/// Identity of an output node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    /// A surface word
    Word(u32),
    /// The `ord`-th abstract adposition node of word `host`
    Abstract { host: u32, ord: u32 },
}

impl NodeId {
    /// Id of the surface word this node belongs to
    pub fn host(&self) -> u32 {
        match *self {
            NodeId::Word(id) => id,
            NodeId::Abstract { host, .. } => host,
        }
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, NodeId::Abstract { .. })
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Word(id) => write!(f, "{}", id),
            NodeId::Abstract { host, ord } => write!(f, "{}.{}", host, ord),
        }
    }
}

/// A node of the split sentence, ready for serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub text: String,
    pub lemma: String,
    pub upos: String,
    pub xpos: String,
    pub feats: Option<String>,
    /// None for abstract nodes
    pub head: Option<Head>,
    /// None for abstract nodes
    pub deprel: Option<String>,
    /// Enhanced dependency field
    pub deps: Option<String>,
    /// None when the adposition is not realized as a substring of its host
    pub span: Option<Span>,
    pub misc: Option<String>,
    /// Set on abstract nodes only
    pub adposition: Option<Adposition>,
    /// Lemma and fine-tag segment counts differ
    pub match_error: bool,
    /// No fine-tag segment looks like an adposition tag
    pub xpos_error: bool,
    /// The adposition tag table had no usable entry
    pub lookup_error: bool,
}

impl Node {
    /// Host node for a merged token: same word, adposition removed
    pub fn host(token: &MergedToken) -> Self {
        Node {
            id: NodeId::Word(token.id),
            text: token.text.clone(),
            lemma: token.lemma.clone(),
            upos: token.upos.clone(),
            xpos: token.xpos.clone(),
            feats: token.feats.clone(),
            head: Some(token.head),
            deprel: Some(token.deprel.clone()),
            deps: None,
            span: Some(token.span),
            misc: token.misc.clone(),
            adposition: None,
            match_error: false,
            xpos_error: false,
            lookup_error: false,
        }
    }

    /// Abstract adposition node attached to word `host`
    pub fn adposition(
        host: u32,
        ord: u32,
        adposition: &Adposition,
        xpos: String,
        span: Option<Span>,
    ) -> Self {
        Node {
            id: NodeId::Abstract { host, ord },
            text: adposition.surface.clone(),
            lemma: adposition.surface.clone(),
            upos: UPOS_ADP.to_string(),
            xpos,
            feats: None,
            head: None,
            deprel: None,
            deps: Some(format!("{}:case", host)),
            span,
            misc: None,
            adposition: Some(adposition.clone()),
            match_error: false,
            xpos_error: false,
            lookup_error: false,
        }
    }

    /// Whether any data-quality flag is raised on this node
    pub fn is_flagged(&self) -> bool {
        self.match_error || self.xpos_error || self.lookup_error
    }
}
