//! Alignment of the reference segmentation with the parser's segmentation.
//!
//! The reference corpus keeps punctuation glued to words ("있겠지......>하고")
//! while the parser splits it off ("있겠지", ".", ..., ">하고"). The aligner walks
//! both streams with one cursor each and, at every step, applies the first rule
//! whose predicate accepts the current pair of tokens.
//!
//! Reference entries for a word with stacked adpositions (`4-1`, `4-2`) all
//! reuse the parsed token(s) of that word.

use std::borrow::Cow;
use tracing::{debug, trace};
use unicode_normalization::{is_nfc, UnicodeNormalization};

use crate::error::AlignError;
use crate::hangul::{adposition_in_text, core_text, is_punctuation};
use crate::token::{MergedToken, ParsedToken, ReferenceToken};

/// How a derived token was matched to its reference token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Same text
    Exact,
    /// Derived text is the Hangul-only part of the reference form
    Head,
    /// Several derived tokens concatenate to the reference form
    Partial,
    /// Punctuation split off a reference form that cannot be completed
    Punctuation,
}

/// One alignment rule: a predicate over the current cursor state, and the
/// action that consumes tokens when the predicate holds.
#[derive(Clone, Copy)]
pub struct Rule {
    pub kind: MatchKind,
    pub matches: fn(&Step<'_>) -> bool,
    pub apply: fn(&mut Step<'_>),
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("kind", &self.kind).finish()
    }
}

/// Cursor state while aligning one sentence
pub struct Step<'a> {
    reference: &'a [ReferenceToken],
    derived: &'a [ParsedToken],
    /// Reference cursor; runs over the whole document
    pub o: usize,
    /// Derived cursor; runs over the current sentence
    pub s: usize,
    merged: Vec<MergedToken>,
    normalize: bool,
}

impl<'a> Step<'a> {
    /// Current reference token
    pub fn reference(&self) -> &'a ReferenceToken {
        &self.reference[self.o]
    }

    /// Current derived token
    pub fn derived(&self) -> &'a ParsedToken {
        &self.derived[self.s]
    }

    fn norm<'s>(&self, text: &'s str) -> Cow<'s, str> {
        if self.normalize && !is_nfc(text) {
            Cow::Owned(text.nfc().collect())
        } else {
            Cow::Borrowed(text)
        }
    }

    /// Normalized form of the current reference token
    pub fn form(&self) -> Cow<'a, str> {
        self.norm(&self.reference().form)
    }

    /// Normalized text of the derived token at `index`
    fn text_at(&self, index: usize) -> Cow<'a, str> {
        self.norm(&self.derived[index].text)
    }

    /// Normalized text of the current derived token
    pub fn text(&self) -> Cow<'a, str> {
        self.text_at(self.s)
    }

    /// Whether the next reference entry is another stacked entry of the same word
    pub fn next_is_stacked_sibling(&self) -> bool {
        self.reference
            .get(self.o + 1)
            .map_or(false, |next| self.reference().id.is_stacked_sibling(&next.id))
    }

    /// Number of derived tokens, starting at the cursor, whose concatenation
    /// spells the current reference form; None if no prefix of the remaining
    /// sentence does.
    pub fn completion_len(&self) -> Option<usize> {
        let form = self.form();
        let mut acc = String::new();
        for index in self.s..self.derived.len() {
            acc.push_str(&self.text_at(index));
            if acc == form {
                return Some(index - self.s + 1);
            }
            if !form.starts_with(acc.as_str()) {
                return None;
            }
        }
        None
    }

    /// Merge `reference` into `parsed`, keeping the adposition only if the
    /// parsed text realizes it.
    fn merge_piece(reference: &ReferenceToken, parsed: &ParsedToken) -> MergedToken {
        match &reference.adposition {
            Some(adp) if adposition_in_text(&adp.surface, &parsed.text) => {
                MergedToken::merge(reference, parsed)
            }
            _ => MergedToken::merge_without_adposition(reference, parsed),
        }
    }

    /// Advance past a one-to-one match
    fn advance_whole(&mut self) {
        let stacked = self.next_is_stacked_sibling();
        self.o += 1;
        if !stacked {
            self.s += 1;
        }
    }
}

fn exact_matches(step: &Step<'_>) -> bool {
    step.text() == step.form()
}

fn head_matches(step: &Step<'_>) -> bool {
    let form = step.form();
    let core = core_text(&form);
    !core.is_empty() && core.as_str() != &*form && step.text() == core.as_str()
        // the parser did not spell out the stripped material
        && step.completion_len().is_none()
}

fn whole_apply(step: &mut Step<'_>) {
    let merged = MergedToken::merge(step.reference(), step.derived());
    step.merged.push(merged);
    step.advance_whole();
}

fn partial_matches(step: &Step<'_>) -> bool {
    let text = step.text();
    let form = step.form();
    !text.is_empty()
        && text.len() < form.len()
        && form.contains(&*text)
        && step.completion_len().is_some()
}

fn partial_apply(step: &mut Step<'_>) {
    let Some(count) = step.completion_len() else {
        return;
    };
    let consumed = &step.derived[step.s..step.s + count];
    let reference = step.reference();
    let mut pieces: Vec<MergedToken> = consumed
        .iter()
        .map(|parsed| Step::merge_piece(reference, parsed))
        .collect();
    step.s += count;

    // punctuation pieces first, then one copy of the word per stacked entry
    while step.next_is_stacked_sibling() {
        step.o += 1;
        let sibling = step.reference();
        pieces.extend(
            consumed
                .iter()
                .filter(|parsed| !parsed.is_punct())
                .map(|parsed| Step::merge_piece(sibling, parsed)),
        );
    }
    step.merged.extend(pieces);
    step.o += 1;
}

fn punctuation_matches(step: &Step<'_>) -> bool {
    let text = step.text();
    is_punctuation(&text) && step.form().contains(&*text)
}

fn punctuation_apply(step: &mut Step<'_>) {
    let derived = step.derived();
    let merged = MergedToken::merge_without_adposition(step.reference(), derived);
    step.merged.push(merged);
    step.s += 1;
    // a space after the punctuation closes the reference word
    if !derived.no_space_after() {
        step.o += 1;
    }
}

/// The built-in rules, in priority order
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            kind: MatchKind::Exact,
            matches: exact_matches,
            apply: whole_apply,
        },
        Rule {
            kind: MatchKind::Head,
            matches: head_matches,
            apply: whole_apply,
        },
        Rule {
            kind: MatchKind::Partial,
            matches: partial_matches,
            apply: partial_apply,
        },
        Rule {
            kind: MatchKind::Punctuation,
            matches: punctuation_matches,
            apply: punctuation_apply,
        },
    ]
}

/// Two-cursor aligner driven by an ordered list of rules
#[derive(Debug, Clone)]
pub struct Aligner {
    rules: Vec<Rule>,
    normalize: bool,
}

impl Default for Aligner {
    fn default() -> Self {
        Self::new()
    }
}

impl Aligner {
    /// Aligner with the built-in rules and NFC normalization
    pub fn new() -> Self {
        Aligner {
            rules: default_rules(),
            normalize: true,
        }
    }

    /// Aligner with a custom rule list
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Aligner {
            rules,
            normalize: true,
        }
    }

    /// Enable or disable NFC normalization before comparing texts
    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Align one parsed sentence.
    ///
    /// `reference` holds the reference tokens of the whole document and
    /// `cursor` is the position of the first reference token not consumed by
    /// previous sentences; it is advanced past this sentence.
    pub fn align_sentence(
        &self,
        reference: &[ReferenceToken],
        cursor: &mut usize,
        derived: &[ParsedToken],
        document: usize,
        sentence: usize,
    ) -> Result<Vec<MergedToken>, AlignError> {
        let mut step = Step {
            reference,
            derived,
            o: *cursor,
            s: 0,
            merged: Vec::with_capacity(derived.len()),
            normalize: self.normalize,
        };

        while step.s < derived.len() {
            if step.o >= reference.len() {
                return Err(AlignError::ReferenceExhausted {
                    document,
                    sentence,
                    derived: Box::new(step.derived().clone()),
                });
            }
            let rule = self
                .rules
                .iter()
                .find(|rule| (rule.matches)(&step))
                .ok_or_else(|| AlignError::NoRuleMatched {
                    document,
                    sentence,
                    reference: Box::new(step.reference().clone()),
                    derived: Box::new(step.derived().clone()),
                })?;
            trace!(
                kind = ?rule.kind,
                reference = %step.reference().form,
                derived = %step.derived().text,
                "alignment step"
            );
            (rule.apply)(&mut step);
        }

        debug!(
            document,
            sentence,
            derived = derived.len(),
            merged = step.merged.len(),
            "aligned sentence"
        );
        *cursor = step.o;
        Ok(step.merged)
    }

    /// Align a whole document, one parsed sentence at a time.
    ///
    /// Every reference token must be consumed by the end of the document.
    pub fn align_document(
        &self,
        document: usize,
        reference: &[ReferenceToken],
        derived: &[Vec<ParsedToken>],
    ) -> Result<Vec<Vec<MergedToken>>, AlignError> {
        let mut cursor = 0;
        let sentences = derived
            .iter()
            .enumerate()
            .map(|(sentence, parsed)| {
                self.align_sentence(reference, &mut cursor, parsed, document, sentence)
            })
            .collect::<Result<Vec<_>, _>>()?;
        ensure_consumed(document, reference, cursor)?;
        Ok(sentences)
    }

    /// Align a single sentence on its own
    pub fn align(
        &self,
        reference: &[ReferenceToken],
        derived: &[ParsedToken],
    ) -> Result<Vec<MergedToken>, AlignError> {
        let mut cursor = 0;
        let merged = self.align_sentence(reference, &mut cursor, derived, 0, 0)?;
        ensure_consumed(0, reference, cursor)?;
        Ok(merged)
    }
}

/// Fail if reference tokens remain after the cursor
pub(crate) fn ensure_consumed(
    document: usize,
    reference: &[ReferenceToken],
    cursor: usize,
) -> Result<(), AlignError> {
    match reference.get(cursor) {
        Some(next) => Err(AlignError::UnconsumedReference {
            document,
            remaining: reference.len() - cursor,
            next: Box::new(next.clone()),
        }),
        None => Ok(()),
    }
}
