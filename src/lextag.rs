//! The LEXTAG column of CoNLL-U-Lex.
//!
//! Strong and weak MWE memberships are read from their `group:position`
//! columns, turned into groups, tagged with [`crate::mwe`], and the tag is
//! decorated with the lexical category and supersenses:
//!
//! ```text
//! B-N-Locus            first token of an MWE
//! I_                   later token of a strong MWE
//! O-P-Locus|Goal       single-word adposition with two different supersenses
//! ```

use std::str::FromStr;
use tracing::debug;

use crate::error::LexError;
use crate::mwe::sentence_tags;
use crate::token::EMPTY_FIELD;

/// Number of columns of a CoNLL-U-Lex token line
pub const LEX_COLUMNS: usize = 19;

/// Column indices used here
const COL_ID: usize = 0;
const COL_SMWE: usize = 10;
const COL_WMWE: usize = 11;
const COL_LEXCAT: usize = 12;
const COL_SS: usize = 13;
const COL_SS2: usize = 14;
const COL_WCAT: usize = 15;

/// A token's membership in an MWE group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    pub group: u32,
    /// 1-based position within the group
    pub position: u32,
}

impl FromStr for Membership {
    type Err = LexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LexError::InvalidMembership(s.to_string());
        let mut parts = s.split(':');
        let group = parts
            .next()
            .and_then(|g| g.trim().parse().ok())
            .ok_or_else(invalid)?;
        let position = match parts.next() {
            None | Some(EMPTY_FIELD) => 1,
            Some(p) => p.trim().parse().map_err(|_| invalid())?,
        };
        Ok(Membership { group, position })
    }
}

/// Lexical-semantic fields of one token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexToken {
    pub id: u32,
    pub strong: Option<Membership>,
    pub weak: Option<Membership>,
    pub lexcat: Option<String>,
    pub supersense: Option<String>,
    pub supersense2: Option<String>,
    /// Lexical category of the weak MWE this token begins
    pub weak_lexcat: Option<String>,
}

fn field(value: &str) -> Option<String> {
    if value == EMPTY_FIELD || value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// A malformed membership reads as no membership
fn membership(value: &str) -> Option<Membership> {
    if value == EMPTY_FIELD {
        return None;
    }
    match value.parse() {
        Ok(m) => Some(m),
        Err(e) => {
            debug!(error = %e, "membership ignored");
            None
        }
    }
}

impl LexToken {
    /// Read the fields from the columns of a CoNLL-U-Lex line.
    ///
    /// Short rows read as if padded with `_` up to [`LEX_COLUMNS`]. Abstract
    /// node ids (`3.1`) are read as their host word's id; any other id that is
    /// not a number (a multiword range such as `3-4`) is an error.
    pub fn from_columns(cols: &[&str]) -> Result<Self, LexError> {
        let col = |index: usize| cols.get(index).copied().unwrap_or(EMPTY_FIELD);
        let raw_id = col(COL_ID);
        let id = raw_id
            .split('.')
            .next()
            .and_then(|whole| whole.parse().ok())
            .ok_or_else(|| LexError::InvalidId(raw_id.to_string()))?;

        Ok(LexToken {
            id,
            strong: membership(col(COL_SMWE)),
            weak: membership(col(COL_WMWE)),
            lexcat: field(col(COL_LEXCAT)),
            supersense: field(col(COL_SS)),
            supersense2: field(col(COL_SS2)),
            weak_lexcat: field(col(COL_WCAT)),
        })
    }

    /// Read one tab-separated line; comments, blank lines and multiword
    /// ranges give `None`
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let cols: Vec<&str> = line.split('\t').collect();
        match LexToken::from_columns(&cols) {
            Ok(token) => Some(token),
            Err(e) => {
                debug!(error = %e, "line skipped");
                None
            }
        }
    }
}

/// Split CoNLL-U-Lex text into sentences of tokens; sentences are separated
/// by blank lines
pub fn read_sentences(text: &str) -> Vec<Vec<LexToken>> {
    let mut sentences = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                sentences.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(token) = LexToken::from_line(line) {
            current.push(token);
        }
    }
    if !current.is_empty() {
        sentences.push(current);
    }
    sentences
}

/// Collect group members in order of first appearance of each group
fn collect_groups<F>(tokens: &[LexToken], member: F) -> Vec<Vec<u32>>
where
    F: Fn(&LexToken) -> Option<Membership>,
{
    let mut order: Vec<u32> = Vec::new();
    let mut groups: Vec<Vec<u32>> = Vec::new();
    for token in tokens {
        if let Some(m) = member(token) {
            match order.iter().position(|&g| g == m.group) {
                Some(idx) => groups[idx].push(token.id),
                None => {
                    order.push(m.group);
                    groups.push(vec![token.id]);
                }
            }
        }
    }
    groups
}

/// Compute the LEXTAG value of every token of a sentence, in input order
pub fn populate_lextags(tokens: &[LexToken]) -> Vec<String> {
    let strong = collect_groups(tokens, |t| t.strong);
    let weak = collect_groups(tokens, |t| t.weak);
    let mut ids: Vec<u32> = tokens.iter().map(|t| t.id).collect();
    ids.sort_unstable();
    ids.dedup();
    let tags = sentence_tags(&ids, &strong, &weak);

    tokens
        .iter()
        .map(|token| {
            let mut lextag = tags
                .get(&token.id)
                .map_or("O", |tag| tag.as_str())
                .to_string();

            // only the first token of a strong MWE carries its labels
            if token.strong.map_or(true, |m| m.position == 1) {
                if let Some(lexcat) = &token.lexcat {
                    lextag.push('-');
                    lextag.push_str(lexcat);
                }
                if let Some(ss) = &token.supersense {
                    lextag.push('-');
                    lextag.push_str(ss);
                    if let Some(ss2) = token.supersense2.as_ref().filter(|ss2| *ss2 != ss) {
                        lextag.push('|');
                        lextag.push_str(ss2);
                    }
                }
            }

            if let (Some(weak), Some(wcat)) = (token.weak, &token.weak_lexcat) {
                if weak.position == 1 {
                    lextag.push('+');
                    lextag.push_str(wcat);
                }
            }
            lextag
        })
        .collect()
}
