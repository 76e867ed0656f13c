//! Token boundary adjustment.
//!
//! The parser tends to break an ellipsis into single periods. This stage
//! glues such runs back together, renumbers the sentence from 1 and rewrites
//! heads to the new numbering.

use std::collections::HashMap;
use tracing::debug;

use crate::error::AdjustError;
use crate::token::{Head, MergedToken};

/// Coalesces period runs and renumbers a merged sentence
#[derive(Debug, Clone)]
pub struct BoundaryAdjuster {
    ellipsis: String,
}

impl Default for BoundaryAdjuster {
    fn default() -> Self {
        Self::new('.')
    }
}

impl BoundaryAdjuster {
    /// Adjuster that coalesces runs of `ellipsis`
    pub fn new(ellipsis: char) -> Self {
        BoundaryAdjuster {
            ellipsis: ellipsis.to_string(),
        }
    }

    fn is_lone_period(&self, token: &MergedToken) -> bool {
        token.text == self.ellipsis
    }

    /// Length of the run of lone periods starting at `start`
    fn run_len(&self, sentence: &[MergedToken], start: usize) -> usize {
        sentence[start..]
            .iter()
            .take_while(|t| self.is_lone_period(t))
            .count()
    }

    /// Coalesce period runs and renumber; heads are rewritten once the whole
    /// sentence has been renumbered, since they may point forward.
    pub fn adjust(&self, sentence: &[MergedToken]) -> Result<Vec<MergedToken>, AdjustError> {
        let (mut adjusted, remap) = self.renumber(sentence);
        remap_heads(&mut adjusted, &remap)?;
        Ok(adjusted)
    }

    /// First pass: coalesce and renumber, recording old id -> new id
    fn renumber(&self, sentence: &[MergedToken]) -> (Vec<MergedToken>, HashMap<u32, u32>) {
        let mut adjusted = Vec::with_capacity(sentence.len());
        let mut remap: HashMap<u32, u32> = HashMap::new();
        let mut next_id = 1;
        let mut i = 0;

        while i < sentence.len() {
            let token = &sentence[i];

            let run = self.run_len(sentence, i);
            if run >= 2 {
                let members = &sentence[i..i + run];
                adjusted.push(MergedToken::coalesce(members, next_id));
                for member in members {
                    remap.entry(member.id).or_insert(next_id);
                }
                debug!(run, id = next_id, "coalesced period run");
                i += run;
                next_id += 1;
                continue;
            }

            adjusted.push(token.renumbered(next_id));
            // stacked entries share the parsed token of their host, which
            // keeps its mapping
            remap.entry(token.id).or_insert(next_id);
            if !token.reference_id.is_stack_continuation() {
                next_id += 1;
            }
            i += 1;
        }

        (adjusted, remap)
    }
}

/// Second pass: rewrite non-root heads through `remap`
fn remap_heads(sentence: &mut [MergedToken], remap: &HashMap<u32, u32>) -> Result<(), AdjustError> {
    for token in sentence.iter_mut() {
        if let Head::Id(head) = token.head {
            let new_head = remap.get(&head).ok_or(AdjustError::UnmappedHead {
                token: token.id,
                head,
            })?;
            token.head = Head::Id(*new_head);
        }
    }
    Ok(())
}
