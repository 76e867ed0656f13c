//! Positional tags for multiword expressions.
//!
//! Given the strong and weak MWE groups of a sentence, every token gets one
//! of eight tags: `O`/`B` outside or beginning a group, `I_`/`I~` inside a
//! strong/weak group, and lower-case variants of each for tokens that sit in
//! the gap of a discontiguous group.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Cohesion of an MWE group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strength {
    Strong,
    Weak,
}

/// Positional MWE tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MweTag {
    /// Outside any group
    O,
    /// Begins a group
    B,
    /// Outside any group, inside another group's gap
    GapO,
    /// Begins a group inside another group's gap
    GapB,
    /// Continues a strong group
    IBar,
    /// Continues a strong group inside a gap
    GapIBar,
    /// Continues a weak group
    ITilde,
    /// Continues a weak group inside a gap
    GapITilde,
}

impl MweTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            MweTag::O => "O",
            MweTag::B => "B",
            MweTag::GapO => "o",
            MweTag::GapB => "b",
            MweTag::IBar => "I_",
            MweTag::GapIBar => "i_",
            MweTag::ITilde => "I~",
            MweTag::GapITilde => "i~",
        }
    }

    /// Whether the token is part of a group (as beginning or continuation)
    pub fn in_group(&self) -> bool {
        !matches!(self, MweTag::O | MweTag::GapO)
    }
}

impl fmt::Display for MweTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Group links and gaps collected for one sentence
#[derive(Debug, Default)]
pub struct GroupIndex {
    /// member -> (preceding member, strength of the group)
    parents: HashMap<u32, (u32, Strength)>,
    /// gap position -> strength of the group that opened the gap
    gaps: HashMap<u32, Strength>,
}

fn sorted_group(group: &[u32]) -> Vec<u32> {
    let mut sorted = group.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}

/// Ids strictly between consecutive members of a sorted group
fn gap_positions(sorted: &[u32]) -> impl Iterator<Item = u32> + '_ {
    sorted.windows(2).flat_map(|pair| pair[0] + 1..pair[1])
}

impl GroupIndex {
    pub fn new() -> Self {
        GroupIndex::default()
    }

    /// Link consecutive members; an existing link is never overwritten
    fn link(&mut self, sorted: &[u32], strength: Strength) {
        for pair in sorted.windows(2) {
            self.parents.entry(pair[1]).or_insert((pair[0], strength));
        }
    }

    /// Add a strong group. Returns false if the group was discarded because
    /// one of its gaps overlaps an existing gap.
    pub fn add_strong(&mut self, group: &[u32]) -> bool {
        let sorted = sorted_group(group);
        if gap_positions(&sorted).any(|h| self.gaps.contains_key(&h)) {
            debug!(?sorted, "strong group overlaps an existing gap, discarded");
            return false;
        }
        self.link(&sorted, Strength::Strong);
        for h in gap_positions(&sorted) {
            self.gaps.insert(h, Strength::Strong);
        }
        true
    }

    /// Add a weak group. Returns false if the group was discarded because it
    /// straddles the boundary of an existing gap.
    pub fn add_weak(&mut self, group: &[u32]) -> bool {
        let sorted = sorted_group(group);
        let inside = sorted.iter().any(|id| self.gaps.contains_key(id));
        let outside = sorted.iter().any(|id| !self.gaps.contains_key(id));
        if inside && outside {
            debug!(?sorted, "weak group straddles a gap, discarded");
            return false;
        }
        self.link(&sorted, Strength::Weak);
        for h in gap_positions(&sorted) {
            self.gaps.entry(h).or_insert(Strength::Weak);
        }
        true
    }

    /// Tag each of `token_ids`, in ascending order
    pub fn tags(&self, token_ids: &[u32]) -> BTreeMap<u32, MweTag> {
        let predecessors: HashSet<u32> = self.parents.values().map(|&(p, _)| p).collect();

        token_ids
            .iter()
            .map(|&id| {
                let in_gap = self.gaps.contains_key(&id);
                let tag = match self.parents.get(&id) {
                    None if predecessors.contains(&id) => {
                        if in_gap {
                            MweTag::GapB
                        } else {
                            MweTag::B
                        }
                    }
                    None => {
                        if in_gap {
                            MweTag::GapO
                        } else {
                            MweTag::O
                        }
                    }
                    Some((_, Strength::Strong)) => {
                        if in_gap {
                            MweTag::GapIBar
                        } else {
                            MweTag::IBar
                        }
                    }
                    Some((_, Strength::Weak)) => {
                        if in_gap {
                            MweTag::GapITilde
                        } else {
                            MweTag::ITilde
                        }
                    }
                };
                (id, tag)
            })
            .collect()
    }
}

/// Tag the tokens of one sentence.
///
/// Strong groups are indexed before weak groups, each in the order given.
pub fn sentence_tags(
    token_ids: &[u32],
    strong: &[Vec<u32>],
    weak: &[Vec<u32>],
) -> BTreeMap<u32, MweTag> {
    let mut index = GroupIndex::new();
    for group in strong {
        index.add_strong(group);
    }
    for group in weak {
        index.add_weak(group);
    }
    index.tags(token_ids)
}
