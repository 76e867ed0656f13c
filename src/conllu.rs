//! CoNLL-U rendering of split sentences.
//!
//! Each sentence is written as a `# sent_id` and a `# text` comment followed by
//! one ten-column line per node and a blank line. Abstract adposition nodes
//! keep their dotted id (`3.1`) and have `_` for head and relation.
//!
//! Before writing, every non-punctuation node gets a misc bundle: its
//! romanization (`Translit`), the romanized core lemma and morpheme
//! segmentation of multi-morpheme words (`LTranslit`, `MSeg`), and on
//! abstract nodes the adposition with its supersenses (`Adp`, `Scene`,
//! `Funct`). Multi-morpheme lemmas are then reduced to their core lemma.

use std::fmt::{self, Write};

use crate::hangul::transliterate;
use crate::token::{has_no_space_after, Head, Node, EMPTY_FIELD, UPOS_ADP, UPOS_PUNCT};

/// Relation linking the parts of a fixed expression
const DEPREL_FIXED: &str = "fixed";

/// Feature marking the head of a fixed auxiliary expression
const EXTPOS_AUX: &str = "ExtPos=AUX";

/// Coarse categories that never receive case features
const CASELESS: &[&str] = &[UPOS_ADP, "CCONJ", "NUM", "ADV"];

/// `# sent_id` value for 0-based document and sentence indices
pub fn sent_id(prefix: &str, document: usize, sentence: usize) -> String {
    format!("{}{:02}-{:03}", prefix, document + 1, sentence + 1)
}

/// Surface text of a sentence, rebuilt from its word nodes
pub fn sentence_text(nodes: &[Node]) -> String {
    let mut text = String::new();
    for node in nodes.iter().filter(|n| !n.id.is_abstract()) {
        text.push_str(&node.text);
        if !has_no_space_after(node.misc.as_deref()) {
            text.push(' ');
        }
    }
    text.trim().to_string()
}

fn has_segment(tags: &str, wanted: &str) -> bool {
    tags.split('+').any(|tag| tag == wanted)
}

/// Case, mood, tense and verb form features derived from the fine tags and
/// the lemma segmentation of a word node
pub fn morphological_features(node: &Node) -> Option<String> {
    if node.id.is_abstract() {
        return None;
    }
    let mut feats: Vec<&str> = Vec::new();

    if !CASELESS.contains(&node.upos.as_str()) {
        if node.upos != "AUX" && (has_segment(&node.xpos, "jxt") || has_segment(&node.xpos, "jcs")) {
            feats.push("Case=Nom");
        }
        if has_segment(&node.xpos, "jco") {
            feats.push("Case=Acc");
        } else if has_segment(&node.xpos, "jcm") {
            feats.push("Case=Gen");
        }
    }

    if node.upos == "VERB" {
        let inflection = node.lemma.split_once('+').map_or("", |(_, rest)| rest);
        if inflection.contains('라') {
            feats.extend(["Mood=Imp", "VerbForm=Fin"]);
        } else if inflection.contains('다') {
            feats.extend(["Mood=Ind", "VerbForm=Fin"]);
        }
        if inflection.contains('ㅆ') {
            feats.push("Tense=Past");
        } else if inflection.contains('ㄹ') {
            feats.push("Tense=Fut");
        }
        if has_segment(&node.lemma, "ㅁ") {
            feats.push("VerbForm=Ger");
        }
    }

    if feats.is_empty() {
        None
    } else {
        feats.sort_unstable();
        Some(feats.join("|"))
    }
}

/// Mark the head word of every fixed expression as an auxiliary construction
fn mark_fixed_heads(nodes: &mut [Node]) {
    for i in 0..nodes.len() {
        if nodes[i].deprel.as_deref() != Some(DEPREL_FIXED) {
            continue;
        }
        let Some(head) = nodes[..i].iter_mut().rev().find(|n| !n.id.is_abstract()) else {
            continue;
        };
        let mut feats: Vec<&str> = head
            .feats
            .as_deref()
            .map_or_else(Vec::new, |f| f.split('|').collect());
        if !feats.contains(&EXTPOS_AUX) {
            feats.push(EXTPOS_AUX);
            feats.sort_unstable();
        }
        head.feats = Some(feats.join("|"));
        head.upos = "NOUN".to_string();
        if head.deprel.as_deref() == Some("advmod") {
            head.deprel = Some("obl".to_string());
            if let Some(governor) = head.head {
                head.deps = Some(format!("{}:obl", governor));
            }
        }
    }
}

fn tag_position(tags: &[&str], wanted: impl Fn(&str) -> bool) -> Option<usize> {
    tags.iter().position(|tag| wanted(tag))
}

/// The lemma segment naming what a multi-morpheme word is about: the counter
/// of a numeral, else the verb stem, else the first nominal or predicate
/// segment, else the first segment. `None` for single-morpheme lemmas.
pub fn core_lemma<'a>(lemma: &'a str, xpos: &str, upos: &str) -> Option<&'a str> {
    let lemmas: Vec<&str> = lemma.split('+').collect();
    if lemmas.len() < 2 {
        return None;
    }
    let tags: Vec<&str> = xpos.split('+').collect();
    let nominal = tag_position(&tags, |tag| tag.starts_with('n'));

    let index = if upos == "NUM" {
        tag_position(&tags, |tag| tag == "nbu").or(nominal)
    } else {
        tag_position(&tags, |tag| tag == "pvg")
            .or(nominal)
            .or_else(|| tag_position(&tags, |tag| tag.starts_with('p')))
    };
    // segment counts may disagree with a mis-tagged lemma
    Some(index.and_then(|i| lemmas.get(i)).copied().unwrap_or(lemmas[0]))
}

/// Sorted misc bundle of a node, keeping the flags already present
fn misc_bundle(node: &Node, core: Option<&str>) -> String {
    let mut misc: Vec<String> = node
        .misc
        .as_deref()
        .filter(|m| *m != EMPTY_FIELD)
        .map_or_else(Vec::new, |m| m.split('|').map(str::to_string).collect());

    if let Some(core) = core {
        misc.push(format!("LTranslit={}", transliterate(core)));
        misc.push(format!("MSeg={}", node.lemma.replace('+', "-")));
    }
    misc.push(format!("Translit={}", transliterate(&node.text)));

    if let Some(adposition) = &node.adposition {
        misc.push(format!("Adp={}", adposition.surface));
        if let Some(scene) = &adposition.scene {
            misc.push(format!("Scene={}", scene));
        }
        if let Some(function) = &adposition.function {
            misc.push(format!("Funct={}", function));
        }
    }

    misc.sort_unstable();
    misc.join("|")
}

/// Fill the misc bundle and reduce the lemma to its core
fn romanize_node(node: &mut Node) {
    if node.upos == UPOS_PUNCT {
        return;
    }
    let core = core_lemma(&node.lemma, &node.xpos, &node.upos).map(str::to_string);
    node.misc = Some(misc_bundle(node, core.as_deref()));
    if let Some(core) = core {
        node.lemma = core;
    }
}

fn field(value: &str) -> &str {
    if value.is_empty() {
        EMPTY_FIELD
    } else {
        value
    }
}

/// One ten-column CoNLL-U line, without the newline
pub fn format_node(node: &Node) -> String {
    let head = node.head.map(|h: Head| h.to_string());
    [
        node.id.to_string().as_str(),
        field(&node.text),
        field(&node.lemma),
        field(&node.upos),
        field(&node.xpos),
        node.feats.as_deref().unwrap_or(EMPTY_FIELD),
        head.as_deref().unwrap_or(EMPTY_FIELD),
        node.deprel.as_deref().unwrap_or(EMPTY_FIELD),
        node.deps.as_deref().unwrap_or(EMPTY_FIELD),
        node.misc.as_deref().unwrap_or(EMPTY_FIELD),
    ]
    .join("\t")
}

/// Derive features, misc bundles, core lemmas and fixed-expression marks for
/// a sentence about to be written
pub fn prepare_sentence(nodes: &[Node]) -> Vec<Node> {
    let mut prepared: Vec<Node> = nodes
        .iter()
        .map(|node| Node {
            feats: morphological_features(node),
            ..node.clone()
        })
        .collect();
    prepared.iter_mut().for_each(romanize_node);
    mark_fixed_heads(&mut prepared);
    prepared
}

/// Write one sentence block: comments, node lines and the closing blank line
pub fn write_sentence<W: Write>(out: &mut W, sent_id: &str, nodes: &[Node]) -> fmt::Result {
    let nodes = prepare_sentence(nodes);
    writeln!(out, "# sent_id = {}", sent_id)?;
    writeln!(out, "# text = {}", sentence_text(&nodes))?;
    for node in &nodes {
        writeln!(out, "{}", format_node(node))?;
    }
    writeln!(out)
}

/// Write every sentence of a document
pub fn write_document<W: Write>(
    out: &mut W,
    prefix: &str,
    document: usize,
    sentences: &[Vec<Node>],
) -> fmt::Result {
    for (sentence, nodes) in sentences.iter().enumerate() {
        write_sentence(out, &sent_id(prefix, document, sentence), nodes)?;
    }
    Ok(())
}
