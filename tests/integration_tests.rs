//! Integration tests for the alignment pipeline
//!
//! These tests run sentences shaped like the annotated corpus through the
//! public API, from reference and parser tokens to CoNLL-U lines and tags.

use proptest::prelude::*;
use snacs_align::{
    populate_lextags, read_sentences, sentence_tags, Adposition, Aligner, BoundaryAdjuster, Head,
    LexToken, MergedToken, NodeId, ParsedToken, Pipeline, PipelineConfig, PrecomputedParses,
    ReferenceId, ReferenceToken, Span, TagTable,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn parsed(id: u32, text: &str, lemma: &str, upos: &str, xpos: &str, head: u32) -> ParsedToken {
    let mut token = ParsedToken::with_text(id, text, 0, text.chars().count());
    token.lemma = lemma.to_string();
    token.upos = upos.to_string();
    token.xpos = xpos.to_string();
    token.head = Head::from(head);
    token.deprel = if head == 0 { "root" } else { "dep" }.to_string();
    token
}

fn glued(mut token: ParsedToken) -> ParsedToken {
    token.misc = Some("SpaceAfter=No".to_string());
    token
}

fn at(mut token: ParsedToken, start: usize) -> ParsedToken {
    token.span = Span::new(start, start + token.text.chars().count());
    token
}

fn tag_table() -> TagTable {
    TagTable::from_json(
        r#"{
            "에": "jca",
            "에서": "jca",
            "는": "jxt",
            "을": "jco",
            "만": "jxc",
            "은": "jxt",
            "와": {"Ensemble": "jcj", "Accompanier": "jct"}
        }"#,
    )
    .unwrap()
}

// =============================================================================
// Aligner
// =============================================================================

#[test]
fn test_punctuation_split_from_reference_word() {
    // "있겠지......>하고" in the reference, split four ways by the parser
    let reference = vec![ReferenceToken::new(
        ReferenceId::new(1),
        "있겠지...>하고",
        "있+겠+지+...+>+하+고",
    )];
    let derived = vec![
        glued(parsed(1, "있겠지", "있+겠+지", "VERB", "pvg+ep+ef", 0)),
        glued(parsed(2, "...", "...", "PUNCT", "sf", 1)),
        glued(parsed(3, ">", ">", "PUNCT", "sr", 1)),
        parsed(4, "하고", "하+고", "VERB", "pvg+ecc", 1),
    ];

    let merged = Aligner::new().align(&reference, &derived).unwrap();
    let texts: Vec<&str> = merged.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["있겠지", "...", ">", "하고"]);
    assert!(merged.iter().all(|t| t.form == "있겠지...>하고"));
}

#[test]
fn test_stacked_adpositions_duplicate_the_word() {
    let reference = vec![
        ReferenceToken::new(ReferenceId::stacked(1, 1), "\"저녁에는", "\"+저녁+에+는")
            .with_adposition(Adposition::new("에", Some("Time"), Some("Time"))),
        ReferenceToken::new(ReferenceId::stacked(1, 2), "\"저녁에는", "\"+저녁+에+는")
            .with_adposition(Adposition::new("는", Some("Topic"), Some("Topic"))),
    ];
    let derived = vec![
        glued(parsed(1, "\"", "\"", "PUNCT", "sl", 2)),
        parsed(2, "저녁에는", "저녁+에+는", "NOUN", "ncn+jca+jxt", 0),
    ];

    let merged = Aligner::new().align(&reference, &derived).unwrap();
    assert_eq!(merged.len(), 3);
    // punctuation first, then one entry per stacked adposition
    assert!(merged[0].is_punct());
    assert!(merged[0].adposition.is_none());
    let words: Vec<(&str, ReferenceId)> = merged[1..]
        .iter()
        .map(|t| (t.text.as_str(), t.reference_id))
        .collect();
    assert_eq!(
        words,
        vec![
            ("저녁에는", ReferenceId::stacked(1, 1)),
            ("저녁에는", ReferenceId::stacked(1, 2)),
        ]
    );
    assert_eq!(merged[1].span, merged[2].span);
    assert_eq!(merged[2].adposition.as_ref().unwrap().surface, "는");
}

fn hangul_word() -> impl Strategy<Value = String> {
    "[가-힣]{1,4}"
}

proptest! {
    #[test]
    fn prop_aligner_consumes_every_derived_token_once(
        words in prop::collection::vec((hangul_word(), any::<bool>()), 1..8)
    ) {
        let mut reference = Vec::new();
        let mut derived = Vec::new();
        for (i, (word, period)) in words.iter().enumerate() {
            let form = if *period { format!("{}.", word) } else { word.clone() };
            reference.push(ReferenceToken::new(ReferenceId::new(i as u32 + 1), &form, &form));
            let id = derived.len() as u32 + 1;
            if *period {
                derived.push(glued(parsed(id, word, word, "NOUN", "ncn", 0)));
                derived.push(parsed(id + 1, ".", ".", "PUNCT", "sf", id));
            } else {
                derived.push(parsed(id, word, word, "NOUN", "ncn", 0));
            }
        }

        let merged = Aligner::new().align(&reference, &derived).unwrap();
        prop_assert_eq!(merged.len(), derived.len());
        for (m, d) in merged.iter().zip(&derived) {
            prop_assert_eq!(m.id, d.id);
            prop_assert_eq!(&m.text, &d.text);
        }
    }

    #[test]
    fn prop_every_head_is_remapped(
        tokens in prop::collection::vec((prop::bool::weighted(0.4), 0u32..=8), 1..9)
    ) {
        let n = tokens.len() as u32;
        let sentence: Vec<MergedToken> = tokens
            .iter()
            .enumerate()
            .map(|(i, (period, head))| {
                let id = i as u32 + 1;
                let text = if *period { "." } else { "말" };
                let reference = ReferenceToken::new(ReferenceId::new(id), text, text);
                let parsed = parsed(id, text, text, "X", "x", head % (n + 1));
                MergedToken::merge(&reference, &parsed)
            })
            .collect();

        let adjusted = BoundaryAdjuster::default().adjust(&sentence).unwrap();
        let len = adjusted.len() as u32;
        for (i, token) in adjusted.iter().enumerate() {
            prop_assert_eq!(token.id, i as u32 + 1);
            if let Head::Id(head) = token.head {
                prop_assert!(head >= 1 && head <= len);
            }
        }
    }
}

// =============================================================================
// Boundary adjustment
// =============================================================================

#[test]
fn test_ellipsis_coalesced_through_pipeline() {
    init_tracing();
    let tags = tag_table();
    let reference = vec![vec![
        ReferenceToken::new(ReferenceId::new(1), "그래...", "그래+..."),
        ReferenceToken::new(ReferenceId::new(2), "좋아", "좋+아"),
    ]];
    let parses = vec![vec![
        glued(parsed(1, "그래", "그래", "INTJ", "ii", 5)),
        glued(parsed(2, ".", ".", "PUNCT", "sf", 1)),
        glued(parsed(3, ".", ".", "PUNCT", "sf", 2)),
        parsed(4, ".", ".", "PUNCT", "sf", 1),
        parsed(5, "좋아", "좋+아", "ADJ", "paa+ef", 0),
    ]];

    let pipeline = Pipeline::new(&tags);
    let mut parser = PrecomputedParses::new(parses);
    let document = pipeline.process_document(&mut parser, 0, &reference).unwrap();

    let nodes = &document.sentences[0];
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[1].text, "...");
    assert_eq!(nodes[1].xpos, "sf");
    assert_eq!(nodes[0].head, Some(Head::Id(3)));
    assert_eq!(nodes[1].head, Some(Head::Id(1)));
    assert_eq!(nodes[2].head, Some(Head::Root));
}

// =============================================================================
// Node splitting and CoNLL-U
// =============================================================================

#[test]
fn test_document_to_conllu() {
    init_tracing();
    let tags = tag_table();
    let reference = vec![vec![
        ReferenceToken::new(ReferenceId::new(1), "친구와", "친구+와")
            .with_adposition(Adposition::new("와", Some("Accompanier"), Some("Accompanier"))),
        ReferenceToken::new(ReferenceId::new(2), "별을", "별+을")
            .with_adposition(Adposition::new("을", None, None)),
        ReferenceToken::new(ReferenceId::new(3), "보았다.", "보+았+다+."),
    ]];
    let parses = vec![vec![
        parsed(1, "친구와", "친구+와", "NOUN", "ncn+jct", 3),
        parsed(2, "별을", "별+을", "NOUN", "ncn+jco", 3),
        glued(parsed(3, "보았다", "보+았+다", "VERB", "pvg+ep+ef", 0)),
        parsed(4, ".", ".", "PUNCT", "sf", 3),
    ]];

    let config = PipelineConfig {
        sent_id_prefix: "lpp.ko".to_string(),
        ..Default::default()
    };
    let pipeline = Pipeline::with_config(&config, &tags).unwrap();
    let mut parser = PrecomputedParses::new(parses);
    let book = pipeline.process_book(&mut parser, &[reference]).unwrap();

    let mut out = String::new();
    book.write_conllu(&mut out).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "# sent_id = lpp.ko01-001",
            "# text = 친구와 별을 보았다.",
            "1\t친구와\t친구\tNOUN\tncn+jct\t_\t3\tdep\t_\tLTranslit=.chin.gu|MSeg=친구-와|Translit=.chin.gu.wa",
            "1.1\t와\t와\tADP\tjct\t_\t_\t_\t1:case\tAdp=와|Funct=Accompanier|Scene=Accompanier|Translit=.wa",
            "2\t별을\t별\tNOUN\tncn+jco\tCase=Acc\t3\tdep\t_\tLTranslit=.byeol|MSeg=별-을|Translit=.byeol.eul",
            "2.1\t을\t을\tADP\tjco\t_\t_\t_\t2:case\tAdp=을|Translit=.eul",
            "3\t보았다\t보\tVERB\tpvg+ep+ef\tMood=Ind|VerbForm=Fin\t0\troot\t_\tLTranslit=.bo|MSeg=보-았-다|SpaceAfter=No|Translit=.bo.ass.da",
            "4\t.\t.\tPUNCT\tsf\t_\t3\tdep\t_\t_",
            "",
        ]
    );
    assert!(book.report.is_clean());
}

#[test]
fn test_three_stacked_adpositions_to_conllu() {
    init_tracing();
    let tags = tag_table();
    let entry = |stack: u32, p: &str, ss: &str| {
        ReferenceToken::new(ReferenceId::stacked(1, stack), "집에서만은", "집+에서+만+은")
            .with_adposition(Adposition::new(p, Some(ss), Some(ss)))
    };
    let reference = vec![vec![
        entry(1, "에서", "Locus"),
        entry(2, "만", "Focus"),
        entry(3, "은", "Topic"),
        ReferenceToken::new(ReferenceId::new(2), "잤다", "자+았+다"),
    ]];
    let parses = vec![vec![
        parsed(1, "집에서만은", "집+에서+만+은", "NOUN", "ncn+jca+jxc+jxt", 2),
        at(parsed(2, "잤다", "자+았+다", "VERB", "pvg+ep+ef", 0), 6),
    ]];

    let pipeline = Pipeline::new(&tags);
    let mut parser = PrecomputedParses::new(parses);
    let book = pipeline.process_book(&mut parser, &[reference]).unwrap();

    let nodes = &book.documents[0].sentences[0];
    let ids: Vec<String> = nodes.iter().map(|n| n.id.to_string()).collect();
    assert_eq!(ids, vec!["1", "1.1", "1.2", "1.3", "2"]);
    assert!(nodes[1..4].iter().all(|n| n.deps.as_deref() == Some("1:case")));
    assert_eq!(nodes[3].span, Some(Span::new(4, 5)));
    assert!(book.report.is_clean());

    let mut out = String::new();
    book.write_conllu(&mut out).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[1], "# text = 집에서만은 잤다");
    assert_eq!(
        lines[2],
        "1\t집에서만은\t집\tNOUN\tncn+jca+jxc+jxt\tCase=Nom\t2\tdep\t_\tLTranslit=.jib|MSeg=집-에서-만-은|Translit=.jib.e.seo.man.eun"
    );
    assert_eq!(
        lines[5],
        "1.3\t은\t은\tADP\tjxt\t_\t_\t_\t1:case\tAdp=은|Funct=Topic|Scene=Topic|Translit=.eun"
    );
    assert_eq!(
        lines[6],
        "2\t잤다\t자\tVERB\tpvg+ep+ef\tMood=Ind|VerbForm=Fin\t0\troot\t_\tLTranslit=.ja|MSeg=자-았-다|Translit=.jass.da"
    );
}

#[test]
fn test_stacked_word_split_by_parser() {
    init_tracing();
    let tags = tag_table();
    // "3시에는": the parser splits off the numeral
    let reference = vec![vec![
        ReferenceToken::new(ReferenceId::stacked(1, 1), "3시에는", "3+시+에+는")
            .with_adposition(Adposition::new("에", Some("Time"), Some("Time"))),
        ReferenceToken::new(ReferenceId::stacked(1, 2), "3시에는", "3+시+에+는")
            .with_adposition(Adposition::new("는", Some("Topic"), Some("Topic"))),
        ReferenceToken::new(ReferenceId::new(2), "왔다", "오+았+다"),
    ]];
    let parses = vec![vec![
        glued(parsed(1, "3", "3", "NUM", "nnc", 2)),
        at(parsed(2, "시에는", "시+에+는", "NOUN", "nbu+jca+jxt", 3), 1),
        at(parsed(3, "왔다", "오+았+다", "VERB", "pvg+ep+ef", 0), 5),
    ]];

    let pipeline = Pipeline::new(&tags);
    let mut parser = PrecomputedParses::new(parses);
    let book = pipeline.process_book(&mut parser, &[reference]).unwrap();

    let nodes = &book.documents[0].sentences[0];
    let ids: Vec<String> = nodes.iter().map(|n| n.id.to_string()).collect();
    assert_eq!(ids, vec!["1", "2", "2.1", "2.2", "3"]);
    assert_eq!(nodes[2].text, "에");
    assert_eq!(nodes[3].text, "는");
    assert_eq!(nodes[3].deps.as_deref(), Some("2:case"));
    assert_eq!(nodes[1].head, Some(Head::Id(3)));
    assert_eq!(nodes[4].head, Some(Head::Root));
    assert!(book.report.is_clean());
}

#[test]
fn test_quality_problems_are_counted_not_fatal() {
    init_tracing();
    let tags = tag_table();
    let reference = vec![vec![
        ReferenceToken::new(ReferenceId::new(1), "나와", "나+와")
            .with_adposition(Adposition::new("와", Some("Goal"), Some("Goal"))),
        ReferenceToken::new(ReferenceId::new(2), "집에", "집+에")
            .with_adposition(Adposition::new("에", Some("Goal"), Some("Goal"))),
    ]];
    let parses = vec![vec![
        parsed(1, "나와", "나+와", "PRON", "npp+jct", 2),
        parsed(2, "집에", "집", "NOUN", "ncn+ncn", 0),
    ]];

    let pipeline = Pipeline::new(&tags);
    let mut parser = PrecomputedParses::new(parses);
    let book = pipeline.process_book(&mut parser, &[reference]).unwrap();

    let nodes = &book.documents[0].sentences[0];
    assert_eq!(nodes[1].id, NodeId::Abstract { host: 1, ord: 1 });
    assert_eq!(nodes[1].xpos, "ERROR");
    assert!(nodes[2].match_error);
    assert!(nodes[2].xpos_error);
    assert_eq!(book.report.lookup_errors, 1);
    assert_eq!(book.report.match_errors, 1);
    assert_eq!(book.report.xpos_errors, 1);
}

// =============================================================================
// MWE tags
// =============================================================================

fn tags_of(ids: &[u32], strong: &[Vec<u32>], weak: &[Vec<u32>]) -> Vec<String> {
    sentence_tags(ids, strong, weak)
        .values()
        .map(|tag| tag.to_string())
        .collect()
}

#[test]
fn test_contiguous_strong_mwe() {
    assert_eq!(
        tags_of(&[1, 2, 3, 4, 5], &[vec![2, 3, 4]], &[]),
        vec!["O", "B", "I_", "I_", "O"]
    );
}

#[test]
fn test_strong_mwe_with_gap() {
    assert_eq!(tags_of(&[1, 2, 3], &[vec![1, 3]], &[]), vec!["B", "o", "I_"]);
}

#[test]
fn test_weak_mwe_conflicting_with_strong_gap() {
    // weak {2, 4} straddles the gap of strong {1, 3} and is discarded
    assert_eq!(
        tags_of(&[1, 2, 3, 4], &[vec![1, 3]], &[vec![2, 4]]),
        vec!["B", "o", "I_", "O"]
    );
}

#[test]
fn test_lextags_from_conllulex_lines() {
    let text = [
        "# sent_id = lpp.ko01-001",
        "1\t어린\t어리+ㄴ\tADJ\tpaa+etm\t_\t2\tamod\t_\t_\t_\t_\tV\tv.stative\t_\t_\t_\t_\t_",
        "2\t왕자는\t왕자+는\tNOUN\tncn+jxt\t_\t0\troot\t_\t_\t_\t_\tN\tn.PERSON\t_\t_\t_\t_\t_",
        "2.1\t는\t는\tADP\tjxt\t_\t_\t_\t2:case\t_\t_\t_\tP\tp.Topic\tp.Topic\t_\t_\t_\t_",
        "3-4\t한번\t_\t_\t_\t_\t_\t_\t_\t_",
        "3\t한\t한\tDET\tmma\t_\t4\tdet\t_\t_\t1:1\t_\tN\tn.TIME\t_\t_\t_\t_\t_",
        // short row, malformed weak membership
        "4\t번\t번\tNOUN\tnbu\t_\t2\tobl\t_\t_\t1:2\t?:1\tN",
        "",
    ]
    .join("\n");

    let sentences = read_sentences(&text);
    assert_eq!(sentences.len(), 1);
    let tokens: Vec<LexToken> = sentences.into_iter().flatten().collect();
    assert_eq!(tokens.len(), 5);
    assert_eq!(tokens[4].weak, None);

    assert_eq!(
        populate_lextags(&tokens),
        vec!["O-V-v.stative", "O-N-n.PERSON", "O-P-p.Topic", "B-N-n.TIME", "I_"]
    );
}
