//! Hangul syllable analysis.
//!
//! Precomposed Hangul syllables (U+AC00..U+D7A3) are decomposed into onset,
//! nucleus and coda jamo, which lets us detect adpositions that are realized
//! as a final consonant (난 = 나 + ㄴ) or as a contraction (내게 = 나 + 에게).

use once_cell::sync::Lazy;
use std::collections::HashMap;

const SYLLABLE_BASE: u32 = 0xAC00;
const SYLLABLE_LAST: u32 = 0xD7A3;
const ONSET_STRIDE: u32 = 588;
const NUCLEUS_STRIDE: u32 = 28;

static ONSETS: [char; 19] = [
    'ㄱ', 'ㄲ', 'ㄴ', 'ㄷ', 'ㄸ', 'ㄹ', 'ㅁ', 'ㅂ', 'ㅃ', 'ㅅ', 'ㅆ', 'ㅇ', 'ㅈ', 'ㅉ', 'ㅊ', 'ㅋ',
    'ㅌ', 'ㅍ', 'ㅎ',
];

static NUCLEI: [char; 21] = [
    'ㅏ', 'ㅐ', 'ㅑ', 'ㅒ', 'ㅓ', 'ㅔ', 'ㅕ', 'ㅖ', 'ㅗ', 'ㅘ', 'ㅙ', 'ㅚ', 'ㅛ', 'ㅜ', 'ㅝ', 'ㅞ',
    'ㅟ', 'ㅠ', 'ㅡ', 'ㅢ', 'ㅣ',
];

/// Codas; index 0 is "no coda"
static CODAS: [Option<char>; 28] = [
    None,
    Some('ㄱ'),
    Some('ㄲ'),
    Some('ㄳ'),
    Some('ㄴ'),
    Some('ㄵ'),
    Some('ㄶ'),
    Some('ㄷ'),
    Some('ㄹ'),
    Some('ㄺ'),
    Some('ㄻ'),
    Some('ㄼ'),
    Some('ㄽ'),
    Some('ㄾ'),
    Some('ㄿ'),
    Some('ㅀ'),
    Some('ㅁ'),
    Some('ㅂ'),
    Some('ㅄ'),
    Some('ㅅ'),
    Some('ㅆ'),
    Some('ㅇ'),
    Some('ㅈ'),
    Some('ㅊ'),
    Some('ㅋ'),
    Some('ㅌ'),
    Some('ㅍ'),
    Some('ㅎ'),
];

/// Romanization of [`ONSETS`], [`NUCLEI`] and [`CODAS`], index for index
static ONSET_LATIN: [&str; 19] = [
    "g", "gg", "n", "d", "dd", "r", "m", "b", "bb", "s", "ss", "", "j", "jj", "ch", "k", "t", "p",
    "h",
];

static NUCLEUS_LATIN: [&str; 21] = [
    "a", "ae", "ya", "yae", "eo", "e", "yeo", "ye", "o", "wa", "wae", "oe", "yo", "u", "weo", "we",
    "wi", "yu", "eu", "yi", "i",
];

static CODA_LATIN: [&str; 28] = [
    "", "g", "gg", "gs", "n", "nj", "nh", "t", "l", "rg", "rm", "rb", "rs", "rt", "rp", "rh", "m",
    "b", "bs", "s", "ss", "ng", "j", "ch", "k", "t", "p", "h",
];

/// Contracted forms in which an adposition fuses with a pronoun
static CONTRACTIONS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    m.insert("에게", &["내게", "내겐", "네게", "네겐", "제게", "제겐"]);
    m.insert(
        "에게서",
        &["내게서", "내게선", "네게서", "네게선", "제게서", "제게선"],
    );
    m.insert("이라고", &["라고"]);
    m.insert("이란", &["란"]);
    // 것이 -> 게
    m.insert("이", &["게"]);
    m
});

/// Adpositions that may be realized as a syllable-final consonant
static CODA_ADPOSITIONS: &[&str] = &["ㄴ", "ㄹ"];

/// Pronoun forms into which the genitive 의 assimilates
static GENITIVE_ASSIMILATED: &[&str] = &["내", "네", "제"];

/// The jamo making up one Hangul syllable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jamo {
    pub onset: char,
    pub nucleus: char,
    pub coda: Option<char>,
}

/// Whether `c` is a precomposed syllable or a compatibility consonant (ㄱ..ㅎ)
pub fn is_hangul(c: char) -> bool {
    matches!(c, 'ㄱ'..='ㅎ' | '가'..='힣')
}

/// Split a precomposed syllable into its jamo
pub fn decompose(syllable: char) -> Option<Jamo> {
    let code = syllable as u32;
    if !(SYLLABLE_BASE..=SYLLABLE_LAST).contains(&code) {
        return None;
    }
    let offset = code - SYLLABLE_BASE;
    Some(Jamo {
        onset: ONSETS[(offset / ONSET_STRIDE) as usize],
        nucleus: NUCLEI[((offset % ONSET_STRIDE) / NUCLEUS_STRIDE) as usize],
        coda: CODAS[(offset % NUCLEUS_STRIDE) as usize],
    })
}

/// Build a precomposed syllable from its jamo
pub fn compose(onset: char, nucleus: char, coda: Option<char>) -> Option<char> {
    let onset_idx = ONSETS.iter().position(|&c| c == onset)? as u32;
    let nucleus_idx = NUCLEI.iter().position(|&c| c == nucleus)? as u32;
    let coda_idx = CODAS.iter().position(|&c| c == coda)? as u32;
    char::from_u32(SYLLABLE_BASE + onset_idx * ONSET_STRIDE + nucleus_idx * NUCLEUS_STRIDE + coda_idx)
}

/// Keep only the Hangul characters of `text`
pub fn core_text(text: &str) -> String {
    text.chars().filter(|&c| is_hangul(c)).collect()
}

/// Whether `text` is made of punctuation only
pub fn is_punctuation(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| !c.is_alphanumeric() && !c.is_whitespace())
}

/// Romanization of one character; characters with no romanization are kept
fn romanize(c: char) -> String {
    if let Some(i) = ONSETS.iter().position(|&o| o == c) {
        return ONSET_LATIN[i].to_string();
    }
    if let Some(i) = NUCLEI.iter().position(|&n| n == c) {
        return NUCLEUS_LATIN[i].to_string();
    }
    let code = c as u32;
    if !(SYLLABLE_BASE..=SYLLABLE_LAST).contains(&code) {
        return c.to_string();
    }
    let offset = code - SYLLABLE_BASE;
    [
        ONSET_LATIN[(offset / ONSET_STRIDE) as usize],
        NUCLEUS_LATIN[((offset % ONSET_STRIDE) / NUCLEUS_STRIDE) as usize],
        CODA_LATIN[(offset % NUCLEUS_STRIDE) as usize],
    ]
    .concat()
}

/// Letter-by-letter romanization with every syllable prefixed by a period
/// (집에 -> `.jib.e`).
///
/// Digits, Latin letters and punctuation pass through unchanged.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        out.push('.');
        out.push_str(&romanize(c));
    }
    if out.is_empty() {
        out.push('.');
    }
    out
}

/// `text` with the coda of its last syllable removed
fn without_final_coda(text: &str) -> Option<String> {
    let last = text.chars().last()?;
    let jamo = decompose(last)?;
    let bare = compose(jamo.onset, jamo.nucleus, None)?;
    let mut out: String = text.chars().take(text.chars().count() - 1).collect();
    out.push(bare);
    Some(out)
}

/// Whether the adposition `adposition` is realized in the Hangul part of `text`.
///
/// Besides plain containment this accepts adpositions that are written as a
/// final consonant, contracted with a pronoun, or assimilated into it.
pub fn adposition_in_text(adposition: &str, text: &str) -> bool {
    let core = core_text(text);
    if core.is_empty() || adposition.is_empty() {
        return false;
    }

    if core.contains(adposition) {
        return true;
    }
    if without_final_coda(&core).map_or(false, |bare| bare.contains(adposition)) {
        return true;
    }
    if let Some(forms) = CONTRACTIONS.get(adposition) {
        if forms.iter().any(|form| core.contains(form)) {
            return true;
        }
    }
    if CODA_ADPOSITIONS.contains(&adposition) {
        let coda = adposition.chars().next();
        if core
            .chars()
            .any(|c| decompose(c).map_or(false, |jamo| jamo.coda == coda))
        {
            return true;
        }
    }
    adposition == "의" && GENITIVE_ASSIMILATED.contains(&core.as_str())
}
