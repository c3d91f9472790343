//! Phonetic normalization of radio-style speech transcripts.
//!
//! Speech recognition renders "niner" for 9, spells grids letter by letter
//! ("three five Victor November Foxtrot...") and splits frequencies into
//! comma-separated digits ("1, 2, 4, 0.5"). This module collapses those
//! back into compact alphanumeric tokens before classification and
//! extraction. Every function here is total and deterministic.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Spoken digit words, radio variants included. Longer alternatives must
/// precede their prefixes in the alternation (niner before nine).
const PHONETIC_DIGITS: &[(&str, &str)] = &[
    ("zero", "0"),
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("tree", "3"),
    ("fower", "4"),
    ("four", "4"),
    ("fife", "5"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("niner", "9"),
    ("nine", "9"),
];

const PHONETIC_ALPHABET: &[(&str, &str)] = &[
    ("alpha", "A"),
    ("bravo", "B"),
    ("charlie", "C"),
    ("delta", "D"),
    ("echo", "E"),
    ("foxtrot", "F"),
    ("golf", "G"),
    ("hotel", "H"),
    ("india", "I"),
    ("juliet", "J"),
    ("kilo", "K"),
    ("lima", "L"),
    ("mike", "M"),
    ("november", "N"),
    ("oscar", "O"),
    ("papa", "P"),
    ("quebec", "Q"),
    ("romeo", "R"),
    ("sierra", "S"),
    ("tango", "T"),
    ("uniform", "U"),
    ("victor", "V"),
    ("whiskey", "W"),
    ("x-ray", "X"),
    ("xray", "X"),
    ("yankee", "Y"),
    ("zulu", "Z"),
];

const ALPHA_WORDS: &str = "alpha|bravo|charlie|delta|echo|foxtrot|golf|hotel|india|juliet|kilo|lima|mike|november|oscar|papa|quebec|romeo|sierra|tango|uniform|victor|whiskey|x-ray|xray|yankee|zulu";

const DIGIT_WORDS: &str =
    "zero|one|two|three|tree|fower|four|fife|five|six|seven|eight|niner|nine";

/// Comma-separated digit groups forming one number: "1, 2, 4, 0.5".
/// A decimal point is permitted only on the final segment; the mandatory
/// last repetition forces the matcher to hand that whole segment to
/// `collapse_digit_run` instead of stranding its fraction.
static DIGIT_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d+(?:\s*,\s*\d+)*\s*,\s*\d+(?:\.\d+)?\b").unwrap()
});

/// Digit groups, then phonetic-alphabet words, then digit groups again —
/// the shape of a spoken MGRS grid. Spoken digits count as digit groups.
static GRID_SEQ_RE: LazyLock<Regex> = LazyLock::new(|| {
    let dw = format!(r"(?:\d+|{DIGIT_WORDS})");
    let aw = format!("(?:{ALPHA_WORDS})");
    Regex::new(&format!(
        r"(?i)(?:grid[\s:]+)?\b({dw}(?:[\s,]+{dw})*(?:[\s,]+{aw})+(?:[\s,]+{dw})+)"
    ))
    .unwrap()
});

static DIGIT_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\b({DIGIT_WORDS})\b")).unwrap());

/// Alphabet words convert only when followed by a delimiter, whitespace,
/// or end of input, biasing toward letter-code usage over names.
static ALPHA_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)\b({ALPHA_WORDS})([\s,\-]|$)")).unwrap());

fn digit_for(word: &str) -> Option<&'static str> {
    let lower = word.to_lowercase();
    PHONETIC_DIGITS
        .iter()
        .find(|(w, _)| *w == lower)
        .map(|(_, d)| *d)
}

fn letter_for(word: &str) -> Option<&'static str> {
    let lower = word.to_lowercase();
    PHONETIC_ALPHABET
        .iter()
        .find(|(w, _)| *w == lower)
        .map(|(_, l)| *l)
}

/// Splice a spoken grid sequence into one alphanumeric token.
/// Phonetic words become letters/digits; digit-bearing chunks (digit
/// groups, already-compact grids like "35VNF61105197") pass through
/// verbatim, as do short uppercase letter groups ("WL"). Everything
/// else is filler and is dropped.
pub fn splice_grid(text: &str) -> String {
    let mut out = String::new();
    for token in text.split(|c: char| c == ',' || c.is_whitespace()) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some(letter) = letter_for(token) {
            out.push_str(letter);
        } else if let Some(digit) = digit_for(token) {
            out.push_str(digit);
        } else if token.chars().any(|c| c.is_ascii_digit())
            && token.chars().all(|c| c.is_ascii_alphanumeric())
        {
            out.push_str(&token.to_uppercase());
        } else if token.len() <= 3 && token.chars().all(|c| c.is_ascii_uppercase()) {
            out.push_str(token);
        }
    }
    out
}

fn collapse_digit_run(run: &str) -> String {
    let parts: Vec<&str> = run.split(',').map(str::trim).collect();
    let last = parts[parts.len() - 1];
    if let Some((_, frac)) = last.split_once('.') {
        let integer: String = parts[..parts.len() - 1].concat();
        format!("{integer}.{frac}")
    } else {
        parts.concat()
    }
}

/// Collapse comma-digit runs in place. A run whose leading digit is the
/// fractional part of an existing number ("124.5, 3 down") is left alone.
fn collapse_digit_runs(text: &str) -> String {
    let mut out = String::new();
    let mut last = 0;
    for m in DIGIT_RUN_RE.find_iter(text) {
        out.push_str(&text[last..m.start()]);
        if text[..m.start()].ends_with('.') {
            out.push_str(m.as_str());
        } else {
            out.push_str(&collapse_digit_run(m.as_str()));
        }
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Normalize a transcript: collapse comma-digit runs, splice grid
/// sequences (prefixed with the literal word "grid"), then convert
/// standalone phonetic digit and alphabet words.
pub fn normalize(text: &str) -> String {
    let step1 = collapse_digit_runs(text);

    let step2 = GRID_SEQ_RE.replace_all(&step1, |caps: &Captures| {
        format!("grid {}", splice_grid(&caps[1]))
    });

    let step3 = DIGIT_WORD_RE.replace_all(&step2, |caps: &Captures| {
        digit_for(&caps[1]).unwrap_or_default().to_string()
    });

    ALPHA_WORD_RE
        .replace_all(&step3, |caps: &Captures| {
            format!("{}{}", letter_for(&caps[1]).unwrap_or_default(), &caps[2])
        })
        .into_owned()
}

/// Inverse mapping for voice readback: "A1" -> "Alpha One".
pub fn to_phonetic(text: &str) -> String {
    const LETTERS: [&str; 26] = [
        "Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel", "India",
        "Juliet", "Kilo", "Lima", "Mike", "November", "Oscar", "Papa", "Quebec", "Romeo",
        "Sierra", "Tango", "Uniform", "Victor", "Whiskey", "X-ray", "Yankee", "Zulu",
    ];
    const DIGITS: [&str; 10] = [
        "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine",
    ];

    let mut words = Vec::new();
    for ch in text.to_uppercase().chars() {
        if ch.is_ascii_uppercase() {
            words.push(LETTERS[(ch as u8 - b'A') as usize].to_string());
        } else if ch.is_ascii_digit() {
            words.push(DIGITS[(ch as u8 - b'0') as usize].to_string());
        } else {
            words.push(ch.to_string());
        }
    }
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_comma_digit_run() {
        assert_eq!(normalize("on frequency 1, 2, 4, 5"), "on frequency 1245");
    }

    #[test]
    fn collapses_digit_run_with_decimal_tail() {
        assert_eq!(normalize("radio 1, 2, 4, 0.5"), "radio 124.5");
    }

    #[test]
    fn decimal_tail_digit_not_stranded_from_its_fraction() {
        // The "0" of "0.5" must travel with the fraction, not be glued
        // onto the integer run.
        assert_eq!(normalize("radio 1, 2, 4, 0.5, over"), "radio 124.5, over");
        assert_eq!(normalize("channel 3, 0.5"), "channel 3.5");
    }

    #[test]
    fn leaves_decimal_followed_by_count_alone() {
        // "5, 3" here is not a spoken digit run; gluing it would corrupt
        // both the frequency and the casualty count.
        assert_eq!(
            normalize("freq 124.5, 3 down"),
            "freq 124.5, 3 down"
        );
    }

    #[test]
    fn splices_comma_separated_grid() {
        let out = normalize("grid 3, 5, Victor, November, Foxtrot, 6, 1, 1, 0, 5, 1, 9, 7");
        assert_eq!(out, "grid 35VNF61105197");
    }

    #[test]
    fn splices_spoken_word_grid() {
        let out = normalize(
            "grid three five Victor November Foxtrot six one one zero five one niner seven",
        );
        assert_eq!(out, "grid 35VNF61105197");
    }

    #[test]
    fn grid_prefix_added_when_absent() {
        let out = normalize("we are at 1, 8, Tango, Whiskey, Lima, 8, 7, 6, 5");
        assert!(out.contains("grid 18TWL8765"), "got: {out}");
    }

    #[test]
    fn converts_phonetic_digits() {
        assert_eq!(normalize("niner casualties"), "9 casualties");
        assert_eq!(normalize("tree vehicles"), "3 vehicles");
    }

    #[test]
    fn converts_alphabet_word_before_delimiter() {
        assert_eq!(normalize("line six, november, no enemy"), "line 6, N, no enemy");
    }

    #[test]
    fn alphabet_word_before_period_left_alone() {
        assert_eq!(normalize("back in november."), "back in november.");
    }

    #[test]
    fn substrings_inside_words_untouched() {
        assert_eq!(normalize("someone shouted"), "someone shouted");
        assert_eq!(normalize("echoes carried far"), "echoes carried far");
    }

    #[test]
    fn splice_keeps_compact_tokens() {
        assert_eq!(splice_grid("35VNF61105197"), "35VNF61105197");
        assert_eq!(splice_grid("18T, WL, 9, 4, 3, 4"), "18TWL9434");
    }

    #[test]
    fn splice_drops_unrecognized_words() {
        assert_eq!(splice_grid("3, 5, Victor, umm, 6"), "35V6");
    }

    #[test]
    fn idempotent_on_clean_input() {
        let inputs = [
            "grid 35VNF61105197, freq 124.5, 3 down",
            "WARHAWK 2-1 requesting medevac",
            "A B C, line 6, N",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn to_phonetic_readback() {
        assert_eq!(to_phonetic("A1"), "Alpha One");
        assert_eq!(to_phonetic("nf"), "November Foxtrot");
    }
}
