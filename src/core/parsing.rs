//! Permissive tokenizers for free-text buyer answers.
//!
//! Answers come straight from a conversation ("£400,000 to £650,000",
//! "3 bedrooms, but 4 would be great"), so everything here is lenient:
//! anything that cannot be read is simply skipped.

/// What kind of quantity a range answer describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    /// Money; understands currency symbols and k/m suffixes
    Currency,
    /// Small counts such as bedrooms; understands "studio" and number words
    Count,
}

/// Bounds read from a free-text answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParsedRange {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl ParsedRange {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

const MAX_MARKERS: &[&str] = &[
    "under", "up to", "upto", "max", "below", "less than", "no more than", "not more than",
    "at most", "within", "or less",
];

const MIN_MARKERS: &[&str] = &[
    "at least", "minimum", "min ", "from ", "over ", "or more", "more than", "plus", "starting",
];

const NUMBER_WORDS: &[(&str, u64)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
];

/// Words that carry no meaning when comparing short phrases
const FILLER_WORDS: &[&str] = &[
    "a", "an", "the", "some", "good", "great", "nearby", "near", "local", "nice", "maybe",
    "ideally", "would", "be", "lovely", "essential", "preferred", "important", "access",
];

const TRAILING_FILLER: &[&str] = &[
    "would be lovely",
    "would be nice",
    "would be great",
    "would be perfect",
    "is essential",
    "essential",
    "preferred",
    "if possible",
    "nearby",
    "maybe",
];

/// Text between two numbers that makes them one written range
const RANGE_CONNECTORS: &[&str] = &["-", "–", "to", "and", "or", "up to"];

#[derive(Debug, Clone, Copy)]
struct NumberToken {
    pos: usize,
    /// Byte offset just past the number and any unit suffix
    end: usize,
    value: f64,
    multiplier: Option<f64>,
    plus: bool,
}

/// Parse a numeric range out of a free-text answer
///
/// A single value yields min == max, and a lone value next to an
/// "under"/"at least" style marker yields a one-sided range. Two values
/// written as a range ("£650k to £400k") keep their written order, so an
/// inverted range comes back for the caller to reject. Two separate figures
/// beside a one-sided marker stay one-sided ("under £650k, ideally £550k"
/// is a maximum of £650k). More values yield (smallest, largest).
pub fn parse_range(text: &str, kind: RangeKind) -> ParsedRange {
    let lower = text.to_ascii_lowercase();
    let mut tokens = tokenize_numbers(&lower, kind);

    if kind == RangeKind::Count {
        if let Some(pos) = word_position(&lower, "studio") {
            let end = pos + "studio".len();
            tokens.push(NumberToken { pos, end, value: 0.0, multiplier: None, plus: false });
        }
        if tokens.is_empty() {
            for (word, value) in NUMBER_WORDS {
                if let Some(pos) = word_position(&lower, word) {
                    let end = pos + word.len();
                    tokens.push(NumberToken { pos, end, value: *value as f64, multiplier: None, plus: false });
                }
            }
        }
        tokens.sort_by_key(|t| t.pos);
    }

    // "£450-550k" shares one suffix across both bounds
    let shared_multiplier = tokens
        .iter()
        .filter_map(|t| t.multiplier)
        .fold(None, |acc: Option<f64>, m| Some(acc.map_or(m, |a| a.max(m))));

    let values: Vec<u64> = tokens
        .iter()
        .map(|t| {
            let multiplier = match (t.multiplier, shared_multiplier) {
                (Some(m), _) => m,
                (None, Some(shared)) if t.value < 1000.0 => shared,
                _ => 1.0,
            };
            (t.value * multiplier).round() as u64
        })
        .collect();

    let plus = tokens.iter().any(|t| t.plus);
    let (has_max, has_min) = marker_sides(&lower);

    match values.as_slice() {
        [] => ParsedRange::default(),
        [first, second] => {
            let joined = written_as_range(&lower, &tokens[0], &tokens[1]);
            match (joined, has_max && !plus, has_min || plus) {
                (false, true, false) => ParsedRange { min: None, max: Some(*first.max(second)) },
                (false, false, true) => ParsedRange { min: Some(*first.min(second)), max: None },
                _ => ParsedRange { min: Some(*first), max: Some(*second) },
            }
        }
        [single] => {
            if has_max && !plus {
                ParsedRange { min: None, max: Some(*single) }
            } else if plus || has_min {
                ParsedRange { min: Some(*single), max: None }
            } else {
                ParsedRange { min: Some(*single), max: Some(*single) }
            }
        }
        many => ParsedRange {
            min: many.iter().min().copied(),
            max: many.iter().max().copied(),
        },
    }
}

/// Whether the answer carries an upper-bound and a lower-bound marker
fn marker_sides(lower: &str) -> (bool, bool) {
    let has_max = MAX_MARKERS.iter().any(|m| lower.contains(m));
    // "no more than" is an upper bound, not a "more than"
    let without_caps = lower.replace("no more than", "").replace("not more than", "");
    let has_min = MIN_MARKERS.iter().any(|m| without_caps.contains(m));
    (has_max, has_min)
}

/// "£400k to £600k", "2-3": only a connector sits between the two numbers
fn written_as_range(lower: &str, first: &NumberToken, second: &NumberToken) -> bool {
    if first.end > second.pos {
        return false;
    }
    let gap = lower[first.end..second.pos]
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '£' | '$' | '€' | ','));
    RANGE_CONNECTORS.contains(&gap)
}

fn tokenize_numbers(lower: &str, kind: RangeKind) -> Vec<NumberToken> {
    let bytes = lower.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let pos = i;
        let mut digits = String::new();
        while i < bytes.len() {
            let b = bytes[i];
            if b.is_ascii_digit() {
                digits.push(b as char);
                i += 1;
            } else if b == b',' && is_thousands_group(bytes, i + 1) {
                i += 1;
            } else if b == b'.' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit() {
                digits.push('.');
                i += 1;
            } else {
                break;
            }
        }

        let Ok(value) = digits.parse::<f64>() else {
            continue;
        };

        let rest = &lower[i..];
        let trimmed = rest.trim_start();
        let plus = trimmed.starts_with('+');
        let suffix = match kind {
            RangeKind::Currency => currency_suffix(trimmed),
            RangeKind::Count => None,
        };

        let (multiplier, end) = match suffix {
            Some((multiplier, word_len)) => (Some(multiplier), i + (rest.len() - trimmed.len()) + word_len),
            None => (None, i),
        };

        tokens.push(NumberToken { pos, end, value, multiplier, plus });
    }

    tokens
}

fn is_thousands_group(bytes: &[u8], start: usize) -> bool {
    let end = start + 3;
    end <= bytes.len()
        && bytes[start..end].iter().all(u8::is_ascii_digit)
        && bytes.get(end).map_or(true, |b| !b.is_ascii_digit())
}

/// Multiplier and byte length of a "k"/"million" style suffix
fn currency_suffix(rest: &str) -> Option<(f64, usize)> {
    let word: String = rest.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let multiplier = match word.as_str() {
        "k" | "thousand" => 1_000.0,
        "m" | "mil" | "million" | "mn" => 1_000_000.0,
        _ => return None,
    };
    Some((multiplier, word.len()))
}

/// Parse a maximum commute time in minutes ("about 45 minutes", "an hour")
pub fn parse_minutes(text: &str) -> Option<u16> {
    let lower = text.to_ascii_lowercase();
    if lower.contains("half an hour") {
        return Some(30);
    }

    let tokens = tokenize_numbers(&lower, RangeKind::Count);
    if tokens.is_empty() {
        return contains_word(&lower, "hour").then_some(60);
    }

    // "1 hour 30 minutes": every number with its own unit is added up
    let mut total = 0.0;
    let mut has_units = false;
    let mut has_hours = false;
    for token in &tokens {
        let unit: String = lower[token.end..]
            .trim_start()
            .chars()
            .take_while(char::is_ascii_alphabetic)
            .collect();
        if unit.starts_with('h') {
            total += token.value * 60.0;
            has_units = true;
            has_hours = true;
        } else if unit.starts_with("min") {
            total += token.value;
            has_units = true;
        }
    }

    if has_units {
        if !has_hours && lower.contains("an hour") {
            total += 60.0;
        }
    } else {
        let first = tokens[0].value;
        total = if contains_word(&lower, "hour") { first * 60.0 } else { first };
    }

    u16::try_from(total.round() as u64).ok()
}

/// Split a list-like answer on commas, semicolons, slashes, "&", "or" and "and"
pub fn split_list(text: &str) -> Vec<String> {
    let mut items = Vec::new();

    for piece in text.split([',', ';', '/', '&', '\n']) {
        let mut current: Vec<&str> = Vec::new();
        for word in piece.split_whitespace() {
            if matches!(word.to_ascii_lowercase().as_str(), "or" | "and") {
                push_item(&mut items, &current);
                current.clear();
            } else {
                current.push(word);
            }
        }
        push_item(&mut items, &current);
    }

    items
}

fn push_item(items: &mut Vec<String>, words: &[&str]) {
    let joined = words.join(" ");
    let cleaned = strip_filler(joined.trim_matches(|c: char| c.is_ascii_punctuation() && c != '\''));
    if !cleaned.is_empty() {
        items.push(cleaned);
    }
}

/// Remove trailing hedges such as "would be nice" from a phrase
pub fn strip_filler(phrase: &str) -> String {
    let mut current = phrase.trim().to_string();
    loop {
        let lower = current.to_ascii_lowercase();
        let Some(suffix) = TRAILING_FILLER.iter().find(|s| {
            lower.len() > s.len()
                && lower.ends_with(*s)
                && lower.as_bytes()[lower.len() - s.len() - 1] == b' '
        }) else {
            break;
        };
        current.truncate(current.len() - suffix.len());
        current = current.trim_end().to_string();
    }
    current
}

/// Meaningful lower-case word stems of a phrase
pub fn tokens(phrase: &str) -> Vec<String> {
    phrase
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty() && !FILLER_WORDS.contains(w))
        .map(stem)
        .collect()
}

fn stem(word: &str) -> String {
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Whether two short phrases name the same thing
///
/// Matches when every meaningful word of one phrase appears in the other,
/// so "flat" matches "studio flat" and "good schools" matches "schools".
pub fn phrases_match(a: &str, b: &str) -> bool {
    let a_tokens = tokens(a);
    let b_tokens = tokens(b);
    if a_tokens.is_empty() || b_tokens.is_empty() {
        return false;
    }
    a_tokens.iter().all(|t| b_tokens.contains(t)) || b_tokens.iter().all(|t| a_tokens.contains(t))
}

fn word_position(lower: &str, word: &str) -> Option<usize> {
    lower.match_indices(word).map(|(idx, _)| idx).find(|&idx| {
        let before = idx.checked_sub(1).map(|b| lower.as_bytes()[b]);
        let after = lower.as_bytes().get(idx + word.len()).copied();
        before.map_or(true, |b| !b.is_ascii_alphabetic()) && after.map_or(true, |b| !b.is_ascii_alphabetic())
    })
}

/// Whole-word, case-insensitive containment
pub fn contains_word(haystack: &str, word: &str) -> bool {
    let word = word.to_lowercase();
    haystack
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .any(|w| w == word || stem(w) == word)
}

/// Format whole pounds with thousands separators
pub fn format_gbp(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('£');
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
