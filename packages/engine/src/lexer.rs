//! Gap tag lexer
//!
//! Scans a text/HTML fragment and extracts the ordered set of gap tags it
//! contains, independent of dialect. Four dialects exist:
//!
//! - **Standard** `[[N]]`: sentence/summary/table/diagram gaps
//! - **Note** `[[nN]]`: note-completion gaps (separate numbering space)
//! - **Heading** `[HN]` or `data-heading-gap="N"`: heading gaps in part
//!   bodies; the attribute form may carry `data-correct-answer="..."`
//! - **Flowchart** `[fN]`: flowchart step gaps
//!
//! First occurrence order is preserved and later duplicates of the same
//! dialect+number are dropped. Malformed brackets (unterminated,
//! non-numeric) are not matches and stay literal text; this is how author
//! typos are tolerated rather than rejected.

use crate::config;
use crate::types::TagDialect;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::LazyLock;
use tracing::debug;

/// Regex for standard gaps `[[N]]`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static STANDARD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(\d+)\]\]").expect("valid regex"));

/// Regex for note gaps `[[nN]]`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[n(\d+)\]\]").expect("valid regex"));

/// Regex for the bracket form of heading gaps `[HN]`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HEADING_BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[H(\d+)\]").expect("valid regex"));

/// Regex for the HTML attribute form of heading gaps.
///
/// Matches the whole element open tag so the inline answer can be read
/// from it regardless of attribute order.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HEADING_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<[^>]*data-heading-gap="(\d+)"[^>]*>"#).expect("valid regex"));

/// Regex for the inline answer carried by the attribute form.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static INLINE_ANSWER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-correct-answer="([^"]*)""#).expect("valid regex"));

/// Regex for flowchart gaps `[fN]`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FLOWCHART_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[f(\d+)\]").expect("valid regex"));

/// One parsed gap tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Dialect the tag was written in
    pub dialect: TagDialect,
    /// Numeric identity, unique within its scope
    pub number: u32,
    /// The exact matched text
    pub raw: String,
    /// Inline-carried correct answer (attribute-form heading tags only;
    /// empty string when the element has no `data-correct-answer`)
    pub inline_answer: Option<String>,
}

/// Which dialects to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectFilter {
    /// Extract tags of every dialect
    All,
    /// Extract only the given dialect
    Only(TagDialect),
}

impl DialectFilter {
    fn includes(&self, dialect: TagDialect) -> bool {
        match self {
            DialectFilter::All => true,
            DialectFilter::Only(d) => *d == dialect,
        }
    }
}

/// Extract the ordered, de-duplicated gap tags in a fragment.
///
/// Ordering is by first occurrence in the text; a later duplicate of the
/// same dialect+number is ignored for extraction but still counts as
/// "present". Numbers above [`config::MAX_TAG_NUMBER`] are treated as
/// malformed and skipped.
pub fn extract_tags(text: &str, filter: DialectFilter) -> Vec<Tag> {
    let mut found: Vec<(usize, Tag)> = Vec::new();

    if filter.includes(TagDialect::Standard) {
        collect_bracket_matches(text, &STANDARD_RE, TagDialect::Standard, &mut found);
    }
    if filter.includes(TagDialect::Note) {
        collect_bracket_matches(text, &NOTE_RE, TagDialect::Note, &mut found);
    }
    if filter.includes(TagDialect::Flowchart) {
        collect_bracket_matches(text, &FLOWCHART_RE, TagDialect::Flowchart, &mut found);
    }
    if filter.includes(TagDialect::Heading) {
        collect_bracket_matches(text, &HEADING_BRACKET_RE, TagDialect::Heading, &mut found);
        collect_heading_attr_matches(text, &mut found);
    }

    found.sort_by_key(|(start, _)| *start);

    let mut seen: HashSet<(TagDialect, u32)> = HashSet::new();
    let mut tags = Vec::new();
    for (_, tag) in found {
        if seen.insert((tag.dialect, tag.number)) {
            tags.push(tag);
        } else {
            debug!(
                dialect = ?tag.dialect,
                number = tag.number,
                "Duplicate gap tag in scope, first occurrence wins"
            );
        }
    }
    tags
}

/// The set of tag numbers of one dialect present in a fragment.
pub fn tag_numbers(text: &str, dialect: TagDialect) -> BTreeSet<u32> {
    extract_tags(text, DialectFilter::Only(dialect))
        .into_iter()
        .map(|tag| tag.number)
        .collect()
}

/// Inline heading answers in a fragment: gap number to the value carried
/// by `data-correct-answer`. Only attribute-form tags contribute; the
/// first occurrence of each number wins.
pub fn heading_inline_answers(text: &str) -> BTreeMap<u32, String> {
    let mut answers = BTreeMap::new();
    for tag in extract_tags(text, DialectFilter::Only(TagDialect::Heading)) {
        if let Some(answer) = tag.inline_answer {
            answers.entry(tag.number).or_insert(answer);
        }
    }
    answers
}

fn collect_bracket_matches(
    text: &str,
    re: &Regex,
    dialect: TagDialect,
    found: &mut Vec<(usize, Tag)>,
) {
    for caps in re.captures_iter(text) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        let Some(number) = parse_tag_number(&caps[1]) else {
            continue;
        };
        found.push((
            whole.start(),
            Tag {
                dialect,
                number,
                raw: whole.as_str().to_string(),
                inline_answer: None,
            },
        ));
    }
}

fn collect_heading_attr_matches(text: &str, found: &mut Vec<(usize, Tag)>) {
    for caps in HEADING_ATTR_RE.captures_iter(text) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        let Some(number) = parse_tag_number(&caps[1]) else {
            continue;
        };
        let inline_answer = INLINE_ANSWER_RE
            .captures(whole.as_str())
            .map(|answer_caps| answer_caps[1].to_string())
            .unwrap_or_default();
        found.push((
            whole.start(),
            Tag {
                dialect: TagDialect::Heading,
                number,
                raw: whole.as_str().to_string(),
                inline_answer: Some(inline_answer),
            },
        ));
    }
}

/// Parse a captured digit run, rejecting numbers beyond the configured
/// maximum (overlong digit runs overflow `u32` and are also rejected).
fn parse_tag_number(digits: &str) -> Option<u32> {
    match digits.parse::<u32>() {
        Ok(n) if n >= 1 && n <= config::MAX_TAG_NUMBER => Some(n),
        Ok(n) => {
            debug!(number = n, "Tag number out of range, treating as literal text");
            None
        }
        Err(_) => None,
    }
}
