//! Gap tag allocation
//!
//! Computes the next free tag number for a scope. Authors delete gaps in
//! the middle of content, so allocation fills the lowest unused slot
//! instead of incrementing past the maximum; numbering stays dense and
//! counters never run away.
//!
//! A scope is the region a dialect's numbers are unique within: a whole
//! group for group-text/table/flowchart gaps, a whole part for heading
//! gaps (headings are numbered per part, across all of its groups).

use crate::lexer;
use crate::model::{Part, QuestionGroup};
use crate::types::TagDialect;
use std::collections::BTreeSet;

/// Smallest positive integer not present in the scope.
///
/// An empty scope allocates 1. An existing tag is never reused, so
/// `{1, 2, 3}` allocates 4 and `{1, 3}` allocates 2.
pub fn next_tag_number(existing: &BTreeSet<u32>) -> u32 {
    let mut candidate = 1;
    for &n in existing {
        if n > candidate {
            break;
        }
        if n == candidate {
            candidate += 1;
        }
    }
    candidate
}

/// Tag numbers present in a group's own scope, in the group's dialect.
///
/// Covers the free-text body, table cells and flowchart branches.
pub fn group_scope_numbers(group: &QuestionGroup) -> BTreeSet<u32> {
    let dialect = group.kind.gap_dialect();
    let mut numbers = BTreeSet::new();
    for text in group.gap_texts() {
        numbers.extend(lexer::tag_numbers(text, dialect));
    }
    numbers
}

/// Heading gap numbers present in a part's body.
pub fn part_heading_numbers(part: &Part) -> BTreeSet<u32> {
    lexer::tag_numbers(&part.body, TagDialect::Heading)
}
