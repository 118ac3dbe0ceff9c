//! Display numbering
//!
//! Computes each question's 1-based global display number from the
//! ordering over (part order, intra-part sequence hint). Pure and
//! re-entrant; both the authoring and delivery surfaces call this on
//! every render so authors and learners always see the same numbers.
//!
//! Ranks are contiguous and stable under any operation that does not
//! change relative (part, sequence) order; reordering a part renumbers
//! every question in every part after it. Orphaned questions (owning part
//! missing from the snapshot) receive no number.

use crate::model::{Part, Question};
use crate::types::QuestionRef;
use std::collections::HashMap;

/// Assigned display numbers for one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Numbering {
    numbers: HashMap<QuestionRef, u32>,
}

impl Numbering {
    /// Display number for a question, or `None` if it is orphaned.
    pub fn get(&self, question: &QuestionRef) -> Option<u32> {
        self.numbers.get(question).copied()
    }

    /// Count of numbered questions.
    pub fn total(&self) -> usize {
        self.numbers.len()
    }

    /// Iterate over (reference, number) pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&QuestionRef, u32)> {
        self.numbers.iter().map(|(r, n)| (r, *n))
    }
}

/// Compute display numbers for every question in the snapshot.
///
/// `offset` shifts all ranks by a constant, for multi-section tests where
/// earlier sections contribute that many questions (offset 0 numbers from
/// 1).
pub fn display_numbers(parts: &[Part], questions: &[Question], offset: u32) -> Numbering {
    // Rank of each part in the authored sequence
    let mut part_sequence: Vec<(&str, u32)> = parts.iter().map(|p| (p.id.as_str(), p.order)).collect();
    part_sequence.sort_by_key(|(_, order)| *order);
    let part_rank: HashMap<&str, usize> = part_sequence
        .iter()
        .enumerate()
        .map(|(rank, (id, _))| (*id, rank))
        .collect();

    // Global ordering: (part rank, sequence hint, input position)
    let mut ordered: Vec<(usize, u32, usize, &QuestionRef)> = questions
        .iter()
        .enumerate()
        .filter_map(|(input_pos, q)| {
            part_rank
                .get(q.part_id.as_str())
                .map(|&rank| (rank, q.sequence, input_pos, &q.id))
        })
        .collect();
    ordered.sort_by_key(|(rank, sequence, input_pos, _)| (*rank, *sequence, *input_pos));

    let numbers = ordered
        .into_iter()
        .enumerate()
        .map(|(i, (_, _, _, id))| (id.clone(), offset + i as u32 + 1))
        .collect();
    Numbering { numbers }
}
