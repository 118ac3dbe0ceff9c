//! Answer evaluation
//!
//! Grades a learner's submitted value against a question's authoritative
//! answer key. Pure, synchronous and total: no input shape fails, and a
//! blank submission is always [`AnswerOutcome::Unanswered`] rather than
//! incorrect.
//!
//! The key is a single string with `/`-delimited alternatives; both sides
//! are trimmed and lowercased before comparison. Heading-matching
//! questions additionally accept positional equivalence: a Roman or
//! letter label and the option text at the position it denotes are
//! interchangeable on either side of the comparison.

use crate::config;
use crate::labels;
use crate::model::Question;
use crate::types::{AnswerOutcome, QuestionRef};
use std::collections::HashMap;

/// Grade one submitted value against a question's answer key.
pub fn evaluate(question: &Question, submitted: &str) -> AnswerOutcome {
    let submitted = normalize(submitted);
    if submitted.is_empty() {
        return AnswerOutcome::Unanswered;
    }

    let alternatives: Vec<String> = question
        .answer
        .split(config::ALTERNATIVE_SEPARATOR)
        .map(normalize)
        .filter(|alt| !alt.is_empty())
        .collect();
    // A submitted value against an empty key can only be wrong
    if alternatives.is_empty() {
        return AnswerOutcome::Incorrect;
    }

    if alternatives.iter().any(|alt| *alt == submitted) {
        return AnswerOutcome::Correct;
    }

    if question.is_heading() {
        if let Some(submitted_pos) = option_position(&submitted, &question.options) {
            let equivalent = alternatives
                .iter()
                .any(|alt| option_position(alt, &question.options) == Some(submitted_pos));
            if equivalent {
                return AnswerOutcome::Correct;
            }
        }
    }

    AnswerOutcome::Incorrect
}

/// Split a multi-gap submission into its per-gap values.
///
/// Each value is graded independently against its own question record;
/// there is no cross-gap dependency.
pub fn split_gaps(submitted: &str) -> Vec<&str> {
    submitted.split(config::GAP_SEPARATOR).collect()
}

/// Aggregate score over a set of gradable questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreSummary {
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
}

impl ScoreSummary {
    /// Total gradable questions counted.
    pub fn total(&self) -> usize {
        self.correct + self.incorrect + self.unanswered
    }

    /// Whether every gradable question was answered correctly.
    pub fn is_perfect(&self) -> bool {
        self.total() > 0 && self.correct == self.total()
    }
}

/// Score a learner response map against a question collection.
///
/// Non-gradable questions (writing tasks) are skipped; a question with no
/// entry in the response map counts as unanswered. Only each question's
/// own `kind` is consulted here; callers holding a snapshot resolve group
/// inheritance first (see [`crate::service::ExamService::score`]).
pub fn score<'a, I>(questions: I, responses: &HashMap<QuestionRef, String>) -> ScoreSummary
where
    I: IntoIterator<Item = &'a Question>,
{
    let mut summary = ScoreSummary::default();
    for question in questions {
        if !question.kind.map_or(true, |k| k.is_gradable()) {
            continue;
        }
        let submitted = responses.get(&question.id).map(String::as_str).unwrap_or("");
        match evaluate(question, submitted) {
            AnswerOutcome::Correct => summary.correct += 1,
            AnswerOutcome::Incorrect => summary.incorrect += 1,
            AnswerOutcome::Unanswered => summary.unanswered += 1,
        }
    }
    summary
}

/// Trim and lowercase one side of a comparison.
fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Resolve a normalized value to the 0-based option position it denotes:
/// a Roman label, a letter label, or the literal option text.
fn option_position(value: &str, options: &[String]) -> Option<usize> {
    if let Some(position) = options.iter().position(|opt| normalize(opt) == value) {
        return Some(position);
    }
    if let Some(position) = labels::parse_roman(value) {
        if position < options.len() {
            return Some(position);
        }
    }
    if let Some(position) = labels::parse_letter_label(value) {
        if position < options.len() {
            return Some(position);
        }
    }
    None
}
