//! Question reconciliation
//!
//! The central synchronization pass: derives a consistent question
//! collection from whatever gap tags currently exist in authored content.
//! Run whenever content changes (debounced by the caller, see
//! [`crate::debounce`]).
//!
//! The pass operates on a full snapshot and is total and self-healing: a
//! malformed or ambiguous tag is simply not matched, and its question (if
//! any) is pruned as orphaned on the next run. Re-running on an unchanged
//! snapshot is a no-op, which is what makes fire-at-latest-snapshot
//! debouncing safe without locks.
//!
//! Steps, in order:
//! 1. **Extract** per-scope tag sets from every part body and group body.
//! 2. **Prune** questions whose backing tag vanished from their scope.
//! 3. **Grow** questions for new tags in auto-growing group types.
//! 4. **Propagate** inline heading answers and backfill derived fields.
//! 5. **Short-circuit** on structural equality.

use crate::allocator;
use crate::lexer;
use crate::model::{ExamSnapshot, Question, QuestionGroup};
use crate::types::{QuestionRef, QuestionType, TagDialect};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    /// The updated question collection (full replacement)
    pub questions: Vec<Question>,
    /// Persisted identifiers of pruned questions; the caller schedules
    /// their deletion downstream (the engine performs no I/O)
    pub removed_persisted: Vec<String>,
    /// Whether any step changed the collection
    pub changed: bool,
}

/// Per-scope tag presence extracted from a snapshot (step 1).
struct TagIndex<'a> {
    part_ids: HashSet<&'a str>,
    groups: HashMap<&'a str, &'a QuestionGroup>,
    group_tags: HashMap<&'a str, BTreeSet<u32>>,
    heading_tags: HashMap<&'a str, BTreeSet<u32>>,
    heading_answers: HashMap<&'a str, BTreeMap<u32, String>>,
}

impl<'a> TagIndex<'a> {
    fn build(snapshot: &'a ExamSnapshot) -> Self {
        let mut index = TagIndex {
            part_ids: HashSet::new(),
            groups: HashMap::new(),
            group_tags: HashMap::new(),
            heading_tags: HashMap::new(),
            heading_answers: HashMap::new(),
        };
        for part in &snapshot.parts {
            index.part_ids.insert(part.id.as_str());
            index
                .heading_tags
                .insert(part.id.as_str(), allocator::part_heading_numbers(part));
            index
                .heading_answers
                .insert(part.id.as_str(), lexer::heading_inline_answers(&part.body));
            for group in &part.groups {
                index.groups.insert(group.id.as_str(), group);
                index
                    .group_tags
                    .insert(group.id.as_str(), allocator::group_scope_numbers(group));
            }
        }
        index
    }

    fn heading_gap_present(&self, part_id: &str, gap: u32) -> bool {
        self.heading_tags
            .get(part_id)
            .is_some_and(|set| set.contains(&gap))
    }
}

/// Reconcile the question collection against current content.
///
/// Pure function over the snapshot; the caller owns the read-modify-write
/// cycle and persistence of the result.
pub fn reconcile(snapshot: &ExamSnapshot) -> ReconcileOutcome {
    let index = TagIndex::build(snapshot);

    // Step 2: prune orphans
    let mut removed_persisted = Vec::new();
    let mut questions: Vec<Question> = Vec::new();
    for question in &snapshot.questions {
        if keeps_question(snapshot, &index, question) {
            questions.push(question.clone());
        } else if let Some(id) = question.id.persisted_id() {
            warn!(question = id, "Pruning persisted question with orphaned tag");
            removed_persisted.push(id.to_string());
        } else {
            debug!(question = %question.id, "Pruning pending question with orphaned tag");
        }
    }

    // Step 3: grow auto-growing groups
    for part in &snapshot.parts {
        for group in &part.groups {
            if !group.kind.is_auto_growing() {
                continue;
            }
            let dialect = group.kind.gap_dialect();
            let Some(scope) = index.group_tags.get(group.id.as_str()) else {
                continue;
            };
            // Tags already backed by a question, recomputed against the
            // post-prune collection so racing edits cannot cause
            // duplicate synthesis
            let mut backed: BTreeSet<u32> = questions
                .iter()
                .filter(|q| q.group_id.as_deref() == Some(group.id.as_str()))
                .flat_map(|q| lexer::tag_numbers(&q.prompt, dialect))
                .collect();
            for &number in scope {
                if !backed.insert(number) {
                    continue;
                }
                debug!(group = %group.id, number, "Synthesizing question for new gap tag");
                questions.push(Question {
                    id: QuestionRef::pending_gap(&group.id, dialect, number),
                    part_id: part.id.clone(),
                    group_id: Some(group.id.clone()),
                    kind: Some(group.kind),
                    prompt: dialect.render(number),
                    answer: String::new(),
                    options: Vec::new(),
                    sequence: number,
                    heading_gap: None,
                });
            }
        }
    }

    // Step 4: propagate authoritative fields from content
    for question in &mut questions {
        if question.kind.is_none() {
            if let Some(group) = question
                .group_id
                .as_deref()
                .and_then(|gid| index.groups.get(gid))
            {
                question.kind = Some(group.kind);
            }
        }
        if question.kind == Some(QuestionType::MatchingHeadings) {
            let Some(gap) = question_heading_gap(question) else {
                continue;
            };
            if question.heading_gap.is_none() {
                question.heading_gap = Some(gap);
            }
            let inline = index
                .heading_answers
                .get(question.part_id.as_str())
                .and_then(|answers| answers.get(&gap));
            if let Some(answer) = inline {
                // Inline answers are authoritative, but an absent or empty
                // attribute never wipes an authored key
                if !answer.is_empty() && question.answer != *answer {
                    question.answer = answer.clone();
                }
            }
        }
    }

    // Step 5: structural equality short-circuit
    let changed = questions != snapshot.questions;
    debug!(
        kept = questions.len(),
        removed = removed_persisted.len(),
        changed,
        "Reconcile pass complete"
    );
    ReconcileOutcome {
        questions,
        removed_persisted,
        changed,
    }
}

/// Pruning rule (step 2): does current content still back this question?
fn keeps_question(snapshot: &ExamSnapshot, index: &TagIndex<'_>, question: &Question) -> bool {
    // Deleting a part cascades to its groups and questions
    if !index.part_ids.contains(question.part_id.as_str()) {
        return false;
    }

    let kind = snapshot.effective_kind(question);

    if kind == Some(QuestionType::MatchingHeadings) {
        // Heading gaps live in part bodies, so grouped and ungrouped
        // heading questions both prune against the part-level set
        if let Some(group_id) = question.group_id.as_deref() {
            if !index.groups.contains_key(group_id) {
                return false;
            }
        }
        return match question_heading_gap(question) {
            Some(gap) => index.heading_gap_present(&question.part_id, gap),
            // No gap to tie to: a manually authored question, keep it
            None => true,
        };
    }

    if let Some(group_id) = question.group_id.as_deref() {
        let Some(group) = index.groups.get(group_id) else {
            return false;
        };
        let prompt_numbers = lexer::tag_numbers(&question.prompt, group.kind.gap_dialect());
        if prompt_numbers.is_empty() {
            // Prompts without tags (multiple choice, matching) are
            // managed explicitly by the author
            return true;
        }
        let Some(scope) = index.group_tags.get(group_id) else {
            return false;
        };
        return prompt_numbers.iter().all(|n| scope.contains(n));
    }

    // Ungrouped, non-heading question attached directly to a part
    true
}

/// The heading gap number a question is tied to: its explicit field, or
/// the first heading tag embedded in its prompt.
fn question_heading_gap(question: &Question) -> Option<u32> {
    question.heading_gap.or_else(|| {
        lexer::tag_numbers(&question.prompt, TagDialect::Heading)
            .into_iter()
            .next()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Part;
    use pretty_assertions::assert_eq;

    fn part(id: &str, order: u32, body: &str, groups: Vec<QuestionGroup>) -> Part {
        Part {
            id: id.to_string(),
            order,
            title: String::new(),
            body: body.to_string(),
            groups,
        }
    }

    fn group(id: &str, kind: QuestionType, text: &str) -> QuestionGroup {
        QuestionGroup {
            id: id.to_string(),
            kind,
            instruction: String::new(),
            options: Vec::new(),
            group_text: text.to_string(),
            table: None,
            flowchart: None,
            image_url: None,
        }
    }

    fn question(id: &str, part_id: &str, group_id: Option<&str>, prompt: &str) -> Question {
        Question {
            id: QuestionRef::Persisted(id.to_string()),
            part_id: part_id.to_string(),
            group_id: group_id.map(str::to_string),
            kind: None,
            prompt: prompt.to_string(),
            answer: String::new(),
            options: Vec::new(),
            sequence: 0,
            heading_gap: None,
        }
    }

    // -------------------------------------------------------------------------
    // Pruning
    // -------------------------------------------------------------------------

    #[test]
    fn test_prunes_question_whose_tag_vanished() {
        let snapshot = ExamSnapshot {
            parts: vec![part(
                "p1",
                0,
                "",
                vec![group("g1", QuestionType::SummaryCompletion, "a [[1]] b [[2]]")],
            )],
            questions: vec![
                question("q1", "p1", Some("g1"), "[[1]]"),
                question("q2", "p1", Some("g1"), "[[2]]"),
                question("q3", "p1", Some("g1"), "[[3]]"),
            ],
        };

        let outcome = reconcile(&snapshot);
        let ids: Vec<String> = outcome.questions.iter().map(|q| q.id.to_string()).collect();
        assert_eq!(ids, vec!["q1", "q2"]);
        assert_eq!(outcome.removed_persisted, vec!["q3"]);
        assert!(outcome.changed);
    }

    #[test]
    fn test_part_deletion_cascades() {
        let snapshot = ExamSnapshot {
            parts: vec![part("p1", 0, "", Vec::new())],
            questions: vec![question("q1", "p2", None, "anything")],
        };
        let outcome = reconcile(&snapshot);
        assert!(outcome.questions.is_empty());
        assert_eq!(outcome.removed_persisted, vec!["q1"]);
    }

    #[test]
    fn test_group_deletion_prunes_members() {
        let snapshot = ExamSnapshot {
            parts: vec![part("p1", 0, "", Vec::new())],
            questions: vec![question("q1", "p1", Some("g-gone"), "[[1]]")],
        };
        let outcome = reconcile(&snapshot);
        assert!(outcome.questions.is_empty());
    }

    #[test]
    fn test_untagged_prompt_is_kept() {
        let snapshot = ExamSnapshot {
            parts: vec![part(
                "p1",
                0,
                "",
                vec![group("g1", QuestionType::MultipleChoice, "")],
            )],
            questions: vec![question("q1", "p1", Some("g1"), "What is the main idea?")],
        };
        let outcome = reconcile(&snapshot);
        assert_eq!(outcome.questions.len(), 1);
        assert!(outcome.removed_persisted.is_empty());
    }

    #[test]
    fn test_heading_question_pruned_against_part_body() {
        let mut q1 = question("q1", "p1", None, "[H1]");
        q1.kind = Some(QuestionType::MatchingHeadings);
        let mut q2 = question("q2", "p1", None, "[H2]");
        q2.kind = Some(QuestionType::MatchingHeadings);

        let snapshot = ExamSnapshot {
            parts: vec![part("p1", 0, r#"<h3 data-heading-gap="1">A</h3>"#, Vec::new())],
            questions: vec![q1, q2],
        };
        let outcome = reconcile(&snapshot);
        let ids: Vec<String> = outcome.questions.iter().map(|q| q.id.to_string()).collect();
        assert_eq!(ids, vec!["q1"]);
        assert_eq!(outcome.removed_persisted, vec!["q2"]);
    }

    #[test]
    fn test_grouped_heading_question_uses_part_scope() {
        // The heading gap lives in the part body, not the group text
        let snapshot = ExamSnapshot {
            parts: vec![part(
                "p1",
                0,
                "[H3]",
                vec![group("gh", QuestionType::MatchingHeadings, "")],
            )],
            questions: vec![{
                let mut q = question("q1", "p1", Some("gh"), "[H3]");
                q.heading_gap = Some(3);
                q
            }],
        };
        let outcome = reconcile(&snapshot);
        assert_eq!(outcome.questions.len(), 1);
        assert!(outcome.removed_persisted.is_empty());
    }

    // -------------------------------------------------------------------------
    // Growth
    // -------------------------------------------------------------------------

    #[test]
    fn test_grows_note_group_ordered_by_tag_number() {
        let snapshot = ExamSnapshot {
            parts: vec![part(
                "p1",
                0,
                "",
                vec![group("g1", QuestionType::NoteCompletion, "Item [[n2]] and [[n1]]")],
            )],
            questions: Vec::new(),
        };

        let outcome = reconcile(&snapshot);
        assert_eq!(outcome.questions.len(), 2);
        assert_eq!(outcome.questions[0].prompt, "[[n1]]");
        assert_eq!(outcome.questions[0].sequence, 1);
        assert_eq!(outcome.questions[1].prompt, "[[n2]]");
        assert_eq!(outcome.questions[1].sequence, 2);
        assert!(outcome.questions.iter().all(|q| q.id.is_pending()));
        assert!(outcome.changed);
    }

    #[test]
    fn test_growth_skips_backed_tags() {
        let snapshot = ExamSnapshot {
            parts: vec![part(
                "p1",
                0,
                "",
                vec![group("g1", QuestionType::SummaryCompletion, "[[1]] [[2]]")],
            )],
            questions: vec![question("q1", "p1", Some("g1"), "[[1]]")],
        };

        let outcome = reconcile(&snapshot);
        assert_eq!(outcome.questions.len(), 2);
        assert_eq!(outcome.questions[0].id.to_string(), "q1");
        assert_eq!(outcome.questions[1].prompt, "[[2]]");
    }

    #[test]
    fn test_manual_group_types_never_grow() {
        let snapshot = ExamSnapshot {
            parts: vec![part(
                "p1",
                0,
                "",
                vec![group("g1", QuestionType::SentenceCompletion, "Finish [[1]]")],
            )],
            questions: Vec::new(),
        };
        let outcome = reconcile(&snapshot);
        assert!(outcome.questions.is_empty());
        assert!(!outcome.changed);
    }

    #[test]
    fn test_duplicate_tags_grow_once() {
        let snapshot = ExamSnapshot {
            parts: vec![part(
                "p1",
                0,
                "",
                vec![group("g1", QuestionType::NoteCompletion, "[[n1]] again [[n1]]")],
            )],
            questions: Vec::new(),
        };
        let outcome = reconcile(&snapshot);
        assert_eq!(outcome.questions.len(), 1);
    }

    // -------------------------------------------------------------------------
    // Inline answer propagation
    // -------------------------------------------------------------------------

    #[test]
    fn test_inline_answer_overwrites_stored() {
        let mut q = question("q1", "p1", None, "[H1]");
        q.kind = Some(QuestionType::MatchingHeadings);
        q.answer = "i".to_string();

        let snapshot = ExamSnapshot {
            parts: vec![part(
                "p1",
                0,
                r#"<h3 data-heading-gap="1" data-correct-answer="b">T</h3>"#,
                Vec::new(),
            )],
            questions: vec![q],
        };
        let outcome = reconcile(&snapshot);
        assert_eq!(outcome.questions[0].answer, "b");
        assert_eq!(outcome.questions[0].heading_gap, Some(1));
        assert!(outcome.changed);
    }

    #[test]
    fn test_empty_inline_answer_keeps_stored() {
        let mut q = question("q1", "p1", None, "[H1]");
        q.kind = Some(QuestionType::MatchingHeadings);
        q.answer = "iii".to_string();
        q.heading_gap = Some(1);

        let snapshot = ExamSnapshot {
            parts: vec![part(
                "p1",
                0,
                r#"<h3 data-heading-gap="1">T</h3>"#,
                Vec::new(),
            )],
            questions: vec![q],
        };
        let outcome = reconcile(&snapshot);
        assert_eq!(outcome.questions[0].answer, "iii");
        assert!(!outcome.changed);
    }

    #[test]
    fn test_kind_backfilled_from_group() {
        let snapshot = ExamSnapshot {
            parts: vec![part(
                "p1",
                0,
                "",
                vec![group("g1", QuestionType::TrueFalseNotGiven, "")],
            )],
            questions: vec![question("q1", "p1", Some("g1"), "The author agrees.")],
        };
        let outcome = reconcile(&snapshot);
        assert_eq!(
            outcome.questions[0].kind,
            Some(QuestionType::TrueFalseNotGiven)
        );
    }

    // -------------------------------------------------------------------------
    // Idempotence and short-circuit
    // -------------------------------------------------------------------------

    #[test]
    fn test_reconcile_is_idempotent() {
        let snapshot = ExamSnapshot {
            parts: vec![part(
                "p1",
                0,
                r#"<h3 data-heading-gap="1" data-correct-answer="ii">T</h3>"#,
                vec![
                    group("g1", QuestionType::NoteCompletion, "[[n1]] [[n2]]"),
                    group("g2", QuestionType::TableCompletion, "[[1]]"),
                ],
            )],
            questions: vec![question("q1", "p1", Some("g1"), "[[n3]]")],
        };

        let first = reconcile(&snapshot);
        assert!(first.changed);

        let second_input = ExamSnapshot {
            parts: snapshot.parts.clone(),
            questions: first.questions.clone(),
        };
        let second = reconcile(&second_input);
        assert!(!second.changed);
        assert_eq!(second.questions, first.questions);
        assert!(second.removed_persisted.is_empty());
    }

    #[test]
    fn test_unchanged_snapshot_is_noop() {
        let snapshot = ExamSnapshot {
            parts: vec![part(
                "p1",
                0,
                "",
                vec![group("g1", QuestionType::SummaryCompletion, "[[1]]")],
            )],
            questions: vec![{
                let mut q = question("q1", "p1", Some("g1"), "[[1]]");
                q.kind = Some(QuestionType::SummaryCompletion);
                q.sequence = 1;
                q
            }],
        };
        let outcome = reconcile(&snapshot);
        assert!(!outcome.changed);
        assert_eq!(outcome.questions, snapshot.questions);
    }
}
